use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;
use dashmap::DashMap;

use crate::engine::book::DepthSnapshot;
use crate::engine::types::{Price, Symbol, Trade};

/// Default capacity of a subscriber's event buffer before the oldest queued
/// event is dropped to make room for a new one.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 4096;

/// A unique handle returned at subscription time, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Market data published for one symbol.
#[derive(Clone, Debug, PartialEq)]
pub enum MarketEvent {
    Trade(Trade),
    Bbo {
        symbol: Symbol,
        best_bid: Option<Price>,
        best_ask: Option<Price>,
    },
    Depth {
        symbol: Symbol,
        snapshot: DepthSnapshot,
    },
}

impl MarketEvent {
    pub fn symbol(&self) -> &Symbol {
        match self {
            MarketEvent::Trade(trade) => &trade.symbol,
            MarketEvent::Bbo { symbol, .. } => symbol,
            MarketEvent::Depth { symbol, .. } => symbol,
        }
    }
}

struct Subscriber {
    queue: Arc<ArrayQueue<MarketEvent>>,
    dropped: Arc<AtomicU64>,
}

/// A subscriber's read handle: the other end of an [`EventBus`] subscription.
/// Drains a bounded buffer that the bus fills; when the buffer is full the
/// bus drops the oldest queued event to make room rather than block the
/// matching path.
#[derive(Clone)]
pub struct EventReceiver {
    queue: Arc<ArrayQueue<MarketEvent>>,
    dropped: Arc<AtomicU64>,
}

impl EventReceiver {
    /// Pops the oldest buffered event, if any.
    pub fn try_recv(&self) -> Option<MarketEvent> {
        self.queue.pop()
    }

    /// Count of events dropped because this subscriber fell behind.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Publish-subscribe fan-out of market data. Publishing never blocks and
/// never touches the matching path's own locks: each subscriber has its own
/// bounded buffer, and a slow subscriber only loses its own oldest events,
/// never slows down or fails a submission.
#[derive(Default)]
pub struct EventBus {
    subscribers: DashMap<u64, Subscriber>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a new subscriber with the default buffer capacity and
    /// returns its id plus the receiving end.
    pub fn subscribe(&self) -> (SubscriptionId, EventReceiver) {
        self.subscribe_with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> (SubscriptionId, EventReceiver) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Arc::new(ArrayQueue::new(capacity.max(1)));
        let dropped = Arc::new(AtomicU64::new(0));
        self.subscribers.insert(
            id,
            Subscriber {
                queue: queue.clone(),
                dropped: dropped.clone(),
            },
        );
        (SubscriptionId(id), EventReceiver { queue, dropped })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.remove(&id.0);
    }

    /// Fans `event` out to every current subscriber. If a subscriber's
    /// buffer is full, the oldest event it holds is dropped to make room.
    pub fn publish(&self, event: MarketEvent) {
        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if let Err(event) = subscriber.queue.push(event.clone()) {
                subscriber.queue.pop();
                subscriber.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscription_id = *entry.key(),
                    "event subscriber buffer full, dropping oldest event"
                );
                let _ = subscriber.queue.push(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Side;

    fn sample_trade() -> Trade {
        Trade {
            trade_id: 1,
            symbol: Symbol::new("BTC-USD"),
            price: "100".parse().unwrap(),
            quantity: "1".parse().unwrap(),
            aggressor_side: Side::Buy,
            maker_order_id: 1,
            taker_order_id: 2,
            timestamp: 1,
        }
    }

    #[test]
    fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let (_id, rx) = bus.subscribe();
        bus.publish(MarketEvent::Trade(sample_trade()));
        assert_eq!(rx.try_recv(), Some(MarketEvent::Trade(sample_trade())));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn full_buffer_drops_oldest_and_counts_it() {
        let bus = EventBus::new();
        let (_id, rx) = bus.subscribe_with_capacity(1);
        bus.publish(MarketEvent::Trade(sample_trade()));
        let mut second = sample_trade();
        second.trade_id = 2;
        bus.publish(MarketEvent::Trade(second.clone()));

        assert_eq!(rx.try_recv(), Some(MarketEvent::Trade(second)));
        assert_eq!(rx.dropped_count(), 1);
    }

    #[test]
    fn unsubscribed_receiver_stops_getting_new_events() {
        let bus = EventBus::new();
        let (id, rx) = bus.subscribe();
        bus.unsubscribe(id);
        bus.publish(MarketEvent::Trade(sample_trade()));
        assert_eq!(rx.try_recv(), None);
    }
}

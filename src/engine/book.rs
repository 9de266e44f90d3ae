use std::collections::{BTreeMap, HashMap};

use crate::engine::error::{CancelOutcome, CancelResult};
use crate::engine::price_level::{Handle, PriceLevel};
use crate::engine::types::{Order, OrderId, OrderStatus, Price, Quantity, Side, Symbol, Trade};

/// Where a resting order currently lives, so cancel can find it in O(1)
/// without scanning either side of the book.
#[derive(Clone, Copy)]
enum IndexEntry {
    Resting { side: Side, price: Price, handle: Handle },
    /// The order reached a terminal state; the id is kept so a second
    /// cancel of the same order can be told "already gone" rather than
    /// "never existed".
    Terminal,
}

/// A single price level in a depth snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Top-of-book-and-below snapshot for one side of the book.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepthSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// One symbol's limit order book: bids and asks keyed by price, each a
/// FIFO queue of resting orders, plus an id index for O(1) cancel.
pub struct OrderBook {
    symbol: Symbol,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    index: HashMap<OrderId, IndexEntry>,
    next_timestamp: u64,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
            next_timestamp: 0,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Monotonic counter used as the time-priority tie-break for every
    /// order submitted to this book. Advanced once per lock acquisition,
    /// never read from a wall clock.
    pub fn next_timestamp(&mut self) -> u64 {
        self.next_timestamp += 1;
        self.next_timestamp
    }

    /// Highest resting buy price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest resting sell price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    fn opposite_side_book(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side.opposite() {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Whether a new order on `side`, limited to `limit_price` (`None` means
    /// no limit, i.e. a market order), would immediately cross any resting
    /// liquidity. Used to enforce post-only admission.
    pub fn would_cross(&self, side: Side, limit_price: Option<Price>) -> bool {
        match side {
            Side::Buy => match (self.best_ask(), limit_price) {
                (Some(ask), Some(limit)) => ask <= limit,
                (Some(_), None) => true,
                (None, _) => false,
            },
            Side::Sell => match (self.best_bid(), limit_price) {
                (Some(bid), Some(limit)) => bid >= limit,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }

    /// Non-mutating feasibility check: would `quantity` on `side`, limited
    /// to `limit_price`, fully fill against currently resting liquidity?
    /// Used by fill-or-kill orders, which must never partially mutate the
    /// book.
    pub fn can_fill(&self, side: Side, quantity: Quantity, limit_price: Option<Price>) -> bool {
        let mut remaining = quantity;
        for level in self.levels_for_match(side, limit_price) {
            if remaining <= Quantity::ZERO {
                break;
            }
            remaining -= level.total_quantity();
        }
        remaining <= Quantity::ZERO
    }

    fn levels_for_match(&self, side: Side, limit_price: Option<Price>) -> Vec<&PriceLevel> {
        let book = self.opposite_side_book(side);
        match side {
            Side::Buy => book
                .iter()
                .take_while(|(price, _)| limit_price.is_none_or(|limit| **price <= limit))
                .map(|(_, level)| level)
                .collect(),
            Side::Sell => book
                .iter()
                .rev()
                .take_while(|(price, _)| limit_price.is_none_or(|limit| **price >= limit))
                .map(|(_, level)| level)
                .collect(),
        }
    }

    /// Matches `taker` against resting liquidity on the opposite side,
    /// mutating both the taker's remaining quantity and the book, and
    /// returns one trade per maker order consumed (oldest resting order at
    /// the best price first). Trade ids are left at `0`; the caller
    /// assigns them in execution order. Stops once the taker is filled,
    /// its limit price (if any) is no longer met, or liquidity is
    /// exhausted.
    pub fn match_against(&mut self, taker: &mut Order) -> Vec<Trade> {
        let mut trades = Vec::new();
        let limit_price = taker.limit_price();

        loop {
            if taker.remaining_quantity <= Quantity::ZERO {
                break;
            }
            let Some(best_price) = self.best_opposite_price(taker.side, limit_price) else {
                break;
            };

            let book = match taker.side.opposite() {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            let level = book.get_mut(&best_price).expect("best price level present");

            let trade_quantity = taker
                .remaining_quantity
                .min(level.peek_head().expect("non-empty level").remaining_quantity);

            level.decrement_head(trade_quantity);
            taker.remaining_quantity -= trade_quantity;

            let maker_filled = level.peek_head().expect("head still present").remaining_quantity
                <= Quantity::ZERO;
            let maker_order_id = level.peek_head().expect("head still present").id;

            trades.push(Trade {
                trade_id: 0,
                symbol: self.symbol.clone(),
                price: best_price,
                quantity: trade_quantity,
                aggressor_side: taker.side,
                maker_order_id,
                taker_order_id: taker.id,
                timestamp: taker.submission_timestamp,
            });

            if maker_filled {
                let maker = level.pop_head().expect("head still present");
                self.index.insert(maker.id, IndexEntry::Terminal);
            }
            if level.is_empty() {
                book.remove(&best_price);
            }
        }

        if taker.remaining_quantity <= Quantity::ZERO {
            taker.status = OrderStatus::Filled;
        } else if taker.remaining_quantity < taker.original_quantity {
            taker.status = OrderStatus::PartiallyFilled;
        }

        trades
    }

    fn best_opposite_price(&self, side: Side, limit_price: Option<Price>) -> Option<Price> {
        let candidate = match side {
            Side::Buy => self.best_ask(),
            Side::Sell => self.best_bid(),
        }?;
        let within_limit = match (side, limit_price) {
            (_, None) => true,
            (Side::Buy, Some(limit)) => candidate <= limit,
            (Side::Sell, Some(limit)) => candidate >= limit,
        };
        within_limit.then_some(candidate)
    }

    /// Rests `order` on the book at its limit price. The caller is
    /// responsible for having already matched what it could; this never
    /// matches.
    pub fn insert_resting(&mut self, order: Order) {
        let price = order.limit_price().expect("only limit-priced orders rest");
        let side = order.side;
        let order_id = order.id;
        let book = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = book.entry(price).or_insert_with(|| PriceLevel::new(price));
        let handle = level.enqueue(order);
        self.index.insert(order_id, IndexEntry::Resting { side, price, handle });
    }

    /// Removes a resting order from the book, if present and not already
    /// terminal.
    pub fn cancel(&mut self, order_id: OrderId) -> CancelResult {
        let outcome = match self.index.get(&order_id).copied() {
            None => CancelOutcome::NotFound,
            Some(IndexEntry::Terminal) => CancelOutcome::AlreadyTerminal,
            Some(IndexEntry::Resting { side, price, handle }) => {
                let book = match side {
                    Side::Buy => &mut self.bids,
                    Side::Sell => &mut self.asks,
                };
                if let Some(level) = book.get_mut(&price) {
                    level.remove(handle);
                    if level.is_empty() {
                        book.remove(&price);
                    }
                }
                self.index.insert(order_id, IndexEntry::Terminal);
                CancelOutcome::Cancelled
            }
        };
        CancelResult { order_id, outcome }
    }

    /// Snapshot of up to `levels` price levels on each side, best first.
    pub fn depth(&self, levels: usize) -> DepthSnapshot {
        DepthSnapshot {
            bids: self
                .bids
                .iter()
                .rev()
                .take(levels)
                .map(|(price, level)| DepthLevel {
                    price: *price,
                    quantity: level.total_quantity(),
                })
                .collect(),
            asks: self
                .asks
                .iter()
                .take(levels)
                .map(|(price, level)| DepthLevel {
                    price: *price,
                    quantity: level.total_quantity(),
                })
                .collect(),
        }
    }
}

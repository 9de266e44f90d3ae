use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::engine::book::{DepthSnapshot, OrderBook};
use crate::engine::error::{CancelOutcome, CancelResult, InvalidOrderKind, RejectReason};
use crate::engine::event_bus::{EventBus, EventReceiver, MarketEvent, SubscriptionId};
use crate::engine::types::{Order, OrderId, OrderStatus, OrderType, Price, Quantity, Side, Symbol, Trade};

/// A request to place a new order, as received from upstream of this crate.
/// Validation and admission happen inside [`MatchingEngine::submit`].
#[derive(Clone, Debug)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
}

/// Outcome of a successful [`MatchingEngine::submit`] call. "Successful"
/// here means the order was admitted for processing; `status` and
/// `reject_reason` may still describe a rejection that happened after some
/// trades were already executed (a partially filled market order), since
/// those trades are real and must be reported regardless of the order's
/// own final disposition.
#[derive(Clone, Debug)]
pub struct SubmissionResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub remaining_quantity: Quantity,
    pub trades: Vec<Trade>,
    pub reject_reason: Option<RejectReason>,
}

/// Best-bid/best-offer snapshot for one symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BboSnapshot {
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
}

fn validate_request(request: &OrderRequest) -> Result<(), InvalidOrderKind> {
    if request.quantity <= Quantity::ZERO {
        return Err(InvalidOrderKind::NonPositiveQuantity);
    }
    match request.order_type {
        OrderType::Market => {}
        OrderType::Limit { price, .. } | OrderType::Ioc { price } | OrderType::Fok { price } => {
            if price <= Price::ZERO {
                return Err(InvalidOrderKind::NonPositivePrice);
            }
        }
    }
    Ok(())
}

/// Depth published in a [`MarketEvent::Depth`] when no caller-specific depth
/// has been requested. Configurable per engine via
/// [`MatchingEngine::with_default_depth`].
const DEFAULT_EVENT_DEPTH: usize = 10;

/// The matching engine: one order book per symbol, each guarded by its own
/// mutex so unrelated symbols never contend, and an event bus publishing
/// trades, BBO changes, and depth changes as they happen.
pub struct MatchingEngine {
    books: DashMap<Symbol, Arc<Mutex<OrderBook>>>,
    events: EventBus,
    next_order_id: AtomicU64,
    next_trade_id: AtomicU64,
    allowed_symbols: Option<Vec<Symbol>>,
    default_depth: usize,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Creates an engine that admits orders for any symbol, creating its
    /// book lazily on first use.
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            events: EventBus::new(),
            next_order_id: AtomicU64::new(1),
            next_trade_id: AtomicU64::new(1),
            allowed_symbols: None,
            default_depth: DEFAULT_EVENT_DEPTH,
        }
    }

    /// Creates an engine that only admits orders for the given symbols;
    /// anything else is rejected with [`RejectReason::UnknownSymbol`].
    pub fn with_allowed_symbols(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            allowed_symbols: Some(symbols.into_iter().collect()),
            ..Self::new()
        }
    }

    /// Overrides how many levels per side are carried in the
    /// [`MarketEvent::Depth`] events this engine publishes (the default is
    /// [`DEFAULT_EVENT_DEPTH`]). Does not affect [`MatchingEngine::depth`],
    /// which always takes its level count from the caller.
    pub fn with_default_depth(mut self, default_depth: usize) -> Self {
        self.default_depth = default_depth;
        self
    }

    pub fn subscribe(&self) -> (SubscriptionId, EventReceiver) {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.events.unsubscribe(id)
    }

    fn is_symbol_admitted(&self, symbol: &Symbol) -> bool {
        match &self.allowed_symbols {
            None => true,
            Some(allowed) => allowed.contains(symbol),
        }
    }

    fn book_for(&self, symbol: &Symbol) -> Arc<Mutex<OrderBook>> {
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new(symbol.clone()))))
            .clone()
    }

    fn next_order_id(&self) -> OrderId {
        self.next_order_id.fetch_add(1, Ordering::Relaxed)
    }

    fn assign_trade_ids(&self, trades: &mut [Trade]) {
        for trade in trades.iter_mut() {
            trade.trade_id = self.next_trade_id.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Submits a new order for admission and, if admitted, matching.
    ///
    /// Returns `Err` only when the order never reaches a symbol's book at
    /// all: failed validation or an inadmissible symbol. Once an order has
    /// acquired its symbol's lock it always gets an `order_id` and a
    /// `SubmissionResult`, even if its final status is `Rejected` or
    /// `Cancelled` — a post-only order that would have crossed, a
    /// fill-or-kill order that cannot be filled in full, and a market order
    /// rejected after a partial fill are all reported this way, since each
    /// corresponds to a defined point in the order status state machine
    /// rather than an admission-time failure.
    #[tracing::instrument(level = "debug", skip(self), fields(symbol = %request.symbol, side = ?request.side))]
    pub fn submit(&self, request: OrderRequest) -> Result<SubmissionResult, RejectReason> {
        validate_request(&request).map_err(RejectReason::Invalid).inspect_err(|reason| {
            tracing::warn!(symbol = %request.symbol, %reason, "order rejected at admission");
        })?;
        if !self.is_symbol_admitted(&request.symbol) {
            tracing::warn!(symbol = %request.symbol, "order rejected: symbol not admitted");
            return Err(RejectReason::UnknownSymbol(request.symbol.clone()));
        }

        let book_lock = self.book_for(&request.symbol);
        let mut book = book_lock.lock().expect("order book mutex poisoned");

        let order_id = self.next_order_id();
        let timestamp = book.next_timestamp();
        tracing::trace!(order_id, timestamp, "order admitted, entering matcher");

        if let OrderType::Limit { price, post_only: true } = request.order_type {
            if book.would_cross(request.side, Some(price)) {
                tracing::warn!(order_id, %price, "post-only order rejected, would cross book");
                return Ok(SubmissionResult {
                    order_id,
                    status: OrderStatus::Rejected,
                    remaining_quantity: Quantity::ZERO,
                    trades: Vec::new(),
                    reject_reason: Some(RejectReason::WouldCross { would_cross_price: price }),
                });
            }
        }
        if let OrderType::Fok { price } = request.order_type {
            if !book.can_fill(request.side, request.quantity, Some(price)) {
                tracing::warn!(order_id, "fill-or-kill order cancelled, infeasible at submission");
                return Ok(SubmissionResult {
                    order_id,
                    status: OrderStatus::Cancelled,
                    remaining_quantity: Quantity::ZERO,
                    trades: Vec::new(),
                    reject_reason: Some(RejectReason::CannotFillInFull),
                });
            }
        }

        let bbo_before = BboSnapshot {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
        };
        let depth_before = book.depth(self.default_depth);

        let mut order = Order {
            id: order_id,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            original_quantity: request.quantity,
            remaining_quantity: request.quantity,
            status: OrderStatus::Pending,
            submission_timestamp: timestamp,
        };

        let (mut trades, reject_reason) = match order.order_type {
            OrderType::Market => self.dispatch_market(&mut book, &mut order),
            OrderType::Limit { .. } => self.dispatch_limit(&mut book, &mut order),
            OrderType::Ioc { .. } => self.dispatch_ioc(&mut book, &mut order),
            OrderType::Fok { .. } => self.dispatch_fok(&mut book, &mut order),
        };
        self.assign_trade_ids(&mut trades);
        tracing::debug!(order_id, status = ?order.status, trade_count = trades.len(), "match pass complete");
        if let Some(reason) = &reject_reason {
            tracing::warn!(order_id, %reason, "order rejected after matching");
        }

        let bbo = BboSnapshot {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
        };
        let depth_after = book.depth(self.default_depth);
        drop(book);

        for trade in &trades {
            self.events.publish(MarketEvent::Trade(trade.clone()));
        }
        if bbo != bbo_before {
            self.events.publish(MarketEvent::Bbo {
                symbol: request.symbol.clone(),
                best_bid: bbo.best_bid,
                best_ask: bbo.best_ask,
            });
        }
        if depth_after != depth_before {
            self.events.publish(MarketEvent::Depth {
                symbol: request.symbol.clone(),
                snapshot: depth_after,
            });
        }

        Ok(SubmissionResult {
            order_id,
            status: order.status,
            remaining_quantity: order.remaining_quantity,
            trades,
            reject_reason,
        })
    }

    /// Market orders carry no price limit. A full fill is the only
    /// accepted outcome: a partial (or zero) fill leaves the order
    /// rejected, but any trades already executed stand.
    fn dispatch_market(&self, book: &mut OrderBook, order: &mut Order) -> (Vec<Trade>, Option<RejectReason>) {
        let requested = order.remaining_quantity;
        let trades = book.match_against(order);
        if order.remaining_quantity > Quantity::ZERO {
            order.status = OrderStatus::Rejected;
            let reason = if trades.is_empty() {
                RejectReason::NoLiquidity
            } else {
                RejectReason::MarketPartialResidual {
                    filled: requested - order.remaining_quantity,
                    requested,
                }
            };
            (trades, Some(reason))
        } else {
            (trades, None)
        }
    }

    /// Limit orders match what they can immediately, then rest any
    /// remainder at their limit price.
    fn dispatch_limit(&self, book: &mut OrderBook, order: &mut Order) -> (Vec<Trade>, Option<RejectReason>) {
        let trades = book.match_against(order);
        if order.remaining_quantity > Quantity::ZERO {
            book.insert_resting(order.clone());
        }
        (trades, None)
    }

    /// Immediate-or-cancel orders match what they can immediately; any
    /// remainder is discarded rather than rested.
    fn dispatch_ioc(&self, book: &mut OrderBook, order: &mut Order) -> (Vec<Trade>, Option<RejectReason>) {
        let trades = book.match_against(order);
        if order.remaining_quantity > Quantity::ZERO && trades.is_empty() {
            order.status = OrderStatus::Cancelled;
        }
        (trades, None)
    }

    /// Fill-or-kill orders have already passed a non-mutating feasibility
    /// check in `submit` by the time this runs, so the match here always
    /// fills in full.
    fn dispatch_fok(&self, book: &mut OrderBook, order: &mut Order) -> (Vec<Trade>, Option<RejectReason>) {
        let trades = book.match_against(order);
        debug_assert!(order.remaining_quantity <= Quantity::ZERO, "fok feasibility check was bypassed");
        (trades, None)
    }

    /// Cancels a resting order. A cancel of an order id that is already
    /// terminal (filled, cancelled, or rejected) is reported distinctly
    /// from one that never existed, so a racing cancel against a fill
    /// cannot be mistaken for a bad request.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn cancel(&self, symbol: &Symbol, order_id: OrderId) -> Option<CancelResult> {
        let book_lock = self.books.get(symbol)?.clone();
        let mut book = book_lock.lock().expect("order book mutex poisoned");

        let bbo_before = BboSnapshot {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
        };
        let depth_before = book.depth(self.default_depth);

        let result = book.cancel(order_id);
        match result.outcome {
            CancelOutcome::Cancelled => tracing::debug!(order_id, "order cancelled"),
            CancelOutcome::NotFound => tracing::warn!(order_id, "cancel failed: order id unknown"),
            CancelOutcome::AlreadyTerminal => {
                tracing::warn!(order_id, "cancel raced a terminal order, no-op")
            }
        }

        let bbo_after = BboSnapshot {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
        };
        let depth_after = book.depth(self.default_depth);
        drop(book);

        if result.outcome == CancelOutcome::Cancelled {
            if bbo_after != bbo_before {
                self.events.publish(MarketEvent::Bbo {
                    symbol: symbol.clone(),
                    best_bid: bbo_after.best_bid,
                    best_ask: bbo_after.best_ask,
                });
            }
            if depth_after != depth_before {
                self.events.publish(MarketEvent::Depth {
                    symbol: symbol.clone(),
                    snapshot: depth_after,
                });
            }
        }
        Some(result)
    }

    /// Current best bid/ask for a symbol, or `None` if the symbol has no
    /// book yet.
    pub fn bbo(&self, symbol: &Symbol) -> Option<BboSnapshot> {
        let book_lock = self.books.get(symbol)?.clone();
        let book = book_lock.lock().expect("order book mutex poisoned");
        Some(BboSnapshot {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
        })
    }

    /// Depth snapshot for a symbol, or `None` if the symbol has no book yet.
    pub fn depth(&self, symbol: &Symbol, levels: usize) -> Option<DepthSnapshot> {
        let book_lock = self.books.get(symbol)?.clone();
        let book = book_lock.lock().expect("order book mutex poisoned");
        Some(book.depth(levels))
    }
}

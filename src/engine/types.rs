use mimalloc::MiMalloc;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Global allocator. The matching path is allocation-sensitive; mimalloc
/// gives more predictable per-order allocation latency than the system
/// allocator under the allocation pattern an order book produces (many
/// short-lived small allocations).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Price type. Fixed-precision decimal, never a binary float — price and
/// quantity arithmetic must be exact.
pub type Price = Decimal;

/// Quantity type, same representation as [`Price`].
pub type Quantity = Decimal;

/// Unique order identifier, assigned by the engine at admission.
pub type OrderId = u64;

/// Unique trade identifier, assigned by the engine in execution order.
pub type TradeId = u64;

/// Monotonic per-symbol sequence number used for time-priority tie-breaks.
/// Assigned at lock acquisition, never from a wall clock.
pub type Priority = u64;

/// Trading symbol. Cheap to clone; used as a map key throughout.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol::new(value)
    }
}

/// Side indicates the direction of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Buy means the user wants to acquire the asset; matches against sells.
    Buy,
    /// Sell means the user wants to dispose of the asset; matches against buys.
    Sell,
}

impl Side {
    /// The side of the book a taker on this side must walk to find liquidity.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type, including the execution discipline. A tagged variant rather
/// than the orthogonal type/strategy/directive combination a dynamically
/// typed validation layer would use — the combination is invalid
/// (`Market` with a price, `Limit` without one) by construction, not by a
/// runtime check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OrderType {
    /// No price limit; must cross existing liquidity or be rejected.
    Market,
    /// Rests on the book at `price` if not immediately (fully) matched.
    /// `post_only` orders are rejected at admission instead of matching if
    /// they would cross the book at all.
    Limit { price: Price, post_only: bool },
    /// Immediate-or-cancel: matches what it can at `price` or better, any
    /// remainder is cancelled rather than rested.
    Ioc { price: Price },
    /// Fill-or-kill: either the whole quantity fills at `price` or better,
    /// atomically, or nothing happens at all.
    Fok { price: Price },
}

impl OrderType {
    /// The limit price carried by this order type, if any.
    pub fn limit_price(&self) -> Option<Price> {
        match self {
            OrderType::Market => None,
            OrderType::Limit { price, .. } | OrderType::Ioc { price } | OrderType::Fok { price } => {
                Some(*price)
            }
        }
    }

    pub fn is_market(&self) -> bool {
        matches!(self, OrderType::Market)
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, OrderType::Limit { .. })
    }

    pub fn post_only(&self) -> bool {
        matches!(self, OrderType::Limit { post_only: true, .. })
    }
}

/// Order lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    /// Admitted, resting, never matched.
    Pending,
    /// Matched some but not all of its quantity; the rest is resting (Limit)
    /// or already discarded (IOC).
    PartiallyFilled,
    /// Fully matched.
    Filled,
    /// Removed from the book (or never rested) without full execution.
    Cancelled,
    /// Never admitted to the book.
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An order: immutable identity plus mutable execution state.
#[derive(Clone, Debug)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub original_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub status: OrderStatus,
    /// Assigned at lock acquisition; strictly increasing per symbol.
    pub submission_timestamp: Priority,
}

impl Order {
    pub fn limit_price(&self) -> Option<Price> {
        self.order_type.limit_price()
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }
}

/// A single trade: emitted exactly once per match event, priced at the
/// maker's resting price.
#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Quantity,
    pub aggressor_side: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub timestamp: Priority,
}

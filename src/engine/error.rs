use thiserror::Error;

use crate::engine::types::{OrderId, Price, Quantity, Symbol};

/// Why a submitted order was malformed before any attempt to admit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidOrderKind {
    #[error("quantity must be strictly positive")]
    NonPositiveQuantity,
    #[error("limit price must be strictly positive")]
    NonPositivePrice,
}

/// Why an order did not end up resting or fully matched. `Invalid` and
/// `UnknownSymbol` are returned as the `Err` of [`super::matching::MatchingEngine::submit`]
/// before the order ever touches a symbol's book; the rest annotate a
/// `SubmissionResult` whose `status` already reflects the outcome.
#[derive(Debug, Clone, Error)]
pub enum RejectReason {
    #[error("order failed validation: {0}")]
    Invalid(InvalidOrderKind),
    #[error("symbol {0} is not admitted for trading")]
    UnknownSymbol(Symbol),
    #[error("market order had no resting liquidity to match against")]
    NoLiquidity,
    #[error("market order partially filled {filled} of {requested}; residual rejected")]
    MarketPartialResidual { filled: Quantity, requested: Quantity },
    #[error("post-only order would have crossed the book at {would_cross_price}")]
    WouldCross { would_cross_price: Price },
    #[error("fill-or-kill order could not be filled in full")]
    CannotFillInFull,
}

/// Outcome of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The order was resting and has been removed.
    Cancelled,
    /// The order id is unknown to this symbol's book; it may never have
    /// existed, or may belong to a different symbol.
    NotFound,
    /// The order existed but had already reached a terminal state (filled,
    /// cancelled, or rejected) before this request was processed.
    AlreadyTerminal,
}

/// Result of a cancel request against a known order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelResult {
    pub order_id: OrderId,
    pub outcome: CancelOutcome,
}

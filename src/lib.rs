//! Core matching engine for a single-venue exchange: per-symbol limit order
//! books plus the price-time priority matcher that realizes them.
//!
//! Everything here is in-process and synchronous from the caller's point of
//! view; wire formats, request validation, persistence, and auth live
//! upstream of this crate.

pub mod engine;

pub use engine::prelude;

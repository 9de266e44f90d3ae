mod common;

use crate::common::*;
use matching_core::prelude::*;

#[test]
fn limit_order_full_fill_removes_maker_from_book() {
    let engine = MatchingEngine::new();
    engine.submit(limit_request(Side::Sell, "100", "10")).unwrap();
    let result = engine.submit(limit_request(Side::Buy, "100", "10")).unwrap();

    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(engine.depth(&symbol(), 10).unwrap().asks.len(), 0);
}

#[test]
fn limit_order_priority_by_time() {
    let engine = MatchingEngine::new();
    let sell1 = engine.submit(limit_request(Side::Sell, "100", "10")).unwrap();
    let sell2 = engine.submit(limit_request(Side::Sell, "100", "10")).unwrap();

    let result = engine.submit(limit_request(Side::Buy, "100", "10")).unwrap();

    assert_eq!(result.trades[0].maker_order_id, sell1.order_id);
    assert_ne!(result.trades[0].maker_order_id, sell2.order_id);
}

#[test]
fn limit_order_no_cross_no_fill() {
    let engine = MatchingEngine::new();
    engine.submit(limit_request(Side::Sell, "105", "10")).unwrap();
    let result = engine.submit(limit_request(Side::Buy, "100", "10")).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.status, OrderStatus::Pending);
    let depth = engine.depth(&symbol(), 10).unwrap();
    assert_eq!(depth.asks.len(), 1);
    assert_eq!(depth.bids.len(), 1);
}

#[test]
fn limit_order_multiple_partial_fills_drain_in_fifo_order() {
    let engine = MatchingEngine::new();
    engine.submit(limit_request(Side::Sell, "100", "5")).unwrap();
    let sell2 = engine.submit(limit_request(Side::Sell, "100", "5")).unwrap();

    let result = engine.submit(limit_request(Side::Buy, "100", "8")).unwrap();

    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[1].maker_order_id, sell2.order_id);
    assert_eq!(result.trades[1].quantity, "3".parse().unwrap());

    let depth = engine.depth(&symbol(), 10).unwrap();
    assert_eq!(depth.asks.len(), 1);
    assert_eq!(depth.asks[0].quantity, "2".parse().unwrap());
}

#[test]
fn limit_order_partial_then_cancel_empties_level() {
    let engine = MatchingEngine::new();
    let sell = engine.submit(limit_request(Side::Sell, "100", "10")).unwrap();
    engine.submit(limit_request(Side::Buy, "100", "4")).unwrap();

    let cancelled = engine.cancel(&symbol(), sell.order_id).unwrap();
    assert_eq!(cancelled.outcome, CancelOutcome::Cancelled);

    let depth = engine.depth(&symbol(), 10).unwrap();
    assert!(depth.asks.is_empty());
}

#[test]
fn equal_price_on_opposite_sides_trades_at_that_price() {
    let engine = MatchingEngine::new();
    engine.submit(limit_request(Side::Sell, "50000", "1")).unwrap();
    let result = engine.submit(limit_request(Side::Buy, "50000", "1")).unwrap();
    assert_eq!(result.trades[0].price, "50000".parse().unwrap());
}

#[test]
fn book_never_crosses_after_match_completes() {
    let engine = MatchingEngine::new();
    engine.submit(limit_request(Side::Sell, "101", "1")).unwrap();
    engine.submit(limit_request(Side::Buy, "99", "1")).unwrap();

    let bbo = engine.bbo(&symbol()).unwrap();
    assert!(bbo.best_bid.unwrap() < bbo.best_ask.unwrap());
}

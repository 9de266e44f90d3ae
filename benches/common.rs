use matching_core::prelude::*;

pub fn symbol() -> Symbol {
    Symbol::new("BTC-USDT")
}

pub fn limit_request(side: Side, price: u64, qty: u64) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Limit {
            price: Price::from(price),
            post_only: false,
        },
        quantity: Quantity::from(qty),
    }
}

pub fn market_request(side: Side, qty: u64) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Market,
        quantity: Quantity::from(qty),
    }
}

use matching_core::prelude::*;

pub fn symbol() -> Symbol {
    Symbol::new("BTC-USDT")
}

pub fn limit_request(side: Side, price: &str, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Limit {
            price: price.parse().unwrap(),
            post_only: false,
        },
        quantity: qty.parse().unwrap(),
    }
}

pub fn post_only_request(side: Side, price: &str, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Limit {
            price: price.parse().unwrap(),
            post_only: true,
        },
        quantity: qty.parse().unwrap(),
    }
}

pub fn market_request(side: Side, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Market,
        quantity: qty.parse().unwrap(),
    }
}

pub fn ioc_request(side: Side, price: &str, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Ioc {
            price: price.parse().unwrap(),
        },
        quantity: qty.parse().unwrap(),
    }
}

pub fn fok_request(side: Side, price: &str, qty: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol(),
        side,
        order_type: OrderType::Fok {
            price: price.parse().unwrap(),
        },
        quantity: qty.parse().unwrap(),
    }
}

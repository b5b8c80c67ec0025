//! Futures v3 REST client.
//!
//! Order placement, lookup and cancellation against `/fapi/v3/order`, plus the
//! signed account reads (`openOrders`, `balance`, `positionRisk`). Responses are
//! returned raw; the exchange's error bodies are not interpreted.

mod client;
mod config;
mod types;

pub use client::FuturesClient;
pub use config::{
    ENV_HOST, ENV_PRIVATE_KEY, ENV_RECV_WINDOW, ENV_SIGNER, ENV_USER, FuturesConfig,
    RawSigningConfig,
};
pub use types::{NewOrderRequest, OrderSelector, OrderType, PositionSide, Side, TimeInForce};

#![allow(clippy::print_stdout, reason = "Examples are okay to print to stdout")]

//! Places or queries a `SANDUSDT` order and prints the raw response.
//!
//! ```sh
//! ASTER_USER=0x... ASTER_SIGNER=0x... ASTER_PRIVATE_KEY=0x... \
//! RUST_LOG=aster_futures_client=debug \
//! cargo run --example futures_v3 --features tracing -- query 2194215
//! ```

use std::env;

use aster_futures_client::futures::{
    FuturesClient, FuturesConfig, NewOrderRequest, OrderSelector, OrderType, PositionSide, Side,
    TimeInForce,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = FuturesClient::new(FuturesConfig::from_env()?)?;
    let mut args = env::args().skip(1);

    let response = match args.next().as_deref() {
        Some("place") => {
            let order = NewOrderRequest::builder()
                .symbol("SANDUSDT")
                .side(Side::Buy)
                .order_type(OrderType::Limit)
                .position_side(PositionSide::Both)
                .time_in_force(TimeInForce::Gtc)
                .quantity(dec!(30))
                .price(dec!(0.325))
                .reduce_only(true)
                .build();
            client.place_order(&order).await?
        }
        Some("query") => {
            let order_id = args.next().unwrap_or_default().parse()?;
            let selector = OrderSelector::builder()
                .symbol("SANDUSDT")
                .order_id(order_id)
                .build();
            client.query_order(&selector).await?
        }
        _ => client.balance().await?,
    };

    println!("{} {}", response.status, response.body);

    Ok(())
}

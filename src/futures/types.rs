use bon::Builder;
use strum_macros::Display;

use crate::Result;
use crate::error::Error;
use crate::signing::ParameterSet;
use crate::types::Decimal;

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
    /// Post-only.
    Gtx,
}

/// `POST /fapi/v3/order`.
#[derive(Builder, Clone, Debug)]
pub struct NewOrderRequest {
    #[builder(into)]
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub position_side: Option<PositionSide>,
    pub time_in_force: Option<TimeInForce>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub reduce_only: Option<bool>,
    #[builder(into)]
    pub new_client_order_id: Option<String>,
}

impl NewOrderRequest {
    /// Reduce-only `MARKET` order that closes `quantity` of an open position.
    ///
    /// `side` is the closing side: `SELL` for a long, `BUY` for a short.
    #[must_use]
    pub fn close_position(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self::builder()
            .symbol(symbol)
            .side(side)
            .order_type(OrderType::Market)
            .quantity(quantity)
            .reduce_only(true)
            .build()
    }

    /// Request parameters in wire naming. Unset options are left as nulls
    /// and dropped by the signer.
    pub fn to_params(&self) -> Result<ParameterSet> {
        if matches!(self.order_type, OrderType::Limit) && self.price.is_none() {
            return Err(Error::validation(format!(
                "LIMIT order for {} requires a price",
                self.symbol
            )));
        }
        if self.quantity.is_some_and(|q| q.is_sign_negative() || q.is_zero()) {
            return Err(Error::validation(format!(
                "order quantity must be positive for {}",
                self.symbol
            )));
        }

        Ok(ParameterSet::new()
            .with("symbol", &self.symbol)
            .with("positionSide", self.position_side.map(|s| s.to_string()))
            .with("type", self.order_type.to_string())
            .with("side", self.side.to_string())
            .with("timeInForce", self.time_in_force.map(|t| t.to_string()))
            .with("quantity", self.quantity)
            .with("price", self.price)
            .with("stopPrice", self.stop_price)
            .with("reduceOnly", self.reduce_only)
            .with("newClientOrderId", self.new_client_order_id.clone()))
    }
}

/// Identifies one order for `GET` / `DELETE /fapi/v3/order`.
#[derive(Builder, Clone, Debug)]
pub struct OrderSelector {
    #[builder(into)]
    pub symbol: String,
    pub order_id: Option<u64>,
    #[builder(into)]
    pub orig_client_order_id: Option<String>,
}

impl OrderSelector {
    pub fn to_params(&self) -> Result<ParameterSet> {
        if self.order_id.is_none() && self.orig_client_order_id.is_none() {
            return Err(Error::validation(format!(
                "either orderId or origClientOrderId is required for {}",
                self.symbol
            )));
        }

        Ok(ParameterSet::new()
            .with("symbol", &self.symbol)
            .with("orderId", self.order_id)
            .with("origClientOrderId", self.orig_client_order_id.clone()))
    }
}

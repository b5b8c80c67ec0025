//! Primitive re-exports shared by the signing and transport layers.

pub use alloy::primitives::{Address, B256, Signature, U256};
pub use rust_decimal::Decimal;

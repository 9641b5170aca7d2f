//! Decoding verified price records.
//!
//! Only records that already passed inclusion verification should be decoded;
//! the decoder checks layout, not authenticity.

use serde::Serialize;
use std::fmt;
use tessera_core::DataRecord;
use thiserror::Error;

/// Price requests carry a 4-byte parameter: three reserved bytes and a market code.
pub const PRICE_PARAMS_LEN: usize = 4;

/// Price results are 16 bytes: a big-endian u64 price in cents, then a u64 timestamp.
pub const PRICE_PAYLOAD_LEN: usize = 16;

/// Prices are reported scaled by 100.
pub const PRICE_SCALE: u64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price params must be {expected} bytes, got {got}")]
    InvalidParamsLength { expected: usize, got: usize },

    #[error("Price payload must be {expected} bytes, got {got}")]
    InvalidPayloadLength { expected: usize, got: usize },
}

/// A price as an integer number of hundredths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ScaledPrice {
    pub cents: u64,
}

impl fmt::Display for ScaledPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / PRICE_SCALE, self.cents % PRICE_SCALE)
    }
}

/// A price decoded from a verified oracle record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceReport {
    pub request_id: u64,
    pub market_code: u8,
    /// Market the code maps to, if known.
    pub market_id: Option<&'static str>,
    pub price: ScaledPrice,
    /// Second half of the payload, as committed by the oracle script.
    pub timestamp: u64,
}

/// Market id for an oracle market code.
pub fn market_id(code: u8) -> Option<&'static str> {
    match code {
        4 => Some("btc:usd"),
        _ => None,
    }
}

pub fn decode_price(record: &DataRecord) -> Result<PriceReport, PriceError> {
    if record.params.len() != PRICE_PARAMS_LEN {
        return Err(PriceError::InvalidParamsLength {
            expected: PRICE_PARAMS_LEN,
            got: record.params.len(),
        });
    }
    let payload: &[u8; PRICE_PAYLOAD_LEN] =
        record.payload[..]
            .try_into()
            .map_err(|_| PriceError::InvalidPayloadLength {
                expected: PRICE_PAYLOAD_LEN,
                got: record.payload.len(),
            })?;

    let mut price = [0u8; 8];
    price.copy_from_slice(&payload[..8]);
    let mut timestamp = [0u8; 8];
    timestamp.copy_from_slice(&payload[8..]);

    let market_code = record.params[PRICE_PARAMS_LEN - 1];
    Ok(PriceReport {
        request_id: record.request_id,
        market_code,
        market_id: market_id(market_code),
        price: ScaledPrice {
            cents: u64::from_be_bytes(price),
        },
        timestamp: u64::from_be_bytes(timestamp),
    })
}

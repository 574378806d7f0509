use pallas_codec::minicbor;
use std::collections::BTreeMap;
use thiserror::Error;

mod ledger_interop;
#[cfg(test)]
mod tests;

pub(crate) use ledger_interop::LedgerPlutusData;

/// Untyped representation of on-chain data. Datums and redeemers are converted to and from this
/// type before they touch the ledger.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum PlutusData {
    Constr(Constr<PlutusData>),
    Map(BTreeMap<PlutusData, PlutusData>),
    BigInt(BigInt),
    BoundedBytes(Vec<u8>),
    Array(Vec<PlutusData>),
}

/// Constructor application: index of the constructor and its fields
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Constr<T> {
    pub constr: u64,
    pub fields: Vec<T>,
}

/// Integer as it is stored on-chain. `Int` covers everything CBOR can represent natively, the
/// other variants carry big-endian bignum bytes.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub enum BigInt {
    Int { neg: bool, val: u64 },
    BigUInt(Vec<u8>),
    BigNInt(Vec<u8>),
}

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlutusDataError {
    #[error("Failed to encode PlutusData: {0}")]
    Encode(String),
    #[error("Failed to decode PlutusData: {0}")]
    Decode(String),
    #[error("Integer doesn't fit in the requested type")]
    IntOutOfRange,
    #[error("Expected {expected}, found {found:?}")]
    UnexpectedShape {
        expected: &'static str,
        found: PlutusData,
    },
}

impl PlutusData {
    /// Canonical CBOR bytes of this value
    pub fn to_cbor(&self) -> Result<Vec<u8>, PlutusDataError> {
        let ledger = LedgerPlutusData::try_from(self)?;
        minicbor::to_vec(&ledger).map_err(|e| PlutusDataError::Encode(e.to_string()))
    }

    /// Parse a value from its CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> Result<PlutusData, PlutusDataError> {
        let ledger: LedgerPlutusData =
            minicbor::decode(bytes).map_err(|e| PlutusDataError::Decode(e.to_string()))?;
        PlutusData::try_from(ledger)
    }

    /// Constructor with no fields, the shape of unit-like redeemers
    pub fn empty_constr(constr: u64) -> PlutusData {
        PlutusData::Constr(Constr {
            constr,
            fields: Vec::new(),
        })
    }

    /// Borrow the inner bytes if this is a `BoundedBytes`
    pub fn as_bytes(&self) -> Result<&[u8], PlutusDataError> {
        match self {
            PlutusData::BoundedBytes(bytes) => Ok(bytes),
            other => Err(PlutusDataError::UnexpectedShape {
                expected: "bytes",
                found: other.clone(),
            }),
        }
    }

    /// Borrow the inner integer if this is a `BigInt`
    pub fn as_big_int(&self) -> Result<&BigInt, PlutusDataError> {
        match self {
            PlutusData::BigInt(int) => Ok(int),
            other => Err(PlutusDataError::UnexpectedShape {
                expected: "integer",
                found: other.clone(),
            }),
        }
    }
}

impl From<i64> for BigInt {
    fn from(num: i64) -> Self {
        let neg = num.is_negative();
        let val = num.unsigned_abs();
        BigInt::Int { neg, val }
    }
}

impl From<u64> for BigInt {
    fn from(val: u64) -> Self {
        BigInt::Int { neg: false, val }
    }
}

impl TryFrom<&BigInt> for i128 {
    type Error = PlutusDataError;

    fn try_from(big_int: &BigInt) -> Result<Self, Self::Error> {
        match big_int {
            BigInt::Int { neg, val } => {
                let value = *val as i128;
                Ok(if *neg { -value } else { value })
            }
            BigInt::BigUInt(bytes) => {
                let magnitude = bytes_to_u128(bytes)?;
                i128::try_from(magnitude).map_err(|_| PlutusDataError::IntOutOfRange)
            }
            BigInt::BigNInt(bytes) => {
                let magnitude = bytes_to_u128(bytes)?;
                let magnitude =
                    i128::try_from(magnitude).map_err(|_| PlutusDataError::IntOutOfRange)?;
                Ok(-1 - magnitude)
            }
        }
    }
}

impl TryFrom<&BigInt> for i64 {
    type Error = PlutusDataError;

    fn try_from(big_int: &BigInt) -> Result<Self, Self::Error> {
        let wide = i128::try_from(big_int)?;
        i64::try_from(wide).map_err(|_| PlutusDataError::IntOutOfRange)
    }
}

impl TryFrom<&BigInt> for u64 {
    type Error = PlutusDataError;

    fn try_from(big_int: &BigInt) -> Result<Self, Self::Error> {
        let wide = i128::try_from(big_int)?;
        u64::try_from(wide).map_err(|_| PlutusDataError::IntOutOfRange)
    }
}

impl From<i64> for PlutusData {
    fn from(num: i64) -> Self {
        PlutusData::BigInt(num.into())
    }
}

impl From<u64> for PlutusData {
    fn from(num: u64) -> Self {
        PlutusData::BigInt(num.into())
    }
}

impl From<Vec<u8>> for PlutusData {
    fn from(bytes: Vec<u8>) -> Self {
        PlutusData::BoundedBytes(bytes)
    }
}

fn bytes_to_u128(bytes: &[u8]) -> Result<u128, PlutusDataError> {
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if significant.len() > 16 {
        return Err(PlutusDataError::IntOutOfRange);
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, byte| (acc << 8) | *byte as u128))
}

fn constr_tag(constr: u64) -> Option<u64> {
    match constr {
        0..=6 => Some(121 + constr),
        7..=127 => Some(1280 + constr - 7),
        _ => None,
    }
}

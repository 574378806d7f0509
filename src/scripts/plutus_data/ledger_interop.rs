use super::{constr_tag, BigInt, Constr, PlutusData, PlutusDataError};
use pallas_codec::{minicbor, utils::Int as LedgerInt};
use pallas_primitives::conway::{
    BigInt as LedgerBigInt, Constr as LedgerConstr, PlutusData as LedgerData,
};
use std::collections::BTreeMap;

pub(crate) type LedgerPlutusData = LedgerData;

const GENERAL_CONSTR_TAG: u64 = 102;

impl TryFrom<&PlutusData> for LedgerData {
    type Error = PlutusDataError;

    fn try_from(data: &PlutusData) -> Result<Self, Self::Error> {
        let ledger = match data {
            PlutusData::Constr(Constr { constr, fields }) => {
                let fields = fields
                    .iter()
                    .map(LedgerData::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                let (tag, any_constructor) = match constr_tag(*constr) {
                    Some(tag) => (tag, None),
                    None => (GENERAL_CONSTR_TAG, Some(*constr)),
                };
                LedgerData::Constr(LedgerConstr {
                    tag,
                    any_constructor,
                    fields,
                })
            }
            PlutusData::Map(map) => {
                let pairs = map
                    .iter()
                    .map(|(key, value)| Ok((key.try_into()?, value.try_into()?)))
                    .collect::<Result<Vec<(LedgerData, LedgerData)>, PlutusDataError>>()?;
                LedgerData::Map(pairs.into())
            }
            PlutusData::BigInt(int) => LedgerData::BigInt(int.try_into()?),
            PlutusData::BoundedBytes(bytes) => LedgerData::BoundedBytes(bytes.clone().into()),
            PlutusData::Array(items) => LedgerData::Array(
                items
                    .iter()
                    .map(LedgerData::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(ledger)
    }
}

impl TryFrom<&BigInt> for LedgerBigInt {
    type Error = PlutusDataError;

    fn try_from(int: &BigInt) -> Result<Self, Self::Error> {
        let ledger = match int {
            BigInt::Int { neg: false, val } => {
                LedgerBigInt::Int(LedgerInt(minicbor::data::Int::from(*val)))
            }
            BigInt::Int { neg: true, val } => {
                let int = LedgerInt::try_from(-(*val as i128))
                    .map_err(|_| PlutusDataError::IntOutOfRange)?;
                LedgerBigInt::Int(int)
            }
            BigInt::BigUInt(bytes) => LedgerBigInt::BigUInt(bytes.clone().into()),
            BigInt::BigNInt(bytes) => LedgerBigInt::BigNInt(bytes.clone().into()),
        };
        Ok(ledger)
    }
}

impl TryFrom<LedgerData> for PlutusData {
    type Error = PlutusDataError;

    fn try_from(ledger: LedgerData) -> Result<Self, Self::Error> {
        let data = match ledger {
            LedgerData::Constr(LedgerConstr {
                tag,
                any_constructor,
                fields,
            }) => {
                let constr = match (tag, any_constructor) {
                    (121..=127, _) => tag - 121,
                    (1280..=1400, _) => tag - 1280 + 7,
                    (GENERAL_CONSTR_TAG, Some(constr)) => constr,
                    _ => {
                        return Err(PlutusDataError::Decode(format!(
                            "unexpected constructor tag {tag}"
                        )))
                    }
                };
                let fields = fields
                    .into_iter()
                    .map(PlutusData::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                PlutusData::Constr(Constr { constr, fields })
            }
            LedgerData::Map(pairs) => {
                let map = pairs
                    .to_vec()
                    .into_iter()
                    .map(|(key, value)| Ok((key.try_into()?, value.try_into()?)))
                    .collect::<Result<BTreeMap<PlutusData, PlutusData>, PlutusDataError>>()?;
                PlutusData::Map(map)
            }
            LedgerData::BigInt(int) => PlutusData::BigInt(int.try_into()?),
            LedgerData::BoundedBytes(bytes) => PlutusData::BoundedBytes(bytes.into()),
            LedgerData::Array(items) => PlutusData::Array(
                items
                    .into_iter()
                    .map(PlutusData::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(data)
    }
}

impl TryFrom<LedgerBigInt> for BigInt {
    type Error = PlutusDataError;

    fn try_from(ledger: LedgerBigInt) -> Result<Self, Self::Error> {
        let int = match ledger {
            LedgerBigInt::Int(int) => {
                let value = i128::from(int);
                if value < 0 {
                    match u64::try_from(-value) {
                        Ok(val) => BigInt::Int { neg: true, val },
                        // -2^64 only: keep the CBOR argument as bignum bytes
                        Err(_) => BigInt::BigNInt(u64::MAX.to_be_bytes().to_vec()),
                    }
                } else {
                    let val = u64::try_from(value).map_err(|_| PlutusDataError::IntOutOfRange)?;
                    BigInt::Int { neg: false, val }
                }
            }
            LedgerBigInt::BigUInt(bytes) => BigInt::BigUInt(bytes.into()),
            LedgerBigInt::BigNInt(bytes) => BigInt::BigNInt(bytes.into()),
        };
        Ok(int)
    }
}

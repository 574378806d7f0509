use crate::{
    asteria::{AsteriaError, PILOT_TOKEN_PREFIX, SHIP_TOKEN_PREFIX},
    scripts::plutus_data::{BigInt, Constr, PlutusData, PlutusDataError},
    PolicyId,
};

const POLICY_ID_LEN: usize = 28;

/// State of the shared Asteria UTxO
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsteriaDatum {
    /// Number of ships created so far. Seeds the next ship's token names.
    pub ship_counter: u64,
    /// Policy id of the shipyard minting policy
    pub shipyard_policy: Vec<u8>,
}

impl AsteriaDatum {
    /// State after one more ship was created
    pub fn next_ship(&self) -> Result<AsteriaDatum, AsteriaError> {
        let ship_counter = self
            .ship_counter
            .checked_add(1)
            .ok_or(AsteriaError::CounterOverflow)?;
        Ok(AsteriaDatum {
            ship_counter,
            shipyard_policy: self.shipyard_policy.clone(),
        })
    }
}

/// State of a single ship, held at the Spacetime address
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShipDatum {
    pub fuel: u64,
    pub pos_x: i64,
    pub pos_y: i64,
    pub ship_token_name: Vec<u8>,
    pub pilot_token_name: Vec<u8>,
}

/// Every datum the Asteria contracts read or write
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsteriaDatums {
    Asteria(AsteriaDatum),
    Ship(ShipDatum),
}

impl From<AsteriaDatum> for AsteriaDatums {
    fn from(value: AsteriaDatum) -> Self {
        AsteriaDatums::Asteria(value)
    }
}

impl From<ShipDatum> for AsteriaDatums {
    fn from(value: ShipDatum) -> Self {
        AsteriaDatums::Ship(value)
    }
}

impl From<AsteriaDatums> for PlutusData {
    fn from(value: AsteriaDatums) -> Self {
        let fields = match value {
            AsteriaDatums::Asteria(AsteriaDatum {
                ship_counter,
                shipyard_policy,
            }) => vec![
                PlutusData::from(ship_counter),
                PlutusData::BoundedBytes(shipyard_policy),
            ],
            AsteriaDatums::Ship(ShipDatum {
                fuel,
                pos_x,
                pos_y,
                ship_token_name,
                pilot_token_name,
            }) => vec![
                PlutusData::from(fuel),
                PlutusData::from(pos_x),
                PlutusData::from(pos_y),
                PlutusData::BoundedBytes(ship_token_name),
                PlutusData::BoundedBytes(pilot_token_name),
            ],
        };
        PlutusData::Constr(Constr { constr: 0, fields })
    }
}

impl TryFrom<PlutusData> for AsteriaDatums {
    type Error = PlutusDataError;

    fn try_from(data: PlutusData) -> Result<Self, Self::Error> {
        let fields = match &data {
            PlutusData::Constr(Constr { constr: 0, fields }) => fields,
            _ => return Err(unexpected(data)),
        };
        match fields.as_slice() {
            [ship_counter, shipyard_policy] => {
                let ship_counter = u64::try_from(ship_counter.as_big_int()?)?;
                let shipyard_policy = shipyard_policy.as_bytes()?.to_vec();
                Ok(AsteriaDatums::Asteria(AsteriaDatum {
                    ship_counter,
                    shipyard_policy,
                }))
            }
            [fuel, pos_x, pos_y, ship_token_name, pilot_token_name] => {
                Ok(AsteriaDatums::Ship(ShipDatum {
                    fuel: u64::try_from(fuel.as_big_int()?)?,
                    pos_x: i64::try_from(pos_x.as_big_int()?)?,
                    pos_y: i64::try_from(pos_y.as_big_int()?)?,
                    ship_token_name: ship_token_name.as_bytes()?.to_vec(),
                    pilot_token_name: pilot_token_name.as_bytes()?.to_vec(),
                }))
            }
            _ => Err(unexpected(data)),
        }
    }
}

fn unexpected(found: PlutusData) -> PlutusDataError {
    PlutusDataError::UnexpectedShape {
        expected: "Asteria or Ship datum",
        found,
    }
}

/// Redeemers of the Asteria validator and the shipyard policy
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsteriaRedeemers {
    /// Spend the Asteria UTxO to register a new ship
    AddNewShip,
    /// Mint a ship and its pilot token
    MintShip,
}

impl From<AsteriaRedeemers> for PlutusData {
    fn from(value: AsteriaRedeemers) -> Self {
        match value {
            AsteriaRedeemers::AddNewShip | AsteriaRedeemers::MintShip => {
                PlutusData::empty_constr(0)
            }
        }
    }
}

/// A token type: minting policy plus asset name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetClass {
    policy: String,
    name: Vec<u8>,
}

impl AssetClass {
    /// Token `name` under the hex encoded `policy`
    pub fn new(policy: &str, name: &[u8]) -> Result<Self, AsteriaError> {
        match hex::decode(policy) {
            Ok(bytes) if bytes.len() == POLICY_ID_LEN => Ok(AssetClass {
                policy: policy.to_lowercase(),
                name: name.to_vec(),
            }),
            _ => Err(AsteriaError::InvalidPolicyId(policy.to_string())),
        }
    }

    /// Hex encoded policy id
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// Raw asset name
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Key of this token in [`crate::values::Values`]
    pub fn policy_id(&self) -> PolicyId {
        PolicyId::native_token_named(&self.policy, &self.name)
    }
}

/// `SHIP{counter}`
pub fn ship_token_name(counter: u64) -> Vec<u8> {
    format!("{SHIP_TOKEN_PREFIX}{counter}").into_bytes()
}

/// `PILOT{counter}`
pub fn pilot_token_name(counter: u64) -> Vec<u8> {
    format!("{PILOT_TOKEN_PREFIX}{counter}").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asteria(counter: u64) -> AsteriaDatum {
        AsteriaDatum {
            ship_counter: counter,
            shipyard_policy: vec![0xab; POLICY_ID_LEN],
        }
    }

    #[test]
    fn next_ship_increments_counter_only() {
        let next = asteria(5).next_ship().unwrap();

        assert_eq!(next, asteria(6));
    }

    #[test]
    fn next_ship_refuses_to_wrap() {
        let err = asteria(u64::MAX).next_ship().unwrap_err();

        assert!(matches!(err, AsteriaError::CounterOverflow));
    }

    #[test]
    fn asteria_datum_cbor() {
        let data = PlutusData::from(AsteriaDatums::from(AsteriaDatum {
            ship_counter: 6,
            shipyard_policy: vec![0x01, 0x02],
        }));

        assert_eq!(hex::encode(data.to_cbor().unwrap()), "d8799f06420102ff");
    }

    #[test]
    fn ship_datum_survives_cbor() {
        let ship = ShipDatum {
            fuel: 40,
            pos_x: -20,
            pos_y: 13,
            ship_token_name: ship_token_name(5),
            pilot_token_name: pilot_token_name(5),
        };
        let bytes = PlutusData::from(AsteriaDatums::from(ship.clone()))
            .to_cbor()
            .unwrap();

        let decoded = AsteriaDatums::try_from(PlutusData::from_cbor(&bytes).unwrap()).unwrap();

        assert_eq!(decoded, AsteriaDatums::Ship(ship));
    }

    #[test]
    fn unknown_shape_is_rejected() {
        let data = PlutusData::Constr(Constr {
            constr: 0,
            fields: vec![PlutusData::from(1u64)],
        });

        let err = AsteriaDatums::try_from(data).unwrap_err();

        assert!(matches!(err, PlutusDataError::UnexpectedShape { .. }));
    }

    #[test]
    fn negative_counter_is_rejected() {
        let data = PlutusData::Constr(Constr {
            constr: 0,
            fields: vec![
                PlutusData::BigInt(BigInt::from(-1i64)),
                PlutusData::BoundedBytes(vec![]),
            ],
        });

        let err = AsteriaDatums::try_from(data).unwrap_err();

        assert_eq!(err, PlutusDataError::IntOutOfRange);
    }

    #[test]
    fn redeemers_are_unit_constructors() {
        assert_eq!(
            PlutusData::from(AsteriaRedeemers::AddNewShip).to_cbor().unwrap(),
            vec![0xd8, 0x79, 0x80]
        );
        assert_eq!(
            PlutusData::from(AsteriaRedeemers::MintShip),
            PlutusData::empty_constr(0)
        );
    }

    #[test]
    fn token_names_are_prefixed_counters() {
        assert_eq!(ship_token_name(5), b"SHIP5".to_vec());
        assert_eq!(pilot_token_name(12), b"PILOT12".to_vec());
    }

    #[test]
    fn asset_class_needs_28_byte_policy() {
        assert!(AssetClass::new("abcd", b"admin").is_err());
        let admin = AssetClass::new(&"AB".repeat(28), b"admin").unwrap();
        assert_eq!(admin.policy(), "ab".repeat(28));
        assert_eq!(
            admin.policy_id(),
            PolicyId::native_token_named(&"ab".repeat(28), b"admin")
        );
    }
}

use crate::{
    scripts::{plutus_data::PlutusData, PlutusScript},
    values::Values,
};
use pallas_addresses::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Representation of an UTxO that does not exist yet. This can be used inside the
/// [`crate::logic::SCLogic`] to represent outputs that will be created when the transaction is
/// submitted.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum UnbuiltOutput<Datum> {
    /// An output owned by a wallet
    Wallet {
        /// Address of the wallet
        owner: Address,
        /// Values of the output
        values: Values,
    },
    /// An output owned by a validator script, carrying an inline datum
    Validator {
        /// Address of the validator script
        script_address: Address,
        /// Values of the output
        values: Values,
        /// Datum of the output
        datum: Datum,
    },
}

impl<Datum> UnbuiltOutput<Datum> {
    /// Constructor for wallet output
    pub fn new_wallet(owner: Address, values: Values) -> Self {
        UnbuiltOutput::Wallet { owner, values }
    }

    /// Constructor for validator output
    pub fn new_validator(script_address: Address, values: Values, datum: Datum) -> Self {
        UnbuiltOutput::Validator {
            script_address,
            values,
            datum,
        }
    }

    /// Getter for owner of output
    pub fn owner(&self) -> &Address {
        match self {
            UnbuiltOutput::Wallet { owner, .. } => owner,
            UnbuiltOutput::Validator { script_address, .. } => script_address,
        }
    }

    /// Getter for values of output
    pub fn values(&self) -> &Values {
        match self {
            UnbuiltOutput::Wallet { values, .. } => values,
            UnbuiltOutput::Validator { values, .. } => values,
        }
    }

    /// Getter for (optional) datum of output
    pub fn datum(&self) -> Option<&Datum> {
        match self {
            UnbuiltOutput::Wallet { .. } => None,
            UnbuiltOutput::Validator { datum, .. } => Some(datum),
        }
    }
}

/// Representation of an on-chain datum
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum DatumKind<Datum> {
    /// A datum that decoded into the contract's datum type
    Typed(Datum),
    /// A datum that didn't
    UnTyped(PlutusData),
    /// No datum
    None,
}

impl<Datum> From<DatumKind<Datum>> for Option<Datum> {
    fn from(value: DatumKind<Datum>) -> Self {
        match value {
            DatumKind::Typed(datum) => Some(datum),
            _ => None,
        }
    }
}

/// Unique identifier for specific UTxO
#[derive(Clone, PartialEq, Debug, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct OutputId {
    tx_hash: Vec<u8>,
    index: u64,
}

impl OutputId {
    /// Constructor for OutputId
    pub fn new(tx_hash: Vec<u8>, index: u64) -> Self {
        OutputId { tx_hash, index }
    }

    /// Getter for id's tx_hash
    pub fn tx_hash(&self) -> &[u8] {
        &self.tx_hash
    }

    /// Getter for id's index
    pub fn index(&self) -> u64 {
        self.index
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", hex::encode(&self.tx_hash), self.index)
    }
}

/// Domain specific representation of an on-chain UTxO
#[derive(Clone, PartialEq, Debug, Eq)]
pub struct Output<Datum> {
    id: OutputId,
    owner: Address,
    values: Values,
    datum: DatumKind<Datum>,
    script_ref: Option<PlutusScript>,
}

impl<Datum> Output<Datum> {
    /// Constructor for wallet output
    pub fn new_wallet(tx_hash: Vec<u8>, index: u64, owner: Address, values: Values) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::None,
            script_ref: None,
        }
    }

    /// Constructor for validator output
    pub fn new_validator(
        tx_hash: Vec<u8>,
        index: u64,
        owner: Address,
        values: Values,
        datum: Datum,
    ) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::Typed(datum),
            script_ref: None,
        }
    }

    /// Constructor for validator output with untyped datum
    pub fn new_untyped_validator(
        tx_hash: Vec<u8>,
        index: u64,
        owner: Address,
        values: Values,
        datum: PlutusData,
    ) -> Self {
        Output {
            id: OutputId::new(tx_hash, index),
            owner,
            values,
            datum: DatumKind::UnTyped(datum),
            script_ref: None,
        }
    }

    /// Attach a reference script to the output
    pub fn with_script_ref(mut self, script: PlutusScript) -> Self {
        self.script_ref = Some(script);
        self
    }

    /// Getter for Output's id
    pub fn id(&self) -> &OutputId {
        &self.id
    }

    /// Getter for Output's owner address
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Getter for Output's values
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Getter for Output's datum
    pub fn datum(&self) -> &DatumKind<Datum> {
        &self.datum
    }

    /// Getter for the script published in this output, if any
    pub fn script_ref(&self) -> Option<&PlutusScript> {
        self.script_ref.as_ref()
    }
}

impl<Datum: Clone> Output<Datum> {
    /// Getter for Output's datum, if it is typed. Returns `None` if datum is untyped or non-existent
    pub fn typed_datum(&self) -> Option<Datum> {
        match &self.datum {
            DatumKind::Typed(datum) => Some(datum.to_owned()),
            _ => None,
        }
    }
}

impl<Datum: Clone + Into<PlutusData>> Output<Datum> {
    /// Getter for `Output`'s datum as `PlutusData`. Returns `None` if datum is non-existent
    pub fn datum_plutus_data(&self) -> Option<PlutusData> {
        match &self.datum {
            DatumKind::Typed(datum) => Some(datum.to_owned().into()),
            DatumKind::UnTyped(data) => Some(data.to_owned()),
            DatumKind::None => None,
        }
    }
}

impl<Datum: TryFrom<PlutusData>> Output<Datum> {
    /// Converts an untyped datum to `Datum` where it decodes. Typed and absent datums are kept.
    pub fn with_typed_datum_if_possible(self) -> Output<Datum> {
        let datum = match self.datum {
            DatumKind::UnTyped(data) => match Datum::try_from(data.clone()) {
                Ok(datum) => DatumKind::Typed(datum),
                Err(_) => DatumKind::UnTyped(data),
            },
            other => other,
        };
        Output { datum, ..self }
    }
}

use crate::{
    error::Result,
    output::{Output, UnbuiltOutput},
    scripts::PlutusScript,
    values::Values,
    PolicyId,
};
use pallas_addresses::Address;
use std::fmt;

/// Spending of a script-locked output
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptInput<Datum, Redeemer> {
    pub output: Output<Datum>,
    pub redeemer: Redeemer,
    pub script: PlutusScript,
}

/// Minting of one asset under a Plutus policy
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintAction<Redeemer> {
    pub amount: u64,
    pub asset_name: Vec<u8>,
    pub redeemer: Redeemer,
    pub policy: PlutusScript,
}

impl<Redeemer> MintAction<Redeemer> {
    /// Token minted by this action
    pub fn policy_id(&self) -> PolicyId {
        PolicyId::native_token_named(&self.policy.policy_id(), &self.asset_name)
    }
}

/// Everything a [`crate::logic::SCLogic`] asks a ledger client to do in one transaction. Wallet
/// inputs, collateral, fees and change are left to the ledger client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxActions<Datum, Redeemer> {
    /// Outputs read but not spent. Scripts they carry are used instead of witnesses.
    pub reference_inputs: Vec<Output<Datum>>,
    /// Script-locked outputs to spend
    pub script_inputs: Vec<ScriptInput<Datum, Redeemer>>,
    /// Tokens to mint
    pub minting: Vec<MintAction<Redeemer>>,
    /// Outputs to create, in order
    pub outputs: Vec<UnbuiltOutput<Datum>>,
}

impl<Datum, Redeemer> Default for TxActions<Datum, Redeemer> {
    fn default() -> Self {
        TxActions {
            reference_inputs: Vec::new(),
            script_inputs: Vec::new(),
            minting: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl<Datum, Redeemer> TxActions<Datum, Redeemer> {
    /// Read `output` without spending it
    pub fn with_reference_input(mut self, output: Output<Datum>) -> Self {
        self.reference_inputs.push(output);
        self
    }

    /// Mint `amount` of `asset_name` under `policy`
    pub fn with_mint(
        mut self,
        amount: u64,
        asset_name: Vec<u8>,
        redeemer: Redeemer,
        policy: PlutusScript,
    ) -> Self {
        let action = MintAction {
            amount,
            asset_name,
            redeemer,
            policy,
        };
        self.minting.push(action);
        self
    }

    /// Lock `values` at `address` with an inline `datum`
    pub fn with_script_init(mut self, datum: Datum, values: Values, address: Address) -> Self {
        let output = UnbuiltOutput::new_validator(address, values, datum);
        self.outputs.push(output);
        self
    }

    /// Pay `values` to a wallet address
    pub fn with_wallet_output(mut self, values: Values, owner: Address) -> Self {
        let output = UnbuiltOutput::new_wallet(owner, values);
        self.outputs.push(output);
        self
    }

    /// Spend script-locked `output` with `redeemer`
    pub fn with_script_redeem(
        mut self,
        output: Output<Datum>,
        redeemer: Redeemer,
        script: PlutusScript,
    ) -> Self {
        let input = ScriptInput {
            output,
            redeemer,
            script,
        };
        self.script_inputs.push(input);
        self
    }

    /// Sum of everything minted
    pub fn minted_values(&self) -> Result<Values> {
        let mut minted = Values::default();
        for mint in &self.minting {
            minted.add_one_value(&mint.policy_id(), mint.amount)?;
        }
        Ok(minted)
    }

    /// True if `script` is carried by one of the reference inputs
    pub fn is_referenced(&self, script: &PlutusScript) -> bool {
        self.reference_inputs
            .iter()
            .any(|output| output.script_ref() == Some(script))
    }
}

/// Hex encoded id of a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxId(String);

impl TxId {
    /// Constructor for TxId
    pub fn new(id_str: &str) -> Self {
        TxId(id_str.to_string())
    }

    /// Getter for the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

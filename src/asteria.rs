use crate::{
    ledger_client::{LedgerClient, LedgerClientError},
    logic::{SCLogic, SCLogicError, SCLogicResult},
    output::OutputId,
    scripts::ScriptError,
    transaction::TxActions,
};
use async_trait::async_trait;
use pallas_addresses::Address;
use thiserror::Error;

pub use datum::*;

/// Building the create-ship transaction
pub mod create_ship;
/// Datums, redeemers and token names
pub mod datum;
/// Fuel arithmetic
pub mod fuel;
/// Read-only queries
pub mod lookups;
/// Reference script resolution
pub mod reference;


/// Lovelace locked with every new ship
pub const SHIP_MIN_LOVELACE: u64 = 2_000_000;
/// Prefix of ship token names
pub const SHIP_TOKEN_PREFIX: &str = "SHIP";
/// Prefix of pilot token names
pub const PILOT_TOKEN_PREFIX: &str = "PILOT";

/// Off-chain logic of the Asteria game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsteriaLogic;

/// Parameters of the create-ship endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateShip {
    /// Transaction whose output 0 carries the Asteria validator
    pub asteria_ref_tx_hash: String,
    /// Transaction whose output 0 carries the Spacetime validator, also the shipyard policy
    pub spacetime_ref_tx_hash: String,
    /// Token identifying the Asteria UTxO
    pub admin_token: AssetClass,
    /// Lovelace paid into the Asteria UTxO for every ship
    pub ship_mint_lovelace_fee: u64,
    /// Fuel the ship starts with
    pub initial_fuel: u64,
    #[allow(missing_docs)]
    pub pos_x: i64,
    #[allow(missing_docs)]
    pub pos_y: i64,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsteriaEndpoints {
    CreateShip(CreateShip),
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsteriaLookups {
    /// `admin_token` picks the Asteria UTxO when several outputs share its address
    AsteriaState {
        asteria_ref_tx_hash: String,
        admin_token: Option<AssetClass>,
    },
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsteriaLookupResponses {
    AsteriaState(AsteriaState),
}

/// Current state of the Asteria UTxO
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsteriaState {
    pub output_id: OutputId,
    pub address: Address,
    pub datum: AsteriaDatum,
    pub lovelace: u64,
}

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum AsteriaError {
    #[error("Could not read validator from ref UTxO {0}")]
    MissingValidator(String),
    #[error("No Asteria UTxO at {0}")]
    AsteriaNotFound(String),
    #[error("Asteria datum not found on {0}")]
    MissingAsteriaDatum(OutputId),
    #[error("Invalid transaction hash {0:?}")]
    InvalidTxHash(String),
    #[error("Invalid policy id {0:?}")]
    InvalidPolicyId(String),
    #[error("Ship counter overflowed")]
    CounterOverflow,
    #[error("Asteria lovelace balance overflowed")]
    FeeOverflow,
    #[error(transparent)]
    LedgerClient(#[from] LedgerClientError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl AsteriaError {
    fn into_sc_logic_error(self, wrap: fn(AsteriaError) -> SCLogicError) -> SCLogicError {
        match self {
            AsteriaError::LedgerClient(inner) => SCLogicError::LedgerClient(inner),
            AsteriaError::Script(inner) => SCLogicError::Script(inner),
            other => wrap(other),
        }
    }

    /// Endpoint failure. Ledger and script errors pass through unchanged.
    pub fn endpoint(self) -> SCLogicError {
        self.into_sc_logic_error(|e| SCLogicError::Endpoint(Box::new(e)))
    }

    /// Lookup failure. Ledger and script errors pass through unchanged.
    pub fn lookup(self) -> SCLogicError {
        self.into_sc_logic_error(|e| SCLogicError::Lookup(Box::new(e)))
    }
}

/// Bech32 when possible, hex otherwise
pub fn display_address(address: &Address) -> String {
    address.to_bech32().unwrap_or_else(|_| address.to_hex())
}

#[async_trait]
impl SCLogic for AsteriaLogic {
    type Endpoints = AsteriaEndpoints;
    type Lookups = AsteriaLookups;
    type LookupResponses = AsteriaLookupResponses;
    type Datums = AsteriaDatums;
    type Redeemers = AsteriaRedeemers;

    async fn handle_endpoint<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        endpoint: Self::Endpoints,
        ledger_client: &LC,
    ) -> SCLogicResult<TxActions<Self::Datums, Self::Redeemers>> {
        match endpoint {
            AsteriaEndpoints::CreateShip(params) => {
                create_ship::create_ship(ledger_client, params)
                    .await
                    .map_err(AsteriaError::endpoint)
            }
        }
    }

    async fn lookup<LC: LedgerClient<Self::Datums, Self::Redeemers>>(
        query: Self::Lookups,
        ledger_client: &LC,
    ) -> SCLogicResult<Self::LookupResponses> {
        match query {
            AsteriaLookups::AsteriaState {
                asteria_ref_tx_hash,
                admin_token,
            } => lookups::asteria_state(ledger_client, &asteria_ref_tx_hash, admin_token.as_ref())
                .await
                .map(AsteriaLookupResponses::AsteriaState)
                .map_err(AsteriaError::lookup),
        }
    }
}

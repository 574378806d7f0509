#![warn(missing_docs)]

//! Off-chain transaction building for the Asteria game on Cardano

pub use crate::{
    policy_id::PolicyId,
    transaction::{TxActions, TxId},
};

pub use pallas_addresses::{Address, Network};

/// Asteria game logic module
pub mod asteria;
/// Backend configuration module
pub mod config;
pub mod error;
/// Ledger client module
pub mod ledger_client;
/// Smart contract logic module
pub mod logic;
pub mod output;
/// `PolicyId` type module
pub mod policy_id;
pub mod scripts;
pub mod smart_contract;
pub mod transaction;
pub mod values;

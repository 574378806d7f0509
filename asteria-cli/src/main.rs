use anyhow::{anyhow, Result};
use asteria::{
    asteria::{
        display_address,
        fuel::{distance, required_fuel},
        AssetClass, AsteriaDatums, AsteriaEndpoints, AsteriaLogic, AsteriaLookupResponses,
        AsteriaLookups, AsteriaRedeemers, CreateShip,
    },
    config::NodeConfig,
    ledger_client::{blockfrost_client::BlockfrostLedgerClient, keys::EnvSeedKeys},
    smart_contract::{SmartContract, SmartContractTrait},
};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Node config file. Defaults to the environment, then ~/.asteria/config.toml
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    action: ActionParams,
}

#[derive(clap::Subcommand, Debug)]
enum ActionParams {
    /// Mint a new ship and its pilot token 🚀
    CreateShip {
        /// Transaction publishing the Asteria validator at output 0
        #[clap(long)]
        asteria_ref: String,
        /// Transaction publishing the Spacetime validator at output 0
        #[clap(long)]
        spacetime_ref: String,
        /// Policy id of the admin token, hex
        #[clap(long)]
        admin_policy: String,
        /// Name of the admin token
        #[clap(long)]
        admin_name: String,
        /// Lovelace paid into the Asteria UTxO
        #[clap(long)]
        fee: u64,
        /// Fuel the ship starts with
        #[clap(long)]
        fuel: u64,
        #[clap(long, allow_hyphen_values = true)]
        pos_x: i64,
        #[clap(long, allow_hyphen_values = true)]
        pos_y: i64,
    },
    /// Show the ship counter and balance of the Asteria UTxO
    AsteriaState {
        #[clap(long)]
        asteria_ref: String,
        /// Policy id of the admin token, hex. Picks the Asteria UTxO among several.
        #[clap(long, requires = "admin_name")]
        admin_policy: Option<String>,
        #[clap(long, requires = "admin_policy")]
        admin_name: Option<String>,
    },
    /// Fuel needed to move a ship, computed locally
    RequiredFuel {
        #[clap(long, allow_hyphen_values = true)]
        dx: i64,
        #[clap(long, allow_hyphen_values = true)]
        dy: i64,
        #[clap(long)]
        fuel_per_step: u64,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<NodeConfig> {
    let config = match path {
        Some(path) => NodeConfig::from_file(&path)?,
        None => NodeConfig::load()?,
    };
    Ok(config)
}

fn contract(
    config_path: Option<PathBuf>,
) -> Result<
    SmartContract<
        AsteriaLogic,
        BlockfrostLedgerClient<EnvSeedKeys, AsteriaDatums, AsteriaRedeemers>,
    >,
> {
    let config = load_config(config_path)?;
    let ledger_client = config.to_ledger_client(EnvSeedKeys::default());
    Ok(SmartContract::new(AsteriaLogic, ledger_client))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.action {
        ActionParams::CreateShip {
            asteria_ref,
            spacetime_ref,
            admin_policy,
            admin_name,
            fee,
            fuel,
            pos_x,
            pos_y,
        } => {
            let contract = contract(args.config)?;
            let params = CreateShip {
                asteria_ref_tx_hash: asteria_ref,
                spacetime_ref_tx_hash: spacetime_ref,
                admin_token: AssetClass::new(&admin_policy, admin_name.as_bytes())?,
                ship_mint_lovelace_fee: fee,
                initial_fuel: fuel,
                pos_x,
                pos_y,
            };
            let tx_id = contract
                .hit_endpoint(AsteriaEndpoints::CreateShip(params))
                .await?;
            println!("Submitted {}", tx_id.as_str());
        }
        ActionParams::AsteriaState {
            asteria_ref,
            admin_policy,
            admin_name,
        } => {
            let admin_token = match (admin_policy, admin_name) {
                (Some(policy), Some(name)) => Some(AssetClass::new(&policy, name.as_bytes())?),
                _ => None,
            };
            let contract = contract(args.config)?;
            let AsteriaLookupResponses::AsteriaState(state) = contract
                .lookup(AsteriaLookups::AsteriaState {
                    asteria_ref_tx_hash: asteria_ref,
                    admin_token,
                })
                .await?;
            println!("Asteria UTxO: {}", state.output_id);
            println!("Address:      {}", display_address(&state.address));
            println!("Ship counter: {}", state.datum.ship_counter);
            println!("Lovelace:     {}", state.lovelace);
        }
        ActionParams::RequiredFuel {
            dx,
            dy,
            fuel_per_step,
        } => {
            let fuel = required_fuel(distance(dx, dy), fuel_per_step as u128)
                .ok_or_else(|| anyhow!("Fuel requirement overflows"))?;
            println!("{fuel}");
        }
    }
    Ok(())
}

use crate::ledger_client::blockfrost_client::schemas::{
    Cbor, EvaluateTxResult, ProtocolParams, ScriptInfo, TxUtxos, UTxO,
};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Largest page Blockfrost serves
pub const MAX_PAGE_SIZE: usize = 100;

pub type Result<T, E = BlockfrostError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BlockfrostError {
    #[error("reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("url Error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Blockfrost answered {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Unexpected response shape: {0}")]
    Schema(String),
    #[error("EvaluateTxResult malformed: {0}")]
    EvaluateTxResult(String),
}

/// The Blockfrost endpoints the ledger client needs. `None` and empty results stand for 404s.
#[async_trait]
pub trait BlockfrostHttpTrait: Send + Sync {
    async fn utxos(&self, address: &str, count: usize, page: usize) -> Result<Vec<UTxO>>;

    async fn tx_utxos(&self, tx_hash: &str) -> Result<Option<TxUtxos>>;

    async fn script_info(&self, script_hash: &str) -> Result<ScriptInfo>;

    async fn script_cbor(&self, script_hash: &str) -> Result<Cbor>;

    async fn datum_cbor(&self, datum_hash: &str) -> Result<Cbor>;

    async fn protocol_params(&self) -> Result<ProtocolParams>;

    async fn execution_units(&self, bytes: &[u8]) -> Result<EvaluateTxResult>;

    async fn submit_tx(&self, bytes: &[u8]) -> Result<String>;
}

pub struct BlockfrostHttp {
    parent_url: String,
    api_key: SecretString, // A.K.A. `project_id`
    client: reqwest::Client,
}

#[async_trait]
impl BlockfrostHttpTrait for BlockfrostHttp {
    async fn utxos(&self, address: &str, count: usize, page: usize) -> Result<Vec<UTxO>> {
        let ext = format!("./addresses/{address}/utxos");
        let count = count.min(MAX_PAGE_SIZE).to_string();
        let page = page.to_string();
        let params = [("count", count.as_str()), ("page", page.as_str())];
        let utxos = self.get_endpoint_with_params(&ext, &params).await?;
        Ok(utxos.unwrap_or_default())
    }

    async fn tx_utxos(&self, tx_hash: &str) -> Result<Option<TxUtxos>> {
        let ext = format!("./txs/{tx_hash}/utxos");
        self.get_endpoint(&ext).await
    }

    async fn script_info(&self, script_hash: &str) -> Result<ScriptInfo> {
        let ext = format!("./scripts/{script_hash}");
        self.get_required(&ext).await
    }

    async fn script_cbor(&self, script_hash: &str) -> Result<Cbor> {
        let ext = format!("./scripts/{script_hash}/cbor");
        self.get_required(&ext).await
    }

    async fn datum_cbor(&self, datum_hash: &str) -> Result<Cbor> {
        let ext = format!("./scripts/datum/{datum_hash}/cbor");
        self.get_required(&ext).await
    }

    async fn protocol_params(&self) -> Result<ProtocolParams> {
        self.get_required("./epochs/latest/parameters").await
    }

    async fn execution_units(&self, bytes: &[u8]) -> Result<EvaluateTxResult> {
        let url = Url::parse(&self.parent_url)?.join("./utils/txs/evaluate")?;
        let encoded = hex::encode(bytes);
        let res = self
            .client
            .post(url)
            .header("Content-Type", "application/cbor")
            .header("project_id", self.api_key.expose_secret())
            .body(encoded)
            .send()
            .await?;
        Ok(check_status(res).await?.json().await?)
    }

    async fn submit_tx(&self, bytes: &[u8]) -> Result<String> {
        let url = Url::parse(&self.parent_url)?.join("./tx/submit")?;
        let res = self
            .client
            .post(url)
            .header("Content-Type", "application/cbor")
            .header("project_id", self.api_key.expose_secret())
            // Binary here, unlike evaluate
            .body(bytes.to_owned())
            .send()
            .await?;
        Ok(check_status(res).await?.json().await?)
    }
}

impl BlockfrostHttp {
    pub fn new(url: &str, key: SecretString) -> Self {
        let mut parent_url = url.to_string();
        if !parent_url.ends_with('/') {
            parent_url.push('/');
        }
        BlockfrostHttp {
            parent_url,
            api_key: key,
            client: reqwest::Client::new(),
        }
    }

    async fn get_required<T: DeserializeOwned>(&self, ext: &str) -> Result<T> {
        self.get_endpoint(ext).await?.ok_or(BlockfrostError::Http {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: ext.trim_start_matches("./").to_string(),
        })
    }

    async fn get_endpoint<T: DeserializeOwned>(&self, ext: &str) -> Result<Option<T>> {
        self.get_endpoint_with_params(ext, &[]).await
    }

    async fn get_endpoint_with_params<T: DeserializeOwned>(
        &self,
        ext: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let mut url = Url::parse(&self.parent_url)?.join(ext)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        tracing::debug!(%url, "GET");
        let res = self
            .client
            .get(url)
            .header("project_id", self.api_key.expose_secret())
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let res = check_status(res).await?.json().await?;
        Ok(Some(res))
    }
}

async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let message = res.text().await.unwrap_or_default();
        Err(BlockfrostError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

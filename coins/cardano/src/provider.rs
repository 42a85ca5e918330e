//! Chain data access: UTXO lookup and transaction submission.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::address::CardanoAddress;
use crate::config::ToolboxConfig;
use crate::error::{CardanoError, Result};
use crate::transaction::{Transaction, TransactionInput, TransactionOutput, Utxo};
use crate::value::{AssetName, PolicyId, Value};

/// Read and submit access to a Cardano node or indexer
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Unspent outputs currently held by `address`
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>>;

    /// Submits a signed transaction, returning its id if the backend accepted it
    async fn submit_transaction(&self, tx: &Transaction) -> Result<Option<String>>;
}

#[async_trait]
impl<P: ChainDataProvider + ?Sized> ChainDataProvider for Arc<P> {
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        (**self).fetch_utxos(address).await
    }

    async fn submit_transaction(&self, tx: &Transaction) -> Result<Option<String>> {
        (**self).submit_transaction(tx).await
    }
}

// ============================================================================
// Koios REST API
// ============================================================================

/// Row cap Koios applies to a single response
pub const KOIOS_PAGE_SIZE: usize = 1000;

#[derive(Debug, Serialize)]
struct AddressUtxosRequest<'a> {
    #[serde(rename = "_addresses")]
    addresses: [&'a str; 1],
    #[serde(rename = "_extended")]
    extended: bool,
}

#[derive(Debug, Deserialize)]
struct KoiosUtxo {
    tx_hash: String,
    tx_index: u32,
    address: String,
    value: String,
    #[serde(default)]
    asset_list: Option<Vec<KoiosAsset>>,
}

#[derive(Debug, Deserialize)]
struct KoiosAsset {
    policy_id: String,
    #[serde(default)]
    asset_name: Option<String>,
    quantity: String,
}

impl KoiosUtxo {
    fn into_utxo(self) -> Result<Utxo> {
        let input = TransactionInput::from_hex(&self.tx_hash, self.tx_index)?;
        let address = CardanoAddress::from_bech32(&self.address)
            .map_err(|e| CardanoError::Provider(format!("utxo {input}: {e}")))?;

        let mut amount = Value::new(parse_quantity(&self.value)?);
        for asset in self.asset_list.unwrap_or_default() {
            let policy: PolicyId = asset.policy_id.parse()?;
            let name = AssetName::from_hex(asset.asset_name.as_deref().unwrap_or_default())?;
            amount = amount.with_asset(policy, name, parse_quantity(&asset.quantity)?)?;
        }

        Ok(Utxo {
            input,
            output: TransactionOutput::new(address, amount),
        })
    }
}

fn parse_quantity(s: &str) -> Result<u64> {
    s.parse()
        .map_err(|e| CardanoError::Provider(format!("bad quantity '{s}': {e}")))
}

/// Koios client
#[derive(Debug, Clone)]
pub struct KoiosProvider {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl KoiosProvider {
    pub fn new(config: &ToolboxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CardanoError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.rpc_url.trim_end_matches('/').to_string(),
            page_size: KOIOS_PAGE_SIZE,
        })
    }

    /// Rows requested per `address_utxos` page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ChainDataProvider for KoiosProvider {
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>> {
        let request = AddressUtxosRequest { addresses: [address], extended: true };
        let mut utxos = Vec::new();
        let mut offset = 0usize;

        // pages until Koios returns fewer rows than requested
        loop {
            let response = self
                .client
                .post(self.url("address_utxos"))
                .query(&[("offset", offset), ("limit", self.page_size)])
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CardanoError::Provider(format!(
                    "address_utxos returned {status}: {body}"
                )));
            }

            let page: Vec<KoiosUtxo> = response.json().await?;
            let rows = page.len();
            for raw in page {
                utxos.push(raw.into_utxo()?);
            }
            if rows < self.page_size {
                break;
            }
            offset += rows;
        }

        log::debug!("koios returned {} utxos for {}", utxos.len(), address);
        Ok(utxos)
    }

    async fn submit_transaction(&self, tx: &Transaction) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.url("submittx"))
            .header(CONTENT_TYPE, "application/cbor")
            .body(tx.to_cbor())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CardanoError::Provider(format!("submittx returned {status}: {body}")));
        }

        // the node answers with the id as a JSON string
        let tx_hash = serde_json::from_str::<String>(&body)
            .unwrap_or_else(|_| body.trim().trim_matches('"').to_string());
        Ok(if tx_hash.is_empty() { None } else { Some(tx_hash) })
    }
}

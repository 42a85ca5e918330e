//! Interface for browser wallet extensions (CIP-30 style) the toolbox can
//! delegate signing to. Only the shape is defined here; concrete bridges
//! live with the host application.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::transaction::Transaction;

/// Events a wallet extension emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionEvent {
    Connect,
    Disconnect,
    AccountChanged,
}

impl fmt::Display for ExtensionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionEvent::Connect => "connect",
            ExtensionEvent::Disconnect => "disconnect",
            ExtensionEvent::AccountChanged => "accountChanged",
        };
        f.write_str(name)
    }
}

/// Methods reachable through [`CardanoWalletExtension::request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionRequestMethod {
    Connect,
    Disconnect,
    SignTransaction,
    SignAllTransactions,
    SignAndSendTransaction,
    SignMessage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Only connect if the user already trusts this site
    pub only_if_trusted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignAndSendResponse {
    pub tx_hash: String,
    pub public_key: String,
}

pub type EventHandler = Box<dyn Fn(JsonValue) + Send + Sync>;

/// A wallet extension holding its own keys
#[async_trait]
pub trait CardanoWalletExtension: Send + Sync {
    async fn connect(&self, options: ConnectOptions) -> Result<ConnectResponse>;

    async fn disconnect(&self) -> Result<()>;

    async fn get_address(&self) -> Result<String>;

    /// Signature over `message`
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>>;

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction>;

    async fn sign_all_transactions(&self, txs: Vec<Transaction>) -> Result<Vec<Transaction>> {
        let mut signed = Vec::with_capacity(txs.len());
        for tx in txs {
            signed.push(self.sign_transaction(tx).await?);
        }
        Ok(signed)
    }

    async fn sign_and_send_transaction(&self, tx: Transaction) -> Result<SignAndSendResponse>;

    /// Generic request passthrough
    async fn request(&self, method: ExtensionRequestMethod, params: JsonValue) -> Result<JsonValue>;

    fn on(&self, event: ExtensionEvent, handler: EventHandler);

    fn is_connected(&self) -> bool;

    fn public_key(&self) -> Option<String>;
}

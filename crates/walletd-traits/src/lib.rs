//! # WalletD Traits
//!
//! Chain-agnostic types shared by every chain toolbox plugged into the WalletD
//! aggregator. A toolbox implements [`ChainToolbox`] and speaks in
//! [`AssetValue`]s so the aggregator can treat balances and transfers the same
//! way regardless of the active chain.
//!
//! ## Core Types
//!
//! - [`Chain`] - Supported chains and their native coin metadata
//! - [`Amount`] - Integer amount in the smallest unit plus its decimal scale
//! - [`AssetValue`] - A (chain, identifier, amount) triple
//! - [`ChainToolbox`] - The surface the aggregator dispatches through
//!
//! ## Example
//!
//! ```ignore
//! use walletd_traits::prelude::*;
//!
//! async fn native_balance<T: ChainToolbox>(toolbox: &T, address: &str) -> WalletResult<Amount> {
//!     let balances = toolbox.get_balance(address).await?;
//!     Ok(balances[0].amount)
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chains known to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// Bitcoin
    Bitcoin,
    /// Ethereum
    Ethereum,
    /// Cardano
    Cardano,
    /// Solana
    Solana,
}

impl Chain {
    /// Ticker of the chain's native coin, also used as the identifier prefix
    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Bitcoin => "BTC",
            Chain::Ethereum => "ETH",
            Chain::Cardano => "ADA",
            Chain::Solana => "SOL",
        }
    }

    /// Decimal places of the native coin
    pub fn decimals(&self) -> u8 {
        match self {
            Chain::Bitcoin => 8,
            Chain::Ethereum => 18,
            Chain::Cardano => 6,
            Chain::Solana => 9,
        }
    }

    /// Identifier of the native coin, e.g. `ADA.ADA`
    pub fn native_identifier(&self) -> String {
        format!("{}.{}", self.symbol(), self.symbol())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An amount in the smallest unit of an asset (lovelace, satoshi, wei, ...).
///
/// Arithmetic is integer-only; the decimal scale is carried alongside for
/// display and is never applied through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// The value in the smallest unit
    pub value: u128,
    /// Number of decimal places of the asset
    pub decimals: u8,
}

impl Amount {
    /// Creates an amount from a smallest-unit value
    pub fn from_smallest_unit(value: u128, decimals: u8) -> Self {
        Self { value, decimals }
    }

    /// Returns a zero amount with the given scale
    pub fn zero(decimals: u8) -> Self {
        Self { value: 0, decimals }
    }

    /// Returns the value in the smallest unit
    pub fn smallest_unit(&self) -> u128 {
        self.value
    }

    /// Checks if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Adds two amounts of the same scale, `None` on overflow or scale mismatch
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.value
            .checked_add(other.value)
            .map(|value| Amount { value, decimals: self.decimals })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.value);
        }
        match 10u128.checked_pow(self.decimals as u32) {
            Some(divisor) => write!(
                f,
                "{}.{:0width$}",
                self.value / divisor,
                self.value % divisor,
                width = self.decimals as usize
            ),
            None => write!(f, "{}e-{}", self.value, self.decimals),
        }
    }
}

/// A normalized asset balance or transfer amount.
///
/// `identifier` is unique per (chain, asset): `ADA.ADA` for the native coin,
/// `ADA.<name>-<policy>` for a Cardano native token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetValue {
    /// Chain the asset lives on
    pub chain: Chain,
    /// Unique asset identifier
    pub identifier: String,
    /// Amount with its decimal scale
    pub amount: Amount,
}

impl AssetValue {
    /// Native coin amount on `chain`
    pub fn native(chain: Chain, value: u128) -> Self {
        Self {
            chain,
            identifier: chain.native_identifier(),
            amount: Amount::from_smallest_unit(value, chain.decimals()),
        }
    }

    /// Non-native asset amount
    pub fn token(chain: Chain, identifier: impl Into<String>, value: u128, decimals: u8) -> Self {
        Self {
            chain,
            identifier: identifier.into(),
            amount: Amount::from_smallest_unit(value, decimals),
        }
    }

    /// True if this is the chain's native coin
    pub fn is_native(&self) -> bool {
        self.identifier == self.chain.native_identifier()
    }
}

impl fmt::Display for AssetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.identifier)
    }
}

/// Represents a transaction hash/ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    /// Creates a new TxHash from a string
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Returns the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Hash of the submitted transaction
    pub tx_hash: TxHash,
}

/// Parameters of a single-asset transfer
#[derive(Debug, Clone, Copy)]
pub struct WalletTxParams<'a, K> {
    /// Recipient address
    pub recipient: &'a str,
    /// Asset and amount to send
    pub asset_value: &'a AssetValue,
    /// Key pair funding and signing the transfer
    pub from_keypair: &'a K,
}

/// Errors surfaced to the aggregator by any toolbox
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Recipient rejected before anything was built
    #[error("Invalid recipient address: {0}")]
    InvalidRecipientAddress(String),

    /// Insufficient balance for transaction
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Available balance
        have: Amount,
        /// Required balance
        need: Amount,
    },

    /// Transaction could not be built, signed or submitted
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Network/RPC error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Key/signing error
    #[error("Key error: {0}")]
    KeyError(String),

    /// Feature not supported
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for toolbox operations
pub type WalletResult<T> = Result<T, WalletError>;

/// The surface a chain toolbox exposes to the aggregator.
///
/// Every operation is a function of its arguments plus network reads; a
/// toolbox holds configuration only.
#[async_trait]
pub trait ChainToolbox: Send + Sync {
    /// Chain-specific key pair
    type KeyPair: Send + Sync;

    /// The chain this toolbox serves
    fn chain(&self) -> Chain;

    /// Endpoint the toolbox talks to
    fn connection_endpoint(&self) -> &str;

    /// Derives a key pair from a mnemonic; `None` selects the chain default path
    fn create_keys_for_path(
        &self,
        phrase: &str,
        derivation_path: Option<&str>,
    ) -> WalletResult<Self::KeyPair>;

    /// Receive address of a key pair
    fn get_address_from_keys(&self, keys: &Self::KeyPair) -> WalletResult<String>;

    /// Checks whether `address` is usable on this chain. Never fails.
    fn validate_address(&self, address: &str) -> bool;

    /// Native balance followed by token balances
    async fn get_balance(&self, address: &str) -> WalletResult<Vec<AssetValue>>;

    /// Builds, signs and submits a single-asset transfer
    async fn transfer(
        &self,
        params: WalletTxParams<'_, Self::KeyPair>,
    ) -> WalletResult<TransactionResult>;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Amount, AssetValue, Chain, ChainToolbox, TransactionResult, TxHash, WalletError,
        WalletResult, WalletTxParams,
    };
}

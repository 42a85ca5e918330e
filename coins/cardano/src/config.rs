use serde::{Deserialize, Serialize};

use crate::error::{CardanoError, Result};

/// Cardano network IDs
pub const MAINNET_NETWORK_ID: u8 = 1;
pub const TESTNET_NETWORK_ID: u8 = 0; // Preview/Preprod

/// Default Koios endpoints
pub const MAINNET_RPC_URL: &str = "https://api.koios.rest/api/v1";
pub const PREVIEW_RPC_URL: &str = "https://preview.koios.rest/api/v1";
pub const PREPROD_RPC_URL: &str = "https://preprod.koios.rest/api/v1";

/// CIP-1852 path of the first external payment key
pub const DEFAULT_DERIVATION_PATH: &str = "m/1852'/1815'/0'/0/0";

/// Decimal scale applied to native tokens when no registry metadata is available
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Address types in Cardano
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    Base,       // Payment + staking credential
    Pointer,    // Payment + stake pool pointer
    Enterprise, // Payment credential only (no staking)
}

/// Ledger parameters the transaction builder enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Fee per serialized byte (lovelace)
    pub min_fee_a: u64,
    /// Constant fee component (lovelace)
    pub min_fee_b: u64,
    /// Min-UTXO cost per output byte (Babbage rule)
    pub coins_per_utxo_byte: u64,
    /// Maximum serialized transaction size in bytes
    pub max_tx_size: usize,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            coins_per_utxo_byte: 4_310,
            max_tx_size: 16_384,
        }
    }
}

impl ProtocolParams {
    /// Linear fee: `a * size + b`
    pub fn min_fee(&self, tx_size_bytes: usize) -> Result<u64> {
        self.min_fee_a
            .checked_mul(tx_size_bytes as u64)
            .and_then(|fee| fee.checked_add(self.min_fee_b))
            .ok_or_else(|| CardanoError::Balancing("fee overflow".to_string()))
    }

    /// Minimum lovelace an output of `output_size_bytes` must carry
    pub fn min_ada_for_output(&self, output_size_bytes: usize) -> Result<u64> {
        (160u64 + output_size_bytes as u64)
            .checked_mul(self.coins_per_utxo_byte)
            .ok_or_else(|| CardanoError::Balancing("min-UTXO overflow".to_string()))
    }
}

/// How UTXOs are picked as transaction inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Spend every available UTXO
    #[default]
    UseAll,
    /// Spend the largest UTXOs until the target is covered
    LargestFirst,
}

/// How token balances are reported across UTXOs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAggregation {
    /// One entry per asset, summed over all UTXOs
    #[default]
    Merged,
    /// One entry per UTXO occurrence of an asset
    PerUtxo,
}

/// Toolbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxConfig {
    /// Data provider endpoint
    pub rpc_url: String,
    /// Network the toolbox derives addresses for and accepts recipients on
    pub network_id: u8,
    /// Fee and min-UTXO parameters
    pub protocol: ProtocolParams,
    /// Coin selection policy for transfers
    pub selection: SelectionPolicy,
    /// Token balance reporting mode
    pub token_aggregation: TokenAggregation,
    /// Decimal scale reported for native tokens
    pub token_decimals: u8,
    /// HTTP request timeout
    pub request_timeout_secs: u64,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ToolboxConfig {
    /// Cardano Mainnet configuration
    pub fn mainnet() -> Self {
        Self {
            rpc_url: MAINNET_RPC_URL.to_string(),
            network_id: MAINNET_NETWORK_ID,
            protocol: ProtocolParams::default(),
            selection: SelectionPolicy::default(),
            token_aggregation: TokenAggregation::default(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            request_timeout_secs: 30,
        }
    }

    /// Cardano Preview Testnet configuration
    pub fn preview() -> Self {
        Self {
            rpc_url: PREVIEW_RPC_URL.to_string(),
            network_id: TESTNET_NETWORK_ID,
            ..Self::mainnet()
        }
    }

    /// Cardano Preprod Testnet configuration
    pub fn preprod() -> Self {
        Self {
            rpc_url: PREPROD_RPC_URL.to_string(),
            network_id: TESTNET_NETWORK_ID,
            ..Self::mainnet()
        }
    }

    /// Sets the provider endpoint
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Sets the protocol parameters
    pub fn with_protocol(mut self, protocol: ProtocolParams) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the coin selection policy
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the token aggregation mode
    pub fn with_token_aggregation(mut self, aggregation: TokenAggregation) -> Self {
        self.token_aggregation = aggregation;
        self
    }

    /// Check if mainnet
    pub fn is_mainnet(&self) -> bool {
        self.network_id == MAINNET_NETWORK_ID
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.rpc_url)
            .map_err(|e| CardanoError::Config(format!("invalid rpc_url '{}': {}", self.rpc_url, e)))?;
        if self.network_id > 0x0F {
            return Err(CardanoError::Config(format!(
                "network id {} does not fit the address header",
                self.network_id
            )));
        }
        if self.protocol.max_tx_size == 0 {
            return Err(CardanoError::Config("max_tx_size must be positive".to_string()));
        }
        Ok(())
    }
}

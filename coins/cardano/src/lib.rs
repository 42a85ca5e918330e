//! # WalletD Cardano Toolbox
//!
//! Cardano (ADA) toolbox for the WalletD aggregator.
//!
//! ## Features
//!
//! - CIP-1852 key derivation from BIP-39 mnemonics (Icarus master keys)
//! - Enterprise address generation and Shelley address validation
//! - ADA and native token balances from the UTXO set
//! - Transaction building with coin selection, fee balancing and change
//! - Submission through Koios or any custom [`ChainDataProvider`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use walletd_cardano_toolbox::{CardanoToolbox, ToolboxConfig};
//! use walletd_traits::{AssetValue, Chain, WalletTxParams};
//!
//! # async fn run() -> walletd_cardano_toolbox::Result<()> {
//! let toolbox = CardanoToolbox::new(ToolboxConfig::mainnet())?;
//!
//! let keys = toolbox.create_keys_for_path("<24 word mnemonic>", None)?;
//! let address = toolbox.get_address_from_keys(&keys)?;
//! println!("Address: {address}");
//!
//! for balance in toolbox.get_balance(address.to_bech32()).await? {
//!     println!("{balance}");
//! }
//!
//! let amount = AssetValue::native(Chain::Cardano, 2_000_000);
//! let result = toolbox
//!     .transfer(WalletTxParams {
//!         recipient: "addr1...",
//!         asset_value: &amount,
//!         from_keypair: &keys,
//!     })
//!     .await?;
//! println!("Submitted {}", result.tx_hash);
//! # Ok(())
//! # }
//! ```
//!
//! ## Address Types
//!
//! Cardano supports several address types:
//! - **Enterprise**: Payment key only (no staking rewards)
//! - **Base**: Payment + staking key (can receive staking rewards)
//! - **Pointer**: Payment + stake pool pointer
//!
//! All three are accepted as recipients. Addresses derived by the toolbox are
//! enterprise addresses.
//!
//! ## Note on UTXO Model
//!
//! Cardano uses a UTXO (Unspent Transaction Output) model similar to Bitcoin,
//! rather than an account model like Ethereum. Transfers select UTXOs, pay
//! the recipient, and return the remainder as a change output to the sender.

pub mod address;
pub mod balance;
pub mod builder;
pub mod cbor;
pub mod config;
pub mod error;
pub mod extension;
pub mod keys;
pub mod provider;
pub mod selection;
pub mod signer;
pub mod toolbox;
pub mod transaction;
pub mod value;

pub use address::{validate_address, CardanoAddress};
pub use balance::{aggregate_balances, token_identifier};
pub use builder::TransactionBuilder;
pub use config::{
    AddressType, ProtocolParams, SelectionPolicy, TokenAggregation, ToolboxConfig,
    DEFAULT_DERIVATION_PATH, MAINNET_NETWORK_ID, MAINNET_RPC_URL,
    TESTNET_NETWORK_ID,
};
pub use error::{CardanoError, Result};
pub use extension::CardanoWalletExtension;
pub use keys::{DerivationPath, IcarusDerivation, KeyDerivation, KeyPair, PrivateKey, PublicKey};
pub use provider::{ChainDataProvider, KoiosProvider, KOIOS_PAGE_SIZE};
pub use selection::{LargestFirst, UseAll, UtxoSelectionStrategy};
pub use signer::{Ed25519Signer, TransactionSigner};
pub use toolbox::CardanoToolbox;
pub use transaction::{
    Transaction, TransactionBody, TransactionInput, TransactionOutput, TransactionWitnessSet,
    Utxo, VkeyWitness,
};
pub use value::{AssetName, MultiAsset, PolicyId, Value};

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_phrase_to_validated_address() {
        let keys = IcarusDerivation::new()
            .key_pair_from_phrase(PHRASE, Some(DEFAULT_DERIVATION_PATH))
            .unwrap();
        let testnet = CardanoAddress::enterprise(keys.public.as_bytes(), TESTNET_NETWORK_ID).unwrap();
        let mainnet = CardanoAddress::enterprise(keys.public.as_bytes(), MAINNET_NETWORK_ID).unwrap();

        assert!(testnet.to_bech32().starts_with("addr_test1"));
        assert!(mainnet.to_bech32().starts_with("addr1"));
        assert_eq!(testnet.payment_credential, mainnet.payment_credential);
        assert!(validate_address(testnet.to_bech32()));
        assert!(validate_address(mainnet.to_bech32()));
    }
}

use thiserror::Error;
use walletd_traits::{Amount, Chain, WalletError};

#[derive(Error, Debug)]
pub enum CardanoError {
    #[error("Invalid mnemonic or derivation path: {0}")]
    InvalidMnemonicOrPath(String),

    #[error("Address parse error: {0}")]
    AddressParse(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipientAddress(String),

    #[error("Insufficient funds: required {required} lovelace, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Transaction balancing failed: {0}")]
    Balancing(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Unsupported asset: {0}")]
    UnsupportedAsset(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CardanoError>;

impl From<reqwest::Error> for CardanoError {
    fn from(err: reqwest::Error) -> Self {
        CardanoError::Provider(err.to_string())
    }
}

impl From<CardanoError> for WalletError {
    fn from(err: CardanoError) -> Self {
        match err {
            CardanoError::InvalidMnemonicOrPath(msg) | CardanoError::Signing(msg) => {
                WalletError::KeyError(msg)
            }
            CardanoError::AddressParse(msg) => WalletError::InvalidAddress(msg),
            CardanoError::InvalidRecipientAddress(addr) => {
                WalletError::InvalidRecipientAddress(addr)
            }
            CardanoError::InsufficientFunds { required, available } => {
                let decimals = Chain::Cardano.decimals();
                WalletError::InsufficientBalance {
                    have: Amount::from_smallest_unit(available as u128, decimals),
                    need: Amount::from_smallest_unit(required as u128, decimals),
                }
            }
            CardanoError::Balancing(msg) | CardanoError::TransactionFailed(msg) => {
                WalletError::TransactionFailed(msg)
            }
            CardanoError::UnsupportedAsset(msg) => WalletError::NotSupported(msg),
            CardanoError::Provider(msg) => WalletError::NetworkError(msg),
            other => WalletError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_display() {
        let err = CardanoError::InsufficientFunds { required: 700_000, available: 0 };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: required 700000 lovelace, available 0"
        );
    }

    #[test]
    fn test_wallet_error_mapping() {
        let mapped: WalletError =
            CardanoError::InvalidRecipientAddress("addr1xyz".to_string()).into();
        assert!(matches!(mapped, WalletError::InvalidRecipientAddress(a) if a == "addr1xyz"));

        let mapped: WalletError =
            CardanoError::InsufficientFunds { required: 2, available: 1 }.into();
        match mapped {
            WalletError::InsufficientBalance { have, need } => {
                assert_eq!(have.value, 1);
                assert_eq!(need.value, 2);
                assert_eq!(need.decimals, 6);
            }
            other => panic!("unexpected mapping: {other:?}"),
        }

        let mapped: WalletError = CardanoError::Provider("timeout".to_string()).into();
        assert!(matches!(mapped, WalletError::NetworkError(_)));
    }
}

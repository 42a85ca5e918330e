use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use blake2::digest::consts::U28;
use blake2::{Blake2b, Digest};

use crate::config::{AddressType, MAINNET_NETWORK_ID};
use crate::error::{CardanoError, Result};

const CREDENTIAL_LEN: usize = 28;
const MAINNET_HRP: &str = "addr";
const TESTNET_HRP: &str = "addr_test";

/// Shelley-era Cardano address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardanoAddress {
    pub address_type: AddressType,
    pub network_id: u8,
    pub payment_credential: [u8; CREDENTIAL_LEN],
    pub staking_credential: Option<[u8; CREDENTIAL_LEN]>,
    bytes: Vec<u8>,
    bech32: String,
}

impl CardanoAddress {
    /// Create a new enterprise address (no staking)
    pub fn enterprise(payment_pubkey: &[u8], network_id: u8) -> Result<Self> {
        let payment = Self::hash_key(payment_pubkey);
        // 0110 | network: key-hash payment credential, no delegation part
        let mut bytes = Vec::with_capacity(1 + CREDENTIAL_LEN);
        bytes.push(0x60 | (network_id & 0x0F));
        bytes.extend_from_slice(&payment);
        Self::from_bytes(bytes)
    }

    /// Create a new base address (payment + staking)
    pub fn base(payment_pubkey: &[u8], staking_pubkey: &[u8], network_id: u8) -> Result<Self> {
        let payment = Self::hash_key(payment_pubkey);
        let staking = Self::hash_key(staking_pubkey);
        // 0000 | network: key-hash payment and key-hash staking credentials
        let mut bytes = Vec::with_capacity(1 + 2 * CREDENTIAL_LEN);
        bytes.push(network_id & 0x0F);
        bytes.extend_from_slice(&payment);
        bytes.extend_from_slice(&staking);
        Self::from_bytes(bytes)
    }

    /// Hash a public key using Blake2b-224
    pub fn hash_key(pubkey: &[u8]) -> [u8; CREDENTIAL_LEN] {
        let mut hasher = Blake2b::<U28>::new();
        hasher.update(pubkey);
        hasher.finalize().into()
    }

    /// Parse a bech32 address string
    pub fn from_bech32(address: &str) -> Result<Self> {
        let (hrp, bytes) = bech32::decode(address)
            .map_err(|e| CardanoError::AddressParse(format!("{address}: {e}")))?;

        let prefix = hrp.to_lowercase();

        // decode() also accepts bech32m; Cardano only uses the original checksum
        let lower_hrp =
            Hrp::parse(&prefix).map_err(|e| CardanoError::AddressParse(e.to_string()))?;
        let reencoded = bech32::encode::<Bech32>(lower_hrp, &bytes)
            .map_err(|e| CardanoError::AddressParse(e.to_string()))?;
        if reencoded != address.to_ascii_lowercase() {
            return Err(CardanoError::AddressParse(format!(
                "{address}: not a bech32 checksum"
            )));
        }

        let parsed = Self::from_bytes(bytes)?;
        if parsed.hrp() != prefix {
            return Err(CardanoError::AddressParse(format!(
                "{address}: prefix '{prefix}' does not match network id {}",
                parsed.network_id
            )));
        }
        Ok(parsed)
    }

    /// Decode raw address bytes (header + credentials)
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let header = *bytes
            .first()
            .ok_or_else(|| CardanoError::AddressParse("empty address payload".to_string()))?;
        let network_id = header & 0x0F;

        let (address_type, staking_credential) = match header >> 4 {
            0..=3 => {
                Self::expect_len(&bytes, 1 + 2 * CREDENTIAL_LEN)?;
                let mut staking = [0u8; CREDENTIAL_LEN];
                staking.copy_from_slice(&bytes[1 + CREDENTIAL_LEN..]);
                (AddressType::Base, Some(staking))
            }
            4 | 5 => {
                // slot, tx index and cert index varints follow the payment credential
                if bytes.len() < 1 + CREDENTIAL_LEN + 3 {
                    return Err(CardanoError::AddressParse(format!(
                        "pointer address too short: {} bytes",
                        bytes.len()
                    )));
                }
                (AddressType::Pointer, None)
            }
            6 | 7 => {
                Self::expect_len(&bytes, 1 + CREDENTIAL_LEN)?;
                (AddressType::Enterprise, None)
            }
            other => {
                return Err(CardanoError::AddressParse(format!(
                    "unsupported address header type {other}"
                )))
            }
        };

        let mut payment_credential = [0u8; CREDENTIAL_LEN];
        payment_credential.copy_from_slice(&bytes[1..1 + CREDENTIAL_LEN]);

        let hrp = Hrp::parse(Self::hrp_for(network_id))
            .map_err(|e| CardanoError::AddressParse(e.to_string()))?;
        let bech32 = bech32::encode::<Bech32>(hrp, &bytes)
            .map_err(|e| CardanoError::AddressParse(e.to_string()))?;

        Ok(Self {
            address_type,
            network_id,
            payment_credential,
            staking_credential,
            bytes,
            bech32,
        })
    }

    fn expect_len(bytes: &[u8], expected: usize) -> Result<()> {
        if bytes.len() != expected {
            return Err(CardanoError::AddressParse(format!(
                "expected {expected} address bytes, got {}",
                bytes.len()
            )));
        }
        Ok(())
    }

    fn hrp_for(network_id: u8) -> &'static str {
        if network_id == MAINNET_NETWORK_ID {
            MAINNET_HRP
        } else {
            TESTNET_HRP
        }
    }

    /// Human-readable prefix of this address
    pub fn hrp(&self) -> &'static str {
        Self::hrp_for(self.network_id)
    }

    /// Get the bech32 encoded address
    pub fn to_bech32(&self) -> &str {
        &self.bech32
    }

    /// Raw address bytes as they appear in transaction outputs
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if the payment part is a script hash rather than a key hash
    pub fn has_script_payment(&self) -> bool {
        (self.bytes[0] >> 4) & 0x01 == 1
    }

    /// Check if this is a mainnet address
    pub fn is_mainnet(&self) -> bool {
        self.network_id == MAINNET_NETWORK_ID
    }

    /// Validate a Cardano address string.
    ///
    /// Parse failures are data here, not errors: any malformed input yields
    /// `false` and nothing is propagated.
    pub fn validate(address: &str) -> bool {
        Self::from_bech32(address).is_ok()
    }
}

/// Returns `true` if `address` is a well-formed Shelley address on any network
pub fn validate_address(address: &str) -> bool {
    CardanoAddress::validate(address)
}

impl FromStr for CardanoAddress {
    type Err = CardanoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bech32(s)
    }
}

impl fmt::Display for CardanoAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bech32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TESTNET_NETWORK_ID;

    // Test key (32 bytes for Ed25519 public key)
    fn test_pubkey() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn test_hash_key() {
        let hash = CardanoAddress::hash_key(&test_pubkey());
        assert_eq!(hash.len(), 28);
        assert_ne!(hash, CardanoAddress::hash_key(&[0u8; 32]));
    }

    #[test]
    fn test_enterprise_address_mainnet() {
        let addr = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();

        assert!(addr.to_bech32().starts_with("addr1"));
        assert_eq!(addr.address_type, AddressType::Enterprise);
        assert!(addr.is_mainnet());
        assert!(addr.staking_credential.is_none());
        assert_eq!(addr.as_bytes().len(), 29);
        assert_eq!(addr.as_bytes()[0], 0x61);
    }

    #[test]
    fn test_enterprise_address_testnet() {
        let addr = CardanoAddress::enterprise(&test_pubkey(), TESTNET_NETWORK_ID).unwrap();

        assert!(addr.to_bech32().starts_with("addr_test1"));
        assert!(!addr.is_mainnet());
    }

    #[test]
    fn test_base_address() {
        let mut staking_key = test_pubkey();
        staking_key[0] = 0xFF;

        let addr =
            CardanoAddress::base(&test_pubkey(), &staking_key, MAINNET_NETWORK_ID).unwrap();

        assert!(addr.to_bech32().starts_with("addr1"));
        assert_eq!(addr.address_type, AddressType::Base);
        assert_eq!(addr.staking_credential, Some(CardanoAddress::hash_key(&staking_key)));
        assert_eq!(addr.as_bytes().len(), 57);
    }

    #[test]
    fn test_address_deterministic() {
        let addr1 = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let addr2 = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        assert_eq!(addr1, addr2);
    }

    #[test]
    fn test_parse_roundtrips_generated_addresses() {
        let enterprise = CardanoAddress::enterprise(&test_pubkey(), TESTNET_NETWORK_ID).unwrap();
        let base = CardanoAddress::base(&test_pubkey(), &[7u8; 32], MAINNET_NETWORK_ID).unwrap();

        for addr in [enterprise, base] {
            let parsed = CardanoAddress::from_bech32(addr.to_bech32()).unwrap();
            assert_eq!(parsed, addr);
        }
    }

    #[test]
    fn test_parse_accepts_uppercase() {
        let addr = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let upper = addr.to_bech32().to_ascii_uppercase();
        assert_eq!(CardanoAddress::from_bech32(&upper).unwrap(), addr);
    }

    #[test]
    fn test_pointer_address() {
        let mut bytes = vec![0x41];
        bytes.extend_from_slice(&CardanoAddress::hash_key(&test_pubkey()));
        bytes.extend_from_slice(&[0x81, 0x00, 0x02, 0x03]);
        let addr = CardanoAddress::from_bytes(bytes).unwrap();
        assert_eq!(addr.address_type, AddressType::Pointer);
        assert!(CardanoAddress::validate(addr.to_bech32()));
    }

    #[test]
    fn test_script_payment_flag() {
        let mut bytes = vec![0x71];
        bytes.extend_from_slice(&[9u8; 28]);
        let script = CardanoAddress::from_bytes(bytes).unwrap();
        assert!(script.has_script_payment());

        let key = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        assert!(!key.has_script_payment());
    }

    #[test]
    fn test_validate_generated_addresses() {
        let mainnet = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let testnet = CardanoAddress::enterprise(&test_pubkey(), TESTNET_NETWORK_ID).unwrap();
        assert!(validate_address(mainnet.to_bech32()));
        assert!(validate_address(testnet.to_bech32()));
    }

    #[test]
    fn test_validate_invalid_address() {
        assert!(!validate_address(""));
        assert!(!validate_address("invalid"));
        assert!(!validate_address("btc1qxyz"));
        assert!(!validate_address("0x1234567890"));
        assert!(!validate_address("addr1"));
    }

    #[test]
    fn test_validate_truncated_address() {
        let addr = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let s = addr.to_bech32();
        for cut in [1, 5, 20] {
            assert!(!validate_address(&s[..s.len() - cut]));
        }
    }

    #[test]
    fn test_validate_wrong_network_prefix() {
        // mainnet header under the testnet prefix
        let addr = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let hrp = Hrp::parse("addr_test").unwrap();
        let mismatched = bech32::encode::<Bech32>(hrp, addr.as_bytes()).unwrap();
        assert!(!validate_address(&mismatched));

        // well-formed bech32 under a foreign prefix
        let hrp = Hrp::parse("stake").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, addr.as_bytes()).unwrap();
        assert!(!validate_address(&foreign));
    }

    #[test]
    fn test_validate_wrong_payload_length() {
        let hrp = Hrp::parse("addr").unwrap();
        let short = bech32::encode::<Bech32>(hrp, &[0x61, 1, 2, 3]).unwrap();
        assert!(!validate_address(&short));
    }

    #[test]
    fn test_validate_rejects_bech32m() {
        let addr = CardanoAddress::enterprise(&test_pubkey(), MAINNET_NETWORK_ID).unwrap();
        let hrp = Hrp::parse("addr").unwrap();
        let bech32m = bech32::encode::<bech32::Bech32m>(hrp, addr.as_bytes()).unwrap();
        assert!(!validate_address(&bech32m));
    }

    #[test]
    fn test_from_bech32_error_is_structured() {
        let err = CardanoAddress::from_bech32("not-an-address").unwrap_err();
        assert!(matches!(err, CardanoError::AddressParse(_)));
    }
}

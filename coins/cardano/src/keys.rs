//! Key derivation for Cardano payment keys.
//!
//! Mnemonics are turned into Icarus master keys (CIP-3) and walked down a
//! CIP-1852 path with BIP32-Ed25519 child derivation.

use std::fmt;
use std::str::FromStr;

use bip39::{Language, Mnemonic};
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::address::CardanoAddress;
use crate::config::DEFAULT_DERIVATION_PATH;
use crate::error::{CardanoError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Offset marking a hardened path index
pub const HARDENED: u32 = 0x8000_0000;

const PBKDF2_ROUNDS: u32 = 4096;

/// A parsed BIP32-style derivation path such as `m/1852'/1815'/0'/0/0`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    /// Path indices, hardened ones carrying the [`HARDENED`] offset
    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        // m/1852'/1815'/0'/0/0
        Self(vec![1852 | HARDENED, 1815 | HARDENED, HARDENED, 0, 0])
    }
}

impl FromStr for DerivationPath {
    type Err = CardanoError;

    fn from_str(path: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            CardanoError::InvalidMnemonicOrPath(format!("derivation path '{path}': {reason}"))
        };

        let mut segments = path.trim().split('/');
        if segments.next() != Some("m") {
            return Err(invalid("must start with 'm'"));
        }

        let mut indices = Vec::new();
        for segment in segments {
            let (digits, hardened) = match segment.strip_suffix(['\'', 'h']) {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(&format!("bad segment '{segment}'")));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| invalid(&format!("segment '{segment}' out of range")))?;
            if index >= HARDENED {
                return Err(invalid(&format!("segment '{segment}' out of range")));
            }
            indices.push(if hardened { index | HARDENED } else { index });
        }
        Ok(Self(indices))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            if index & HARDENED != 0 {
                write!(f, "/{}'", index & !HARDENED)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

/// Extended Ed25519 private key (kL ‖ kR) with its chain code
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    extended: [u8; 64],
    chain_code: [u8; 32],
}

impl PrivateKey {
    /// Build from raw extended key bytes and chain code
    pub fn from_parts(extended: [u8; 64], chain_code: [u8; 32]) -> Self {
        Self { extended, chain_code }
    }

    fn kl(&self) -> [u8; 32] {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(&self.extended[..32]);
        kl
    }

    fn kr(&self) -> [u8; 32] {
        let mut kr = [0u8; 32];
        kr.copy_from_slice(&self.extended[32..]);
        kr
    }

    /// Chain code used for child derivation
    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// The Ed25519 public key for this private key
    pub fn public_key(&self) -> PublicKey {
        let scalar = Scalar::from_bytes_mod_order(self.kl());
        PublicKey(EdwardsPoint::mul_base(&scalar).compress().to_bytes())
    }

    /// BIP32-Ed25519 child key
    pub fn derive_child(&self, index: u32) -> Result<PrivateKey> {
        let kl = Zeroizing::new(self.kl());
        let kr = Zeroizing::new(self.kr());

        let (z, c) = if index & HARDENED != 0 {
            let mut data = Zeroizing::new(Vec::with_capacity(69));
            data.extend_from_slice(&self.extended);
            data.extend_from_slice(&index.to_le_bytes());
            (self.hmac(0x00, &data)?, self.hmac(0x01, &data)?)
        } else {
            let public = self.public_key();
            let mut data = Vec::with_capacity(37);
            data.extend_from_slice(public.as_bytes());
            data.extend_from_slice(&index.to_le_bytes());
            (self.hmac(0x02, &data)?, self.hmac(0x03, &data)?)
        };

        let child_kl = add_28_mul8(&kl, &z[..28]);
        let child_kr = add_256bits(&kr, &z[32..64]);

        let mut extended = [0u8; 64];
        extended[..32].copy_from_slice(&child_kl);
        extended[32..].copy_from_slice(&child_kr);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&c[32..64]);

        Ok(PrivateKey { extended, chain_code })
    }

    fn hmac(&self, tag: u8, data: &[u8]) -> Result<Zeroizing<[u8; 64]>> {
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| CardanoError::InvalidMnemonicOrPath(e.to_string()))?;
        mac.update(&[tag]);
        mac.update(data);
        let mut out = Zeroizing::new([0u8; 64]);
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// 32-byte Ed25519 public key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get public key as hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Blake2b-224 key hash, the payment credential in addresses
    pub fn hash(&self) -> [u8; 28] {
        CardanoAddress::hash_key(&self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A payment key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private: PrivateKey,
    pub public: PublicKey,
}

impl KeyPair {
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Ed25519 signature over `message` with the extended key
    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        let verifying_key = VerifyingKey::from_bytes(self.public.as_bytes())
            .map_err(|e| CardanoError::Signing(e.to_string()))?;
        let expanded = ExpandedSecretKey {
            scalar: Scalar::from_bytes_mod_order(self.private.kl()),
            hash_prefix: self.private.kr(),
        };
        let signature = raw_sign::<Sha512>(&expanded, message, &verifying_key);
        Ok(signature.to_bytes())
    }

    /// Verify a signature
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(self.public.as_bytes()) else {
            return false;
        };
        verifying_key
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .is_ok()
    }
}

/// Mnemonic to key pair derivation
pub trait KeyDerivation: Send + Sync {
    /// Turn a mnemonic phrase into seed material
    fn seed_from_phrase(&self, phrase: &str) -> Result<Zeroizing<Vec<u8>>>;

    /// Derive the private key at `path` from seed material
    fn derive_private_key(&self, seed: &[u8], path: &DerivationPath) -> Result<PrivateKey>;

    /// Public half of a private key
    fn derive_public_key(&self, private_key: &PrivateKey) -> PublicKey {
        private_key.public_key()
    }

    /// Full pipeline: phrase, path string (default CIP-1852 path when `None`), key pair
    fn key_pair_from_phrase(&self, phrase: &str, path: Option<&str>) -> Result<KeyPair> {
        let path: DerivationPath = path.unwrap_or(DEFAULT_DERIVATION_PATH).parse()?;
        let seed = self.seed_from_phrase(phrase)?;
        let private = self.derive_private_key(&seed, &path)?;
        let public = self.derive_public_key(&private);
        Ok(KeyPair { private, public })
    }
}

/// Icarus master key generation (CIP-3) with BIP32-Ed25519 children
#[derive(Debug, Clone, Copy, Default)]
pub struct IcarusDerivation {
    passphrase: &'static str,
}

impl IcarusDerivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Icarus master key from BIP-39 entropy
    pub fn master_key(&self, entropy: &[u8]) -> PrivateKey {
        let mut out = Zeroizing::new([0u8; 96]);
        pbkdf2::pbkdf2_hmac::<Sha512>(
            self.passphrase.as_bytes(),
            entropy,
            PBKDF2_ROUNDS,
            &mut out[..],
        );
        out[0] &= 0xF8;
        out[31] &= 0x1F;
        out[31] |= 0x40;

        let mut extended = [0u8; 64];
        extended.copy_from_slice(&out[..64]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&out[64..]);
        PrivateKey { extended, chain_code }
    }
}

impl KeyDerivation for IcarusDerivation {
    fn seed_from_phrase(&self, phrase: &str) -> Result<Zeroizing<Vec<u8>>> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase.trim())
            .map_err(|e| CardanoError::InvalidMnemonicOrPath(format!("invalid mnemonic: {e}")))?;
        Ok(Zeroizing::new(mnemonic.to_entropy()))
    }

    fn derive_private_key(&self, seed: &[u8], path: &DerivationPath) -> Result<PrivateKey> {
        let mut key = self.master_key(seed);
        for index in path.indices() {
            key = key.derive_child(*index)?;
        }
        Ok(key)
    }
}

/// x + 8·y over the low 28 bytes of y, little-endian, modulo 2^256
fn add_28_mul8(x: &[u8; 32], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let yi = if i < 28 { (y[i] as u16) << 3 } else { 0 };
        let r = x[i] as u16 + yi + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

/// x + y modulo 2^256, little-endian
fn add_256bits(x: &[u8; 32], y: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = x[i] as u16 + y[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

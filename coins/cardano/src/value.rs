//! Lovelace plus multi-asset bundles.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CardanoError, Result};

const POLICY_ID_LEN: usize = 28;
const MAX_ASSET_NAME_LEN: usize = 32;

/// Minting policy hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId(pub [u8; POLICY_ID_LEN]);

impl PolicyId {
    pub fn as_bytes(&self) -> &[u8; POLICY_ID_LEN] {
        &self.0
    }
}

impl FromStr for PolicyId {
    type Err = CardanoError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| CardanoError::Serialization(format!("policy id '{s}': {e}")))?;
        let bytes: [u8; POLICY_ID_LEN] = bytes.try_into().map_err(|_| {
            CardanoError::Serialization(format!("policy id '{s}' must be {POLICY_ID_LEN} bytes"))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Asset name, up to 32 raw bytes.
///
/// Ordered length-first, then bytewise, which is the canonical CBOR key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(CardanoError::Serialization(format!(
                "asset name is {} bytes, max {MAX_ASSET_NAME_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Parse a hex-encoded asset name as returned by chain indexers
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| CardanoError::Serialization(format!("asset name '{s}': {e}")))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 name when printable, otherwise hex
    pub fn display_name(&self) -> String {
        match std::str::from_utf8(&self.0) {
            Ok(name) if !name.is_empty() && name.chars().all(|c| !c.is_control()) => {
                name.to_string()
            }
            _ => hex::encode(&self.0),
        }
    }
}

impl Ord for AssetName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for AssetName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub type MultiAsset = BTreeMap<PolicyId, BTreeMap<AssetName, u64>>;

/// Coin and tokens held by an output or carried by a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pub coin: u64,
    pub multiasset: MultiAsset,
}

impl Value {
    pub fn new(coin: u64) -> Self {
        Self { coin, multiasset: MultiAsset::new() }
    }

    /// Adds `quantity` of an asset; zero quantities are not stored
    pub fn with_asset(mut self, policy: PolicyId, name: AssetName, quantity: u64) -> Result<Self> {
        if quantity == 0 {
            return Ok(self);
        }
        let slot = self.multiasset.entry(policy).or_default().entry(name).or_insert(0);
        *slot = slot
            .checked_add(quantity)
            .ok_or_else(|| CardanoError::Balancing("asset quantity overflow".to_string()))?;
        Ok(self)
    }

    pub fn is_pure_coin(&self) -> bool {
        self.multiasset.is_empty()
    }

    /// Iterate (policy, name, quantity) in canonical order
    pub fn assets(&self) -> impl Iterator<Item = (&PolicyId, &AssetName, u64)> {
        self.multiasset
            .iter()
            .flat_map(|(policy, assets)| assets.iter().map(move |(name, qty)| (policy, name, *qty)))
    }

    pub fn checked_add(&self, other: &Value) -> Option<Value> {
        let mut sum = self.clone();
        sum.coin = sum.coin.checked_add(other.coin)?;
        for (policy, name, qty) in other.assets() {
            let slot = sum
                .multiasset
                .entry(*policy)
                .or_default()
                .entry(name.clone())
                .or_insert(0);
            *slot = slot.checked_add(qty)?;
        }
        Some(sum)
    }

    /// `None` if any component of `other` exceeds this value
    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        let mut diff = self.clone();
        diff.coin = diff.coin.checked_sub(other.coin)?;
        for (policy, name, qty) in other.assets() {
            let assets = diff.multiasset.get_mut(policy)?;
            let held = assets.get_mut(name)?;
            *held = held.checked_sub(qty)?;
            if *held == 0 {
                assets.remove(name);
            }
            if assets.is_empty() {
                diff.multiasset.remove(policy);
            }
        }
        Some(diff)
    }

    /// True if every component of `other` is held here
    pub fn covers(&self, other: &Value) -> bool {
        self.checked_sub(other).is_some()
    }
}

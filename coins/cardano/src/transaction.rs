//! Ledger transaction types and their CBOR form.

use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::address::CardanoAddress;
use crate::cbor::Encoder;
use crate::error::{CardanoError, Result};
use crate::value::Value;

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionInput {
    pub tx_hash: [u8; 32],
    pub index: u32,
}

impl TransactionInput {
    pub fn new(tx_hash: [u8; 32], index: u32) -> Self {
        Self { tx_hash, index }
    }

    /// Parse a hex transaction id
    pub fn from_hex(tx_hash: &str, index: u32) -> Result<Self> {
        let bytes = hex::decode(tx_hash)
            .map_err(|e| CardanoError::Serialization(format!("tx hash '{tx_hash}': {e}")))?;
        let tx_hash: [u8; 32] = bytes.try_into().map_err(|_| {
            CardanoError::Serialization(format!("tx hash '{tx_hash}' must be 32 bytes"))
        })?;
        Ok(Self { tx_hash, index })
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.array(2).bytes(&self.tx_hash).uint(self.index as u64);
    }
}

impl fmt::Display for TransactionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", hex::encode(self.tx_hash), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    pub address: CardanoAddress,
    pub amount: Value,
}

impl TransactionOutput {
    pub fn new(address: CardanoAddress, amount: Value) -> Self {
        Self { address, amount }
    }

    fn encode(&self, enc: &mut Encoder) {
        enc.array(2).bytes(self.address.as_bytes());
        encode_value(&self.amount, enc);
    }

    /// Serialized size, the input to the min-UTXO rule
    pub fn encoded_len(&self) -> usize {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.len()
    }
}

/// An unspent output owned by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub input: TransactionInput,
    pub output: TransactionOutput,
}

fn encode_value(value: &Value, enc: &mut Encoder) {
    if value.is_pure_coin() {
        enc.uint(value.coin);
        return;
    }
    enc.array(2).uint(value.coin).map(value.multiasset.len());
    for (policy, assets) in &value.multiasset {
        enc.bytes(policy.as_bytes()).map(assets.len());
        for (name, quantity) in assets {
            enc.bytes(name.as_bytes()).uint(*quantity);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBody {
    /// Sorted by (tx hash, index)
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub fee: u64,
    pub ttl: Option<u64>,
}

impl TransactionBody {
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(256);
        let fields = 3 + usize::from(self.ttl.is_some());
        enc.map(fields);

        enc.uint(0).array(self.inputs.len());
        for input in &self.inputs {
            input.encode(&mut enc);
        }

        enc.uint(1).array(self.outputs.len());
        for output in &self.outputs {
            output.encode(&mut enc);
        }

        enc.uint(2).uint(self.fee);

        if let Some(ttl) = self.ttl {
            enc.uint(3).uint(ttl);
        }
        enc.finish()
    }

    /// Blake2b-256 of the serialized body, the message every witness signs
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.to_cbor());
        hasher.finalize().into()
    }

    /// Coin and assets paid out, fee included
    pub fn total_output(&self) -> Result<Value> {
        self.outputs
            .iter()
            .try_fold(Value::new(self.fee), |acc, out| acc.checked_add(&out.amount))
            .ok_or_else(|| CardanoError::Balancing("output total overflow".to_string()))
    }
}

/// Public key and signature over the body hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VkeyWitness {
    pub vkey: [u8; 32],
    pub signature: [u8; 64],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionWitnessSet {
    pub vkey_witnesses: Vec<VkeyWitness>,
}

impl TransactionWitnessSet {
    fn encode(&self, enc: &mut Encoder) {
        if self.vkey_witnesses.is_empty() {
            enc.map(0);
            return;
        }
        enc.map(1).uint(0).array(self.vkey_witnesses.len());
        for witness in &self.vkey_witnesses {
            enc.array(2).bytes(&witness.vkey).bytes(&witness.signature);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub body: TransactionBody,
    pub witness_set: TransactionWitnessSet,
}

impl Transaction {
    pub fn new(body: TransactionBody, witness_set: TransactionWitnessSet) -> Self {
        Self { body, witness_set }
    }

    /// `[body, witness_set, is_valid, auxiliary_data]`
    pub fn to_cbor(&self) -> Vec<u8> {
        let body = self.body.to_cbor();
        let mut enc = Encoder::with_capacity(body.len() + 128);
        enc.array(4).raw(&body);
        self.witness_set.encode(&mut enc);
        enc.bool(true).null();
        enc.finish()
    }

    pub fn hash(&self) -> [u8; 32] {
        self.body.hash()
    }

    /// Transaction id as lowercase hex
    pub fn id(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn is_signed(&self) -> bool {
        !self.witness_set.vkey_witnesses.is_empty()
    }
}

use crate::error::Result;
use crate::keys::KeyPair;
use crate::transaction::{Transaction, TransactionBody, TransactionWitnessSet, VkeyWitness};

/// Turns a balanced body into a witnessed transaction
pub trait TransactionSigner: Send + Sync {
    fn sign(&self, body: TransactionBody, key_pair: &KeyPair) -> Result<Transaction>;
}

/// Adds a single vkey witness over the body hash
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl TransactionSigner for Ed25519Signer {
    fn sign(&self, body: TransactionBody, key_pair: &KeyPair) -> Result<Transaction> {
        let signature = key_pair.sign(&body.hash())?;
        let witness = VkeyWitness {
            vkey: *key_pair.public.as_bytes(),
            signature,
        };
        Ok(Transaction::new(
            body,
            TransactionWitnessSet { vkey_witnesses: vec![witness] },
        ))
    }
}

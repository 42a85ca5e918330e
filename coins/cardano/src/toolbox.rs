use std::fmt;

use async_trait::async_trait;
use log::{debug, info, warn};
use walletd_traits::{
    AssetValue, Chain, ChainToolbox, TransactionResult, TxHash, WalletResult, WalletTxParams,
};

use crate::address::CardanoAddress;
use crate::balance::aggregate_balances;
use crate::builder::TransactionBuilder;
use crate::config::ToolboxConfig;
use crate::error::{CardanoError, Result};
use crate::keys::{IcarusDerivation, KeyDerivation, KeyPair};
use crate::provider::{ChainDataProvider, KoiosProvider};
use crate::selection::UtxoSelectionStrategy;
use crate::signer::{Ed25519Signer, TransactionSigner};
use crate::transaction::{Transaction, TransactionOutput};
use crate::value::Value;

const MAX_SELECTION_ROUNDS: usize = 8;

/// Cardano toolbox: keys, addresses, balances and ADA transfers
pub struct CardanoToolbox<P = KoiosProvider> {
    config: ToolboxConfig,
    provider: P,
    derivation: Box<dyn KeyDerivation>,
    signer: Box<dyn TransactionSigner>,
    selection: Box<dyn UtxoSelectionStrategy>,
}

impl CardanoToolbox<KoiosProvider> {
    /// Toolbox backed by the Koios endpoint in `config.rpc_url`
    pub fn new(config: ToolboxConfig) -> Result<Self> {
        config.validate()?;
        let provider = KoiosProvider::new(&config)?;
        Self::with_provider(config, provider)
    }
}

impl<P: ChainDataProvider> CardanoToolbox<P> {
    /// Toolbox backed by a custom data provider
    pub fn with_provider(config: ToolboxConfig, provider: P) -> Result<Self> {
        config.validate()?;
        let selection = config.selection.into();
        Ok(Self {
            config,
            provider,
            derivation: Box::new(IcarusDerivation::new()),
            signer: Box::new(Ed25519Signer),
            selection,
        })
    }

    pub fn with_key_derivation(mut self, derivation: impl KeyDerivation + 'static) -> Self {
        self.derivation = Box::new(derivation);
        self
    }

    pub fn with_signer(mut self, signer: impl TransactionSigner + 'static) -> Self {
        self.signer = Box::new(signer);
        self
    }

    pub fn with_selection_strategy(mut self, selection: impl UtxoSelectionStrategy + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn config(&self) -> &ToolboxConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Endpoint the provider talks to
    pub fn connection_endpoint(&self) -> &str {
        &self.config.rpc_url
    }

    /// Key pair at `derivation_path`, or at `m/1852'/1815'/0'/0/0` when `None`
    pub fn create_keys_for_path(&self, phrase: &str, derivation_path: Option<&str>) -> Result<KeyPair> {
        self.derivation.key_pair_from_phrase(phrase, derivation_path)
    }

    /// Enterprise address of a key pair on the configured network
    pub fn get_address_from_keys(&self, keys: &KeyPair) -> Result<CardanoAddress> {
        CardanoAddress::enterprise(keys.public.as_bytes(), self.config.network_id)
    }

    /// True if `address` is a well-formed address on the configured network
    pub fn validate_address(&self, address: &str) -> bool {
        match CardanoAddress::from_bech32(address) {
            Ok(parsed) => parsed.network_id == self.config.network_id,
            Err(_) => false,
        }
    }

    /// ADA balance followed by native token balances
    pub async fn get_balance(&self, address: &str) -> Result<Vec<AssetValue>> {
        CardanoAddress::from_bech32(address)?;
        let utxos = self.provider.fetch_utxos(address).await?;
        debug!("aggregating {} utxos for {}", utxos.len(), address);
        aggregate_balances(&utxos, self.config.token_aggregation, self.config.token_decimals)
    }

    /// Signed transaction paying `amount` lovelace to `recipient` from the
    /// key pair's enterprise address, change returned to the same address
    pub async fn create_cardano_transaction(
        &self,
        recipient: &str,
        from_keypair: &KeyPair,
        amount: u64,
    ) -> Result<Transaction> {
        let recipient = CardanoAddress::from_bech32(recipient)?;
        let sender = self.get_address_from_keys(from_keypair)?;

        let payment = TransactionOutput::new(recipient, Value::new(amount));
        let mut template = TransactionBuilder::new(self.config.protocol);
        template.add_output(payment)?;

        let utxos = self.provider.fetch_utxos(sender.to_bech32()).await?;
        debug!("fetched {} utxos for {}", utxos.len(), sender);

        // headroom for the fee and a change output on top of the payment
        let change_floor = self.config.protocol.min_ada_for_output(
            TransactionOutput::new(sender.clone(), Value::new(amount)).encoded_len(),
        )?;
        let mut reserve = self.config.protocol.min_fee(0)?.saturating_add(change_floor);

        let mut round = 1;
        loop {
            let target = Value::new(amount.saturating_add(reserve));
            let selected = self.selection.select(&utxos, &target);
            let selected_count = selected.len();

            let mut builder = template.clone();
            for utxo in selected {
                builder.add_input(utxo);
            }

            match builder.build(&sender) {
                Ok(body) => {
                    debug!(
                        "balanced {} inputs, {} outputs, fee {}",
                        body.inputs.len(),
                        body.outputs.len(),
                        body.fee
                    );
                    return self.signer.sign(body, from_keypair);
                }
                Err(err @ (CardanoError::InsufficientFunds { .. } | CardanoError::Balancing(_)))
                    if selected_count < utxos.len() && round < MAX_SELECTION_ROUNDS =>
                {
                    debug!("selection round {round} with {selected_count} inputs failed: {err}");
                    reserve = reserve.saturating_mul(2);
                    round += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Validates, builds, signs and submits a native ADA transfer
    pub async fn transfer(&self, params: WalletTxParams<'_, KeyPair>) -> Result<TransactionResult> {
        debug!("validating transfer of {} to {}", params.asset_value, params.recipient);
        if !self.validate_address(params.recipient) {
            return Err(CardanoError::InvalidRecipientAddress(params.recipient.to_string()));
        }
        let asset = params.asset_value;
        if asset.chain != Chain::Cardano || !asset.is_native() {
            return Err(CardanoError::UnsupportedAsset(asset.identifier.clone()));
        }
        let amount = u64::try_from(asset.amount.value).map_err(|_| {
            CardanoError::Balancing(format!("{} lovelace exceeds a single output", asset.amount.value))
        })?;

        debug!("building transaction");
        let tx = self
            .create_cardano_transaction(params.recipient, params.from_keypair, amount)
            .await?;

        debug!("submitting transaction {}", tx.id());
        match self.provider.submit_transaction(&tx).await {
            Ok(Some(tx_hash)) if !tx_hash.is_empty() => {
                info!("submitted transaction {tx_hash}");
                Ok(TransactionResult { tx_hash: TxHash::new(tx_hash) })
            }
            Ok(_) => {
                warn!("submission of {} returned no transaction hash", tx.id());
                Err(CardanoError::TransactionFailed(
                    "provider returned no transaction hash".to_string(),
                ))
            }
            Err(err) => {
                warn!("submission of {} failed: {}", tx.id(), err);
                Err(CardanoError::TransactionFailed(err.to_string()))
            }
        }
    }
}

impl<P> fmt::Debug for CardanoToolbox<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardanoToolbox")
            .field("rpc_url", &self.config.rpc_url)
            .field("network_id", &self.config.network_id)
            .finish()
    }
}

#[async_trait]
impl<P: ChainDataProvider> ChainToolbox for CardanoToolbox<P> {
    type KeyPair = KeyPair;

    fn chain(&self) -> Chain {
        Chain::Cardano
    }

    fn connection_endpoint(&self) -> &str {
        CardanoToolbox::connection_endpoint(self)
    }

    fn create_keys_for_path(
        &self,
        phrase: &str,
        derivation_path: Option<&str>,
    ) -> WalletResult<KeyPair> {
        Ok(CardanoToolbox::create_keys_for_path(self, phrase, derivation_path)?)
    }

    fn get_address_from_keys(&self, keys: &KeyPair) -> WalletResult<String> {
        Ok(CardanoToolbox::get_address_from_keys(self, keys)?.to_string())
    }

    fn validate_address(&self, address: &str) -> bool {
        CardanoToolbox::validate_address(self, address)
    }

    async fn get_balance(&self, address: &str) -> WalletResult<Vec<AssetValue>> {
        Ok(CardanoToolbox::get_balance(self, address).await?)
    }

    async fn transfer(
        &self,
        params: WalletTxParams<'_, KeyPair>,
    ) -> WalletResult<TransactionResult> {
        Ok(CardanoToolbox::transfer(self, params).await?)
    }
}

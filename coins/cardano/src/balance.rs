//! UTXO balance aggregation into chain-agnostic asset values.

use std::collections::HashMap;

use walletd_traits::{AssetValue, Chain};

use crate::config::TokenAggregation;
use crate::error::{CardanoError, Result};
use crate::transaction::Utxo;
use crate::value::{AssetName, PolicyId};

/// `ADA.<name>-<policy hex>`
pub fn token_identifier(policy: &PolicyId, name: &AssetName) -> String {
    format!("{}.{}-{}", Chain::Cardano.symbol(), name.display_name(), policy)
}

/// Native balance first, then token balances in UTXO iteration order.
///
/// Sums are exact `u128` integers. With [`TokenAggregation::Merged`] each
/// asset appears once, positioned by its first occurrence; with
/// [`TokenAggregation::PerUtxo`] every occurrence is reported on its own.
pub fn aggregate_balances(
    utxos: &[Utxo],
    aggregation: TokenAggregation,
    token_decimals: u8,
) -> Result<Vec<AssetValue>> {
    let overflow = || CardanoError::Balancing("balance overflow".to_string());

    let lovelace = utxos.iter().try_fold(0u128, |acc, utxo| {
        acc.checked_add(utxo.output.amount.coin as u128)
    });
    let mut balances = vec![AssetValue::native(Chain::Cardano, lovelace.ok_or_else(overflow)?)];

    match aggregation {
        TokenAggregation::PerUtxo => {
            for utxo in utxos {
                for (policy, name, quantity) in utxo.output.amount.assets() {
                    balances.push(AssetValue::token(
                        Chain::Cardano,
                        token_identifier(policy, name),
                        quantity as u128,
                        token_decimals,
                    ));
                }
            }
        }
        TokenAggregation::Merged => {
            let mut order: Vec<(&PolicyId, &AssetName)> = Vec::new();
            let mut totals: HashMap<(&PolicyId, &AssetName), u128> = HashMap::new();
            for utxo in utxos {
                for (policy, name, quantity) in utxo.output.amount.assets() {
                    let total = totals.entry((policy, name)).or_insert_with(|| {
                        order.push((policy, name));
                        0
                    });
                    *total = total.checked_add(quantity as u128).ok_or_else(overflow)?;
                }
            }
            for key in order {
                balances.push(AssetValue::token(
                    Chain::Cardano,
                    token_identifier(key.0, key.1),
                    totals[&key],
                    token_decimals,
                ));
            }
        }
    }

    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::CardanoAddress;
    use crate::transaction::{TransactionInput, TransactionOutput};
    use crate::value::Value;

    fn utxo(index: u32, amount: Value) -> Utxo {
        Utxo {
            input: TransactionInput::new([6u8; 32], index),
            output: TransactionOutput::new(
                CardanoAddress::enterprise(&[0u8; 32], 1).unwrap(),
                amount,
            ),
        }
    }

    fn hosky() -> (PolicyId, AssetName) {
        (PolicyId([0xa0; 28]), AssetName::new(b"HOSKY".to_vec()).unwrap())
    }

    fn with_token(coin: u64, policy: PolicyId, name: AssetName, qty: u64) -> Value {
        Value::new(coin).with_asset(policy, name, qty).unwrap()
    }

    #[test]
    fn test_identifier_format() {
        let (policy, name) = hosky();
        assert_eq!(token_identifier(&policy, &name), format!("ADA.HOSKY-{}", "a0".repeat(28)));

        let binary = AssetName::new(vec![0x00, 0x01]).unwrap();
        assert_eq!(token_identifier(&policy, &binary), format!("ADA.0001-{}", "a0".repeat(28)));
    }

    #[test]
    fn test_empty_utxo_set() {
        let balances = aggregate_balances(&[], TokenAggregation::Merged, 6).unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].identifier, "ADA.ADA");
        assert!(balances[0].amount.is_zero());
    }

    #[test]
    fn test_native_sum() {
        let utxos = vec![utxo(0, Value::new(1_000_000)), utxo(1, Value::new(2_500_000))];
        let balances = aggregate_balances(&utxos, TokenAggregation::Merged, 6).unwrap();
        assert_eq!(balances[0].amount.value, 3_500_000);
        assert_eq!(balances[0].amount.decimals, 6);
    }

    #[test]
    fn test_native_sum_beyond_u64() {
        let utxos = vec![utxo(0, Value::new(u64::MAX)), utxo(1, Value::new(u64::MAX))];
        let balances = aggregate_balances(&utxos, TokenAggregation::Merged, 6).unwrap();
        assert_eq!(balances[0].amount.value, 2 * u64::MAX as u128);
    }

    #[test]
    fn test_per_utxo_reports_each_occurrence() {
        let (policy, name) = hosky();
        let utxos = vec![
            utxo(0, with_token(1_500_000, policy, name.clone(), 100)),
            utxo(1, with_token(1_500_000, policy, name.clone(), 250)),
        ];
        let balances = aggregate_balances(&utxos, TokenAggregation::PerUtxo, 6).unwrap();
        let tokens: Vec<u128> = balances[1..].iter().map(|b| b.amount.value).collect();
        assert_eq!(tokens, vec![100, 250]);
        assert_eq!(balances[1].identifier, balances[2].identifier);
    }

    #[test]
    fn test_merged_sums_occurrences() {
        let (policy, name) = hosky();
        let utxos = vec![
            utxo(0, with_token(1_500_000, policy, name.clone(), 100)),
            utxo(1, with_token(1_500_000, policy, name.clone(), 250)),
        ];
        let balances = aggregate_balances(&utxos, TokenAggregation::Merged, 6).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[1].amount.value, 350);
        assert_eq!(balances[1].amount.decimals, 6);
    }

    #[test]
    fn test_merged_keeps_first_appearance_order() {
        let (policy, name) = hosky();
        let other = PolicyId([0x01; 28]);
        let utxos = vec![
            utxo(0, with_token(1_000_000, policy, name.clone(), 1)),
            utxo(1, with_token(1_000_000, other, name.clone(), 2)),
            utxo(2, with_token(1_000_000, policy, name.clone(), 3)),
        ];
        let balances = aggregate_balances(&utxos, TokenAggregation::Merged, 6).unwrap();
        let ids: Vec<&str> = balances.iter().map(|b| b.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ADA.ADA".to_string(),
                token_identifier(&policy, &name),
                token_identifier(&other, &name),
            ]
        );
        assert_eq!(balances[1].amount.value, 4);
    }

    #[test]
    fn test_every_asset_under_a_policy_reported() {
        let (policy, name) = hosky();
        let second = AssetName::new(b"WOOF".to_vec()).unwrap();
        let value = with_token(2_000_000, policy, name, 5)
            .with_asset(policy, second, 9)
            .unwrap();
        let balances = aggregate_balances(&[utxo(0, value)], TokenAggregation::Merged, 2).unwrap();
        assert_eq!(balances.len(), 3);
        assert!(balances[1..].iter().all(|b| b.amount.decimals == 2));
    }
}

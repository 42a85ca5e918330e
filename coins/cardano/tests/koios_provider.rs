use serde_json::json;
use walletd_cardano_toolbox::{
    CardanoAddress, CardanoError, ChainDataProvider, KoiosProvider, ToolboxConfig, Transaction,
    TransactionBody, TransactionInput, TransactionOutput, Value, KOIOS_PAGE_SIZE,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> KoiosProvider {
    let config = ToolboxConfig::preview().with_rpc_url(format!("{}/api/v1", server.uri()));
    KoiosProvider::new(&config).unwrap()
}

fn address() -> String {
    CardanoAddress::enterprise(&[9u8; 32], 0).unwrap().to_string()
}

fn transaction() -> Transaction {
    let body = TransactionBody {
        inputs: vec![TransactionInput::new([1u8; 32], 0)],
        outputs: vec![TransactionOutput::new(
            CardanoAddress::enterprise(&[2u8; 32], 0).unwrap(),
            Value::new(1_000_000),
        )],
        fee: 170_000,
        ttl: None,
    };
    Transaction::new(body, Default::default())
}

#[tokio::test]
async fn test_fetch_utxos_parses_extended_response() {
    let server = MockServer::start().await;
    let address = address();

    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .and(body_json(json!({ "_addresses": [address], "_extended": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "tx_hash": "aa".repeat(32),
                "tx_index": 0,
                "address": address,
                "value": "1500000",
                "asset_list": []
            },
            {
                "tx_hash": "bb".repeat(32),
                "tx_index": 3,
                "address": address,
                "value": "2000000",
                "block_height": 100,
                "asset_list": [
                    { "policy_id": "cc".repeat(28), "asset_name": "484f534b59", "fingerprint": "asset1", "decimals": 0, "quantity": "250" }
                ]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let utxos = provider(&server).fetch_utxos(&address).await.unwrap();
    assert_eq!(utxos.len(), 2);
    assert_eq!(utxos[0].output.amount.coin, 1_500_000);
    assert!(utxos[0].output.amount.is_pure_coin());
    assert_eq!(utxos[1].input.index, 3);
    assert_eq!(utxos[1].output.amount.assets().count(), 1);
    assert_eq!(utxos[1].output.address.to_bech32(), address);
}

fn utxo_rows(address: &str, first_index: u32, count: u32) -> serde_json::Value {
    let rows: Vec<_> = (first_index..first_index + count)
        .map(|i| {
            json!({
                "tx_hash": "dd".repeat(32),
                "tx_index": i,
                "address": address,
                "value": "1000000",
                "asset_list": []
            })
        })
        .collect();
    json!(rows)
}

#[tokio::test]
async fn test_fetch_utxos_follows_pages() {
    let server = MockServer::start().await;
    let address = address();

    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(utxo_rows(&address, 0, 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .and(query_param("offset", "2"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(utxo_rows(&address, 2, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let utxos = provider(&server).with_page_size(2).fetch_utxos(&address).await.unwrap();
    let indices: Vec<u32> = utxos.iter().map(|u| u.input.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_fetch_utxos_full_default_page_requests_next() {
    let server = MockServer::start().await;
    let address = address();
    let full = KOIOS_PAGE_SIZE as u32;

    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(utxo_rows(&address, 0, full)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .and(query_param("offset", full.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(utxo_rows(&address, full, 500)))
        .expect(1)
        .mount(&server)
        .await;

    let utxos = provider(&server).fetch_utxos(&address).await.unwrap();
    assert_eq!(utxos.len(), 1_500);
    assert_eq!(utxos[1_499].input.index, 1_499);
}

#[tokio::test]
async fn test_fetch_utxos_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let utxos = provider(&server).fetch_utxos(&address()).await.unwrap();
    assert!(utxos.is_empty());
}

#[tokio::test]
async fn test_fetch_utxos_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/address_utxos"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch_utxos(&address()).await.unwrap_err();
    assert!(matches!(err, CardanoError::Provider(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_submit_sends_cbor_and_reads_hash() {
    let server = MockServer::start().await;
    let tx = transaction();

    Mock::given(method("POST"))
        .and(path("/api/v1/submittx"))
        .and(header("content-type", "application/cbor"))
        .respond_with(ResponseTemplate::new(202).set_body_string(format!("\"{}\"", tx.id())))
        .expect(1)
        .mount(&server)
        .await;

    let hash = provider(&server).submit_transaction(&tx).await.unwrap();
    assert_eq!(hash, Some(tx.id()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, tx.to_cbor());
}

#[tokio::test]
async fn test_submit_empty_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submittx"))
        .respond_with(ResponseTemplate::new(202).set_body_string(""))
        .mount(&server)
        .await;

    let hash = provider(&server).submit_transaction(&transaction()).await.unwrap();
    assert_eq!(hash, None);
}

#[tokio::test]
async fn test_submit_rejection_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submittx"))
        .respond_with(ResponseTemplate::new(400).set_body_string("BadInputsUTxO"))
        .mount(&server)
        .await;

    let err = provider(&server).submit_transaction(&transaction()).await.unwrap_err();
    assert!(matches!(err, CardanoError::Provider(ref m) if m.contains("BadInputsUTxO")));
}

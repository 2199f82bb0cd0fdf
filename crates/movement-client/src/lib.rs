//! Movement network (Aptos-compatible) ledger client.
//!
//! Provides locally held ed25519 accounts, a [`LedgerClient`] trait with an
//! HTTP implementation, and a typed wrapper over the phone registry contract.

mod account;
mod client;
mod contract;
mod error;
mod ledger;
mod types;
pub mod units;

pub use account::{derive_address, LocalAccount};
pub use client::MovementClient;
pub use contract::{PhoneRegistryContract, PHONE_ALREADY_REGISTERED};
pub use error::MovementError;
pub use ledger::LedgerClient;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDRESS: &str = "0x7a9ea50052a16a735b75491d961ac61d9eae45584c1f789a4d93d99132c240a9";

    fn create_test_client(mock_server: &MockServer) -> MovementClient {
        MovementClient::new(
            mock_server.uri(),
            Some(format!("{}/faucet", mock_server.uri())),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_polling(Duration::from_millis(10), Duration::from_millis(500))
    }

    fn committed_transaction(hash: &str) -> serde_json::Value {
        json!({
            "type": "user_transaction",
            "hash": hash,
            "version": "42",
            "success": true,
            "vm_status": "Executed successfully"
        })
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/-/healthy"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/-/healthy"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_balance_reads_coin_store() {
        let mock_server = MockServer::start().await;

        let resources = json!([
            { "type": "0x1::account::Account", "data": { "sequence_number": "3" } },
            { "type": COIN_STORE, "data": { "coin": { "value": "150000000" } } }
        ]);

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/resources", ADDRESS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(&resources))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.balance(ADDRESS).await.unwrap(), 150_000_000);
    }

    #[tokio::test]
    async fn test_balance_of_unknown_account_is_zero() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}/resources", ADDRESS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Account not found",
                "error_code": "account_not_found"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert_eq!(client.balance(ADDRESS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_view() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/view"))
            .and(body_partial_json(json!({ "function": "0x1::m::total" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["7"])))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client
            .view(&ViewRequest::new("0x1::m::total", vec![]))
            .await
            .unwrap();
        assert_eq!(result, vec![json!("7")]);
    }

    #[tokio::test]
    async fn test_view_error_surfaces_api_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/view"))
            .respond_with(ResponseTemplate::new(400).set_body_string("function not found"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.view(&ViewRequest::new("0x1::m::missing", vec![])).await;
        assert!(matches!(
            result,
            Err(MovementError::Api { status: 400, ref message }) if message.contains("not found")
        ));
    }

    #[tokio::test]
    async fn test_transfer_signs_and_waits() {
        let mock_server = MockServer::start().await;
        let account = LocalAccount::generate();

        Mock::given(method("GET"))
            .and(path(format!("/accounts/{}", account.address())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sequence_number": "5",
                "authentication_key": account.address()
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/transactions/encode_submission"))
            .and(body_partial_json(json!({ "sequence_number": "5" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("0xdeadbeef")))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/transactions"))
            .and(body_partial_json(json!({
                "sender": account.address(),
                "payload": {
                    "type": "entry_function_payload",
                    "function": TRANSFER_FUNCTION,
                    "arguments": [ADDRESS, "1000"]
                },
                "signature": {
                    "type": "ed25519_signature",
                    "public_key": account.public_key_hex(),
                    "signature": account.sign(&[0xde, 0xad, 0xbe, 0xef])
                }
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "hash": "0xabc" })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/transactions/by_hash/0xabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(committed_transaction("0xabc")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let tx = client.transfer(&account, ADDRESS, 1000).await.unwrap();
        assert_eq!(tx.hash, "0xabc");
        assert_eq!(tx.success, Some(true));
    }

    #[tokio::test]
    async fn test_wait_reports_failed_transaction() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/transactions/by_hash/0xbad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "user_transaction",
                "hash": "0xbad",
                "success": false,
                "vm_status": "Move abort: EINSUFFICIENT_BALANCE"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.wait_for_transaction("0xbad").await;
        assert!(matches!(
            result,
            Err(MovementError::TransactionFailed { ref vm_status, .. }) if vm_status.contains("EINSUFFICIENT")
        ));
    }

    #[tokio::test]
    async fn test_wait_times_out_on_pending() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/transactions/by_hash/0xslow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "pending_transaction",
                "hash": "0xslow"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.wait_for_transaction("0xslow").await;
        assert!(matches!(result, Err(MovementError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fund_account() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/faucet/mint"))
            .and(query_param("address", ADDRESS))
            .and(query_param("amount", "100000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["0xf1"])))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/transactions/by_hash/0xf1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(committed_transaction("0xf1")))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let hashes = client.fund_account(ADDRESS, 100_000_000).await.unwrap();
        assert_eq!(hashes, vec!["0xf1"]);
    }

    #[tokio::test]
    async fn test_fund_without_faucet() {
        let mock_server = MockServer::start().await;
        let client = MovementClient::new(mock_server.uri(), None, Duration::from_secs(5)).unwrap();

        let result = client.fund_account(ADDRESS, 1).await;
        assert!(matches!(result, Err(MovementError::FaucetUnavailable)));
    }
}

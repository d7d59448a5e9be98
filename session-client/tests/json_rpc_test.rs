// session-client/tests/json_rpc_test.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer};
use serde_json::{json, Value};
use session_client::wallet::{EventKind, JsonRpcProvider, ProviderEvent, WalletError, WalletProvider};

/// Minimal node: no eth_requestAccounts, switchable account list
struct Node {
    accounts: Mutex<Vec<String>>,
}

async fn rpc(node: web::Data<Node>, body: web::Json<Value>) -> HttpResponse {
    let id = body["id"].clone();
    let mut reply = match body["method"].as_str() {
        Some("eth_accounts") => json!({ "result": node.accounts.lock().unwrap().clone() }),
        Some("eth_getBalance") => json!({ "result": "0x1bc16d674ec80000" }),
        Some("eth_chainId") => json!({ "result": "0xaa36a7" }),
        _ => json!({ "error": { "code": -32601, "message": "Method not found" } }),
    };

    reply["jsonrpc"] = json!("2.0");
    reply["id"] = id;
    HttpResponse::Ok().json(reply)
}

async fn spawn_node(node: Arc<Node>) -> String {
    let data = web::Data::from(node);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/", web::post().to(rpc))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind stub node");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}/", addr)
}

fn node_with(accounts: &[&str]) -> Arc<Node> {
    Arc::new(Node {
        accounts: Mutex::new(accounts.iter().map(|a| a.to_string()).collect()),
    })
}

#[actix_web::test]
async fn test_reads_accounts_balance_and_network() {
    let url = spawn_node(node_with(&["0xabc"])).await;
    let provider = JsonRpcProvider::new(&url, Duration::from_secs(1)).unwrap();

    // eth_requestAccounts is unsupported, so eth_accounts answers
    assert_eq!(provider.request_accounts().await.unwrap(), vec!["0xabc".to_string()]);
    assert_eq!(provider.balance_of("0xabc").await.unwrap(), 2_000_000_000_000_000_000);

    let network = provider.network().await.unwrap();
    assert_eq!(network.chain_id, 11155111);
    assert_eq!(network.name, "sepolia");
}

#[actix_web::test]
async fn test_polling_reports_account_changes() {
    let node = node_with(&["0xabc"]);
    let url = spawn_node(node.clone()).await;
    let provider = JsonRpcProvider::new(&url, Duration::from_millis(50)).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let id = provider.on(
        EventKind::AccountsChanged,
        Arc::new(move |event| sink.lock().unwrap().push(event)),
    );

    // Let the watcher record its baseline
    tokio::time::sleep(Duration::from_millis(150)).await;
    node.accounts.lock().unwrap().clear();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        events.lock().unwrap().first(),
        Some(&ProviderEvent::AccountsChanged(vec![]))
    );

    provider.remove_listener(id);
}

#[actix_web::test]
async fn test_unreachable_node_is_transport_error() {
    let provider = JsonRpcProvider::new("http://127.0.0.1:1/", Duration::from_secs(1)).unwrap();

    let err = provider.network().await.unwrap_err();
    assert!(matches!(err, WalletError::Transport(_)));
    assert_eq!(err.to_api_error().status, 500);
}

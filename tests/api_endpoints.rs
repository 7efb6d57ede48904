//! Integration tests for the HTTP request layer
//!
//! These tests drive every route through an in-process server and check the
//! JSON shapes and status codes the routes promise.

#![cfg(feature = "api")]

use axum_test::TestServer;
use precursor_ledger::api::build_api_router;
use precursor_ledger::miner::{PowTarget, ProofOfWork};
use precursor_ledger::node::Node;
use precursor_ledger::persistence::{InMemoryPersistence, Persistence};
use serde_json::{json, Value};
use std::sync::Arc;

fn transaction_body() -> Value {
    json!({
        "sender_urn": "urn:org:supplier",
        "recipient_urn": "urn:org:warehouse",
        "chemical_urn": "urn:cas:7664-93-9",
        "quantity": 20,
        "unit": "L",
        "event_type": "RECEIVE",
        "details": {"invoice": "INV-001"}
    })
}

fn test_server(pow_target: PowTarget) -> (TestServer, InMemoryPersistence) {
    let storage = InMemoryPersistence::new();
    let node = Node::bootstrap(ProofOfWork::new(2, pow_target), Arc::new(storage.clone()))
        .expect("Failed to bootstrap node");
    let app = build_api_router(Arc::new(node));
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, storage)
}

#[tokio::test]
async fn test_fresh_node_endpoints() {
    let (server, _storage) = test_server(PowTarget::PreviousHash);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["length"], 1);

    let response = server.get("/get_chain").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["length"], 1);
    assert_eq!(json["chain"][0]["index"], 0);
    assert_eq!(json["chain"][0]["previous_hash"], "0");
    assert!(json["chain"][0]["hash"].is_string());

    let response = server.get("/get_pending_transactions").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["count"], 0);
    assert!(json["pending_transactions"].as_array().unwrap().is_empty());

    let response = server.get("/is_valid").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["message"], "The blockchain is valid.");
}

#[tokio::test]
async fn test_mine_with_empty_pool() {
    let (server, storage) = test_server(PowTarget::PreviousHash);

    let response = server.get("/mine_block").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(
        json["message"],
        "No pending transactions to mine. Add some transactions first!"
    );
    assert!(storage.raw().is_none());
}

#[tokio::test]
async fn test_submit_and_mine() {
    let (server, storage) = test_server(PowTarget::BlockHash);

    let response = server.post("/add_transaction").json(&transaction_body()).await;
    assert_eq!(response.status_code(), 201);
    let json: Value = response.json();
    assert_eq!(json["message"], "Transaction will be added to Block 1");

    let json: Value = server.get("/get_pending_transactions").await.json();
    assert_eq!(json["count"], 1);
    let pending = &json["pending_transactions"][0];
    assert_eq!(pending["chemical_urn"], "urn:cas:7664-93-9");
    assert!(pending["timestamp"].is_string());

    let response = server.get("/mine_block").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["message"], "New Block Forged!");
    assert_eq!(json["index"], 1);
    assert_eq!(json["transactions"].as_array().unwrap().len(), 1);
    assert!(json["nonce"].is_u64());
    assert!(json["hash"].as_str().unwrap().starts_with("00"));

    let json: Value = server.get("/get_chain").await.json();
    assert_eq!(json["length"], 2);
    assert_eq!(json["chain"][1]["previous_hash"], json["chain"][0]["hash"]);

    let json: Value = server.get("/get_pending_transactions").await.json();
    assert_eq!(json["count"], 0);

    let json: Value = server.get("/is_valid").await.json();
    assert_eq!(json["valid"], true);

    // Mining saved the chain.
    assert_eq!(storage.load_chain().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_fields_rejected() {
    let (server, _storage) = test_server(PowTarget::PreviousHash);

    let mut body = transaction_body();
    body.as_object_mut().unwrap().remove("chemical_urn");

    let response = server.post("/add_transaction").json(&body).expect_failure().await;
    assert_eq!(response.status_code(), 400);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("chemical_urn"));

    let json: Value = server.get("/get_pending_transactions").await.json();
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_validity_reports_reason() {
    let (server, storage) = test_server(PowTarget::BlockHash);
    server.post("/add_transaction").json(&transaction_body()).await;
    server.get("/mine_block").await;

    // Tamper with the stored chain and start a node on it.
    let mut stored: Value = serde_json::from_slice(&storage.raw().unwrap()).unwrap();
    stored[1]["transactions"][0]["quantity"] = json!(21);
    storage.set_raw(serde_json::to_vec(&stored).unwrap());

    let node = Node::bootstrap(ProofOfWork::new(2, PowTarget::BlockHash), Arc::new(storage))
        .expect("Failed to bootstrap node");
    let server = TestServer::new(build_api_router(Arc::new(node))).unwrap();

    let json: Value = server.get("/is_valid").await.json();
    assert_eq!(json["valid"], false);
    assert_eq!(json["message"], "The blockchain is NOT valid! Tampering detected.");
    assert!(json["reason"].as_str().unwrap().contains("hash mismatch"));
}

//! HTTP request layer for the ledger
//!
//! Thin routes over [`Node`]: request parsing, status codes and response
//! shapes live here, ledger semantics do not.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::blockchain::{Block, MineOutcome};
use crate::error::ChainError;
use crate::node::Node;
use crate::transaction::{parse_submission, Transaction};

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(ChainError::InvalidTransaction(msg)) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::BlockchainError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
pub struct MinedBlockResponse {
    pub message: String,
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub hash: String,
    pub previous_hash: String,
}

impl From<Block> for MinedBlockResponse {
    fn from(block: Block) -> Self {
        MinedBlockResponse {
            message: "New Block Forged!".to_string(),
            index: block.index(),
            timestamp: block.timestamp().to_string(),
            transactions: block.transactions().to_vec(),
            nonce: block.nonce(),
            hash: block.hash().to_string(),
            previous_hash: block.previous_hash().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidityResponse {
    pub message: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub pending_transactions: Vec<Transaction>,
    pub count: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints.
pub fn build_api_router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/mine_block", get(mine_block))
        .route("/add_transaction", post(add_transaction))
        .route("/get_chain", get(get_chain))
        .route("/is_valid", get(is_valid))
        .route("/get_pending_transactions", get(get_pending_transactions))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(CorsLayer::permissive())
}

pub async fn run_api_server(node: Arc<Node>, addr: SocketAddr) -> Result<(), ChainError> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn mine_block(State(node): State<Arc<Node>>) -> Result<Response, ApiError> {
    match node.mine().await? {
        MineOutcome::NoOp => Ok(Json(MessageResponse {
            message: "No pending transactions to mine. Add some transactions first!".to_string(),
        })
        .into_response()),
        MineOutcome::Mined(block) => Ok(Json(MinedBlockResponse::from(block)).into_response()),
    }
}

async fn add_transaction(
    State(node): State<Arc<Node>>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let fields = parse_submission(&body)?;
    let index = node.submit_transaction(fields).await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {}", index),
        }),
    ))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let chain = node.chain().await;
    Json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

async fn is_valid(State(node): State<Arc<Node>>) -> Json<ValidityResponse> {
    let response = match node.validate().await {
        Ok(()) => ValidityResponse {
            message: "The blockchain is valid.".to_string(),
            valid: true,
            reason: None,
        },
        Err(failure) => ValidityResponse {
            message: "The blockchain is NOT valid! Tampering detected.".to_string(),
            valid: false,
            reason: Some(failure.to_string()),
        },
    };
    Json(response)
}

async fn get_pending_transactions(State(node): State<Arc<Node>>) -> Json<PendingResponse> {
    let pending = node.pending().await;
    Json(PendingResponse {
        count: pending.len(),
        pending_transactions: pending,
    })
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "length": node.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

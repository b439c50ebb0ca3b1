//! Shared helpers for integration tests: an in-process server on an
//! ephemeral port.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use yield_pool_gateway::api;
use yield_pool_gateway::app_state::AppState;
use yield_pool_gateway::domain::{EventBus, PoolRegistry, Principal, RegistrySettings};
use yield_pool_gateway::service::{ChainClock, PoolService};

/// Verified pool creator.
pub const CREATOR: &str = "ST1TEST";
/// Governance address used by the fixtures.
pub const GOVERNANCE: &str = "ST2GOV";
/// Participant without creator rights.
pub const ALICE: &str = "ST3ALICE";

/// A running gateway.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Starts a gateway with default registry settings at block height 0.
    pub async fn spawn() -> Self {
        let registry =
            PoolRegistry::in_memory(RegistrySettings::default(), [Principal::new(CREATOR)]);
        let service = Arc::new(PoolService::new(
            registry,
            ChainClock::new(0),
            EventBus::new(256),
        ));
        let app = api::build_app(AppState::new(service));

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind ephemeral port");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            client: reqwest::Client::new(),
        }
    }

    /// Absolute URL of `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Sends a request and returns the status code and JSON body.
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(caller) = caller {
            request = request.header("x-principal", caller);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        self.call(reqwest::Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, caller: Option<&str>, body: Value) -> (u16, Value) {
        self.call(reqwest::Method::POST, path, caller, Some(body))
            .await
    }

    pub async fn put(&self, path: &str, caller: Option<&str>, body: Value) -> (u16, Value) {
        self.call(reqwest::Method::PUT, path, caller, Some(body)).await
    }

    pub async fn set_height(&self, height: u64) {
        let (status, _) = self
            .post("/api/v1/chain/height", None, json!({ "height": height }))
            .await;
        assert_eq!(status, 200);
    }

    pub async fn set_governance(&self) {
        let (status, _) = self
            .post(
                "/api/v1/governance/address",
                None,
                json!({ "address": GOVERNANCE }),
            )
            .await;
        assert_eq!(status, 201);
    }

    /// Creates the reference pool and returns its id.
    pub async fn create_alpha_pool(&self) -> u64 {
        let (status, body) = self
            .post("/api/v1/pools", Some(CREATOR), alpha_pool())
            .await;
        assert_eq!(status, 201, "{body}");
        let Some(id) = body["pool_id"].as_u64() else {
            panic!("pool_id missing: {body}");
        };
        id
    }
}

/// Creation request of the reference pool.
pub fn alpha_pool() -> Value {
    json!({
        "name": "AlphaPool",
        "min_deposit": "100",
        "max_deposit": "10000",
        "yield_rate": 5,
        "duration": 30,
        "penalty": 2,
        "threshold": 50,
        "pool_type": "lending",
        "interest_rate": 10,
        "lock_period": 7,
        "currency": "STX",
        "defi_protocol": "alex",
    })
}

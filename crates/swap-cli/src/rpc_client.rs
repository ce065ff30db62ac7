use anyhow::{bail, Context};
use serde::de::DeserializeOwned;

use swap_rpc::{RpcEscrow, RpcJournalEntry, RpcOrder};

/// Simple JSON-RPC 2.0 client used by the CLI to talk to a running
/// coordinator. Uses raw HTTP POST with serde_json rather than the full
/// jsonrpsee client to keep this binary lean and dependency-minimal.
pub struct CliRpcClient {
    url: String,
    client: reqwest::Client,
}

impl CliRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to coordinator at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }

    async fn call_into<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).with_context(|| format!("parsing {method} response"))
    }

    pub async fn list_orders(&self, state: Option<String>) -> anyhow::Result<Vec<RpcOrder>> {
        self.call_into("swap_listOrders", serde_json::json!([state])).await
    }

    pub async fn get_order(&self, order_hash: &str) -> anyhow::Result<Option<RpcOrder>> {
        self.call_into("swap_getOrder", serde_json::json!([order_hash])).await
    }

    pub async fn get_escrows_for_order(&self, order_hash: &str) -> anyhow::Result<Vec<RpcEscrow>> {
        self.call_into("swap_getEscrowsForOrder", serde_json::json!([order_hash])).await
    }

    pub async fn get_journal(&self, order_hash: &str) -> anyhow::Result<Option<RpcJournalEntry>> {
        self.call_into("swap_getJournal", serde_json::json!([order_hash])).await
    }

    pub async fn force_cancel(&self, order_hash: &str) -> anyhow::Result<u32> {
        self.call_into("swap_forceCancel", serde_json::json!([order_hash])).await
    }

    pub async fn replay_from(&self, seq: u64) -> anyhow::Result<u64> {
        self.call_into("swap_replayFrom", serde_json::json!([seq])).await
    }
}

//! Advisory call-volume bookkeeping.
//!
//! Every weather lookup bumps a counter that lives for a rolling 30-day window.
//! Nothing is ever rejected based on the count.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use crate::clock::{Clock, SystemClock};

pub const WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

const KEY_COUNT: &str = "api_call_count";
const KEY_WINDOW_START: &str = "api_window_start";
const KEY_LAST_CALL: &str = "api_last_call";

/// Minimal expiring key-value store, modeled on the Redis commands we need.
#[async_trait]
pub trait CounterStore: Send + Sync + Debug {
    /// Current value, `None` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: i64) -> Result<()>;

    /// Increment by one, keeping any existing expiry. Returns the new value.
    async fn incr(&self, key: &str) -> Result<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCounterState {
    pub count: i64,
    pub window_start_unix: Option<i64>,
    pub last_call_unix: Option<i64>,
}

#[derive(Clone)]
pub struct CallVolumeCounter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
}

impl Debug for CallVolumeCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallVolumeCounter").field("store", &self.store).finish()
    }
}

impl CallVolumeCounter {
    pub fn new(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: Arc<dyn CounterStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// Record one weather call. Store failures are logged and swallowed.
    pub async fn record_call(&self) {
        if let Err(e) = self.try_record_call().await {
            tracing::warn!("Failed to record weather call: {e:#}");
        }
    }

    async fn try_record_call(&self) -> Result<()> {
        let now = self.clock.now_unix();
        let count = self.store.get(KEY_COUNT).await?.unwrap_or(0);

        if count == 0 {
            self.store.set_ex(KEY_COUNT, WINDOW_SECS, 1).await?;
            self.store.set_ex(KEY_WINDOW_START, WINDOW_SECS, now).await?;
            tracing::debug!("Started a new call-volume window");
        } else {
            let count = self.store.incr(KEY_COUNT).await?;
            tracing::debug!(count, "Recorded weather call");
        }

        self.store.set_ex(KEY_LAST_CALL, WINDOW_SECS, now).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<CallCounterState> {
        Ok(CallCounterState {
            count: self.store.get(KEY_COUNT).await?.unwrap_or(0),
            window_start_unix: self.store.get(KEY_WINDOW_START).await?,
            last_call_unix: self.store.get(KEY_LAST_CALL).await?,
        })
    }
}

/// In-process store; expiry is judged against the injected clock.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, (i64, Option<i64>)>>>,
    clock: Arc<dyn Clock>,
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").field("keys", &self.entries.lock().len()).finish()
    }
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), clock }
    }

    fn live_value(
        &self,
        entries: &mut HashMap<String, (i64, Option<i64>)>,
        key: &str,
    ) -> Option<(i64, Option<i64>)> {
        let now = self.clock.now_unix();
        match entries.get(key).copied() {
            Some((_, Some(expires_at))) if expires_at <= now => {
                entries.remove(key);
                None
            }
            live => live,
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let mut entries = self.entries.lock();
        Ok(self.live_value(&mut entries, key).map(|(value, _)| value))
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: i64) -> Result<()> {
        let ttl = i64::try_from(ttl_secs).context("TTL does not fit in i64")?;
        let expires_at = self.clock.now_unix() + ttl;
        self.entries.lock().insert(key.to_string(), (value, Some(expires_at)));
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entries = self.entries.lock();
        let (value, expires_at) = self.live_value(&mut entries, key).unwrap_or((0, None));
        let value = value + 1;
        entries.insert(key.to_string(), (value, expires_at));
        Ok(value)
    }
}

/// Upstash Redis over its REST API (`/get`, `/setex`, `/incr`).
#[derive(Debug, Clone)]
pub struct UpstashStore {
    base_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct UpstashResponse {
    result: Option<serde_json::Value>,
    error: Option<String>,
}

impl UpstashStore {
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Upstash")?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), token, http })
    }

    async fn command(&self, path: &str, post: bool) -> Result<Option<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);
        let req = if post { self.http.post(&url) } else { self.http.get(&url) };

        let res = req
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("Failed to send Upstash command {path}"))?;

        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("Upstash error: {status}"));
        }

        let body: UpstashResponse =
            res.json().await.context("Failed to parse Upstash response JSON")?;

        if let Some(err) = body.error {
            return Err(anyhow!("Upstash error: {err}"));
        }

        Ok(body.result.filter(|v| !v.is_null()))
    }
}

/// Redis replies with integers for INCR and strings for GET.
fn as_i64(value: &serde_json::Value) -> Result<i64> {
    match value {
        serde_json::Value::Number(n) => {
            n.as_i64().ok_or_else(|| anyhow!("Upstash value {n} is not an integer"))
        }
        serde_json::Value::String(s) => {
            s.parse().with_context(|| format!("Upstash value '{s}' is not an integer"))
        }
        other => Err(anyhow!("Unexpected Upstash value: {other}")),
    }
}

#[async_trait]
impl CounterStore for UpstashStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        self.command(&format!("/get/{key}"), false).await?.as_ref().map(as_i64).transpose()
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: i64) -> Result<()> {
        self.command(&format!("/setex/{key}/{ttl_secs}/{value}"), true).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let value = self
            .command(&format!("/incr/{key}"), true)
            .await?
            .ok_or_else(|| anyhow!("Upstash INCR returned no value"))?;
        as_i64(&value)
    }
}

//! True-randomness oracle backed by random.org.
//!
//! Rolling must stay synchronous and fast, so the oracle never calls the
//! network itself. A background task keeps a pool of uniform fractions
//! topped up; each die consumes one fraction. When the pool runs dry or the
//! service is down, rolls degrade to `0` with a warning.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::DiceError;
use crate::expr::DiceExpr;
use crate::oracle::{DiceOracle, total};

/// Public JSON-RPC endpoint of random.org.
pub const RANDOM_ORG_ENDPOINT: &str = "https://api.random.org/json-rpc/1/invoke";

/// Most values random.org returns for one request.
pub const RANDOM_ORG_MAX_BATCH: usize = 10_000;

/// A source of uniform fractions in `[0, 1)`.
#[async_trait]
pub trait EntropySource: Send + Sync {
    /// Fetches `count` fractions.
    ///
    /// # Errors
    ///
    /// Returns `DiceError::Backend` when the source is unreachable or refuses.
    async fn fetch(&self, count: usize) -> Result<Vec<f64>, DiceError>;
}

/// JSON-RPC client for random.org's `generateDecimalFractions`.
#[derive(Debug)]
pub struct RandomOrgClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    next_id: AtomicU64,
}

impl RandomOrgClient {
    /// Creates a client for the public endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, RANDOM_ORG_ENDPOINT)
    }

    /// Creates a client for a custom endpoint.
    #[must_use]
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            next_id: AtomicU64::new(1),
        }
    }

    fn request_body(&self, count: usize) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "generateDecimalFractions",
            "params": {
                "apiKey": self.api_key,
                "n": count.clamp(1, RANDOM_ORG_MAX_BATCH),
                "decimalPlaces": 14,
                "replacement": true,
            },
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    random: RpcRandom,
}

#[derive(Debug, Deserialize)]
struct RpcRandom {
    data: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

fn parse_response(body: Value) -> Result<Vec<f64>, DiceError> {
    let response: RpcResponse = serde_json::from_value(body)
        .map_err(|e| DiceError::Backend(format!("malformed response: {e}")))?;
    if let Some(err) = response.error {
        return Err(DiceError::Backend(format!(
            "random.org error {}: {}",
            err.code, err.message
        )));
    }
    response
        .result
        .map(|r| r.random.data)
        .ok_or_else(|| DiceError::Backend("response carries neither result nor error".to_owned()))
}

#[async_trait]
impl EntropySource for RandomOrgClient {
    async fn fetch(&self, count: usize) -> Result<Vec<f64>, DiceError> {
        let body = self.request_body(count);
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiceError::Backend(e.to_string()))?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| DiceError::Backend(e.to_string()))?;
        parse_response(value)
    }
}

/// Tuning for the background refill task.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Fractions requested per fetch.
    pub batch: usize,
    /// Refill once fewer than this many fractions remain.
    pub low_water: usize,
    /// Pause after a failed fetch.
    pub retry: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            batch: 1_000,
            low_water: 200,
            retry: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct Pool {
    values: Mutex<VecDeque<f64>>,
    wanted: Notify,
    low_water: usize,
}

impl Pool {
    fn len(&self) -> usize {
        self.values.lock().map_or(0, |v| v.len())
    }

    fn extend(&self, fresh: Vec<f64>) {
        if let Ok(mut values) = self.values.lock() {
            values.extend(fresh.into_iter().filter(|f| (0.0..1.0).contains(f)));
        }
    }

    /// Takes exactly `n` fractions, or none at all.
    fn take(&self, n: usize) -> Option<Vec<f64>> {
        let mut values = self.values.lock().ok()?;
        let taken = (values.len() >= n).then(|| values.drain(..n).collect());
        if values.len() < self.low_water {
            self.wanted.notify_one();
        }
        taken
    }
}

/// Maps a fraction in `[0, 1)` to a face in `1..=sides`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn face(fraction: f64, sides: u32) -> u32 {
    let scaled = (fraction * f64::from(sides)).floor() as u32;
    scaled.min(sides.saturating_sub(1)) + 1
}

/// Oracle that consumes pre-fetched true-random fractions.
#[derive(Debug, Clone)]
pub struct RemoteOracle {
    pool: Arc<Pool>,
}

impl RemoteOracle {
    /// Creates the oracle and spawns its refill task on the current runtime.
    ///
    /// The task runs until the returned handle is aborted.
    #[must_use]
    pub fn spawn(source: Arc<dyn EntropySource>, settings: PoolSettings) -> (Self, JoinHandle<()>) {
        let pool = Arc::new(Pool {
            values: Mutex::new(VecDeque::with_capacity(settings.batch)),
            wanted: Notify::new(),
            low_water: settings.low_water,
        });
        let task = tokio::spawn(refill(Arc::clone(&pool), source, settings));
        (Self { pool }, task)
    }

    /// Number of fractions currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.pool.len()
    }
}

impl DiceOracle for RemoteOracle {
    fn roll(&mut self, expr: &DiceExpr) -> i32 {
        let count = usize::try_from(expr.count).unwrap_or(usize::MAX);
        match self.pool.take(count) {
            Some(fractions) => total(fractions.into_iter().map(|f| face(f, expr.sides)), expr.bonus),
            None => {
                warn!(%expr, "entropy pool exhausted, rolling 0");
                0
            }
        }
    }
}

async fn refill(pool: Arc<Pool>, source: Arc<dyn EntropySource>, settings: PoolSettings) {
    loop {
        if pool.len() >= settings.low_water.max(1) {
            pool.wanted.notified().await;
            continue;
        }
        match source.fetch(settings.batch).await {
            Ok(values) if !values.is_empty() => {
                debug!(count = values.len(), "entropy pool refilled");
                pool.extend(values);
            }
            Ok(_) => {
                warn!("entropy source returned no values");
                tokio::time::sleep(settings.retry).await;
            }
            Err(e) => {
                warn!(error = %e, "entropy fetch failed");
                tokio::time::sleep(settings.retry).await;
            }
        }
    }
}

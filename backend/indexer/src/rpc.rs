//! Soroban RPC client: polls `getEvents` and decodes carbon credit events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Payload encoding
//!
//! Requests ask for `xdrFormat: "json"`, so each topic and the event data
//! arrive as the RPC's JSON rendering of an `ScVal`: `{"symbol":"minted"}`,
//! `{"u64":"3"}`, `{"address":"G..."}`, `{"i128":"500"}`,
//! `{"map":[{"key":…,"val":…}]}`. [`sc_to_plain`] flattens that into plain
//! JSON (contract structs become objects keyed by field name) before the
//! per-kind fields are read.
//!
//! A node that ignores `xdrFormat` answers with base64 XDR instead. Symbol
//! and `u64` topics are still decoded from it so the event is typed and
//! keyed; its data is left undecoded.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CarbonEvent, EventKind, TopicKey};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// `ScValType` discriminants of the XDR scalars used as topics.
const SCV_U64: u32 = 5;
const SCV_SYMBOL: u32 = 15;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct RawEvent {
    /// Topics as JSON `ScVal`s
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Event data as a JSON `ScVal`
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    /// Base64 XDR topics, only sent when the node ignores `xdrFormat`
    #[serde(default)]
    pub topic: Vec<String>,
    /// Base64 XDR data, only sent when the node ignores `xdrFormat`
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                backoff = back_off(backoff).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            backoff = back_off(backoff).await;
            continue;
        }

        let text = resp.text().await?;
        let body: RpcResponse = serde_json::from_str(&text)?;

        if let Some(err) = body.error {
            // Invalid request / unknown method will never succeed on retry.
            if err.code == -32600 || err.code == -32601 {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            warn!(
                "RPC soft error (will retry in {backoff}s): {} {}",
                err.code, err.message
            );
            backoff = back_off(backoff).await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("Empty result from getEvents".to_string()))?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok((result.events, result.cursor, result.latest_ledger));
    }
}

/// Sleep for `current` seconds and return the next, doubled, delay.
async fn back_off(current: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(current)).await;
    (current * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`CarbonEvent`] structs.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CarbonEvent> {
    raw.iter()
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<CarbonEvent> {
    let topics: Vec<Value> = if raw.topic_json.is_empty() {
        raw.topic.iter().map(|t| decode_xdr_topic(t)).collect()
    } else {
        raw.topic_json.iter().map(sc_to_plain).collect()
    };

    // Extract leading topic symbol to determine event type.
    let kind = EventKind::from_topic(&scalar_string(topics.first()?)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    if raw.value_json.is_null() && raw.value.is_some() {
        warn!(
            "Event {} carries base64 data only; storing it without actor or amount",
            raw.id.as_deref().unwrap_or("?")
        );
    }
    let value = sc_to_plain(&raw.value_json);

    let key = topics.get(1).and_then(scalar_string);
    let (mut project_id, mut order_id, mut topic_account) = (None, None, None);
    match kind.topic_key() {
        TopicKey::Project => project_id = key,
        TopicKey::Order => {
            order_id = key;
            // Order payloads name their project too.
            project_id = extract_field(&value, &["project_id"]);
        }
        TopicKey::Account => topic_account = key,
        TopicKey::None => {}
    }

    let (actor, amount) = decode_data(&value, kind);

    Some(CarbonEvent {
        event_type: kind.as_str().to_string(),
        project_id,
        order_id,
        actor: topic_account.or(actor),
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.as_deref().map(normalize_tx_hash),
    })
}

/// Pull the primary account and quantity out of the event data.
///
/// | Kind                 | actor    | amount           |
/// |----------------------|----------|------------------|
/// | project added        | owner    | carbon reduced   |
/// | status changed       | auditor  | credits issued   |
/// | minted / retired     | holder   | credits          |
/// | batch mint           | holder   | sum of amounts   |
/// | transfer             | from     | credits          |
/// | order created/closed | seller   | credits listed   |
/// | order filled         | buyer    | total price      |
/// | expired order closed | closer   | reward paid      |
/// | withdrawn / fee / paused | none | the scalar value |
/// | fallback             | sender   | amount           |
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::ProjectAdded => (
            extract_field(value, &["owner"]),
            extract_field(value, &["carbon_reduced"]),
        ),
        EventKind::ProjectStatusChanged => (
            extract_field(value, &["auditor"]),
            extract_field(value, &["credits_issued"]),
        ),
        EventKind::CreditsMinted => (
            extract_field(value, &["to"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::CreditsMintedBatch => (
            extract_field(value, &["to"]),
            value.get("amounts").and_then(sum_amounts),
        ),
        EventKind::CreditRetired => (
            extract_field(value, &["retiree"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::ApprovalForAll => (extract_field(value, &["owner"]), None),
        EventKind::TransferSingle => (
            extract_field(value, &["from"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::OrderCreated | EventKind::OrderClosed => (
            extract_field(value, &["seller"]),
            extract_field(value, &["credits_amount"]),
        ),
        EventKind::OrderFilled => (
            extract_field(value, &["buyer"]),
            extract_field(value, &["total_price"]),
        ),
        EventKind::ExpiredOrderClosed => (
            extract_field(value, &["closer"]),
            extract_field(value, &["reward"]),
        ),
        EventKind::BalanceWithdrawn
        | EventKind::PlatformFeeUpdated
        | EventKind::MarketplacePauseChanged => (None, scalar_string(value)),
        EventKind::FallbackCalled => (
            extract_field(value, &["sender"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::ProjectUpdated
        | EventKind::OrderNotExpired
        | EventKind::RoleSet
        | EventKind::RoleDel
        | EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(scalar_string)
}

/// Render a plain JSON scalar as a string.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Sum an array of `i128` amounts; `None` if any entry is not a number.
fn sum_amounts(amounts: &Value) -> Option<String> {
    let mut total: i128 = 0;
    for entry in amounts.as_array()? {
        let amount: i128 = scalar_string(entry)?.parse().ok()?;
        total = total.checked_add(amount)?;
    }
    Some(total.to_string())
}

/// Flatten the RPC's JSON form of an `ScVal` into plain JSON.
///
/// Integers become decimal strings, addresses stay strkeys, vectors become
/// arrays and maps become objects keyed by the rendered key. `void` and
/// types the contract never publishes become `null`.
fn sc_to_plain(sc: &Value) -> Value {
    let Some((tag, inner)) = sc
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
    else {
        return Value::Null;
    };

    match tag.as_str() {
        "bool" | "symbol" | "string" | "address" | "bytes" => inner.clone(),
        "u32" | "i32" | "u64" | "i64" | "timepoint" | "duration" => {
            scalar_string(inner).map_or(Value::Null, Value::String)
        }
        "i128" | "u128" => int128_string(inner).map_or(Value::Null, Value::String),
        "vec" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().map(sc_to_plain).collect())
                .unwrap_or_default(),
        ),
        "map" => Value::Object(
            inner
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|entry| {
                    let key = scalar_string(&sc_to_plain(entry.get("key")?))?;
                    Some((key, sc_to_plain(entry.get("val")?)))
                })
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// A 128-bit integer rendered either as a decimal string or as
/// `{"hi":…,"lo":…}` parts.
fn int128_string(value: &Value) -> Option<String> {
    let Some(parts) = value.as_object() else {
        return scalar_string(value);
    };
    let hi: i64 = scalar_string(parts.get("hi")?)?.parse().ok()?;
    let lo: u64 = scalar_string(parts.get("lo")?)?.parse().ok()?;
    Some(((i128::from(hi) << 64) | i128::from(lo)).to_string())
}

/// Decode a base64 XDR topic holding a `Symbol` or a `u64`; `null` for
/// anything else.
fn decode_xdr_topic(raw: &str) -> Value {
    decode_xdr_scalar(raw).map_or(Value::Null, Value::String)
}

fn decode_xdr_scalar(raw: &str) -> Option<String> {
    let bytes = general_purpose::STANDARD.decode(raw).ok()?;
    let tag = u32::from_be_bytes(bytes.get(0..4)?.try_into().ok()?);
    let body = bytes.get(4..)?;

    match tag {
        SCV_U64 if body.len() == 8 => {
            Some(u64::from_be_bytes(body.try_into().ok()?).to_string())
        }
        SCV_SYMBOL => {
            let len = u32::from_be_bytes(body.get(0..4)?.try_into().ok()?) as usize;
            let padded = len.div_ceil(4) * 4;
            if body.len() != 4 + padded {
                return None;
            }
            String::from_utf8(body.get(4..4 + len)?.to_vec()).ok()
        }
        _ => None,
    }
}

/// Lower-case hex transaction hashes so the same hash always dedups; other
/// strings pass through unchanged.
fn normalize_tx_hash(raw: &str) -> String {
    hex::decode(raw)
        .map(hex::encode)
        .unwrap_or_else(|_| raw.to_string())
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

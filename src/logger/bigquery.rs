//! Analytical table sink.
//!
//! Records are flattened into snake_case rows and handed to an
//! [`AnalyticalTable`]. Structured columns are stored as JSON text so the
//! table schema stays flat.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{LogRecord, LogSettings, LogSink, SinkError, SinkPayload};
use crate::config::{BigQueryLogType, TableRef, TransportConfig};
use crate::transport::TransportError;

/// Canonical field name to table column.
pub const BIGQUERY_KEY_MAPPING: &[(&str, &str)] = &[
    ("Name", "tag_name"),
    ("Type", "type"),
    ("TraceId", "trace_id"),
    ("EventName", "event_name"),
    ("RequestMethod", "request_method"),
    ("RequestUrl", "request_url"),
    ("RequestBody", "request_body"),
    ("ResponseStatusCode", "response_status_code"),
    ("ResponseHeaders", "response_headers"),
    ("ResponseBody", "response_body"),
];

/// Columns stored as serialized JSON text.
const TEXT_COLUMNS: [&str; 3] = ["request_body", "response_headers", "response_body"];

/// Options for a row insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertOptions {
    /// Accept rows carrying columns the table does not define.
    pub ignore_unknown_values: bool,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            ignore_unknown_values: true,
        }
    }
}

/// One insert call as observed by [`MemoryTable`].
#[derive(Clone, Debug, PartialEq)]
pub struct TableInsert {
    pub table: TableRef,
    pub rows: Vec<Map<String, Value>>,
    pub options: InsertOptions,
}

/// Destination table addressed by project, dataset and table id.
///
/// Implementations must not block the caller; remote writes are expected
/// to complete in the background.
pub trait AnalyticalTable: Send + Sync {
    fn insert(
        &self,
        table: &TableRef,
        rows: Vec<Map<String, Value>>,
        options: InsertOptions,
    ) -> Result<(), SinkError>;
}

/// Sink writing snake_case rows to an [`AnalyticalTable`].
pub struct BigQuerySink {
    table: Arc<dyn AnalyticalTable>,
}

impl BigQuerySink {
    pub fn new(table: Arc<dyn AnalyticalTable>) -> Self {
        Self { table }
    }
}

impl LogSink for BigQuerySink {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn enabled(&self, settings: &LogSettings) -> bool {
        settings.big_query_log_type == BigQueryLogType::Always
    }

    fn encode(&self, record: &LogRecord) -> Result<SinkPayload, SinkError> {
        encode_row(record, now_millis()).map(SinkPayload::Row)
    }

    fn write(&self, payload: SinkPayload, settings: &LogSettings) -> Result<(), SinkError> {
        match payload {
            SinkPayload::Row(row) => {
                self.table
                    .insert(&settings.table, vec![row], InsertOptions::default())
            }
            SinkPayload::Text(_) => Err(SinkError::Payload { sink: self.name() }),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn column_for(field: &str) -> &str {
    BIGQUERY_KEY_MAPPING
        .iter()
        .find(|(from, _)| *from == field)
        .map(|(_, to)| *to)
        .unwrap_or(field)
}

/// Map a record onto table columns and stamp it with `timestamp_ms`.
fn encode_row(record: &LogRecord, timestamp_ms: u64) -> Result<Map<String, Value>, SinkError> {
    let mut row = Map::new();

    for (field, value) in record.to_map() {
        let column = column_for(&field).to_string();
        row.insert(column, value);
    }

    row.insert("timestamp".to_string(), Value::from(timestamp_ms));

    for column in TEXT_COLUMNS {
        if let Some(value) = row.get_mut(column) {
            let text = serde_json::to_string(value).map_err(|e| SinkError::Encode(e.to_string()))?;
            *value = Value::String(text);
        }
    }

    Ok(row)
}

/// Records inserts in memory.
#[derive(Debug, Default)]
pub struct MemoryTable {
    inserts: Mutex<Vec<TableInsert>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inserts(&self) -> Vec<TableInsert> {
        match self.inserts.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// All rows across every insert, in order.
    pub fn rows(&self) -> Vec<Map<String, Value>> {
        self.inserts().into_iter().flat_map(|i| i.rows).collect()
    }
}

impl AnalyticalTable for MemoryTable {
    fn insert(
        &self,
        table: &TableRef,
        rows: Vec<Map<String, Value>>,
        options: InsertOptions,
    ) -> Result<(), SinkError> {
        let insert = TableInsert {
            table: table.clone(),
            rows,
            options,
        };
        match self.inserts.lock() {
            Ok(mut guard) => guard.push(insert),
            Err(poisoned) => poisoned.into_inner().push(insert),
        }
        Ok(())
    }
}

/// BigQuery `tabledata.insertAll` over REST.
#[derive(Clone)]
pub struct BigQueryRestTable {
    client: Client,
    api_base: Arc<str>,
    access_token: Option<Arc<str>>,
}

impl BigQueryRestTable {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            api_base: Arc::from(config.bigquery_api_base.trim_end_matches('/')),
            access_token: config.bigquery_access_token.as_deref().map(Arc::from),
        })
    }

    /// `insertAll` URL for a complete table address.
    pub fn insert_url(&self, table: &TableRef) -> Result<String, SinkError> {
        match (&table.project_id, &table.dataset_id, &table.table_id) {
            (Some(p), Some(d), Some(t)) if table.is_complete() => Ok(format!(
                "{}/projects/{}/datasets/{}/tables/{}/insertAll",
                self.api_base, p, d, t
            )),
            _ => Err(SinkError::Config(
                "project, dataset and table id are required".to_string(),
            )),
        }
    }

    /// Send rows and wait for the API to acknowledge them.
    pub async fn insert_rows(
        &self,
        table: &TableRef,
        rows: Vec<Map<String, Value>>,
        options: InsertOptions,
    ) -> Result<(), SinkError> {
        let url = self.insert_url(table)?;

        let rows: Vec<Value> = rows
            .into_iter()
            .map(|row| {
                json!({
                    "insertId": uuid::Uuid::new_v4().to_string(),
                    "json": Value::Object(row),
                })
            })
            .collect();
        let body = json!({
            "ignoreUnknownValues": options.ignore_unknown_values,
            "rows": rows,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| SinkError::Write(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SinkError::Write(format!(
                "insertAll status={} body_sample={}",
                status,
                truncate(&text, 500)
            )));
        }

        // A 200 may still carry per-row failures.
        if let Ok(parsed) = serde_json::from_str::<Value>(&text) {
            if let Some(errors) = parsed.get("insertErrors").and_then(Value::as_array) {
                if !errors.is_empty() {
                    return Err(SinkError::Write(format!(
                        "insertAll rejected {} row(s)",
                        errors.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl AnalyticalTable for BigQueryRestTable {
    fn insert(
        &self,
        table: &TableRef,
        rows: Vec<Map<String, Value>>,
        options: InsertOptions,
    ) -> Result<(), SinkError> {
        self.insert_url(table)?;

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SinkError::Write(format!("no async runtime: {}", e)))?;

        let this = self.clone();
        let table = table.clone();
        handle.spawn(async move {
            if let Err(e) = this.insert_rows(&table, rows, options).await {
                tracing::warn!(error = %e, "bigquery insert failed");
            }
        });

        Ok(())
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

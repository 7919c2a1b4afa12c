//! Unified JSON logging with custom format.
//!
//! Log format:
//! ```json
//! {"ts":"2024-12-28T15:04:05.123Z","level":"info","type":"app","msg":"invocation dispatched","ctx":{"service":"rc_relay"},"data":{}}
//! ```
//!
//! Lines written by the console log sink (target `console`) are tagged
//! `"type":"console"`; their record becomes `data`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LoggingConfig};

/// Target used by the console log sink.
pub const CONSOLE_TARGET: &str = "console";

/// Install the global subscriber: env filter plus [`JsonFormatter`].
///
/// Console sink lines are always let through at `info`.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "RUST_LOG".into(),
        message,
    };

    let console: Directive = format!("{}=info", CONSOLE_TARGET)
        .parse()
        .map_err(|e: ParseError| invalid(e.to_string()))?;
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| invalid(e.to_string()))?
        .add_directive(console);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(JsonFormatter::new(config.service_name.clone())),
        )
        .try_init()
        .map_err(|e| ConfigError::Invalid {
            key: "logging".into(),
            message: e.to_string(),
        })
}

/// Custom JSON formatter for tracing.
pub struct JsonFormatter {
    service_name: String,
}

impl JsonFormatter {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = match *meta.level() {
            Level::TRACE => "debug",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };

        let log_type = if meta.target() == CONSOLE_TARGET {
            "console"
        } else if *meta.level() == Level::ERROR {
            "error"
        } else {
            "app"
        };

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let ts = Iso8601Timestamp::now();

        let mut data: serde_json::Map<String, Value> = visitor.fields.into_iter().collect();
        let message = visitor.message.unwrap_or_default();

        // Console lines carry a serialized record: lift it into data.
        let msg = match (log_type, serde_json::from_str::<Value>(&message)) {
            ("console", Ok(Value::Object(record))) => {
                let msg = console_summary(&record);
                data = record;
                msg
            }
            _ => message,
        };

        let mut log_ctx = serde_json::Map::new();
        log_ctx.insert("service".into(), Value::from(self.service_name.as_str()));
        if let Some(span) = ctx.lookup_current() {
            log_ctx.insert("span".into(), Value::from(span.name()));
        }

        let entry = serde_json::json!({
            "ts": ts.as_str(),
            "level": level,
            "type": log_type,
            "msg": msg,
            "ctx": log_ctx,
            "data": data,
        });

        writeln!(
            writer,
            "{}",
            serde_json::to_string(&entry).unwrap_or_default()
        )
    }
}

/// "Name Type" for a console record, e.g. `RevContent Request`.
fn console_summary(record: &serde_json::Map<String, Value>) -> String {
    let name = record.get("Name").and_then(Value::as_str).unwrap_or("?");
    let kind = record.get("Type").and_then(Value::as_str).unwrap_or("?");
    format!("{} {}", name, kind)
}

/// Field visitor for collecting tracing fields.
struct FieldVisitor {
    message: Option<String>,
    fields: HashMap<String, Value>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: None,
            fields: HashMap::new(),
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(format!("{:?}", value)),
            );
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }
}

/// ISO 8601 timestamp buffer - exactly 24 bytes: "2024-01-15T10:30:00.123Z"
/// Stack-allocated, no heap allocation.
#[derive(Clone, Copy)]
pub struct Iso8601Timestamp {
    buf: [u8; 24],
}

impl Iso8601Timestamp {
    /// Create a new timestamp for the current time.
    #[inline]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_duration(now)
    }

    /// Create from a Duration since UNIX_EPOCH.
    pub fn from_duration(duration: Duration) -> Self {
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();

        let day_secs = secs % 86400;
        let hours = (day_secs / 3600) as u8;
        let minutes = ((day_secs % 3600) / 60) as u8;
        let seconds = (day_secs % 60) as u8;

        // Valid for 1970-9999.
        let mut year = 1970u16;
        let mut remaining = (secs / 86400) as i64;
        loop {
            let year_days = if is_leap_year(year) { 366 } else { 365 };
            if remaining < year_days {
                break;
            }
            remaining -= year_days;
            year += 1;
        }

        let month_days: [u8; 12] = if is_leap_year(year) {
            [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
        } else {
            [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
        };

        let mut month = 1u8;
        for &days_in_month in &month_days {
            if remaining < days_in_month as i64 {
                break;
            }
            remaining -= days_in_month as i64;
            month += 1;
        }
        let day = (remaining + 1) as u8;

        let mut buf = [0u8; 24];
        write_digits(&mut buf[0..4], year as u32);
        buf[4] = b'-';
        write_digits(&mut buf[5..7], month as u32);
        buf[7] = b'-';
        write_digits(&mut buf[8..10], day as u32);
        buf[10] = b'T';
        write_digits(&mut buf[11..13], hours as u32);
        buf[13] = b':';
        write_digits(&mut buf[14..16], minutes as u32);
        buf[16] = b':';
        write_digits(&mut buf[17..19], seconds as u32);
        buf[19] = b'.';
        write_digits(&mut buf[20..23], millis);
        buf[23] = b'Z';

        Self { buf }
    }

    /// Get the timestamp as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf).unwrap_or_default()
    }
}

impl std::fmt::Display for Iso8601Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for Iso8601Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Write `val` as zero-padded decimal filling `buf`.
#[inline]
fn write_digits(buf: &mut [u8], mut val: u32) {
    for slot in buf.iter_mut().rev() {
        *slot = b'0' + (val % 10) as u8;
        val /= 10;
    }
}

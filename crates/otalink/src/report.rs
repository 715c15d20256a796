use serde_json::{Map, Value, json};

use tracing::warn;

/// The fixed protocol version carried by every outbound report envelope.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// A name/value tag attached to a report.
///
/// Tags are part of the report model but are not wire-encoded by the
/// current reporting path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Tag value.
    pub value: String,
}

/// The send-time timestamp accompanying a batch of reports.
///
/// The timestamp must be formatted in ISO 8601 as UTC, ending with a `Z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    /// Client-side send time.
    pub ts: String,
}

impl ReportHeader {
    /// Creates a [`ReportHeader`] from a send timestamp.
    pub fn new(ts: impl Into<String>) -> Self {
        Self { ts: ts.into() }
    }
}

/// The payload of a `metric.counter.*` or `metric.gauge.*` report.
///
/// The sub-type suffix is appended to the metric prefix on the wire, so a
/// counter with sub-type `reboots` is sent as `metric.counter.reboots`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metric {
    /// Sub-type suffix.
    pub subtype: String,
    /// Collection timestamp, ISO 8601 UTC ending with a `Z`.
    pub ts: String,
    /// Integer name/value pairs.
    pub v_ints: Vec<(String, i64)>,
    /// Float name/value pairs.
    pub v_floats: Vec<(String, f64)>,
    /// Tags, currently not wire-encoded.
    pub tags: Vec<Tag>,
}

/// The payload of an `event.generic.*` report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericEvent {
    /// Sub-type suffix.
    pub subtype: String,
    /// Collection timestamp, ISO 8601 UTC ending with a `Z`.
    pub ts: String,
    /// Integer name/value pairs.
    pub v_ints: Vec<(String, i64)>,
    /// Float name/value pairs.
    pub v_floats: Vec<(String, f64)>,
    /// String name/value pairs.
    pub v_strings: Vec<(String, String)>,
    /// Tags, currently not wire-encoded.
    pub tags: Vec<Tag>,
}

/// The payload of an `event.update.Status` report.
///
/// The sub-type is fixed to `Status`; only string pairs are carried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStatus {
    /// Collection timestamp, ISO 8601 UTC ending with a `Z`.
    pub ts: String,
    /// String name/value pairs.
    pub v_strings: Vec<(String, String)>,
    /// Tags, currently not wire-encoded.
    pub tags: Vec<Tag>,
}

/// One telemetry/event record sent via [`report`](crate::Client::report).
///
/// A closed set of the four supported report kinds; the encoder matches
/// exhaustively, so there is no "unsupported type" failure mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// A `metric.counter.*` report.
    Counter(Metric),
    /// A `metric.gauge.*` report.
    Gauge(Metric),
    /// An `event.generic.*` report.
    Generic(GenericEvent),
    /// An `event.update.Status` report.
    UpdateStatus(UpdateStatus),
}

// Builds a name -> value object from ordered pairs. A name already present
// keeps its value and the later one is silently dropped; the backend
// expects first-write-wins here.
fn pairs_object<T>(pairs: &[(String, T)]) -> Value
where
    T: Clone,
    Value: From<T>,
{
    let mut object = Map::new();
    for (name, value) in pairs {
        object
            .entry(name.clone())
            .or_insert_with(|| Value::from(value.clone()));
    }
    Value::Object(object)
}

fn encode_metric(prefix: &str, metric: &Metric) -> Value {
    json!({
        "type": format!("{prefix}{}", metric.subtype),
        "ts": metric.ts,
        "v_ints": pairs_object(&metric.v_ints),
        "v_floats": pairs_object(&metric.v_floats),
    })
}

fn encode_generic(event: &GenericEvent) -> Value {
    json!({
        "type": format!("event.generic.{}", event.subtype),
        "ts": event.ts,
        "v_ints": pairs_object(&event.v_ints),
        "v_floats": pairs_object(&event.v_floats),
        "v_strings": pairs_object(&event.v_strings),
    })
}

fn encode_update_status(status: &UpdateStatus) -> Value {
    let mut object = Map::new();
    object.insert("type".into(), "event.update.Status".into());
    object.insert("ts".into(), status.ts.clone().into());

    if status.v_strings.is_empty() {
        warn!("No v_strings in event.update.Status type report");
    } else {
        object.insert("v_strings".into(), pairs_object(&status.v_strings));
    }

    Value::Object(object)
}

fn encode_report(report: &Report) -> Value {
    match report {
        Report::Counter(metric) => encode_metric("metric.counter.", metric),
        Report::Gauge(metric) => encode_metric("metric.gauge.", metric),
        Report::Generic(event) => encode_generic(event),
        Report::UpdateStatus(status) => encode_update_status(status),
    }
}

/// Encodes a report batch into the canonical outbound envelope:
/// `{"version":"1.0.0","header":{"ts":…},"data":[…]}` with one encoded
/// object per input report, in input order.
pub(crate) fn encode_batch(header: &ReportHeader, reports: &[Report]) -> Value {
    let data: Vec<Value> = reports.iter().map(encode_report).collect();

    json!({
        "version": PROTOCOL_VERSION,
        "header": { "ts": header.ts },
        "data": data,
    })
}

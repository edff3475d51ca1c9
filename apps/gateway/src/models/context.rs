use serde::Serialize;
use serde_json::Value;

/// Caller-owned data fetched for one request. Only the categories the mode's scope
/// declares are populated; everything else stays empty.
///
/// Rows are opaque JSON objects: the schema belongs to the data store, not the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextBundle {
    pub profile: Option<Value>,
    /// Each school row carries a `school_stats` array of per-cycle statistics.
    pub schools: Vec<Value>,
    pub applications: Vec<Value>,
    pub essays: Vec<Value>,
    pub memory: Vec<Value>,
    pub recommendations: Vec<Value>,
}

//! In-memory `ContextStore` for tests. Records every read so tests can assert which
//! categories a request touched.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::caller::Caller;
use crate::quota::{PlanTier, UsageSnapshot};
use crate::store::ContextStore;

#[derive(Default)]
struct Inner {
    plans: HashMap<String, PlanTier>,
    profiles: HashMap<String, Value>,
    schools: HashMap<String, Vec<Value>>,
    applications: HashMap<String, Vec<Value>>,
    essays: HashMap<String, Vec<Value>>,
    memory: HashMap<String, Vec<Value>>,
    recommendations: HashMap<String, Vec<Value>>,
    usage: HashMap<String, UsageSnapshot>,
    variants: HashMap<(String, Uuid, Uuid), u32>,
    ai_calls: Vec<(String, String, DateTime<Utc>)>,
    reads: Vec<&'static str>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_reads: bool,
}

fn by_application(rows: &[Value], application_id: Option<Uuid>, key: &str) -> Vec<Value> {
    rows.iter()
        .filter(|row| match application_id {
            None => true,
            Some(id) => row.get(key).and_then(Value::as_str) == Some(id.to_string().as_str()),
        })
        .cloned()
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every context read errors.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock().unwrap();
        f(&mut inner)
    }

    pub fn set_plan(&self, caller: &str, plan: PlanTier) {
        self.with(|i| i.plans.insert(caller.to_string(), plan));
    }

    pub fn set_profile(&self, caller: &str, profile: Value) {
        self.with(|i| i.profiles.insert(caller.to_string(), profile));
    }

    pub fn set_schools(&self, caller: &str, rows: Vec<Value>) {
        self.with(|i| i.schools.insert(caller.to_string(), rows));
    }

    pub fn set_applications(&self, caller: &str, rows: Vec<Value>) {
        self.with(|i| i.applications.insert(caller.to_string(), rows));
    }

    pub fn set_essays(&self, caller: &str, rows: Vec<Value>) {
        self.with(|i| i.essays.insert(caller.to_string(), rows));
    }

    pub fn set_memory(&self, caller: &str, rows: Vec<Value>) {
        self.with(|i| i.memory.insert(caller.to_string(), rows));
    }

    pub fn set_recommendations(&self, caller: &str, rows: Vec<Value>) {
        self.with(|i| i.recommendations.insert(caller.to_string(), rows));
    }

    pub fn set_usage(&self, caller: &str, usage: UsageSnapshot) {
        self.with(|i| i.usage.insert(caller.to_string(), usage));
    }

    pub fn set_variants(&self, caller: &str, story: Uuid, school: Uuid, count: u32) {
        self.with(|i| i.variants.insert((caller.to_string(), story, school), count));
    }

    /// Categories read so far, sorted (reads may run concurrently).
    pub fn reads(&self) -> Vec<&'static str> {
        let mut reads = self.with(|i| i.reads.clone());
        reads.sort_unstable();
        reads
    }

    pub fn recorded_calls(&self) -> Vec<(String, String)> {
        self.with(|i| {
            i.ai_calls
                .iter()
                .map(|(caller, feature, _)| (caller.clone(), feature.clone()))
                .collect()
        })
    }

    /// Seeds a usage row with an explicit timestamp.
    pub fn record_ai_call_at(&self, caller: &str, feature: &str, at: DateTime<Utc>) {
        self.with(|i| {
            i.ai_calls
                .push((caller.to_string(), feature.to_string(), at))
        });
    }

    fn read(&self, category: &'static str) -> Result<()> {
        self.with(|i| i.reads.push(category));
        if self.fail_reads {
            bail!("connection reset while reading {category}");
        }
        Ok(())
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn ensure_caller(&self, caller_id: &str) -> Result<Caller> {
        let plan = self.with(|i| *i.plans.entry(caller_id.to_string()).or_insert(PlanTier::Free));
        Ok(Caller {
            id: caller_id.to_string(),
            plan,
        })
    }

    async fn find_caller(&self, caller_id: &str) -> Result<Option<Caller>> {
        Ok(self.with(|i| {
            i.plans.get(caller_id).map(|&plan| Caller {
                id: caller_id.to_string(),
                plan,
            })
        }))
    }

    async fn fetch_profile(&self, caller_id: &str) -> Result<Option<Value>> {
        self.read("profile")?;
        Ok(self.with(|i| i.profiles.get(caller_id).cloned()))
    }

    async fn fetch_schools(&self, caller_id: &str) -> Result<Vec<Value>> {
        self.read("schools")?;
        Ok(self.with(|i| i.schools.get(caller_id).cloned().unwrap_or_default()))
    }

    async fn fetch_applications(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>> {
        self.read("applications")?;
        Ok(self.with(|i| {
            let rows = i.applications.get(caller_id).cloned().unwrap_or_default();
            by_application(&rows, application_id, "id")
        }))
    }

    async fn fetch_essays(&self, caller_id: &str) -> Result<Vec<Value>> {
        self.read("essays")?;
        Ok(self.with(|i| i.essays.get(caller_id).cloned().unwrap_or_default()))
    }

    async fn fetch_memory(&self, caller_id: &str) -> Result<Vec<Value>> {
        self.read("memory")?;
        Ok(self.with(|i| i.memory.get(caller_id).cloned().unwrap_or_default()))
    }

    async fn fetch_recommendations(
        &self,
        caller_id: &str,
        application_id: Option<Uuid>,
    ) -> Result<Vec<Value>> {
        self.read("recommendations")?;
        Ok(self.with(|i| {
            let rows = i.recommendations.get(caller_id).cloned().unwrap_or_default();
            by_application(&rows, application_id, "application_id")
        }))
    }

    async fn usage_snapshot(
        &self,
        caller_id: &str,
        month_start: DateTime<Utc>,
    ) -> Result<UsageSnapshot> {
        Ok(self.with(|i| {
            let mut usage = i.usage.get(caller_id).copied().unwrap_or_default();
            let recorded = i
                .ai_calls
                .iter()
                .filter(|(c, _, at)| c == caller_id && *at >= month_start)
                .count() as u32;
            usage.ai_calls_month += recorded;
            usage
        }))
    }

    async fn record_ai_call(&self, caller_id: &str, feature: &str) -> Result<()> {
        self.record_ai_call_at(caller_id, feature, Utc::now());
        Ok(())
    }

    async fn count_variants(
        &self,
        caller_id: &str,
        story_id: Uuid,
        school_id: Uuid,
    ) -> Result<u32> {
        Ok(self.with(|i| {
            i.variants
                .get(&(caller_id.to_string(), story_id, school_id))
                .copied()
                .unwrap_or(0)
        }))
    }
}

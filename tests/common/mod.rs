//! Shared test doubles and fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tablewise_core::clients::{
    LlmClient, LlmError, LlmResponse, PersistenceClient, PersistenceError, SchemaClient,
    SchemaError,
};
use tablewise_core::models::{FieldDescriptor, TableDescriptor};
use tablewise_core::orchestration::types::TableReport;
use uuid::Uuid;

/// Scripted LLM client double. Pops scripted responses in order, then
/// repeats the default behavior. Records call timing and concurrency so
/// scheduler properties can be asserted.
pub struct MockLlmClient {
    script: parking_lot::Mutex<VecDeque<Result<String, LlmError>>>,
    default: Result<String, LlmError>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub call_times: parking_lot::Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockLlmClient {
    pub fn always_ok(text: impl Into<String>) -> Self {
        Self::new(Ok(text.into()))
    }

    pub fn always_fail(error: LlmError) -> Self {
        Self::new(Err(error))
    }

    fn new(default: Result<String, LlmError>) -> Self {
        Self {
            script: parking_lot::Mutex::new(VecDeque::new()),
            default,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            call_times: parking_lot::Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue responses consumed before the default behavior
    pub fn with_script(self, responses: Vec<Result<String, LlmError>>) -> Self {
        *self.script.lock() = responses.into();
        self
    }

    /// Simulate upstream latency per call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().push(Instant::now());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.script.lock().pop_front();
        let outcome = next.unwrap_or_else(|| self.default.clone());
        outcome.map(|text| LlmResponse {
            text,
            cost: 0.02,
            duration: Duration::from_millis(250),
        })
    }
}

/// Schema client double serving fixed tables per base
pub struct MockSchemaClient {
    pub bases: HashMap<String, Vec<TableDescriptor>>,
    pub fail_listing: bool,
}

impl MockSchemaClient {
    pub fn with_tables(tables: Vec<TableDescriptor>) -> Self {
        let mut bases = HashMap::new();
        bases.insert("appTest".to_string(), tables);
        Self {
            bases,
            fail_listing: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            bases: HashMap::new(),
            fail_listing: true,
        }
    }
}

#[async_trait]
impl SchemaClient for MockSchemaClient {
    async fn list_bases(&self) -> Result<Vec<String>, SchemaError> {
        if self.fail_listing {
            return Err(SchemaError::Unreachable("connection refused".to_string()));
        }
        let mut ids: Vec<String> = self.bases.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_schema(&self, base_id: &str) -> Result<Vec<TableDescriptor>, SchemaError> {
        self.bases
            .get(base_id)
            .cloned()
            .ok_or_else(|| SchemaError::BaseNotFound(base_id.to_string()))
    }
}

/// Persistence client double recording every write
#[derive(Default)]
pub struct MockPersistenceClient {
    pub writes: parking_lot::Mutex<Vec<(Uuid, usize)>>,
    pub fail: bool,
}

impl MockPersistenceClient {
    pub fn failing() -> Self {
        Self {
            writes: parking_lot::Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

#[async_trait]
impl PersistenceClient for MockPersistenceClient {
    async fn write_results(
        &self,
        workflow_id: Uuid,
        reports: &[TableReport],
    ) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError("disk full".to_string()));
        }
        self.writes.lock().push((workflow_id, reports.len()));
        Ok(())
    }
}

/// Build a table descriptor with `field_count` plain text fields
pub fn make_table(table_id: &str, field_count: usize) -> TableDescriptor {
    TableDescriptor {
        base_id: "appTest".to_string(),
        table_id: table_id.to_string(),
        table_name: format!("Table {table_id}"),
        fields: (0..field_count)
            .map(|i| FieldDescriptor {
                name: format!("Field {i}"),
                field_type: "singleLineText".to_string(),
                options: None,
            })
            .collect(),
        record_count: Some(100),
        relationships: vec![],
        views: vec![],
    }
}

/// Response text carrying one strong finding that bands high or acceptable
pub fn strong_finding_response(confidence: f64) -> String {
    format!(
        r#"Here is the analysis:
[
  {{
    "issue_type": "redundant_field",
    "priority": "high",
    "description": "The Status and Stage fields duplicate the same lifecycle information in this table layout",
    "recommendation": "Remove the Stage field and update views to filter on the Status field instead",
    "impact": "Eliminates double data entry and drift",
    "effort": "low",
    "estimated_improvement": "Removes ~15% of per-record maintenance",
    "implementation_steps": ["Audit views referencing Stage", "Remove the Stage field"],
    "confidence_score": {confidence}
  }}
]"#
    )
}

/// Response text carrying one finding that scores in the acceptable band,
/// between 0.7 and 0.8
pub fn acceptable_finding_response() -> String {
    r#"[
  {
    "issue_type": "layout",
    "priority": "medium",
    "description": "The table layout mixes unrelated field groups together",
    "recommendation": "Update the Status field grouping to separate unrelated sections",
    "impact": "Clearer structure",
    "effort": "medium",
    "confidence_score": 0.75
  }
]"#
    .to_string()
}

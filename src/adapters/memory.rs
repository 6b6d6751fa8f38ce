//! In-memory collaborators
//!
//! Stand-ins for the six external services, used when the orchestrator runs
//! without real collaborators (`COLLABORATOR_MODE=memory`) and by the tests.
//! Each one can be switched into an outage to exercise failure handling.

use crate::adapters::traits::*;
use crate::models::parse_iso8601;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Shared outage switch
#[derive(Debug, Default)]
struct Outage(AtomicBool);

impl Outage {
    #[allow(dead_code)]
    fn set(&self, down: bool) {
        self.0.store(down, Ordering::SeqCst);
    }

    fn check(&self, service: &str) -> AdapterResult<()> {
        if self.0.load(Ordering::SeqCst) {
            Err(AdapterError::rejected(format!("{} service unavailable", service)))
        } else {
            Ok(())
        }
    }
}

/// Initial contents of the in-memory collaborators, loaded from JSON
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub denied_actions: Vec<String>,
    #[serde(default)]
    pub costs: HashMap<String, SeedCost>,
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SeedCost {
    pub current: f64,
    pub forecast: f64,
}

// =============================================================================
// POLICY
// =============================================================================

/// Allows every action except the ones on its deny list
#[derive(Debug, Default)]
pub struct StaticPolicy {
    denied_actions: HashSet<String>,
    outage: Outage,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, action: impl Into<String>) -> Self {
        self.denied_actions.insert(action.into());
        self
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl PolicyAdapter for StaticPolicy {
    async fn evaluate_policy(&self, query: &PolicyQuery) -> AdapterResult<PolicyVerdict> {
        self.outage.check("policy")?;

        if self.denied_actions.contains(&query.action) {
            Ok(PolicyVerdict {
                allowed: false,
                reasons: vec![format!(
                    "Action '{}' is denied for {}",
                    query.action, query.resource
                )],
                applied_policies: vec![format!("deny-{}", query.action)],
            })
        } else {
            Ok(PolicyVerdict {
                allowed: true,
                reasons: vec!["No deny rule matched".to_string()],
                applied_policies: vec!["default-allow".to_string()],
            })
        }
    }
}

// =============================================================================
// COST
// =============================================================================

/// Fixed cost table keyed by resource id: (current, forecast)
#[derive(Debug, Default)]
pub struct StaticCost {
    costs: RwLock<HashMap<String, (f64, f64)>>,
    outage: Outage,
}

impl StaticCost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_cost(&self, resource_id: impl Into<String>, current: f64, forecast: f64) {
        self.costs
            .write()
            .await
            .insert(resource_id.into(), (current, forecast));
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }

    async fn lookup(&self, services: &[String]) -> (f64, f64) {
        let costs = self.costs.read().await;
        services
            .iter()
            .filter_map(|s| costs.get(s))
            .fold((0.0, 0.0), |(c, f), (sc, sf)| (c + sc, f + sf))
    }
}

#[async_trait]
impl CostAdapter for StaticCost {
    async fn get_cost_metrics(&self, query: &CostMetricsQuery) -> AdapterResult<CostMetrics> {
        self.outage.check("cost")?;
        let (current, _) = self.lookup(&query.services).await;

        let mut breakdown = Map::new();
        for service in &query.services {
            breakdown.insert(service.clone(), Value::from(current));
        }

        Ok(CostMetrics {
            total_cost: current,
            currency: "USD".to_string(),
            period: Some(format!(
                "{}/{}",
                query.start_date.to_rfc3339(),
                query.end_date.to_rfc3339()
            )),
            breakdown,
        })
    }

    async fn get_forecast(&self, query: &ForecastQuery) -> AdapterResult<CostForecast> {
        self.outage.check("cost")?;
        let (_, forecast) = self.lookup(&query.services).await;

        Ok(CostForecast {
            projected_cost: forecast,
            confidence: Some(0.8),
            period: Some(format!("{}d", query.horizon_days)),
        })
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Versioned key/value store
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    entries: RwLock<HashMap<String, ConfigEntry>>,
    outage: Outage,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a key, bumping its version
    pub async fn set(&self, key: impl Into<String>, value: Value) -> u64 {
        let key = key.into();
        let mut entries = self.entries.write().await;
        let version = entries.get(&key).map(|e| e.version + 1).unwrap_or(1);
        entries.insert(
            key.clone(),
            ConfigEntry {
                key,
                value,
                version,
                last_updated: Utc::now(),
            },
        );
        version
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl ConfigAdapter for MemoryConfigStore {
    async fn get_config(&self, key: &str) -> AdapterResult<ConfigEntry> {
        self.outage.check("configuration")?;
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AdapterError::rejected(format!("config key not found: {}", key)))
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Knows the `audit.signal.v1` schema and nothing else
#[derive(Debug, Default)]
pub struct AuditSchemaRegistry {
    outage: Outage,
}

impl AuditSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }

    fn check_audit_signal(data: &Value) -> Vec<SchemaViolation> {
        let mut errors = Vec::new();
        let Some(object) = data.as_object() else {
            errors.push(violation("", "audit signal must be an object"));
            return errors;
        };

        for field in ["timestamp", "action", "principal", "resource"] {
            match object.get(field).and_then(Value::as_str) {
                Some(s) if !s.trim().is_empty() => {}
                _ => errors.push(violation(
                    field,
                    &format!("{} is required and must be a non-empty string", field),
                )),
            }
        }

        if let Some(ts) = object.get("timestamp").and_then(Value::as_str) {
            if !ts.trim().is_empty() && parse_iso8601(ts).is_err() {
                errors.push(violation("timestamp", "timestamp must be an ISO-8601 date-time"));
            }
        }

        match object.get("outcome").and_then(Value::as_str) {
            Some("allowed") | Some("denied") => {}
            _ => errors.push(violation("outcome", "outcome must be 'allowed' or 'denied'")),
        }

        if let Some(metadata) = object.get("metadata") {
            if !metadata.is_object() && !metadata.is_null() {
                errors.push(violation("metadata", "metadata must be an object"));
            }
        }

        errors
    }
}

fn violation(path: &str, message: &str) -> SchemaViolation {
    SchemaViolation {
        path: path.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl SchemaAdapter for AuditSchemaRegistry {
    async fn validate(&self, schema_id: &str, data: &Value) -> AdapterResult<SchemaValidation> {
        self.outage.check("schema")?;

        if schema_id != AUDIT_SIGNAL_SCHEMA {
            return Err(AdapterError::rejected(format!("unknown schema: {}", schema_id)));
        }

        let errors = Self::check_audit_signal(data);
        debug!("Validated {} with {} error(s)", schema_id, errors.len());
        Ok(SchemaValidation {
            valid: errors.is_empty(),
            errors,
        })
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Events kept per recording sink; older ones are dropped first
pub const RECORDING_CAPACITY: usize = 256;

/// Bounded log of the most recent events
#[derive(Debug)]
struct EventLog<T> {
    events: RwLock<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> EventLog<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    async fn push(&self, event: T) {
        let mut events = self.events.write().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    async fn snapshot(&self) -> Vec<T> {
        self.events.read().await.iter().cloned().collect()
    }
}

impl<T: Clone> Default for EventLog<T> {
    fn default() -> Self {
        Self::with_capacity(RECORDING_CAPACITY)
    }
}

/// Keeps the most recent tracked analytics events
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    log: EventLog<AnalyticsEvent>,
    outage: Outage,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub async fn events(&self) -> Vec<AnalyticsEvent> {
        self.log.snapshot().await
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl AnalyticsAdapter for RecordingAnalytics {
    async fn track(&self, event: &AnalyticsEvent) -> AdapterResult<()> {
        self.outage.check("analytics")?;
        debug!("analytics: {} {:?}", event.event_name, event.properties);
        self.log.push(event.clone()).await;
        Ok(())
    }
}

/// Keeps the most recent published dashboard events
#[derive(Debug, Default)]
pub struct RecordingDashboard {
    log: EventLog<GovernanceEvent>,
    outage: Outage,
}

impl RecordingDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub async fn events(&self) -> Vec<GovernanceEvent> {
        self.log.snapshot().await
    }

    #[allow(dead_code)]
    pub fn set_outage(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl DashboardAdapter for RecordingDashboard {
    async fn publish_event(&self, event: &GovernanceEvent) -> AdapterResult<()> {
        self.outage.check("dashboard")?;
        debug!("dashboard: {} ({:?}) {}", event.event_type, event.severity, event.details);
        self.log.push(event.clone()).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_parses_partial_documents() {
        let seed: Seed = serde_json::from_value(json!({
            "deniedActions": ["delete"],
            "costs": { "db-prod": { "current": 10.0, "forecast": 20.0 } }
        }))
        .unwrap();

        assert_eq!(seed.denied_actions, vec!["delete".to_string()]);
        assert_eq!(seed.costs["db-prod"].forecast, 20.0);
        assert!(seed.config.is_empty());
    }

    #[tokio::test]
    async fn test_config_store_bumps_version() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.set("feature.flag", json!(true)).await, 1);
        assert_eq!(store.set("feature.flag", json!(false)).await, 2);

        let entry = store.get_config("feature.flag").await.unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.value, json!(false));
    }

    #[tokio::test]
    async fn test_config_store_missing_key_is_rejected() {
        let store = MemoryConfigStore::new();
        let err = store.get_config("nope").await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_static_policy_deny_list() {
        let policy = StaticPolicy::new().deny("delete");
        let query = |action: &str| PolicyQuery {
            principal: "alice".to_string(),
            action: action.to_string(),
            resource: "db-1".to_string(),
            context: Map::new(),
        };

        let verdict = policy.evaluate_policy(&query("delete")).await.unwrap();
        assert!(!verdict.allowed);
        assert_eq!(verdict.applied_policies, vec!["deny-delete".to_string()]);

        let verdict = policy.evaluate_policy(&query("read")).await.unwrap();
        assert!(verdict.allowed);
    }

    #[tokio::test]
    async fn test_schema_registry_reports_every_bad_field() {
        let registry = AuditSchemaRegistry::new();
        let result = registry
            .validate(
                AUDIT_SIGNAL_SCHEMA,
                &json!({ "timestamp": "yesterday", "action": "", "outcome": "maybe", "metadata": [] }),
            )
            .await
            .unwrap();

        assert!(!result.valid);
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"timestamp"));
        assert!(paths.contains(&"action"));
        assert!(paths.contains(&"principal"));
        assert!(paths.contains(&"resource"));
        assert!(paths.contains(&"outcome"));
        assert!(paths.contains(&"metadata"));
    }

    #[tokio::test]
    async fn test_schema_registry_accepts_iso8601_without_offset() {
        let registry = AuditSchemaRegistry::new();
        for timestamp in ["2026-03-01T12:00:00", "2026-03-01T12:00:00.5", "2026-03-01", "2026-03-01T12:00:00+05:30"] {
            let result = registry
                .validate(
                    AUDIT_SIGNAL_SCHEMA,
                    &json!({
                        "timestamp": timestamp,
                        "action": "read",
                        "principal": "bob",
                        "resource": "db-prod",
                        "outcome": "allowed"
                    }),
                )
                .await
                .unwrap();
            assert!(result.valid, "{} rejected: {:?}", timestamp, result.errors);
        }
    }

    #[tokio::test]
    async fn test_schema_registry_rejects_unknown_schema() {
        let registry = AuditSchemaRegistry::new();
        assert!(registry.validate("other.v2", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_outage_switch() {
        let dashboard = RecordingDashboard::new();
        dashboard.set_outage(true);
        let event = GovernanceEvent {
            event_type: "audit.signal".to_string(),
            severity: EventSeverity::Info,
            timestamp: Utc::now(),
            details: json!({}),
        };
        assert!(dashboard.publish_event(&event).await.is_err());

        dashboard.set_outage(false);
        assert!(dashboard.publish_event(&event).await.is_ok());
        assert_eq!(dashboard.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_event_log_keeps_most_recent() {
        let log = EventLog::with_capacity(3);
        for n in 0..5 {
            log.push(n).await;
        }
        assert_eq!(log.snapshot().await, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_recording_sinks_are_bounded() {
        let analytics = RecordingAnalytics::new();
        for n in 0..RECORDING_CAPACITY + 10 {
            let event = AnalyticsEvent {
                event_name: format!("event-{}", n),
                timestamp: Utc::now(),
                properties: Map::new(),
                user_id: None,
            };
            analytics.track(&event).await.unwrap();
        }

        let events = analytics.events().await;
        assert_eq!(events.len(), RECORDING_CAPACITY);
        assert_eq!(events[0].event_name, "event-10");
        assert_eq!(
            events.last().map(|e| e.event_name.as_str()),
            Some(format!("event-{}", RECORDING_CAPACITY + 9).as_str())
        );
    }
}

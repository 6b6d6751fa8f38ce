//! FinOps summary - current spend, forecast and budget classification

use crate::adapters::{CostMetricsQuery, ForecastQuery};
use crate::error::GovernanceError;
use crate::pipeline::orchestrator::GovernanceOrchestrator;
use crate::pipeline::types::{BudgetStatus, FinOpsSummary};
use chrono::{Duration, Utc};
use tracing::debug;

/// Trailing cost window and forecast horizon
pub const COST_WINDOW_DAYS: u32 = 30;

const WARNING_RATIO: f64 = 1.2;
const EXCEEDED_RATIO: f64 = 1.5;

impl BudgetStatus {
    /// First match wins: exceeded, then warning, else within
    pub fn classify(current_cost: f64, forecast: f64) -> Self {
        if forecast > current_cost * EXCEEDED_RATIO {
            BudgetStatus::Exceeded
        } else if forecast > current_cost * WARNING_RATIO {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Within
        }
    }
}

impl GovernanceOrchestrator {
    /// Cost of a resource over the last 30 days and its 30-day forecast
    pub async fn get_finops_summary(&self, resource_id: &str) -> Result<FinOpsSummary, GovernanceError> {
        let end_date = Utc::now();
        let start_date = end_date - Duration::days(i64::from(COST_WINDOW_DAYS));
        let services = vec![resource_id.to_string()];

        let metrics_query = CostMetricsQuery {
            start_date,
            end_date,
            services: services.clone(),
        };
        let forecast_query = ForecastQuery {
            horizon_days: COST_WINDOW_DAYS,
            services,
        };

        let cost = &self.collaborators.cost;
        let (metrics, forecast) = tokio::try_join!(
            cost.get_cost_metrics(&metrics_query),
            cost.get_forecast(&forecast_query)
        )
        .map_err(|e| GovernanceError::FinOps(e.to_string()))?;

        let budget_status = BudgetStatus::classify(metrics.total_cost, forecast.projected_cost);
        debug!(
            "{}: current {} {}, forecast {} -> {:?}",
            resource_id, metrics.total_cost, metrics.currency, forecast.projected_cost, budget_status
        );

        Ok(FinOpsSummary {
            resource_id: resource_id.to_string(),
            current_cost: metrics.total_cost,
            forecast: forecast.projected_cost,
            budget_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AdapterResponse, AdapterResult, CostAdapter, CostForecast, CostMetrics};
    use crate::pipeline::testing::Harness;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    /// Reports success on metrics but answers the forecast without a payload
    struct EmptyForecast;

    #[async_trait]
    impl CostAdapter for EmptyForecast {
        async fn get_cost_metrics(&self, _query: &CostMetricsQuery) -> AdapterResult<CostMetrics> {
            serde_json::from_value::<AdapterResponse<CostMetrics>>(json!({
                "success": true,
                "data": { "totalCost": 40.0, "currency": "USD", "breakdown": {} }
            }))
            .unwrap()
            .into_result()
        }

        async fn get_forecast(&self, _query: &ForecastQuery) -> AdapterResult<CostForecast> {
            serde_json::from_value::<AdapterResponse<CostForecast>>(json!({ "success": true }))
                .unwrap()
                .into_result()
        }
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(BudgetStatus::classify(100.0, 110.0), BudgetStatus::Within);
        assert_eq!(BudgetStatus::classify(100.0, 120.0), BudgetStatus::Within);
        assert_eq!(BudgetStatus::classify(100.0, 125.0), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::classify(100.0, 150.0), BudgetStatus::Warning);
        assert_eq!(BudgetStatus::classify(100.0, 160.0), BudgetStatus::Exceeded);
    }

    #[test]
    fn test_classify_zero_spend() {
        assert_eq!(BudgetStatus::classify(0.0, 0.0), BudgetStatus::Within);
        assert_eq!(BudgetStatus::classify(0.0, 1.0), BudgetStatus::Exceeded);
    }

    #[tokio::test]
    async fn test_summary_from_cost_collaborator() {
        let harness = Harness::new();
        harness.cost.set_cost("svc-api", 100.0, 125.0).await;

        let summary = harness
            .orchestrator()
            .get_finops_summary("svc-api")
            .await
            .unwrap();

        assert_eq!(
            summary,
            FinOpsSummary {
                resource_id: "svc-api".to_string(),
                current_cost: 100.0,
                forecast: 125.0,
                budget_status: BudgetStatus::Warning,
            }
        );
    }

    #[tokio::test]
    async fn test_summary_fails_when_cost_collaborator_fails() {
        let harness = Harness::new();
        harness.cost.set_outage(true);

        let err = harness
            .orchestrator()
            .get_finops_summary("svc-api")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "FinOps summary failed: cost service unavailable");
    }

    #[tokio::test]
    async fn test_summary_fails_on_missing_payload() {
        let harness = Harness::new();
        let mut collaborators = harness.collaborators();
        collaborators.cost = Arc::new(EmptyForecast);

        let err = GovernanceOrchestrator::new(collaborators)
            .get_finops_summary("svc-api")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GovernanceError::FinOps("collaborator returned no data".to_string())
        );
        assert_eq!(err.to_string(), "FinOps summary failed: collaborator returned no data");
    }
}

//! HTTP handlers.
//!
//! The service is stateless between requests: each optimize call carries its
//! table statistics inline, so the same deployment serves any catalog.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use planopt_core::config::OptimizerConfig;
use planopt_core::cost::Cost;
use planopt_core::engine::{CancellationToken, Optimizer};
use planopt_core::error::OptimizeError;
use planopt_core::plan::{PlanNode, TableHandle};
use planopt_core::render::render_plan;
use planopt_core::stats::{InMemoryStatsProvider, TableStatistics};
use planopt_core::trace::OptimizerTrace;
use planopt_rules::default_rules;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TableEntry {
    pub catalog: String,
    pub name: String,
    #[serde(flatten)]
    pub statistics: TableStatistics,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    /// Session overrides; omitted fields keep their defaults.
    pub config: Option<OptimizerConfig>,
    #[serde(default)]
    pub tables: Vec<TableEntry>,
    pub plan: PlanNode,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub plan: String,
    pub cost: Cost,
    pub trace: OptimizerTrace,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.optimizer.rule_names())
}

pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Response {
    let mut provider = InMemoryStatsProvider::new();
    for table in request.tables {
        provider.insert(
            TableHandle::new(table.catalog, table.name),
            table.statistics,
        );
    }

    let session_optimizer;
    let optimizer = match request.config {
        Some(config) => {
            session_optimizer = Optimizer::new(config, default_rules());
            &session_optimizer
        }
        None => &state.optimizer,
    };

    match optimizer.optimize(request.plan, &provider, &CancellationToken::new()) {
        Ok(optimized) => {
            info!(?optimized.cost, "optimization finished");
            let rendered = render_plan(&optimized.plan, &provider, optimizer.config());
            (
                StatusCode::OK,
                Json(OptimizeResponse {
                    plan: rendered,
                    cost: optimized.cost,
                    trace: optimized.trace,
                }),
            )
                .into_response()
        }
        Err(err @ OptimizeError::Plan(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planopt_core::properties::Distribution;
    use planopt_core::sym::{PlanNodeId, Symbol};

    fn scan_request(table: &str) -> OptimizeRequest {
        OptimizeRequest {
            config: None,
            tables: vec![],
            plan: PlanNode::TableScan {
                id: PlanNodeId(0),
                table: TableHandle::new("t", table),
                outputs: vec![Symbol::bigint("k")],
                partitioning: Distribution::Arbitrary,
            },
        }
    }

    #[tokio::test]
    async fn optimize_returns_rendered_plan() {
        let state = Arc::new(AppState::new());
        let response = optimize(State(state), Json(scan_request("orders"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_plan_is_a_client_error() {
        use planopt_core::expr::{Expr, ScalarValue};

        let state = Arc::new(AppState::new());
        let request = OptimizeRequest {
            config: None,
            tables: vec![],
            plan: PlanNode::Filter {
                id: PlanNodeId(1),
                child: Box::new(PlanNode::TableScan {
                    id: PlanNodeId(0),
                    table: TableHandle::new("t", "orders"),
                    outputs: vec![Symbol::bigint("k")],
                    partitioning: Distribution::Arbitrary,
                }),
                predicate: Expr::eq(
                    Expr::symbol(Symbol::bigint("missing")),
                    Expr::literal(ScalarValue::Bigint(1)),
                ),
            },
        };
        let response = optimize(State(state), Json(request)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rules_are_listed_in_application_order() {
        let state = Arc::new(AppState::new());
        let names = state.optimizer.rule_names();
        assert_eq!(names.first(), Some(&"RemoveTrivialFilter"));
        assert_eq!(names.last(), Some(&"ReorderJoins"));
        let response = list_rules(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn request_deserializes_from_json() {
        let body = serde_json::json!({
            "tables": [{
                "catalog": "t",
                "name": "orders",
                "row_count": { "known": 100.0 },
                "columns": {}
            }],
            "plan": {
                "node": "table_scan",
                "id": 0,
                "table": { "catalog": "t", "name": "orders" },
                "outputs": [{ "name": "k", "ty": "bigint" }],
                "partitioning": "arbitrary"
            }
        });
        let request: OptimizeRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.tables.len(), 1);
        assert!(matches!(request.plan, PlanNode::TableScan { .. }));
    }
}

// server.rs — Routes and handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use sb_model::{ApprovalStatus, HealthStatus};
use sb_router::{target_adapter, ActionRouter, ResolutionOutcome, RouteOutcome};

use crate::error::ApiError;
use crate::schemas::{
    ApproveBody, AuditVerifyBody, PendingApproval, PolicyCheckBody, PolicyCheckResponse,
    RouteBody, RouteResponse,
};

pub struct AppState {
    pub router: ActionRouter,
}

impl AppState {
    pub fn new(router: ActionRouter) -> Self {
        Self { router }
    }
}

/// Build the HTTP application around a router instance.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/route", post(route_action))
        .route("/approve", post(approve_action))
        .route("/policy/check", post(policy_check))
        .route("/approvals/pending", get(approvals_pending))
        .route("/audit/verify", post(audit_verify))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /route — evaluate, audit, and dispatch (or park / block).
async fn route_action(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<RouteBody>,
) -> Result<Response, ApiError> {
    body.request.normalize()?;
    let adapter = target_adapter(&body.request.tool_name).to_string();

    match state.router.route(body.request).await? {
        RouteOutcome::Executed { result, policy } => Ok((
            StatusCode::OK,
            Json(RouteResponse {
                result: "executed",
                success: result.success,
                detail: result.detail,
                adapter,
                policy,
                response: result.response,
            }),
        )
            .into_response()),
        RouteOutcome::Pending {
            decision,
            approval_id,
        } => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "result": "pending_approval",
                "approval_id": approval_id,
                "detail": decision.policy.reason,
                "approval_required": true,
                "policy": decision.policy,
                "adapter": decision.target_adapter,
            })),
        )
            .into_response()),
        RouteOutcome::Blocked { decision } => Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "result": "blocked",
                "policy": decision.policy,
                "adapter": decision.target_adapter,
            })),
        )
            .into_response()),
    }
}

/// POST /approve — resolve a pending approval.
async fn approve_action(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ApproveBody>,
) -> Result<Response, ApiError> {
    if body.status == ApprovalStatus::Pending {
        return Err(ApiError::bad_request("Cannot transition to pending"));
    }
    let resolution = state
        .router
        .resolve(body.approval_id, body.status, &body.decided_by, body.notes)
        .await?;

    let payload = match resolution {
        ResolutionOutcome::Denied { approval_id } => json!({
            "result": "denied",
            "approval_id": approval_id,
        }),
        ResolutionOutcome::Executed {
            approval_id,
            adapter,
            result,
        } => json!({
            "result": "executed",
            "success": result.success,
            "detail": result.detail,
            "adapter": adapter,
            "approval_id": approval_id,
        }),
    };
    Ok(Json(payload).into_response())
}

/// POST /policy/check — evaluate without auditing or dispatching.
async fn policy_check(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<PolicyCheckBody>,
) -> Result<Json<PolicyCheckResponse>, ApiError> {
    body.request.normalize()?;
    let policy = state.router.policy().evaluate(&body.request).await;
    Ok(Json(PolicyCheckResponse { policy }))
}

/// GET /approvals/pending — the reviewer queue.
async fn approvals_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PendingApproval>>, ApiError> {
    let pending = state
        .router
        .approvals()
        .pending_details()
        .await
        .map_err(sb_router::RouterError::Approval)?;
    let items = pending
        .into_iter()
        .map(|(approval_id, (record, route))| PendingApproval {
            approval_id,
            request: record.request.clone(),
            policy: record.policy_decision.clone(),
            adapter: route.target_adapter,
            audit: record,
        })
        .collect();
    Ok(Json(items))
}

/// POST /audit/verify — signature and transparency-inclusion check.
async fn audit_verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuditVerifyBody>,
) -> Json<sb_audit::AuditVerification> {
    Json(
        state
            .router
            .audit()
            .verify(&body.record, body.verify_rekor)
            .await,
    )
}

/// GET /healthz — liveness.
async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus::ok("switchboard-api"))
}

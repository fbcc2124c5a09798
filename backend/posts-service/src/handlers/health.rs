/// Health probes
///
/// - `/api/v1/health`: summary, fails when the database is unreachable
/// - `/api/v1/health/ready`: per-component readiness (database, page cache)
/// - `/api/v1/health/live`: process liveness only
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.repo.ping().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "posts-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Database connection failed: {}", e),
            "service": "posts-service"
        })),
    }
}

pub async fn readiness_summary(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let db_result = state.repo.ping().await;
    let db_latency = Some(start.elapsed().as_millis() as u64);
    let db_check = match db_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Database connection successful".to_string(),
            latency_ms: db_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("Database connection failed: {}", e),
            latency_ms: db_latency,
        },
    };
    checks.insert("database".to_string(), db_check);

    // Page cache failures degrade, never fail, readiness.
    let start = Instant::now();
    let cache_result = state.page_cache.ping().await;
    let cache_latency = Some(start.elapsed().as_millis() as u64);
    let cache_check = match cache_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Page cache ping successful".to_string(),
            latency_ms: cache_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Degraded,
            message: format!("Page cache ping failed: {}", e),
            latency_ms: cache_latency,
        },
    };
    checks.insert("page_cache".to_string(), cache_check);

    let ready = checks
        .values()
        .all(|c| c.status != ComponentStatus::Unhealthy);
    let status = if !ready {
        ComponentStatus::Unhealthy
    } else if checks
        .values()
        .any(|c| c.status == ComponentStatus::Degraded)
    {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

use crate::db::Database;
use crate::utils::auth::TokenIssuer;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize, ToSchema)]
pub struct HealthChecks {
    pub storage_ok: bool,
    pub jwt_uses_default: bool,
}

/// Public health check endpoint with dependency checks
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded")
    ),
    tag = "Health"
)]
pub async fn health(db: web::Data<Database>, issuer: web::Data<TokenIssuer>) -> impl Responder {
    let storage_ok = db.db.begin_read().is_ok();
    let jwt_uses_default = issuer.uses_default_secret();

    if jwt_uses_default {
        warn!("Health check: Using default JWT secret - NOT SECURE FOR PRODUCTION");
    }

    let status = if storage_ok && !jwt_uses_default {
        "healthy"
    } else {
        "degraded"
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage_ok,
            jwt_uses_default,
        },
    };

    if status == "healthy" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

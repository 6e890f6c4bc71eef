use crate::db::job_repository::JobRepository;
use crate::models::job::JobPayload;
use crate::models::user::Claims;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct ListJobsQuery {
    /// Restrict to the caller's own postings
    #[serde(default)]
    pub mine: bool,
}

/// List job postings
#[utoipa::path(
    get,
    path = "/hr/jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Jobs listed", body = [crate::models::job::Job]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn list(
    claims: web::ReqData<Claims>,
    job_repo: web::Data<JobRepository>,
    query: web::Query<ListJobsQuery>,
) -> impl Responder {
    let result = if query.mine {
        job_repo.list_for_hr(&claims.sub).await
    } else {
        job_repo.list().await
    };
    match result {
        Ok(jobs) => HttpResponse::Ok().json(jobs),
        Err(e) => {
            error!(error = %e, "Failed to list jobs");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Create a job posting owned by the caller
#[utoipa::path(
    post,
    path = "/hr/jobs",
    request_body = JobPayload,
    responses(
        (status = 200, description = "Job created", body = crate::models::job::Job),
        (status = 400, description = "Missing required field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn create(
    claims: web::ReqData<Claims>,
    job_repo: web::Data<JobRepository>,
    payload: web::Json<JobPayload>,
) -> impl Responder {
    let payload = payload.into_inner();
    if let Err(message) = payload.validate() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "message": message }));
    }

    let job = payload.into_job(uuid::Uuid::new_v4().to_string(), claims.sub.clone());
    match job_repo.create(job).await {
        Ok(job) => {
            info!(job_id = %job.id, hr_id = %claims.sub, name = %job.name, "Job posted");
            HttpResponse::Ok().json(job)
        }
        Err(e) => {
            error!(error = %e, "Failed to create job");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Fetch one job posting
#[utoipa::path(
    get,
    path = "/hr/jobs/{id}",
    responses(
        (status = 200, description = "Job found", body = crate::models::job::Job),
        (status = 404, description = "Unknown job id")
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn get(job_repo: web::Data<JobRepository>, path: web::Path<String>) -> impl Responder {
    match job_repo.get_by_id(&path).await {
        Ok(Some(job)) => HttpResponse::Ok().json(job),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Job not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to fetch job");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Replace every mutable field of a job posting
#[utoipa::path(
    put,
    path = "/hr/jobs/{id}",
    request_body = JobPayload,
    responses(
        (status = 200, description = "Job updated", body = crate::models::job::Job),
        (status = 400, description = "Missing required field"),
        (status = 404, description = "Unknown job id")
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn update(
    job_repo: web::Data<JobRepository>,
    path: web::Path<String>,
    payload: web::Json<JobPayload>,
) -> impl Responder {
    let payload = payload.into_inner();
    if let Err(message) = payload.validate() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "message": message }));
    }

    // Ownership is immutable; the stored owner survives the replacement
    let existing = match job_repo.get_by_id(&path).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Job not found"
            }));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch job for update");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let job = payload.into_job(existing.id, existing.hr_id);
    match job_repo.update(job).await {
        Ok(job) => HttpResponse::Ok().json(job),
        Err(e) if e.contains("not found") => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Job not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to update job");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Permanently remove a job posting
#[utoipa::path(
    delete,
    path = "/hr/jobs/{id}",
    responses(
        (status = 200, description = "Job deleted"),
        (status = 404, description = "Unknown job id")
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn delete(job_repo: web::Data<JobRepository>, path: web::Path<String>) -> impl Responder {
    match job_repo.delete(&path).await {
        Ok(true) => {
            info!(job_id = %path.as_str(), "Job removed");
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Job deleted"
            }))
        }
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Job not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to delete job");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::middleware::auth::AuthMiddleware;
    use crate::models::user::Role;
    use crate::utils::auth::TokenIssuer;
    use actix_web::{test, App};

    fn job_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Backend Engineer",
            "positionType": "Full-time",
            "location": "Remote",
            "contactInfo": "hr@example.com",
            "closeDate": "2026-12-31",
            "minEducation": "Bachelor",
            "minExperience": 2,
            "keywords": ["rust"]
        })
    }

    macro_rules! hr_app {
        ($db:expr, $issuer:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(JobRepository::new($db)))
                    .service(
                        web::scope("/hr")
                            .wrap(AuthMiddleware::roles($issuer, &[Role::Hr, Role::Admin]))
                            .route("/jobs", web::get().to(list))
                            .route("/jobs", web::post().to(create))
                            .route("/jobs/{id}", web::get().to(get))
                            .route("/jobs/{id}", web::put().to(update))
                            .route("/jobs/{id}", web::delete().to(delete)),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_requires_token_and_role() {
        let issuer = TokenIssuer::new("test-secret");
        let app = hr_app!(Database::in_memory().unwrap(), issuer.clone());

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/hr/jobs").to_request()).await;
        assert_eq!(resp.status(), 401);

        let applicant = issuer.issue("user-1", Role::Applicant).unwrap();
        let req = test::TestRequest::get()
            .uri("/hr/jobs")
            .insert_header(("Authorization", format!("Bearer {}", applicant)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let hr = issuer.issue("hr-1", Role::Hr).unwrap();
        let req = test::TestRequest::get()
            .uri("/hr/jobs")
            .insert_header(("Authorization", format!("Bearer {}", hr)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_create_get_delete_flow() {
        let issuer = TokenIssuer::new("test-secret");
        let app = hr_app!(Database::in_memory().unwrap(), issuer.clone());
        let token = issuer.issue("hr-1", Role::Hr).unwrap();
        let auth = ("Authorization", format!("Bearer {}", token));

        let req = test::TestRequest::post()
            .uri("/hr/jobs")
            .insert_header(auth.clone())
            .set_json(job_json())
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["hrId"], "hr-1");
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/hr/jobs/{}", id))
            .insert_header(auth.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::delete()
            .uri(&format!("/hr/jobs/{}", id))
            .insert_header(auth.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        // Deleted job is gone for good
        let req = test::TestRequest::get()
            .uri(&format!("/hr/jobs/{}", id))
            .insert_header(auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn test_create_rejects_missing_fields() {
        let issuer = TokenIssuer::new("test-secret");
        let app = hr_app!(Database::in_memory().unwrap(), issuer.clone());
        let token = issuer.issue("hr-1", Role::Hr).unwrap();

        let mut body = job_json();
        body["contactInfo"] = serde_json::json!("");
        let req = test::TestRequest::post()
            .uri("/hr/jobs")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}

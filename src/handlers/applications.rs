use crate::db::application_repository::ApplicationRepository;
use crate::db::job_repository::JobRepository;
use crate::db::notification_repository::NotificationRepository;
use crate::models::application::{Application, Status};
use crate::models::job::EducationLevel;
use crate::models::notification::{Notification, SYSTEM_SENDER};
use crate::models::user::Claims;
use actix_multipart::form::{bytes::Bytes as UploadedBytes, text::Text, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info};
use utoipa::ToSchema;

/// List every application, joined with job and applicant names
#[utoipa::path(
    get,
    path = "/hr/applications",
    responses(
        (status = 200, description = "Applications listed", body = [crate::models::application::ApplicationSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn list_all(app_repo: web::Data<ApplicationRepository>) -> impl Responder {
    match app_repo.list_summaries(None).await {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(e) => {
            error!(error = %e, "Failed to list applications");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// List one job's applications
#[utoipa::path(
    get,
    path = "/hr/applications/job/{job_id}",
    responses(
        (status = 200, description = "Applications listed", body = [crate::models::application::ApplicationSummary]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn list_for_job(
    app_repo: web::Data<ApplicationRepository>,
    path: web::Path<String>,
) -> impl Responder {
    match app_repo.list_summaries(Some(&path)).await {
        Ok(summaries) => HttpResponse::Ok().json(summaries),
        Err(e) => {
            error!(error = %e, "Failed to list applications for job");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

#[derive(Serialize)]
pub struct ApplicationDetailResponse {
    #[serde(flatten)]
    pub application: Application,
    /// Resume bytes, base64-encoded for transit
    pub resume: String,
}

/// Full application detail including the resume
#[utoipa::path(
    get,
    path = "/hr/applications/{id}",
    responses(
        (status = 200, description = "Application detail with base64 resume"),
        (status = 404, description = "Unknown application id")
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn detail(
    app_repo: web::Data<ApplicationRepository>,
    path: web::Path<String>,
) -> impl Responder {
    match app_repo.get_by_id(&path).await {
        Ok(Some(application)) => {
            let resume = base64::engine::general_purpose::STANDARD.encode(&application.resume);
            HttpResponse::Ok().json(ApplicationDetailResponse {
                application,
                resume,
            })
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Application not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to fetch application");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// Audit note recorded with the change
    #[serde(rename = "changeStatus", default)]
    pub change_status: Option<String>,
}

/// Move an application to a new workflow stage
#[utoipa::path(
    put,
    path = "/hr/applications/{id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unrecognized status"),
        (status = 404, description = "Unknown application id")
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn update_status(
    claims: web::ReqData<Claims>,
    app_repo: web::Data<ApplicationRepository>,
    notification_repo: web::Data<NotificationRepository>,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    // Reject before touching the store; an unknown status leaves it unchanged
    let status = match Status::from_str(&payload.status) {
        Ok(status) => status,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unrecognized status value"
            }));
        }
    };
    let note = payload.change_status.clone().unwrap_or_default();

    match app_repo.update_status(&path, status, &note).await {
        Ok(application) => {
            info!(
                application_id = %application.id,
                status = %status,
                changed_by = %claims.sub,
                "Application status changed"
            );
            // Best effort: the status change itself already committed
            let notice = Notification {
                id: uuid::Uuid::new_v4().to_string(),
                recipient_id: application.applicant_id.clone(),
                sender: SYSTEM_SENDER.to_string(),
                message: format!("Your application status changed to {}", status),
                sent_at: chrono::Utc::now(),
                read: false,
            };
            if let Err(e) = notification_repo.create(notice).await {
                error!(error = %e, "Failed to notify applicant of status change");
            }
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Status updated"
            }))
        }
        Err(e) if e.contains("not found") => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Application not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to update application status");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

#[derive(Debug, MultipartForm)]
pub struct ApplyForm {
    #[multipart(rename = "jobId")]
    pub job_id: Text<String>,
    pub education: Text<String>,
    #[multipart(rename = "experienceYears")]
    pub experience_years: Text<String>,
    #[multipart(rename = "profileSummary")]
    pub profile_summary: Option<Text<String>>,
    #[multipart(rename = "priorEmployer")]
    pub prior_employer: Option<Text<String>>,
    #[multipart(rename = "priorRole")]
    pub prior_role: Option<Text<String>>,
    #[multipart(limit = "5MB")]
    pub resume: UploadedBytes,
}

/// Submit an application to a job (applicant-only)
#[utoipa::path(
    post,
    path = "/applications",
    responses(
        (status = 200, description = "Application submitted"),
        (status = 400, description = "Malformed fields"),
        (status = 404, description = "Unknown job id")
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn submit(
    claims: web::ReqData<Claims>,
    app_repo: web::Data<ApplicationRepository>,
    job_repo: web::Data<JobRepository>,
    MultipartForm(form): MultipartForm<ApplyForm>,
) -> impl Responder {
    match job_repo.get_by_id(&form.job_id.0).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "message": "Job not found"
            }));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch job for application");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    }

    let education = match EducationLevel::from_str(&form.education.0) {
        Ok(level) => level,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unrecognized education level"
            }));
        }
    };
    let experience_years = match form.experience_years.0.trim().parse::<u32>() {
        Ok(years) => years,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Experience must be a non-negative number of years"
            }));
        }
    };
    if form.resume.data.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "A resume file is required"
        }));
    }

    let application = Application {
        id: uuid::Uuid::new_v4().to_string(),
        job_id: form.job_id.0.clone(),
        applicant_id: claims.sub.clone(),
        submitted_at: chrono::Utc::now(),
        status: Status::Pending,
        resume: form.resume.data.to_vec(),
        education,
        experience_years,
        profile_summary: form.profile_summary.map(|t| t.0).unwrap_or_default(),
        prior_employer: form.prior_employer.map(|t| t.0),
        prior_role: form.prior_role.map(|t| t.0),
        history: vec![],
    };

    match app_repo.create(application).await {
        Ok(application) => {
            info!(
                application_id = %application.id,
                job_id = %application.job_id,
                applicant_id = %claims.sub,
                "Application submitted"
            );
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Application submitted",
                "applicationId": application.id
            }))
        }
        Err(e) => {
            error!(error = %e, "Failed to store application");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

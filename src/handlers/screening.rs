use crate::db::application_repository::ApplicationRepository;
use crate::db::job_repository::JobRepository;
use crate::models::application::Application;
use crate::models::job::Job;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct ScreeningCriteria {
    #[serde(default)]
    pub education: bool,
    #[serde(default)]
    pub experience: bool,
    #[serde(default)]
    pub keywords: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct ScreeningRequest {
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(default)]
    pub criteria: ScreeningCriteria,
}

/// Keeps the applications passing every enabled criterion. With nothing
/// enabled the set passes through unfiltered. Pure; nothing is persisted.
pub fn screen(job: &Job, applications: Vec<Application>, criteria: &ScreeningCriteria) -> Vec<Application> {
    applications
        .into_iter()
        .filter(|app| {
            if criteria.education && app.education < job.min_education {
                return false;
            }
            if criteria.experience && app.experience_years < job.min_experience {
                return false;
            }
            if criteria.keywords && !matches_keywords(job, app) {
                return false;
            }
            true
        })
        .collect()
}

// Case-insensitive substring containment of any job keyword in the
// application's text fields. An empty keyword list is vacuously satisfied.
fn matches_keywords(job: &Job, app: &Application) -> bool {
    if job.keywords.is_empty() {
        return true;
    }
    let mut haystack = app.profile_summary.to_lowercase();
    if let Some(employer) = &app.prior_employer {
        haystack.push(' ');
        haystack.push_str(&employer.to_lowercase());
    }
    if let Some(role) = &app.prior_role {
        haystack.push(' ');
        haystack.push_str(&role.to_lowercase());
    }
    job.keywords
        .iter()
        .any(|keyword| !keyword.is_empty() && haystack.contains(&keyword.to_lowercase()))
}

/// Filter one job's applications against its requirements
#[utoipa::path(
    post,
    path = "/hr/screening",
    request_body = ScreeningRequest,
    responses(
        (status = 200, description = "Matching applications", body = [crate::models::application::Application]),
        (status = 400, description = "Unknown job id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Screening"
)]
pub async fn run(
    job_repo: web::Data<JobRepository>,
    app_repo: web::Data<ApplicationRepository>,
    payload: web::Json<ScreeningRequest>,
) -> impl Responder {
    let job = match job_repo.get_by_id(&payload.job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unknown job id"
            }));
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch job for screening");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let applications = match app_repo.list_for_job(&payload.job_id).await {
        Ok(applications) => applications,
        Err(e) => {
            error!(error = %e, "Failed to load applications for screening");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let total = applications.len();
    let matched = screen(&job, applications, &payload.criteria);
    info!(
        job_id = %payload.job_id,
        total,
        matched = matched.len(),
        "Screening run completed"
    );

    HttpResponse::Ok().json(matched)
}

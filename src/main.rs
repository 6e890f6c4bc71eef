mod db;
mod handlers;
mod middleware;
mod models;
mod utils;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use db::application_repository::ApplicationRepository;
use db::job_repository::JobRepository;
use db::notification_repository::NotificationRepository;
use db::user_repository::UserRepository;
use db::Database;
use dotenv::dotenv;
use middleware::auth::AuthMiddleware;
use middleware::rate_limit::RateLimitMiddleware;
use models::user::Role;
use std::env;
use tracing::info;
use tracing_actix_web::TracingLogger;
use utils::auth::TokenIssuer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::login,
        handlers::auth::signup,
        handlers::jobs::list,
        handlers::jobs::create,
        handlers::jobs::get,
        handlers::jobs::update,
        handlers::jobs::delete,
        handlers::applications::list_all,
        handlers::applications::list_for_job,
        handlers::applications::detail,
        handlers::applications::update_status,
        handlers::applications::submit,
        handlers::screening::run,
        handlers::notifications::send,
        handlers::notifications::list,
        handlers::notifications::unread_count,
        handlers::notifications::list_for_user,
        handlers::notifications::mark_read,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::health::HealthChecks,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::applications::UpdateStatusRequest,
            handlers::screening::ScreeningRequest,
            handlers::screening::ScreeningCriteria,
            handlers::notifications::SendNotificationRequest,
            models::user::User,
            models::user::Role,
            models::user::Claims,
            models::job::Job,
            models::job::JobPayload,
            models::job::EducationLevel,
            models::application::Application,
            models::application::ApplicationSummary,
            models::application::Status,
            models::application::StatusChange,
            models::notification::Notification,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Signup and session-token issuance"),
        (name = "Jobs", description = "HR job registry"),
        (name = "Applications", description = "Application pipeline and screening"),
        (name = "Screening", description = "Criteria filter over a job's applications"),
        (name = "Notifications", description = "Per-user notification relay")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json()
        .init();

    // Initialize storage and the token issuer once; everything downstream
    // receives them by injection
    let db_path = env::var("DB_PATH").unwrap_or_else(|_| "./data/talentgate.redb".to_string());
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let database = Database::new(&db_path).expect("Failed to initialize database");
    info!(db_path = %db_path, "Database initialized");

    let issuer = TokenIssuer::from_env();
    if issuer.uses_default_secret() {
        tracing::warn!("JWT_SECRET not set; using the default development secret");
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("{}:{}", host, port);

    info!(bind_address = %bind_address, "Starting recruiting portal API server");
    info!("Available endpoints:");
    info!("   GET  /api/health                       - Health check (public)");
    info!("   POST /signup                           - Register account (public)");
    info!("   POST /login                            - Obtain session token (public)");
    info!("   GET/POST /hr/jobs                      - Job registry (HR)");
    info!("   GET/PUT/DELETE /hr/jobs/:id            - Job registry (HR)");
    info!("   GET  /hr/applications[/job/:id | /:id] - Application pipeline (HR)");
    info!("   PUT  /hr/applications/:id/status       - Status update (HR)");
    info!("   POST /hr/screening                     - Screening filter (HR)");
    info!("   POST /hr/notifications                 - Send/broadcast notification (HR)");
    info!("   POST /applications                     - Submit application (Applicant)");
    info!("   GET/PUT /notifications...              - Notification relay (authenticated)");
    info!(
        swagger_url = format!("http://{}/swagger-ui/", bind_address),
        "Swagger UI available"
    );

    HttpServer::new(move || {
        let user_repo = UserRepository::new(database.clone());
        let job_repo = JobRepository::new(database.clone());
        let application_repo = ApplicationRepository::new(database.clone());
        let notification_repo = NotificationRepository::new(database.clone());

        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        let openapi = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(user_repo))
            .app_data(web::Data::new(job_repo))
            .app_data(web::Data::new(application_repo))
            .app_data(web::Data::new(notification_repo))
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(issuer.clone()))
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Swagger UI
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Public routes
            .route("/api/health", web::get().to(handlers::health::health))
            // Credential endpoints, rate limited per IP
            .service(
                web::resource("/login")
                    .wrap(RateLimitMiddleware::per_minute(10))
                    .route(web::post().to(handlers::auth::login)),
            )
            .service(
                web::resource("/signup")
                    .wrap(RateLimitMiddleware::per_minute(10))
                    .route(web::post().to(handlers::auth::signup)),
            )
            // HR dashboard surface
            .service(
                web::scope("/hr")
                    .wrap(AuthMiddleware::roles(
                        issuer.clone(),
                        &[Role::Hr, Role::Admin],
                    ))
                    .route("/jobs", web::get().to(handlers::jobs::list))
                    .route("/jobs", web::post().to(handlers::jobs::create))
                    .route("/jobs/{id}", web::get().to(handlers::jobs::get))
                    .route("/jobs/{id}", web::put().to(handlers::jobs::update))
                    .route("/jobs/{id}", web::delete().to(handlers::jobs::delete))
                    .route(
                        "/applications",
                        web::get().to(handlers::applications::list_all),
                    )
                    .route(
                        "/applications/job/{job_id}",
                        web::get().to(handlers::applications::list_for_job),
                    )
                    .route(
                        "/applications/{id}",
                        web::get().to(handlers::applications::detail),
                    )
                    .route(
                        "/applications/{id}/status",
                        web::put().to(handlers::applications::update_status),
                    )
                    .route("/screening", web::post().to(handlers::screening::run))
                    .route(
                        "/notifications",
                        web::post().to(handlers::notifications::send),
                    ),
            )
            // Applicant submission
            .service(
                web::scope("/applications")
                    .wrap(AuthMiddleware::roles(issuer.clone(), &[Role::Applicant]))
                    .route("", web::post().to(handlers::applications::submit)),
            )
            // Notification relay, any authenticated role
            .service(
                web::scope("/notifications")
                    .wrap(AuthMiddleware::bearer(issuer.clone()))
                    .route("", web::get().to(handlers::notifications::list))
                    .route(
                        "/unread-count",
                        web::get().to(handlers::notifications::unread_count),
                    )
                    .route(
                        "/user/{id}",
                        web::get().to(handlers::notifications::list_for_user),
                    )
                    .route(
                        "/{id}/read",
                        web::put().to(handlers::notifications::mark_read),
                    ),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}

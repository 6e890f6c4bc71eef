use crate::db::user_repository::UserRepository;
use crate::models::user::{Role, User};
use crate::utils::auth::{hash_password, verify_password, TokenIssuer};
use actix_multipart::form::{bytes::Bytes as UploadedBytes, text::Text, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{error, info, warn};
use utoipa::ToSchema;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
}

#[derive(Debug, MultipartForm)]
pub struct SignupForm {
    pub name: Text<String>,
    pub email: Text<String>,
    pub phone: Text<String>,
    pub role: Text<String>,
    pub password: Text<String>,
    #[multipart(rename = "confirmPassword")]
    pub confirm_password: Text<String>,
    /// Optional profile image; the extractor rejects anything over the limit
    /// before the handler body runs.
    #[multipart(limit = "5MB")]
    pub image: Option<UploadedBytes>,
}

/// Mirrors `^[^\s@]+@[^\s@]+\.[^\s@]+$`: one `@`, no whitespace, and a dotted
/// domain with non-empty segments.
fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Authenticate and issue a session token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed email or empty field"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    user_repo: web::Data<UserRepository>,
    issuer: web::Data<TokenIssuer>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    if !is_valid_email(&payload.email) || payload.password.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "A valid email and a password are required"
        }));
    }

    let user = match user_repo.get_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            // Same message as a wrong password; no account enumeration
            warn!(email = %payload.email, "Login failed: unknown email");
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "message": INVALID_CREDENTIALS
            }));
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(email = %payload.email, "Login failed: wrong password");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "message": INVALID_CREDENTIALS
        }));
    }

    let token = match issuer.issue(&user.id, user.role) {
        Ok(t) => t,
        Err(e) => {
            error!(error = ?e, email = %payload.email, "Failed to issue token");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    info!(email = %payload.email, user_id = %user.id, "User logged in successfully");

    HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        role: user.role,
    })
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/signup",
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Malformed input, password mismatch, bad upload or duplicate account")
    ),
    tag = "Authentication"
)]
pub async fn signup(
    user_repo: web::Data<UserRepository>,
    MultipartForm(form): MultipartForm<SignupForm>,
) -> impl Responder {
    info!(email = %form.email.0, "Signup attempt");

    if !is_valid_email(&form.email.0) {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid email format"
        }));
    }

    let role = match Role::from_str(&form.role.0) {
        Ok(role) => role,
        Err(_) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Role must be Applicant, HR or Admin"
            }));
        }
    };

    if form.name.0.trim().is_empty() || form.phone.0.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Name and phone are required"
        }));
    }

    if form.password.0.is_empty() || form.password.0 != form.confirm_password.0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Passwords do not match"
        }));
    }

    let image = match &form.image {
        Some(upload) => {
            let is_image = upload
                .content_type
                .as_ref()
                .map(|m| m.type_() == mime::IMAGE)
                .unwrap_or(false);
            if !is_image {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Profile image must be an image file"
                }));
            }
            Some(upload.data.to_vec())
        }
        None => None,
    };

    let password_hash = match hash_password(&form.password.0) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = ?e, "Failed to hash password");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
    };

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: form.name.0.clone(),
        email: form.email.0.clone(),
        phone: form.phone.0.clone(),
        role,
        password_hash,
        image,
        created_at: chrono::Utc::now(),
    };

    match user_repo.create(user).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "User registered successfully");
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Signup successful"
            }))
        }
        Err(e) if e.contains("already exists") => {
            warn!(email = %form.email.0, "Signup failed: duplicate email or phone");
            HttpResponse::BadRequest().json(serde_json::json!({
                "message": "An account with this email or phone already exists"
            }))
        }
        Err(e) => {
            // Internal detail stays in the log, never in the response
            error!(error = %e, "Failed to create user in database");
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
    use actix_web::{test, App};

    fn test_app_parts() -> (Database, TokenIssuer) {
        (Database::in_memory().unwrap(), TokenIssuer::new("test-secret"))
    }

    fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));
        body
    }

    fn signup_request(fields: &[(&str, &str)]) -> test::TestRequest {
        let boundary = "----talentgate-test-boundary";
        test::TestRequest::post()
            .uri("/signup")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(multipart_body(boundary, fields))
    }

    #[::core::prelude::v1::test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a@xcom"));
        assert!(!is_valid_email("a@x.com@y.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@.com"));
    }

    #[actix_web::test]
    async fn test_signup_then_login_round_trip() {
        let (db, issuer) = test_app_parts();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserRepository::new(db.clone())))
                .app_data(web::Data::new(issuer.clone()))
                .route("/signup", web::post().to(signup))
                .route("/login", web::post().to(login)),
        )
        .await;

        let req = signup_request(&[
            ("name", "A"),
            ("email", "a@x.com"),
            ("phone", "1"),
            ("role", "Applicant"),
            ("password", "p"),
            ("confirmPassword", "p"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(serde_json::json!({"email": "a@x.com", "password": "p"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["role"], "Applicant");

        // The issued token decodes to the submitted role
        let claims = issuer.verify(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role, Role::Applicant);
    }

    #[actix_web::test]
    async fn test_login_enumeration_resistance() {
        let (db, issuer) = test_app_parts();
        let repo = UserRepository::new(db.clone());
        repo.create(User {
            id: "u1".to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "1".to_string(),
            role: Role::Applicant,
            password_hash: hash_password("p").unwrap(),
            image: None,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserRepository::new(db.clone())))
                .app_data(web::Data::new(issuer))
                .route("/login", web::post().to(login)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(serde_json::json!({"email": "a@x.com", "password": "wrong"}))
            .to_request();
        let wrong_password = test::call_service(&app, req).await;
        assert_eq!(wrong_password.status(), 401);
        let wrong_password: serde_json::Value = test::read_body_json(wrong_password).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(serde_json::json!({"email": "ghost@x.com", "password": "p"}))
            .to_request();
        let unknown_email = test::call_service(&app, req).await;
        assert_eq!(unknown_email.status(), 401);
        let unknown_email: serde_json::Value = test::read_body_json(unknown_email).await;

        assert_eq!(wrong_password["message"], unknown_email["message"]);
        assert_eq!(wrong_password["message"], INVALID_CREDENTIALS);
    }

    #[actix_web::test]
    async fn test_signup_password_mismatch_creates_no_row() {
        let (db, _) = test_app_parts();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserRepository::new(db.clone())))
                .route("/signup", web::post().to(signup)),
        )
        .await;

        let req = signup_request(&[
            ("name", "A"),
            ("email", "a@x.com"),
            ("phone", "1"),
            ("role", "Applicant"),
            ("password", "p"),
            ("confirmPassword", "q"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let repo = UserRepository::new(db);
        assert!(repo.get_by_email("a@x.com").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_signup_duplicate_email_rejected() {
        let (db, _) = test_app_parts();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UserRepository::new(db.clone())))
                .route("/signup", web::post().to(signup)),
        )
        .await;

        let fields = [
            ("name", "A"),
            ("email", "a@x.com"),
            ("phone", "1"),
            ("role", "Applicant"),
            ("password", "p"),
            ("confirmPassword", "p"),
        ];
        let resp = test::call_service(&app, signup_request(&fields).to_request()).await;
        assert_eq!(resp.status(), 200);

        let dup = [
            ("name", "B"),
            ("email", "a@x.com"),
            ("phone", "2"),
            ("role", "HR"),
            ("password", "p"),
            ("confirmPassword", "p"),
        ];
        let resp = test::call_service(&app, signup_request(&dup).to_request()).await;
        assert_eq!(resp.status(), 400);
    }
}

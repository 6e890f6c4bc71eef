use crate::db::notification_repository::NotificationRepository;
use crate::db::user_repository::UserRepository;
use crate::models::notification::Notification;
use crate::models::user::{Claims, Role};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SendNotificationRequest {
    pub message: String,
    /// Direct recipient; omitted means broadcast to every applicant
    #[serde(rename = "recipientId", default)]
    pub recipient_id: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

fn new_notification(sender: &str, recipient_id: String, message: &str) -> Notification {
    Notification {
        id: uuid::Uuid::new_v4().to_string(),
        recipient_id,
        sender: sender.to_string(),
        message: message.to_string(),
        sent_at: chrono::Utc::now(),
        read: false,
    }
}

/// Send a notification to one user, or broadcast to all applicants
#[utoipa::path(
    post,
    path = "/hr/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification(s) sent"),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Unknown recipient"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn send(
    claims: web::ReqData<Claims>,
    notification_repo: web::Data<NotificationRepository>,
    user_repo: web::Data<UserRepository>,
    payload: web::Json<SendNotificationRequest>,
) -> impl Responder {
    if payload.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Notification message must not be empty"
        }));
    }

    let recipients: Vec<String> = match &payload.recipient_id {
        Some(recipient_id) => match user_repo.get_by_id(recipient_id).await {
            Ok(Some(user)) => vec![user.id],
            Ok(None) => {
                return HttpResponse::NotFound().json(serde_json::json!({
                    "message": "Recipient not found"
                }));
            }
            Err(e) => {
                error!(error = %e, "Failed to resolve notification recipient");
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        },
        None => match user_repo.list_by_role(Role::Applicant).await {
            Ok(users) => users.into_iter().map(|u| u.id).collect(),
            Err(e) => {
                error!(error = %e, "Failed to resolve broadcast recipients");
                return HttpResponse::InternalServerError().json(serde_json::json!({
                    "message": "Server error"
                }));
            }
        },
    };

    let mut sent = 0usize;
    for recipient_id in recipients {
        let notification = new_notification(&claims.sub, recipient_id, &payload.message);
        if let Err(e) = notification_repo.create(notification).await {
            error!(error = %e, "Failed to store notification");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }));
        }
        sent += 1;
    }

    info!(sender = %claims.sub, sent, "Notifications dispatched");

    HttpResponse::Ok().json(serde_json::json!({
        "message": "Notification sent",
        "count": sent
    }))
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(LimitQuery),
    responses(
        (status = 200, description = "Notifications listed", body = [crate::models::notification::Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list(
    claims: web::ReqData<Claims>,
    notification_repo: web::Data<NotificationRepository>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    match notification_repo.list_for_user(&claims.sub, query.limit).await {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(e) => {
            error!(error = %e, "Failed to list notifications");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// The caller's unread notification count
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_count(
    claims: web::ReqData<Claims>,
    notification_repo: web::Data<NotificationRepository>,
) -> impl Responder {
    match notification_repo.unread_count(&claims.sub).await {
        Ok(count) => HttpResponse::Ok().json(serde_json::json!({ "count": count })),
        Err(e) => {
            error!(error = %e, "Failed to count unread notifications");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// A given user's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications/user/{id}",
    params(LimitQuery),
    responses(
        (status = 200, description = "Notifications listed", body = [crate::models::notification::Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_for_user(
    notification_repo: web::Data<NotificationRepository>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    match notification_repo.list_for_user(&path, query.limit).await {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(e) => {
            error!(error = %e, "Failed to list notifications for user");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Server error"
            }))
        }
    }
}

/// Mark a notification read; re-marking is a no-op
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    responses(
        (status = 200, description = "Marked read"),
        (status = 404, description = "Unknown notification id"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    notification_repo: web::Data<NotificationRepository>,
    path: web::Path<String>,
) -> impl Responder {
    match notification_repo.mark_read(&path).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Notification marked as read"
        })),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "message": "Notification not found"
        })),
        Err(e) => {
            error!(error = %e, "Failed to mark notification as read");
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
    use crate::models::user::User;
    use crate::utils::auth::TokenIssuer;
    use actix_web::{test, App};
    use chrono::Utc;

    fn applicant_user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("Applicant {}", id),
            email: format!("{}@example.com", id),
            phone: id.to_string(),
            role: Role::Applicant,
            password_hash: "hash".to_string(),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn test_broadcast_reaches_every_applicant() {
        let db = Database::in_memory().unwrap();
        let users = UserRepository::new(db.clone());
        users.create(applicant_user("a1")).await.unwrap();
        users.create(applicant_user("a2")).await.unwrap();

        let issuer = TokenIssuer::new("test-secret");
        let token = issuer.issue("hr-1", Role::Hr).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(NotificationRepository::new(db.clone())))
                .app_data(web::Data::new(UserRepository::new(db.clone())))
                .service(
                    web::scope("/hr")
                        .wrap(AuthMiddleware::roles(issuer, &[Role::Hr, Role::Admin]))
                        .route("/notifications", web::post().to(send)),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/hr/notifications")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({"message": "Interviews start Monday"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 2);

        let repo = NotificationRepository::new(db);
        assert_eq!(repo.unread_count("a1").await.unwrap(), 1);
        assert_eq!(repo.unread_count("a2").await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_direct_send_unknown_recipient_is_404() {
        let db = Database::in_memory().unwrap();
        let issuer = TokenIssuer::new("test-secret");
        let token = issuer.issue("hr-1", Role::Hr).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(NotificationRepository::new(db.clone())))
                .app_data(web::Data::new(UserRepository::new(db)))
                .service(
                    web::scope("/hr")
                        .wrap(AuthMiddleware::roles(issuer, &[Role::Hr, Role::Admin]))
                        .route("/notifications", web::post().to(send)),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/hr/notifications")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({"message": "hi", "recipientId": "ghost"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}

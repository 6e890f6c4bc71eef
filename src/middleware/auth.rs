use crate::models::user::Role;
use crate::utils::auth::TokenIssuer;
use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use tracing::warn;

/// Bearer-token guard. Verifies the JWT with the injected issuer, optionally
/// restricts to an allow-list of roles, and exposes the claims to handlers
/// via request extensions.
pub struct AuthMiddleware {
    issuer: TokenIssuer,
    allowed_roles: Rc<Vec<Role>>,
}

impl AuthMiddleware {
    /// Any authenticated user.
    pub fn bearer(issuer: TokenIssuer) -> Self {
        AuthMiddleware {
            issuer,
            allowed_roles: Rc::new(Vec::new()),
        }
    }

    /// Authenticated and holding one of the given roles; otherwise 403.
    pub fn roles(issuer: TokenIssuer, roles: &[Role]) -> Self {
        AuthMiddleware {
            issuer,
            allowed_roles: Rc::new(roles.to_vec()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            issuer: self.issuer.clone(),
            allowed_roles: self.allowed_roles.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    issuer: TokenIssuer,
    allowed_roles: Rc<Vec<Role>>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract Authorization header
        let auth_header = req.headers().get("Authorization");

        let token = match auth_header {
            Some(header_value) => match header_value.to_str() {
                Ok(header_str) => header_str.strip_prefix("Bearer ").map(|s| s.to_string()),
                Err(_) => None,
            },
            None => None,
        };

        let claims = match token {
            Some(t) => match self.issuer.verify(&t) {
                Ok(claims) => claims,
                Err(_) => {
                    let (req, _pl) = req.into_parts();
                    let res = actix_web::HttpResponse::Unauthorized().json(serde_json::json!({
                        "message": "Invalid or expired token"
                    }));
                    return Box::pin(async move {
                        Ok(ServiceResponse::new(req, res).map_into_right_body())
                    });
                }
            },
            None => {
                let (req, _pl) = req.into_parts();
                let res = actix_web::HttpResponse::Unauthorized().json(serde_json::json!({
                    "message": "Authorization token required"
                }));
                return Box::pin(async move {
                    Ok(ServiceResponse::new(req, res).map_into_right_body())
                });
            }
        };

        // Role check: valid token, wrong role
        if !self.allowed_roles.is_empty() && !self.allowed_roles.contains(&claims.role) {
            warn!(user_id = %claims.sub, role = %claims.role, "Role not permitted for this resource");
            let (req, _pl) = req.into_parts();
            let res = actix_web::HttpResponse::Forbidden().json(serde_json::json!({
                "message": "You do not have permission to access this resource"
            }));
            return Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) });
        }

        // Insert claims into request extensions
        req.extensions_mut().insert(claims);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

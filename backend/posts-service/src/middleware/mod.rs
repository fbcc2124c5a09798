/// HTTP middleware utilities for posts-service
///
/// Session resolution: the auth subsystem issues an HS256 JWT which arrives
/// either as the session cookie or as a Bearer token. `SessionMiddleware`
/// validates it and stores a `CurrentUser` in the request extensions; a
/// missing, invalid or expired token simply leaves the request anonymous.
pub mod permissions;

pub use permissions::*;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

// =====================================================================
// Session tokens
// =====================================================================

/// Session user stored in request extensions after the token is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Shared HS256 key pair used to issue and validate session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_token(&self, user: &User, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to issue session token: {e}")))
    }

    pub fn validate(&self, token: &str) -> Option<CurrentUser> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;

        let data = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return None;
            }
        };

        let id = data.claims.sub.parse::<i64>().ok()?;
        Some(CurrentUser {
            id,
            username: data.claims.username,
        })
    }
}

// =====================================================================
// Session middleware
// =====================================================================

#[derive(Clone)]
pub struct SessionMiddleware {
    keys: Arc<SessionKeys>,
    cookie_name: Rc<str>,
}

impl SessionMiddleware {
    pub fn new(keys: Arc<SessionKeys>, cookie_name: &str) -> Self {
        Self {
            keys,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<SessionKeys>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        // A stale cookie must not hide a valid bearer token.
        let user = req
            .cookie(&self.cookie_name)
            .and_then(|c| self.keys.validate(c.value()))
            .or_else(|| {
                req.headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|h| h.strip_prefix("Bearer "))
                    .and_then(|t| self.keys.validate(t))
            });

        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }

        Box::pin(async move { service.call(req).await })
    }
}

// =====================================================================
// Extractors
// =====================================================================

/// The session user, if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(MaybeUser(req.extensions().get::<CurrentUser>().cloned())))
    }
}

/// The session user on login-required routes. Anonymous requests are
/// redirected to the login page with `next` set to the requested path.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<CurrentUser>().cloned() {
            return ready(Ok(AuthenticatedUser(user)));
        }

        let login_url = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.login_url.clone())
            .unwrap_or_else(|| "/auth/login/".to_string());
        let next = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string());

        debug!(path = %req.path(), "Anonymous request to login-required route");
        ready(Err(AppError::LoginRequired { login_url, next }))
    }
}

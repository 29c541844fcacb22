use authz::{Denial, UnauthorizedReason};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info};
use user::AuthContext;

use crate::{error::ApiError, AppState};

pub const VERSION_HEADER: &str = "X-Trellis-Version";

/// Authentication middleware for protected routes
///
/// Resolves the `Authorization: Bearer <token>` header into an
/// `AuthContext` and stores it in the request extensions, where the
/// `CurrentUser` extractor picks it up. Fails closed with 401 on a missing
/// header, a non-Bearer scheme, or a token that does not resolve to a user.
pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        // `to_str` is ASCII-only; tokens may carry UTF-8 ids
        Some(value) => Some(
            std::str::from_utf8(value.as_bytes())
                .map_err(|_| Denial::Unauthorized(UnauthorizedReason::WrongScheme))?
                .to_string(),
        ),
    };

    let ctx = state
        .authz
        .require_authenticated(header.as_deref(), state.users.auth_service())
        .await?;

    debug!(
        "AUTH MIDDLEWARE: {} {} as {}",
        request.method(),
        request.uri(),
        ctx.identity_id
    );

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller (401 if the middleware did not run)
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Denied(Denial::Unauthorized(
                UnauthorizedReason::MissingHeader,
            )))
    }
}

/// Request processing middleware hook
/// Logs each request and how long it took to handle
pub async fn request_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    debug!("REQUEST MIDDLEWARE: Processing {} {}", method, uri);

    let response = next.run(request).await;

    info!(
        "{} {} -> {} in {:?}",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed()
    );

    response
}

/// Response processing middleware hook
/// Stamps every response with the service version
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}

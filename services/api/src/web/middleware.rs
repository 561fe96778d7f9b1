//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.
//!
//! Sign-in happens upstream; the fronting auth proxy forwards the verified
//! identity in request headers.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The signed-in user, available to handlers as `Extension<CurrentUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
    pub email: String,
}

/// Middleware that reads the forwarded identity headers.
///
/// If present, inserts a `CurrentUser` into request extensions for handlers to use.
/// If missing or blank, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, ApiError> {
    // Owned values only: nothing borrowing the request may live across the await below.
    let user = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let user_id = header(USER_ID_HEADER).ok_or_else(|| {
            ApiError::Unauthorized(format!("{} header is required", USER_ID_HEADER))
        })?;
        let email = header(USER_EMAIL_HEADER).ok_or_else(|| {
            ApiError::Unauthorized(format!("{} header is required", USER_EMAIL_HEADER))
        })?;
        CurrentUser { user_id, email }
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

use super::{bearer_token, SessionStore};

/// Bearer token of the authenticated admin request
#[derive(Debug, Clone, PartialEq)]
pub struct AdminToken(pub String);

/// Reject requests without a live admin token before any handler runs.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    if state.sessions.get(&token).await.is_none() {
        return Err(AppError::Unauthorized);
    }

    req.extensions_mut().insert(AdminToken(token));

    Ok(next.run(req).await)
}

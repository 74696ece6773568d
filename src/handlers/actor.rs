//! Verified caller identity.
//!
//! Authentication happens upstream; the authenticating proxy forwards the
//! verified identity in `x-actor-id`. Requests without it are rejected.

use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Debug, Clone)]
pub struct Actor(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Actor(v.to_string()))
            .ok_or_else(|| AppError::unauthorized(format!("missing {ACTOR_HEADER} header")))
    }
}

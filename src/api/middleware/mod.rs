pub mod session;

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::request::Parts as ReqParts;
use http::{HeaderValue, Method, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::db::prelude::KeyError;

pub type MiddlewareResult<T> = core::result::Result<T, MiddlewareErr>;

#[derive(Debug, Error)]
pub enum MiddlewareErr {
    #[error("missing session token")]
    MissingToken,

    #[error("malformed session token")]
    MalformedToken,

    #[error("session signature mismatch")]
    BadSignature,

    #[error(transparent)]
    InvalidUser(#[from] KeyError),
}

impl IntoResponse for MiddlewareErr {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let message = self.to_string();
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse { message })).into_response()
    }
}

/// `*` allows any origin, anything else is matched as an origin suffix.
pub fn cors(allowed_origins: &str) -> CorsLayer {
    let allowed = if allowed_origins == "*" {
        AllowOrigin::any()
    } else {
        let suffix = allowed_origins.to_owned();
        AllowOrigin::predicate(move |org: &HeaderValue, _: &ReqParts| {
            org.as_bytes().ends_with(suffix.as_bytes())
        })
    };

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(allowed)
}

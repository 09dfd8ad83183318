use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::AUTHORIZATION;
use ring::hmac::{self, Key};

use super::{MiddlewareErr, MiddlewareResult};
use crate::api::server::AppState;
use crate::db::prelude::UserKey;
use crate::pond::storage::CurrentUser;

/// Signs and verifies session tokens of the form `<user_key>.<hex hmac-sha256>`.
#[derive(Clone, Debug)]
pub struct SessionKey(Key);

impl SessionKey {
    pub fn new(secret: &str) -> Self {
        Self(Key::new(hmac::HMAC_SHA256, secret.as_bytes()))
    }

    #[cfg(test)]
    pub fn sign(&self, user: &UserKey) -> String {
        let tag = hmac::sign(&self.0, user.as_str().as_bytes());
        format!("{user}.{}", hex::encode(tag.as_ref()))
    }

    pub fn verify(&self, token: &str) -> MiddlewareResult<UserKey> {
        let (user, signature) = token
            .rsplit_once('.')
            .ok_or(MiddlewareErr::MalformedToken)?;
        let signature = hex::decode(signature).map_err(|_| MiddlewareErr::MalformedToken)?;

        hmac::verify(&self.0, user.as_bytes(), &signature)
            .map_err(|_| MiddlewareErr::BadSignature)?;

        Ok(UserKey::parse(user)?)
    }
}

/// Resolves `Authorization: Bearer <token>` to the calling user and stores it as a
/// [`CurrentUser`] request extension.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> MiddlewareResult<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(MiddlewareErr::MissingToken)?;

    match state.session_key.verify(token.trim()) {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected session token");
            Err(e)
        }
    }
}

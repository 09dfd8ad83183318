use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::get_ducks;
use crate::api::middleware::cors;
use crate::api::middleware::session::{SessionKey, require_session};
use crate::db::prelude::*;
use crate::pond::PondError;
use crate::util::env::Env;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DuckStore>,
    pub session_key: SessionKey,
    pub max_top_count: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn DuckStore>, env: &Env) -> Self {
        Self {
            store,
            session_key: SessionKey::new(&env.session_secret),
            max_top_count: env.max_top_count,
        }
    }
}

pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let pond_routes = Router::new()
        .route("/pond-storage/get", get(get_ducks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .merge(pond_routes)
        .route("/", get(|| async { Response::new(Body::empty()) }))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .layer(cors)
        .with_state(state)
}

/// Logs any `RouteError` a handler stashed in its response extensions.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument(skip(state, env))]
pub async fn start_server(state: Arc<AppState>, env: &Env) -> std::io::Result<()> {
    let app = router(state, cors(&env.cors_allow_origins));

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), env.server_api_port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}", socket_addr.port()),
        "server ready"
    );

    axum::serve(listener, app).await
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Pond(#[from] PondError),

    #[error(transparent)]
    BadQuery(#[from] QueryRejection),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message, err) = match &self {
            RouteError::BadQuery(rejection) => {
                (StatusCode::BAD_REQUEST, rejection.body_text(), None)
            }

            RouteError::Pond(pond_err) => match pond_err {
                PondError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("datastore failure"),
                    Some(self),
                ),
                PondError::MalformedKey(_) | PondError::InvalidCount(_) => {
                    (StatusCode::BAD_REQUEST, pond_err.to_string(), None)
                }
                PondError::Forbidden(_) => (StatusCode::FORBIDDEN, pond_err.to_string(), None),
                PondError::DuckNotFound(_) => (StatusCode::NOT_FOUND, pond_err.to_string(), None),
            },
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}

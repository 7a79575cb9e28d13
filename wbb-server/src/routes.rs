//! HTTP route handlers for game-server calls.

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::error;
use wbb::request::RequestError;
use wbb::turn::TurnError;

use crate::state::AppState;

/// Build the router. The game server may call either `/` or `/turn`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(turn))
        .route("/turn", get(turn))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// GET /?serverKey=..&gameID=..&callType=.. - run one turn.
async fn turn(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let query = query.unwrap_or_default();
    // Turns do blocking file and HTTP I/O.
    let joined = tokio::task::spawn_blocking(move || state.run_turn(&query)).await;

    match joined {
        Ok(Ok(reply)) => (StatusCode::OK, reply.body).into_response(),
        Ok(Err(TurnError::Rejected(err))) => (status_for(&err), err.to_string()).into_response(),
        Ok(Err(TurnError::Failed(err))) => {
            error!(error = %format!("{err:#}"), "turn failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "turn failed").into_response()
        }
        Err(err) => {
            error!(error = %err, "turn task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn status_for(err: &RequestError) -> StatusCode {
    if err.is_auth() {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::BAD_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use wbb::strategy::Sentry;
    use wbb::test_support::{ScriptedServer, TEST_KEY, test_config};
    use wbb::turn::LIB_VERSION;

    use super::*;
    use crate::state::Backend;

    fn app(state_dir: &std::path::Path, server: ScriptedServer) -> Router {
        router(AppState {
            config: Arc::new(test_config(state_dir)),
            handler: Arc::new(Sentry),
            backend: Backend::Shared(Arc::new(server)),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (status, body) = get(app(temp.path(), ScriptedServer::default()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn game_init_replies_with_versions() {
        let temp = tempfile::tempdir().expect("tempdir");
        let uri = format!("/?serverKey={TEST_KEY}&gameID=g1&callType=gameInit&serverURL=http%3A%2F%2Fa.test");
        let (status, body) = get(app(temp.path(), ScriptedServer::default()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("0.1-{LIB_VERSION}"));
    }

    #[tokio::test]
    async fn round_runs_the_handler() {
        let temp = tempfile::tempdir().expect("tempdir");
        let server = ScriptedServer::new(vec![ScriptedServer::scan_reply(&[])]);
        let uri = format!(
            "/turn?serverKey={TEST_KEY}&gameID=g1&callType=round&x=1&y=2&energy=30&armor=1&url=http%3A%2F%2Fa.test"
        );
        let (status, body) = get(app(temp.path(), server), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn rejections_map_to_client_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (status, _) = get(
            app(temp.path(), ScriptedServer::default()),
            "/?serverKey=nope&gameID=g1&callType=death",
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/?serverKey={TEST_KEY}&callType=death");
        let (status, body) = get(app(temp.path(), ScriptedServer::default()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "no game id found");
    }

    #[tokio::test]
    async fn failed_turns_are_server_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        // No url in the query and none stored at init.
        let uri = format!("/?serverKey={TEST_KEY}&gameID=g1&callType=round&x=1&y=2&energy=30&armor=1");
        let (status, body) = get(app(temp.path(), ScriptedServer::default()), &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "turn failed");
    }

    #[tokio::test]
    async fn describe_needs_no_key() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (status, body) = get(app(temp.path(), ScriptedServer::default()), "/?describe").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("strategy: sentry"));
    }
}

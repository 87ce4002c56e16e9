use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use fourline::{GameSession, Mark, TurnOutcome, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, info};

/// The one process-wide game. The mutex is held for the whole turn
/// (human move, checks, opponent reply) so a turn is atomic from the
/// point of view of any concurrent request.
type SharedSession = Arc<Mutex<GameSession>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let session = Arc::new(Mutex::new(GameSession::new(
        DEFAULT_HEIGHT,
        DEFAULT_WIDTH,
        Mark::Red,
    )));
    let app = app_router(session);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info,tower_http=debug")
        .try_init();
}

fn app_router(session: SharedSession) -> Router {
    let api = Router::new()
        .route("/move", post(handle_move))
        .route("/reset", post(handle_reset))
        .with_state(session);
    let spa = Router::new().nest_service(
        "/",
        ServeDir::new("static").append_index_html_on_directories(true),
    );
    Router::new()
        .merge(api)
        .merge(spa)
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_origin(axum::http::HeaderValue::from_static("*"))
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, serde::Deserialize)]
struct MoveBody {
    checker: Mark,
    col: usize,
}

#[derive(Debug, serde::Serialize)]
struct MoveReply {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checker: Option<Mark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_col: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_status: Option<&'static str>,
}

impl MoveReply {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            checker: None,
            ai_col: None,
            ai_status: None,
        }
    }
}

async fn handle_move(
    State(session): State<SharedSession>,
    Json(body): Json<MoveBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = {
        let mut session = session
            .lock()
            .map_err(|_| anyhow::anyhow!("game session lock poisoned"))?;
        session.play_turn(body.checker, body.col)?
    };
    debug!(?outcome, col = body.col, "turn resolved");
    let reply = match outcome {
        TurnOutcome::Invalid => MoveReply::status("invalid"),
        TurnOutcome::Win(mark) => MoveReply {
            checker: Some(mark),
            ..MoveReply::status("win")
        },
        TurnOutcome::Draw => MoveReply::status("tie"),
        TurnOutcome::Continue {
            reply_column,
            opponent_won,
        } => MoveReply {
            ai_col: Some(reply_column),
            ai_status: opponent_won.then_some("win"),
            ..MoveReply::status("continue")
        },
    };
    let headers = [(header::CACHE_CONTROL, "no-store")];
    Ok((headers, Json(reply)))
}

async fn handle_reset(State(session): State<SharedSession>) -> Result<impl IntoResponse, ApiError> {
    let mut session = session
        .lock()
        .map_err(|_| anyhow::anyhow!("game session lock poisoned"))?;
    session.reset();
    info!("board reset");
    Ok(Json(MoveReply::status("reset")))
}

#[derive(Debug)]
struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        let body = format!("{}", self.0);
        (status, body).into_response()
    }
}

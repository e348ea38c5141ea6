//! HTTP API: QR pairing, sending, status, and logout.
//!
//! Every handler answers from the current session state and never waits for
//! the connection to come up.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use wagate_core::config::ApiConfig;
use wagate_core::error::GatewayError;
use wagate_whatsapp::qr::generate_qr_data_url;
use wagate_whatsapp::{QrStatus, SessionManager};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub session: SessionManager,
}

/// `POST /api/send` request body.
#[derive(Debug, Deserialize)]
struct SendRequest {
    phone: String,
    message: String,
}

/// `GET /api/status` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

fn error_response(err: &GatewayError) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"success": false, "error": err.to_string()})),
    )
}

/// `GET /api/qr`: Pending QR challenge as a PNG data URL.
async fn qr(State(state): State<ApiState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.session.qr_status().await {
        QrStatus::Pending(code) => {
            let url = generate_qr_data_url(&code).map_err(|e| {
                error!("QR render failed: {e}");
                error_response(&e)
            })?;
            Ok(Json(json!({"success": true, "qr": url})))
        }
        QrStatus::Connected => Ok(Json(json!({
            "success": false,
            "message": "Already connected",
            "connected": true,
        }))),
        QrStatus::NotReady => Ok(Json(json!({
            "success": false,
            "message": "QR not ready yet",
        }))),
    }
}

/// `POST /api/send`: Send a text message to a phone number or JID.
async fn send(
    State(state): State<ApiState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"success": false, "error": format!("invalid request: {e}")})),
            );
        }
    };

    match state
        .session
        .send_message(&request.phone, &request.message)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "Message sent successfully"})),
        ),
        Err(e) => {
            warn!("send to {} failed: {e}", request.phone);
            error_response(&e)
        }
    }
}

/// `GET /api/status`: Whether a session is live, and whose.
async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let status = state.session.status().await;
    Json(StatusResponse {
        connected: status.connected,
        phone_number: status.phone_number,
        name: status.name,
    })
}

/// `POST /api/logout`: Log out and start over with a fresh pairing cycle.
async fn logout(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    match state.session.logout().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "Logged out successfully"})),
        ),
        Err(e) => error_response(&e),
    }
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState, config: &ApiConfig) -> Router {
    let router = Router::new()
        .route("/api/qr", get(qr))
        .route("/api/send", post(send))
        .route("/api/status", get(status))
        .route("/api/logout", post(logout))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .with_state(state);

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind the API listener.
pub async fn bind(config: &ApiConfig) -> anyhow::Result<TcpListener> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("API server failed to bind to {addr}: {e}"))?;
    info!("API server listening on {addr}");
    Ok(listener)
}

/// Serve the API on `listener` until ctrl-c.
pub async fn serve(
    listener: TcpListener,
    config: &ApiConfig,
    session: SessionManager,
) -> anyhow::Result<()> {
    let app = build_router(ApiState { session }, config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

//! HTTP transport for the helper
//!
//! One endpoint, mounted at both `/` and `/api`: `POST` with a multipart form,
//! `OPTIONS` for preflights, and 405 for everything else.

use crate::helper::{Helper, Outcome};
use crate::models::{HelpForm, HelpRequest, Screenshot};
use crate::{Error, Result};
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Instrument};
use uuid::Uuid;

type SharedHelper = Arc<Helper>;

/// Build the router around a ready helper.
pub fn router(helper: Helper, max_upload_bytes: usize) -> Router {
    // OPTIONS never reaches the handlers; the CORS layer answers it with an empty 200.
    let endpoint: MethodRouter<SharedHelper> = post(help).fallback(method_not_allowed);

    Router::new()
        .route("/", endpoint.clone())
        .route("/api", endpoint)
        .with_state(Arc::new(helper))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Serve until ctrl-c.
pub async fn run(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn help(
    State(helper): State<SharedHelper>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let span = tracing::info_span!("help_request", id = %Uuid::new_v4());

    async move {
        let request = match multipart {
            Ok(multipart) => read_request(multipart).await,
            Err(rejection) => Err(Error::Multipart(rejection.body_text())),
        };

        let outcome = match request {
            Ok(request) => helper.handle(request).await,
            Err(e) => {
                error!("Could not read help request: {}", e);
                Outcome::Fallback
            }
        };

        let status = if outcome.is_fallback() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(outcome.into_reply())).into_response()
    }
    .instrument(span)
    .await
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// Collect the known form fields; the first occurrence of each wins.
async fn read_request(mut multipart: Multipart) -> Result<HelpRequest> {
    let mut form = HelpForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "message" => set_text(&mut form.message, field).await?,
            "mode" => set_text(&mut form.mode, field).await?,
            "device" => set_text(&mut form.device, field).await?,
            "topic" => set_text(&mut form.topic, field).await?,
            "screenshot" if form.screenshot.is_none() => {
                let declared_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.screenshot = Some(Screenshot::new(
                    bytes.to_vec(),
                    declared_type.as_deref(),
                    file_name,
                ));
            }
            _ => {}
        }
    }

    Ok(form.into())
}

async fn set_text(slot: &mut Option<String>, field: Field<'_>) -> Result<()> {
    let text = field.text().await.map_err(multipart_error)?;
    if slot.is_none() {
        *slot = Some(text);
    }
    Ok(())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> Error {
    Error::Multipart(e.body_text())
}

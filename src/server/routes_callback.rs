use crate::callback::CallbackAck;
use crate::server::{AppContext, AppError};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};

pub fn callback_routes() -> Router<AppContext> {
    Router::new().route("/callback", post(handle_callback))
}

/// Raw body so authentication runs before any parsing.
async fn handle_callback(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallbackAck>, AppError> {
    let ack = ctx.callbacks.handle(&headers, &body).await.inspect_err(|e| {
        tracing::debug!(error = %e, "Callback rejected");
    })?;
    Ok(Json(ack))
}

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::admission_review::{AdmissionRequest, AdmissionResponse};

pub(crate) mod handlers;
mod state;

pub use state::ApiServerState;

/// Build the router of the webhook.
///
/// The API server is pointed to `/` by the registration, `/validate` is
/// accepted too for webhooks registered by hand.
pub fn router(state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route("/", post(handlers::validate_handler))
        .route("/validate", post(handlers::validate_handler))
        .route("/readiness", get(handlers::readiness_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub(crate) fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("resource", adm_req.resource.resource.as_str());
    Span::current().record("resource_group", adm_req.resource.group.as_str());
    Span::current().record("resource_version", adm_req.resource.version.as_str());
}

pub(crate) fn populate_span_with_admission_response(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}

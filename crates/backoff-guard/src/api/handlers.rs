use std::sync::Arc;

use axum::{
    body::Bytes,
    extract,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::{
    admission_review::{
        check_resource, decode_review, decode_unit, encode_review, AdmissionResponse,
        AdmissionReview,
    },
    api::{
        populate_span_with_admission_request_data, populate_span_with_admission_response,
        state::ApiServerState,
    },
    policy::{self, Verdict},
};

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        resource_group=tracing::field::Empty,
        resource_version=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Evaluate an AdmissionReview sent by the API server.
///
/// Once the body has been accepted the reply is always a `200` carrying an
/// AdmissionReview, failures are reported inside of its response.
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if content_type != Some(mime::APPLICATION_JSON.as_ref()) {
        debug!(?content_type, "unsupported content type");
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }

    let response = evaluate(&state, &body).await;
    populate_span_with_admission_response(&response);

    match encode_review(AdmissionReview::new_with_response(response)) {
        Ok(payload) => (
            [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
            payload,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "cannot encode admission review");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

async fn evaluate(state: &ApiServerState, body: &[u8]) -> AdmissionResponse {
    let request = match decode_review(body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "cannot decode admission review");
            return AdmissionResponse::from_error(String::new(), &e, None);
        }
    };
    populate_span_with_admission_request_data(&request);

    let uid = request.uid.clone();
    let unit = match check_resource(&request).and_then(|_| decode_unit(&request)) {
        Ok(unit) => unit,
        Err(e) => {
            warn!(error = %e, "rejecting admission request");
            return AdmissionResponse::from_error(uid, &e, None);
        }
    };

    match policy::decide(&unit, &state.cluster_client).await {
        Ok(Verdict { allowed: true, .. }) => AdmissionResponse::allow(uid),
        Ok(Verdict { reason, .. }) => AdmissionResponse::reject(uid, reason.unwrap_or_default()),
        Err(e) => {
            error!(error = %e, "cannot evaluate admission request");
            AdmissionResponse::from_error(uid, &e, Some(500))
        }
    }
}

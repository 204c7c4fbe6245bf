//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::time::Instant;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use gector_core::{parse_request, predict, CorrectionResult, GectorResponse, RequestPlan};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/", get(index))
        .route("/gector", get(gector_get).post(gector_post))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "index"
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

/// `GET /gector` carries no input, so it always answers NG
async fn gector_get() -> Json<GectorResponse> {
    Json(GectorResponse::ng())
}

/// Correction handler.
///
/// Failures are reported in the response envelope; the HTTP status is 200
/// whenever the request reached this handler.
async fn gector_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<GectorResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("gector", %request_id);

    async move {
        let start = Instant::now();

        let response = if !is_json(&headers) {
            debug!("Rejected content type {:?}", headers.get(CONTENT_TYPE));
            GectorResponse::failure("Unsupported Media Type")
        } else {
            match correct(&state, &body).await {
                Ok(result) => {
                    info!(
                        sentences = result.result.len(),
                        corrections = result.n_correction,
                        "Correction finished"
                    );
                    metrics::counter!("gector_corrections_total")
                        .increment(result.n_correction as u64);
                    GectorResponse::ok(result)
                }
                Err(e) => {
                    error!("Correction failed: {}", e);
                    GectorResponse::from_error(&e)
                }
            }
        };

        let status = if response.is_ok() { "OK" } else { "NG" };
        metrics::counter!("gector_requests_total", "status" => status).increment(1);
        metrics::histogram!("gector_request_latency_us")
            .record(start.elapsed().as_micros() as f64);

        Json(response)
    }
    .instrument(span)
    .await
}

async fn correct(state: &AppState, body: &[u8]) -> gector_core::Result<CorrectionResult> {
    let request = parse_request(body)?;
    let defaults = state.defaults()?;
    let plan = RequestPlan::resolve(request, &defaults);
    debug!(
        sentences = plan.input_text.len(),
        batch_size = plan.batch_size,
        to_normalize = plan.to_normalize,
        "Resolved request"
    );

    let prediction = predict(state.corrector.as_ref(), &plan, &state.normalizer).await?;

    Ok(CorrectionResult {
        result: prediction.lines,
        n_correction: prediction.corrections,
        history: prediction.history,
    })
}

/// True when the media type (ignoring parameters such as charset) is JSON
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("application/json; charset=utf-8")));
        assert!(is_json(&headers("Application/JSON")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&headers("application/json-seq")));
        assert!(!is_json(&HeaderMap::new()));
    }
}

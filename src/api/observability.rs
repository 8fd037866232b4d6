use crate::api::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// Watch-list operation served by a route.
fn operation(method: &Method, route: Option<&str>) -> &'static str {
    match (method.as_str(), route) {
        ("GET", Some("/anime")) => "find",
        ("GET", Some("/redirect")) => "redirect",
        ("POST", Some("/anime")) => "create",
        ("PUT", Some("/anime")) => "full_update",
        ("PATCH", Some("/anime")) => "partial_update",
        ("DELETE", Some("/anime")) => "delete",
        ("GET", Some("/")) => "health",
        ("GET", Some("/metrics")) => "metrics",
        _ => "other",
    }
}

fn outcome(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NO_CONTENT => "no_match",
        StatusCode::FOUND => "redirected",
        StatusCode::BAD_REQUEST => "rejected",
        StatusCode::NOT_FOUND => "not_found",
        s if s.is_server_error() => "error",
        s if s.is_client_error() => "client_error",
        _ => "success",
    }
}

/// Tags each request with its watch-list operation, then records how it ended.
///
/// Refused writes are counted separately in `anime_rejections_total`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());
    let operation = operation(req.method(), route.as_deref());

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        operation,
    );

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let outcome = outcome(status);

        let labels = [
            ("operation", operation.to_string()),
            ("outcome", outcome.to_string()),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if outcome == "rejected" {
            metrics::counter!("anime_rejections_total", "operation" => operation).increment(1);
            warn!(status_code = status.as_u16(), duration_ms, "Anime request rejected");
        } else {
            info!(
                status_code = status.as_u16(),
                duration_ms,
                outcome,
                "Anime request finished"
            );
        }

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_map_to_operations() {
        assert_eq!(operation(&Method::PATCH, Some("/anime")), "partial_update");
        assert_eq!(operation(&Method::PUT, Some("/anime")), "full_update");
        assert_eq!(operation(&Method::GET, Some("/redirect")), "redirect");
        assert_eq!(operation(&Method::GET, None), "other");
    }

    #[test]
    fn statuses_map_to_outcomes() {
        assert_eq!(outcome(StatusCode::BAD_REQUEST), "rejected");
        assert_eq!(outcome(StatusCode::NO_CONTENT), "no_match");
        assert_eq!(outcome(StatusCode::FOUND), "redirected");
        assert_eq!(outcome(StatusCode::INTERNAL_SERVER_ERROR), "error");
        assert_eq!(outcome(StatusCode::OK), "success");
    }
}

use std::time::Duration;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{availability, events, health_check, participants, usage};
use crate::state::AppState;
use crate::utils::error::AppError;

pub fn create_routes(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/analytics", get(events::get_event_analytics))
        .route(
            "/participants",
            get(participants::list_participants).post(participants::create_participant),
        )
        .route(
            "/availability",
            get(availability::list_availability).post(availability::save_availability),
        )
        .route("/usage/events-this-week", get(usage::events_this_week));

    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state);

    with_request_timeout(router, request_timeout)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
}

/// Abort requests running longer than `timeout` with a JSON 408.
fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(timeout_as_json))
}

// TimeoutLayer answers with an empty 408; give it the usual error body.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        return AppError::Timeout("Request timed out".to_string()).into_response();
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn slow_router() -> Router {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }));
        with_request_timeout(router, Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_timeout_returns_json_error() {
        let response = slow_router()
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "TIMEOUT");
        assert_eq!(body["error"], "Request timed out");
    }

    #[tokio::test]
    async fn test_fast_requests_pass_through() {
        let response = slow_router()
            .oneshot(Request::get("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"done");
    }
}

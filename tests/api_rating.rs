// API integration tests.
//
// Purpose: exercise the router surface without touching the live SSURGO
// or USGS services. Request validation runs before any upstream call, so
// the error paths here are fully offline.
// Run with: cargo test --features api --test api_rating

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqi_scorer_rust::{create_router, AppState};
    use tower::ServiceExt; // for oneshot

    async fn create_test_app() -> axum::Router {
        let state = AppState::new(
            "data/raw_data",
            "https://sdmdataaccess.sc.egov.usda.gov/Tabular/post.rest",
            "https://epqs.nationalmap.gov/v1/json",
        )
        .await
        .expect("app state");
        create_router(state)
    }

    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    async fn post_rating(app: axum::Router, payload: Value) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/rating")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_bad_input_level_is_400() {
        let app = create_test_app().await;
        let response = post_rating(
            app,
            json!({
                "location": {"latitude": 41.2, "longitude": -101.6},
                "crop_id": "4",
                "input_level": "X"
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("input_level"));
    }

    #[tokio::test]
    async fn test_unknown_crop_is_400() {
        let app = create_test_app().await;
        let response = post_rating(
            app,
            json!({
                "location": {"latitude": 41.2, "longitude": -101.6},
                "crop_id": "999",
                "input_level": "L"
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("crop_id"));
    }

    #[tokio::test]
    async fn test_out_of_range_location_is_400() {
        let app = create_test_app().await;
        let response = post_rating(
            app,
            json!({
                "location": {"latitude": 137.4, "longitude": -101.0},
                "crop_id": "4",
                "input_level": "L"
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("latitude"));
    }
}

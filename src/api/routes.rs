use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Risk status
        .route("/api/status", get(handlers::get_status))
        .route("/api/alerts", get(handlers::get_alerts))
        // Reports
        .route("/api/reports/latest", get(handlers::get_latest_report))
        .route("/api/reports/generate", post(handlers::generate_report))
        .route("/api/reviews/pending", get(handlers::get_pending_reviews))
        // Cross-chain audit
        .route("/api/crosschain/verify", post(handlers::verify_message))
        // Emergency workflow
        .route("/api/emergency/prepare", post(handlers::prepare_pause))
        .route(
            "/api/emergency/status",
            get(handlers::get_emergency_status).put(handlers::set_emergency_status),
        )
        .route("/api/emergency/proposals", get(handlers::list_pending_pauses))
        .route(
            "/api/emergency/proposals/:key/resolve",
            post(handlers::resolve_pause),
        )
        .with_state(state)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        FixedMetricSource, InMemoryObjectStore, ObjectStore, PlaceholderFeed, ReserveAttestation,
    };
    use crate::agents::{
        AgentCore, GoldReserveAgent, Governor, ObserverAgent, StructuralVerifier, ThresholdTable,
        TokenRiskAgent,
    };
    use crate::api::AdminAuth;
    use crate::persistence::{ReportStore, SnapshotStore};
    use crate::services::ReportCycle;
    use crate::supervisor::NotificationDispatcher;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "admin-token";

    fn app_with_store() -> (Router, Arc<InMemoryObjectStore>) {
        let store = Arc::new(InMemoryObjectStore::new());
        let source = Arc::new(
            FixedMetricSource::new()
                .with_supplies("GOLD", [(1u64, 1_000u128)].into_iter().collect())
                .with_price("GOLD", Decimal::ONE)
                .with_reserve(
                    "GOLD",
                    ReserveAttestation {
                        reserve_value_usd: dec!(1010),
                        liability_usd: dec!(1000),
                    },
                ),
        );
        let agent: Arc<dyn TokenRiskAgent> = Arc::new(GoldReserveAgent::new(AgentCore::new(
            "gold",
            "GOLD",
            ThresholdTable::STANDARD,
            source,
            SnapshotStore::new(store.clone(), chrono::Duration::hours(2)),
            std::time::Duration::from_millis(500),
        )));
        let governor = Arc::new(Governor::new(
            vec![agent],
            store.clone(),
            Arc::new(StructuralVerifier::default()),
        ));
        let observer = Arc::new(ObserverAgent::new(
            Arc::new(PlaceholderFeed),
            chrono::Duration::hours(4),
            std::time::Duration::from_millis(500),
        ));
        let cycle = Arc::new(ReportCycle::new(
            true,
            "4h",
            governor,
            observer,
            ReportStore::new(store.clone()),
            Arc::new(NotificationDispatcher::new(std::time::Duration::from_millis(100))),
        ));
        let state = AppState::new(
            cycle,
            store.clone(),
            chrono::Duration::seconds(300),
            AdminAuth::new(Some(TOKEN.to_string()), true),
        );
        (create_router(state), store)
    }

    fn app() -> Router {
        app_with_store().0
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .header(crate::api::auth::ADMIN_TOKEN_HEADER, TOKEN)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["monitoringEnabled"], true);
    }

    #[tokio::test]
    async fn test_status_and_alerts() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["riskStatus"]["overall"], "ORANGE");
        assert_eq!(json["emergencyStatus"], "STANDBY");

        let response = app
            .clone()
            .oneshot(Request::get("/api/alerts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let response = app
            .oneshot(
                Request::get("/api/alerts?min_severity=HIGH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_report_404_then_generate() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/api/reports/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(post_json("/api/reports/generate", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "completed");

        let response = app
            .clone()
            .oneshot(post_json("/api/reports/generate", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = app
            .oneshot(Request::get("/api/reports/latest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["period"], "4h");
    }

    #[tokio::test]
    async fn test_mutations_require_admin_token() {
        let response = app()
            .oneshot(
                Request::post("/api/emergency/prepare")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"target":"0xvault","reason":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let response = app()
            .oneshot(post_json("/api/crosschain/verify", "{not json"))
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        let response = app()
            .oneshot(post_json("/api/crosschain/verify", r#"{"guid":"0x1"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_verify_and_emergency_workflow() {
        let (app, store) = app_with_store();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/crosschain/verify",
                r#"{"guid":"0xabc","srcEid":30101,"dstEid":30184}"#,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["verified"], true);
        assert_eq!(json["messagesVerified"], 1);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/emergency/prepare",
                r#"{"target":"0xvault","reason":"reserve shortfall"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let prepared = body_json(response).await;
        assert_eq!(prepared["alert"]["type"], "emergency");
        // No chat bindings in this app: every channel reports a skip.
        assert_eq!(prepared["notifications"].as_array().unwrap().len(), 3);
        let key = prepared["key"].as_str().unwrap().to_string();
        let id = key
            .trim_start_matches("emergency/pending/")
            .trim_end_matches(".json")
            .to_string();

        let response = app
            .clone()
            .oneshot(
                Request::put("/api/emergency/status")
                    .header("content-type", "application/json")
                    .header(crate::api::auth::ADMIN_TOKEN_HEADER, TOKEN)
                    .body(Body::from(r#"{"status":"STANDBY","operator":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/api/emergency/proposals/{id}/resolve"),
                r#"{"decision":"reject","authority":"multisig"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["transaction"]["status"], "REJECTED");

        let response = app
            .oneshot(post_json(
                &format!("/api/emergency/proposals/{id}/resolve"),
                r#"{"decision":"approve","authority":"multisig"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert!(store
            .list("emergency/pending/")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_pending_reviews() {
        let (app, store) = app_with_store();
        store
            .put("skill-prs/42.json", br#"{"title":"tune thresholds"}"#.to_vec())
            .await
            .unwrap();
        store
            .put("skill-prs/broken.json", b"{".to_vec())
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/api/reviews/pending").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["artifact"]["title"], "tune thresholds");
    }
}

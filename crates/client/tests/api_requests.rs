mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use platformops_client::storage::MemoryStore;
use platformops_client::ApiError;
use platformops_core::alerts::EvaluateRequest;
use platformops_core::anomalies::AnomalyInjection;
use platformops_core::auth::UserInfo;
use platformops_core::error::CoreError;

use common::MockBackend;

fn operator() -> UserInfo {
    UserInfo {
        id: Some("1".into()),
        username: "operator".into(),
        roles: vec!["sre".into()],
        is_active: true,
    }
}

#[tokio::test]
async fn alert_events_query_string_keeps_order() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/alerts/events", json!([]));
    let ctx = backend.context();

    ctx.api()
        .fetch_alert_events(Some("C1.api_qps"), Some("OPEN"), 100)
        .await
        .unwrap();

    let requests = backend.requests_to("/api/alerts/events");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].query.as_deref(),
        Some("signal_code=C1.api_qps&status=OPEN&limit=100")
    );
}

#[tokio::test]
async fn absent_filters_are_omitted() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/alerts/events", json!([]));
    let ctx = backend.context();

    ctx.api().fetch_alert_events(None, None, 200).await.unwrap();

    assert_eq!(backend.hits("/api/alerts/events", Some("limit=200")), 1);
}

#[tokio::test]
async fn zero_ticks_are_left_out_of_alerts_stats() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/analytics/alerts-stats", json!({"stats": []}));
    let ctx = backend.context();

    ctx.api().fetch_alerts_stats(Some(0), Some(2000), 10).await.unwrap();
    ctx.api().fetch_alerts_stats(Some(1000), Some(2000), 10).await.unwrap();

    assert_eq!(backend.hits("/api/analytics/alerts-stats", Some("to_tick=2000&limit=10")), 1);
    assert_eq!(
        backend.hits("/api/analytics/alerts-stats", Some("from_tick=1000&to_tick=2000&limit=10")),
        1
    );
}

#[tokio::test]
async fn component_codes_stay_within_their_path_segment() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/components/C1%2F..%2Fadmin%3Fx", json!({"signals": []}));
    backend.ok("GET /api/analytics/component-stress/C%201", json!([]));
    let ctx = backend.context();

    ctx.api().fetch_component_details("C1/../admin?x").await.unwrap();
    ctx.api().fetch_stress_curve("C 1", 600, 20).await.unwrap();

    let details = backend.requests_to("/api/components/C1%2F..%2Fadmin%3Fx");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].query, None);
    assert_eq!(
        backend.hits("/api/analytics/component-stress/C%201", Some("window=600&bucket=20")),
        1
    );
}

#[tokio::test]
async fn bearer_header_only_sent_with_a_token() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/alerts/ping", json!({"ok": true}));
    let ctx = backend.context();

    ctx.api().ping().await.unwrap();
    ctx.session().set_session("tok-123".into(), operator()).unwrap();
    ctx.api().ping().await.unwrap();

    let requests = backend.requests_to("/api/alerts/ping");
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn non_success_status_becomes_status_error() {
    let backend = MockBackend::start().await;
    backend.respond("GET /api/system/overview", 503, json!({"detail": "down"}));
    let ctx = backend.context();

    let err = ctx.api().fetch_system_overview().await.unwrap_err();
    assert_matches!(err, ApiError::Status { status: 503, ref body } if body.contains("down"));
}

#[tokio::test]
async fn evaluate_sends_json_body() {
    let backend = MockBackend::start().await;
    backend.ok("POST /api/alerts/evaluate", json!({"events_created": 2}));
    let ctx = backend.context();

    ctx.api().evaluate_alerts(EvaluateRequest::default()).await.unwrap();

    let request = &backend.requests_to("/api/alerts/evaluate")[0];
    assert_eq!(
        request.body,
        Some(json!({"lookback_ticks": 200, "simulation_mode": false}))
    );
}

#[tokio::test]
async fn numeric_endpoints_unwrap_every_envelope() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/analytics/global-health", json!({"health": 5}));
    backend.ok("GET /api/analytics/component-health/C1", json!("5"));
    backend.ok("GET /api/analytics/volatility", json!({"signal_code": "C1.api_qps", "volatility": 0.42}));
    let ctx = backend.context();

    assert_eq!(ctx.api().fetch_global_health().await.unwrap(), 5.0);
    assert_eq!(ctx.api().fetch_component_health("C1").await.unwrap(), 5.0);
    assert_eq!(ctx.api().fetch_volatility("C1.api_qps", 10).await.unwrap(), 0.42);
    assert_eq!(
        backend.requests_to("/api/analytics/volatility")[0].query.as_deref(),
        Some("signal_code=C1.api_qps&window=10")
    );
}

#[tokio::test]
async fn collection_endpoints_unwrap_keyed_and_bare_bodies() {
    let backend = MockBackend::start().await;
    backend.ok(
        "GET /api/analytics/forecast/signal",
        json!({"forecast": [{"tick": 1, "value": 2.0, "upper": 3.0, "lower": 1.0}]}),
    );
    backend.ok("GET /api/analytics/component-rankings", json!([{"component_code": "C1"}]));
    backend.ok("GET /api/analytics/active-hotspots", json!({"unexpected": true}));
    let ctx = backend.context();

    assert_eq!(ctx.api().fetch_forecast("C1.api_qps", 30).await.unwrap().len(), 1);
    assert_eq!(ctx.api().fetch_component_rankings(10).await.unwrap().len(), 1);
    assert!(ctx.api().fetch_active_hotspots(15).await.unwrap().is_empty());
}

#[tokio::test]
async fn injection_travels_as_query_parameters() {
    let backend = MockBackend::start().await;
    backend.ok("POST /api/anomalies/inject", json!({"affected_points": 101}));
    let ctx = backend.context();

    let result = ctx
        .api()
        .inject_anomaly(&AnomalyInjection::default())
        .await
        .unwrap();

    assert_eq!(result.affected_points, Some(101));
    let request = &backend.requests_to("/api/anomalies/inject")[0];
    assert_eq!(
        request.query.as_deref(),
        Some("pipeline=stream_lane&anomaly_type=backlog_growth&from_tick=100&to_tick=200&strength=1")
    );
    assert_eq!(request.body, None);
}

#[tokio::test]
async fn invalid_injection_is_rejected_before_sending() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();

    let injection = AnomalyInjection {
        strength: Some(9.0),
        ..Default::default()
    };
    let err = ctx.api().inject_anomaly(&injection).await.unwrap_err();

    assert_matches!(err, ApiError::Core(CoreError::Validation(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn incident_timeline_is_unwrapped() {
    let backend = MockBackend::start().await;
    backend.ok(
        "GET /api/incidents/7/timeline",
        json!({"timeline": [{"tick": 120, "event": "alert opened", "severity": "CRITICAL"}]}),
    );
    let ctx = backend.context();

    let timeline = ctx.api().fetch_incident_timeline(7).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].event, "alert opened");
}

#[tokio::test]
async fn login_persists_the_session() {
    let backend = MockBackend::start().await;
    backend.ok(
        "POST /api/auth/login",
        json!({"access_token": "fresh", "token_type": "bearer"}),
    );
    backend.ok(
        "GET /api/auth/me",
        json!({"id": "1", "username": "operator", "roles": ["sre"], "is_active": true}),
    );
    let storage = Arc::new(MemoryStore::new());
    let ctx = backend.context_with_storage(storage.clone());

    let user = ctx.login("operator", "secret").await.unwrap();
    assert_eq!(user, operator());

    let me = &backend.requests_to("/api/auth/me")[0];
    assert_eq!(me.authorization.as_deref(), Some("Bearer fresh"));
    assert_eq!(
        backend.requests_to("/api/auth/login")[0].body,
        Some(json!({"username": "operator", "password": "secret"}))
    );

    let reloaded = backend.context_with_storage(storage);
    assert_eq!(reloaded.session().token().as_deref(), Some("fresh"));
    assert_eq!(reloaded.session().user(), Some(operator()));

    reloaded.logout().await.unwrap();
    assert!(!reloaded.session().is_authenticated());
}

#[tokio::test]
async fn null_success_body_decodes_as_null() {
    let backend = MockBackend::start().await;
    backend.ok("GET /api/alerts/ping", serde_json::Value::Null);
    let ctx = backend.context();

    assert!(ctx.api().ping().await.unwrap().is_null());
}

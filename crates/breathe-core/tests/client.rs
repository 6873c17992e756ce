//! HTTP client tests against a throwaway local service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use breathe_core::{AqiSource, BreatheClient, Error, SyncEngine};
use breathe_store::MemoryStore;

async fn zones() -> Json<serde_json::Value> {
    Json(json!({
        "zones": [
            { "id": "srinagar", "name": "Srinagar", "provider": "openmeteo", "lat": 34.08, "lon": 74.79 },
            { "id": "jammu", "name": "Jammu" },
            { "id": "broken", "name": "Broken" }
        ]
    }))
}

async fn zone_aqi(Path(zone_id): Path<String>) -> Response {
    match zone_id.as_str() {
        "srinagar" => Json(json!({
            "zone_id": "srinagar",
            "zone_name": "Srinagar",
            "aqi": 142,
            "us_aqi": 158,
            "main_pollutant": "pm2_5",
            "aqi_breakdown": { "pm2_5": 142, "pm10": 80 },
            "concentrations_us_units": { "pm2_5": 68.2, "pm10": 110.0, "no2": 14.1 },
            "timestamp_unix": 1760000000.0,
            "history": [],
            "trends": { "change_1h": 4, "change_24h": -12 },
            "warning": "Sensor recalibrating",
            "source": "AirGradient network"
        }))
        .into_response(),
        "leh #2?" => Json(json!({
            "zone_id": "leh #2?",
            "zone_name": "Leh",
            "aqi": 31,
            "main_pollutant": "pm10"
        }))
        .into_response(),
        "jammu" => Json(json!({
            "zone_id": "jammu",
            "zone_name": "Jammu",
            "aqi": 64,
            "main_pollutant": "o3"
        }))
        .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "upstream down" })),
        )
            .into_response(),
    }
}

async fn spawn_service() -> SocketAddr {
    let app = Router::new()
        .route("/zones", get(zones))
        .route("/aqi/zone/{zone_id}", get(zone_aqi));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_list_zones() {
    let addr = spawn_service().await;
    let client = BreatheClient::new(&format!("http://{addr}/")).unwrap();

    let zones = client.list_zones().await.unwrap();
    assert_eq!(zones.len(), 3);
    assert_eq!(zones[0].display_name, "Srinagar");
    assert_eq!(zones[0].coordinates(), Some((34.08, 74.79)));
    assert_eq!(zones[1].coordinates(), None);
}

#[tokio::test]
async fn test_zone_aqi_full_and_minimal() {
    let addr = spawn_service().await;
    let client = BreatheClient::new(&format!("http://{addr}")).unwrap();

    let full = client.zone_aqi("srinagar").await.unwrap();
    assert_eq!(full.index_value, 142);
    assert_eq!(full.us_index_value, Some(158));
    assert_eq!(full.pm25(), Some(68.2));
    assert_eq!(full.history, Some(Vec::new()));
    assert_eq!(full.trend.unwrap().change_last_hour, Some(4));
    assert_eq!(full.warning.as_deref(), Some("Sensor recalibrating"));
    assert_eq!(full.provider_label(), "AirGradient");

    let minimal = client.zone_aqi("jammu").await.unwrap();
    assert_eq!(minimal.us_index_value, None);
    assert_eq!(minimal.history, None);
    assert_eq!(minimal.breakdown, None);
    assert_eq!(minimal.provider_label(), "OpenMeteo");
}

#[tokio::test]
async fn test_zone_id_with_reserved_characters() {
    let addr = spawn_service().await;
    let client = BreatheClient::new(&format!("http://{addr}")).unwrap();

    let reading = client.zone_aqi("leh #2?").await.unwrap();
    assert_eq!(reading.zone_id, "leh #2?");
    assert_eq!(reading.index_value, 31);
}

#[tokio::test]
async fn test_api_error_message() {
    let addr = spawn_service().await;
    let client = BreatheClient::new(&format!("http://{addr}")).unwrap();

    match client.zone_aqi("broken").await {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BreatheClient::new(&format!("http://{addr}")).unwrap();
    let err = client.list_zones().await.unwrap_err();
    assert!(matches!(err, Error::NotReachable { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_engine_over_http() {
    let addr = spawn_service().await;
    let client = Arc::new(BreatheClient::new(&format!("http://{addr}")).unwrap());
    let engine = SyncEngine::new(client, Arc::new(MemoryStore::new()));
    engine.toggle_pin("jammu").unwrap();

    let report = engine.refresh(false).await.unwrap();
    assert_eq!(report.zones, 3);
    assert_eq!(report.failed, vec!["broken"]);

    let snapshot = engine.snapshot();
    let ids: Vec<_> = snapshot.all_readings().iter().map(|r| r.zone_id.as_str()).collect();
    assert_eq!(ids, vec!["jammu", "srinagar"]);
    assert_eq!(snapshot.pinned_readings()[0].index_value, 64);
    assert_eq!(snapshot.error(), None);
}

//! End-to-end decode flow: gateway response JSON through to the
//! published record

use secrecy::SecretString;
use serde_json::json;

use gwm_bridge::coordinator::VehicleData;
use gwm_bridge::gwm::decode::TelemetryValue;
use gwm_bridge::gwm::models::{ApiResponse, VehicleStatus};
use gwm_bridge::ha::publisher::{location_payload, state_payload};
use gwm_bridge::storage::settings::AccountSettings;

fn account() -> AccountSettings {
    AccountSettings {
        email: "user@example.com".to_string(),
        password: SecretString::from("hunter2"),
        vin: "VIN123".to_string(),
        model: "TANK 300".to_string(),
        vehicle_number: Some("A123BC".to_string()),
    }
}

#[test]
fn decodes_a_full_status_response() {
    let raw = r#"{
        "code": "000000",
        "description": "success",
        "data": {
            "items": [
                {"code": "2103010", "value": "12345", "unit": "km"},
                {"code": "2016001", "value": "2"},
                {"code": "2208001", "value": "0"},
                {"code": "2101001", "value": "230", "unit": "kPa"},
                {"code": "2210005", "value": "3"},
                {"code": "9999999", "value": "ignored"}
            ],
            "latitude": 55.0,
            "longitude": 37.0,
            "updateTime": 1700000000000,
            "serviceStatus": 1
        }
    }"#;

    let envelope: ApiResponse<VehicleStatus> = serde_json::from_str(raw).unwrap();
    assert!(envelope.is_success());

    let status = envelope.data.unwrap();
    let data = VehicleData::from_status(&status, &account());

    assert_eq!(data.snapshot.mileage, Some(TelemetryValue::Integer(12345)));
    assert_eq!(
        data.snapshot.engine_state.as_ref().map(|s| s.to_string()),
        Some("running".to_string())
    );
    assert_eq!(data.snapshot.doors_locked, Some(true));
    assert_eq!(data.snapshot.tire_pressure_fl, Some(TelemetryValue::Integer(230)));
    assert_eq!(data.snapshot.sunroof_position, Some(TelemetryValue::Integer(0)));
    assert_eq!(data.snapshot.fuel_volume, None);
    assert_eq!(data.latitude, Some(55.0));
    assert_eq!(data.longitude, Some(37.0));
    assert_eq!(data.update_time, Some(1700000000000));
    assert_eq!(data.service_status, Some(1));
}

#[test]
fn published_record_carries_location_and_state() {
    let status = VehicleStatus {
        items: vec![
            gwm_bridge::gwm::models::TelemetryItem::new("2103010", json!("12345")),
            gwm_bridge::gwm::models::TelemetryItem::new("2016001", json!("2")),
        ],
        latitude: Some(55.0),
        longitude: Some(37.0),
        update_time: Some(1700000000000),
        service_status: Some(1),
    };
    let data = VehicleData::from_status(&status, &account());

    let state = state_payload(&data).unwrap();
    assert_eq!(state["mileage"], json!(12345));
    assert_eq!(state["engine_state"], json!("running"));
    assert_eq!(state["service_status"], json!("active"));

    let location = location_payload(&data);
    assert_eq!(location["latitude"], json!(55.0));
    assert_eq!(location["longitude"], json!(37.0));
    assert_eq!(location["vin"], json!("VIN123"));
}

#[test]
fn failed_envelope_yields_no_data() {
    let raw = r#"{"code": "999999", "description": "auth failed"}"#;
    let envelope: ApiResponse<VehicleStatus> = serde_json::from_str(raw).unwrap();
    assert!(!envelope.is_success());
    assert!(envelope.data.is_none());
}

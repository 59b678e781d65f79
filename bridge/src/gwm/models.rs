//! Wire types for the gateway API

use serde::{Deserialize, Serialize};

/// Response envelope shared by all gateway endpoints.
///
/// The gateway signals success through the `code` field, not the HTTP
/// status; `"0"` and `"000000"` both mean success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self.code.as_deref(), Some("0") | Some("000000"))
    }
}

/// Fixed-shape login payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub account: String,
    pub password: String,
    pub agreement: Vec<u8>,
    pub sms_code: Option<String>,
    pub msg_type: Option<String>,
    pub model: String,
    #[serde(rename = "type")]
    pub login_type: u8,
    pub device_id: String,
    pub app_type: u8,
    pub push_token: String,
    pub country: String,
    pub country_code: Option<String>,
    pub is_encrypt: bool,
}

impl LoginRequest {
    pub fn new(email: &str, password: &str, device_id: &str) -> Self {
        Self {
            account: email.to_string(),
            password: password.to_string(),
            agreement: vec![1, 2, 3],
            sms_code: None,
            msg_type: None,
            model: "Android".to_string(),
            login_type: 1,
            device_id: device_id.to_string(),
            app_type: 0,
            push_token: String::new(),
            country: "RU".to_string(),
            country_code: None,
            is_encrypt: false,
        }
    }
}

/// Payload of a successful login
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(default)]
    pub access_token: Option<String>,

    /// Remaining user-info fields, kept raw
    #[serde(flatten)]
    pub user_info: serde_json::Value,
}

/// One bound vehicle from the acquireVehicles listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub vin: Option<String>,

    /// Model designation
    #[serde(default)]
    pub vtype: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    /// License plate
    #[serde(default)]
    pub vehicle_number: Option<String>,
}

impl Vehicle {
    /// Human-readable label: "Model (Color) - Plate [VIN]"
    pub fn label(&self) -> String {
        let mut label = self.vtype.clone().unwrap_or_else(|| "Unknown model".to_string());
        if let Some(color) = self.color.as_deref().filter(|c| !c.is_empty()) {
            label.push_str(&format!(" ({})", color));
        }
        if let Some(plate) = self.vehicle_number.as_deref().filter(|p| !p.is_empty()) {
            label.push_str(&format!(" - {}", plate));
        }
        if let Some(vin) = self.vin.as_deref().filter(|v| !v.is_empty()) {
            label.push_str(&format!(" [{}]", vin));
        }
        label
    }
}

/// Last-known vehicle status as returned under `data`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    #[serde(default)]
    pub items: Vec<TelemetryItem>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    /// Epoch milliseconds
    #[serde(default)]
    pub update_time: Option<i64>,

    #[serde(default)]
    pub service_status: Option<i64>,
}

/// One raw telemetry reading: a code from the gateway's fixed vocabulary
/// and a heterogeneous string-or-number value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryItem {
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub value: serde_json::Value,

    #[serde(default)]
    pub unit: Option<String>,
}

impl TelemetryItem {
    pub fn new(code: &str, value: serde_json::Value) -> Self {
        Self {
            code: code.to_string(),
            value,
            unit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes() {
        let ok: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"code": "0", "data": {}}"#).unwrap();
        assert!(ok.is_success());

        let ok_long: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"code": "000000", "data": {}}"#).unwrap();
        assert!(ok_long.is_success());

        let failed: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"code": "999999", "description": "bad credentials"}"#).unwrap();
        assert!(!failed.is_success());

        let missing: ApiResponse<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(!missing.is_success());
    }

    #[test]
    fn test_login_request_is_compact_camel_case() {
        let request = LoginRequest::new("user@example.com", "hunter2", "0123456789abcdef0123456789abcdef");
        let body = serde_json::to_string(&request).unwrap();

        assert!(!body.contains(' '));
        assert!(body.contains("\"account\":\"user@example.com\""));
        assert!(body.contains("\"agreement\":[1,2,3]"));
        assert!(body.contains("\"smsCode\":null"));
        assert!(body.contains("\"type\":1"));
        assert!(body.contains("\"deviceId\":\"0123456789abcdef0123456789abcdef\""));
        assert!(body.contains("\"pushToken\":\"\""));
        assert!(body.contains("\"isEncrypt\":false"));
    }

    #[test]
    fn test_vehicle_label() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{"vin": "VIN123", "vtype": "TANK 300", "color": "Black", "vehicleNumber": "A123BC"}"#,
        )
        .unwrap();
        assert_eq!(vehicle.label(), "TANK 300 (Black) - A123BC [VIN123]");
    }

    #[test]
    fn test_status_parses_with_missing_fields() {
        let status: VehicleStatus = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(status.items.is_empty());
        assert!(status.latitude.is_none());
        assert!(status.service_status.is_none());
    }
}

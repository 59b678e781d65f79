//! Gateway API client
//!
//! Owns the HTTP transport, device identity, and access token. Expected
//! failures (bad credentials, SSL, connection, timeout, malformed JSON)
//! are absorbed into unset/false results with a logged diagnostic; callers
//! never see a raw transport error. Retry cadence belongs to the poller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, info, warn};

use crate::errors::BridgeError;
use crate::gwm::models::{ApiResponse, LoginData, LoginRequest, Vehicle, VehicleStatus};
use crate::gwm::sign::Signer;
use crate::storage::identity::DeviceIdentity;
use crate::utils::mask_email;

const LOGIN_PATH: &str = "app-api/api/v1.0/userAuth/loginAccount";
const VEHICLES_PATH: &str = "app-api/api/v1.0/vehicle/acquireVehicles";
const LAST_STATUS_PATH: &str = "app-api/api/v1.0/vehicle/getLastStatus";

const CERT_FILE: &str = "gwm_general.pem";
const KEY_FILE: &str = "gwm_general.key";

/// Fixed device/locale/channel metadata sent with every request
const METADATA_HEADERS: &[(&str, &str)] = &[
    ("ip", "0.0.0.0"),
    ("rs", "2"),
    ("appId", "1"),
    ("brand", "1"),
    ("terminal", "GW_APP_Haval"),
    ("enterpriseId", "gwm"),
    ("systemType", "1"),
    ("cVer", "2.0.1"),
    ("timeZone", "Europe/Moscow"),
    ("channel", "APP"),
    ("language", "ru_RU"),
    ("regionCode", "RU"),
    ("country", "RU"),
    ("communityBrand", ""),
    ("Content-Type", "application/json"),
];

/// Options for constructing a [`GwmClient`]
#[derive(Debug, Clone)]
pub struct GwmOptions {
    /// Gateway base URL, trailing slash included
    pub base_url: String,

    pub app_key: String,

    pub app_secret: String,

    /// Prefix of the auth header names
    pub auth_prefix: String,

    /// Directory holding an optional client certificate pair
    pub certificates_dir: Option<PathBuf>,
}

/// Gateway API client: one instance per vehicle account session
pub struct GwmClient {
    http: reqwest::Client,
    base_url: String,
    signer: Signer,
    device_id: DeviceIdentity,
    has_client_certificate: bool,
    access_token: Option<String>,
    user_info: Option<serde_json::Value>,
}

impl GwmClient {
    /// Create a new client.
    ///
    /// A client certificate pair is attached when both files exist under
    /// the certificate directory; a missing pair is non-fatal and only
    /// logged, requests then go out without client-certificate material.
    pub fn new(options: &GwmOptions, device_id: DeviceIdentity) -> Result<Self, BridgeError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(30));

        let mut has_client_certificate = false;
        if let Some(ref dir) = options.certificates_dir {
            if let Some(identity) = load_client_certificate(dir) {
                builder = builder.identity(identity);
                has_client_certificate = true;
                info!("Client certificates loaded");
            } else {
                warn!("Client certificates not found, requests may be rejected by the gateway");
            }
        }

        Ok(Self {
            http: builder.build()?,
            base_url: options.base_url.trim_end_matches('/').to_string() + "/",
            signer: Signer::new(
                options.app_key.as_str(),
                options.app_secret.as_str(),
                options.auth_prefix.as_str(),
            ),
            device_id,
            has_client_certificate,
            access_token: None,
            user_info: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn has_client_certificate(&self) -> bool {
        self.has_client_certificate
    }

    pub fn device_id(&self) -> &DeviceIdentity {
        &self.device_id
    }

    /// Raw user-info payload from the last successful login
    pub fn user_info(&self) -> Option<&serde_json::Value> {
        self.user_info.as_ref()
    }

    /// Log in and cache the access token. Returns false on any failure.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        match self.try_login(email, password).await {
            Ok(()) => true,
            Err(e) => {
                error!("Login failed for user {}: {}", mask_email(email), e);
                false
            }
        }
    }

    /// Log in, distinguishing rejected credentials from transport trouble.
    ///
    /// `AuthError` means the gateway answered with a non-success code;
    /// every other variant is a connectivity-shaped failure. The setup
    /// wizard is the only caller that needs the distinction.
    pub async fn try_login(&mut self, email: &str, password: &str) -> Result<(), BridgeError> {
        info!("Attempting login for user: {}", mask_email(email));

        let request = LoginRequest::new(email, password, self.device_id.as_str());
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let body = serde_json::to_string(&request)?;
        let headers = self.build_headers("POST", &url, Some(&body), None)?;

        debug!("POST {}", url);
        let response = self.http.post(&url).headers(headers).body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::GatewayError(format!("HTTP {} during login", status)));
        }

        let envelope: ApiResponse<LoginData> = response.json().await?;
        if !envelope.is_success() {
            let code = envelope.code.as_deref().unwrap_or("unknown");
            let description = envelope.description.as_deref().unwrap_or("Unknown error");
            return Err(BridgeError::AuthError(format!("{} ({})", description, code)));
        }

        let data = envelope
            .data
            .ok_or_else(|| BridgeError::AuthError("login response carried no data".to_string()))?;

        self.access_token = data.access_token.clone();
        self.user_info = Some(data.user_info);
        info!("Login successful for user: {}", mask_email(email));
        Ok(())
    }

    /// Fetch the list of vehicles bound to the account.
    ///
    /// Returns the full decoded response; `None` without a cached token
    /// (no request is sent) or on any failure.
    pub async fn get_vehicles_list(&self) -> Option<ApiResponse<Vec<Vehicle>>> {
        if self.access_token.is_none() {
            debug!("No access token cached, skipping vehicle list request");
            return None;
        }

        match self.get_vehicles_impl().await {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                error!("Failed to get vehicles list: {}", e);
                None
            }
        }
    }

    async fn get_vehicles_impl(&self) -> Result<ApiResponse<Vec<Vehicle>>, BridgeError> {
        let url = format!("{}{}", self.base_url, VEHICLES_PATH);
        let headers = self.build_headers("GET", &url, None, None)?;

        debug!("GET {}", url);
        let response = self.http.get(&url).headers(headers).send().await?;
        let envelope: ApiResponse<Vec<Vehicle>> = response.json().await?;

        if !envelope.is_success() {
            let code = envelope.code.as_deref().unwrap_or("unknown");
            return Err(BridgeError::GatewayError(format!(
                "vehicle list rejected with code {}",
                code
            )));
        }

        Ok(envelope)
    }

    /// Fetch one vehicle's last-known status.
    ///
    /// Returns only the `data` field of the response; `None` without a
    /// cached token (no request is sent) or on any failure.
    pub async fn get_vehicle_by_vin(&self, vin: &str) -> Option<VehicleStatus> {
        if self.access_token.is_none() {
            debug!("No access token cached, skipping status request");
            return None;
        }

        match self.get_status_impl(vin).await {
            Ok(status) => Some(status),
            Err(e) => {
                error!("Failed to get vehicle status: {}", e);
                None
            }
        }
    }

    async fn get_status_impl(&self, vin: &str) -> Result<VehicleStatus, BridgeError> {
        let url = format!("{}{}", self.base_url, LAST_STATUS_PATH);
        let params = [("vin".to_string(), vin.to_string())];
        let headers = self.build_headers("GET", &url, None, Some(&params))?;

        debug!("GET {} (vin {})", url, vin);
        let response = self
            .http
            .get(&url)
            .query(&[("vin", vin)])
            .headers(headers)
            .send()
            .await?;
        let envelope: ApiResponse<VehicleStatus> = response.json().await?;

        if !envelope.is_success() {
            let code = envelope.code.as_deref().unwrap_or("unknown");
            return Err(BridgeError::GatewayError(format!(
                "status rejected with code {}",
                code
            )));
        }

        envelope
            .data
            .ok_or_else(|| BridgeError::GatewayError("status response carried no data".to_string()))
    }

    /// Signature headers plus the fixed metadata block and, once logged
    /// in, the access token
    fn build_headers(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        params: Option<&[(String, String)]>,
    ) -> Result<HeaderMap, BridgeError> {
        let mut headers = HeaderMap::new();

        for (name, value) in self.signer.headers(method, url, body, params)? {
            headers.insert(parse_header_name(&name)?, parse_header_value(&value)?);
        }

        for (name, value) in METADATA_HEADERS {
            headers.insert(parse_header_name(name)?, parse_header_value(value)?);
        }

        let device_id = parse_header_value(self.device_id.as_str())?;
        headers.insert(parse_header_name("deviceId")?, device_id.clone());
        headers.insert(parse_header_name("iccid")?, device_id);

        if let Some(ref token) = self.access_token {
            headers.insert(parse_header_name("accessToken")?, parse_header_value(token)?);
        }

        Ok(headers)
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, BridgeError> {
    HeaderName::try_from(name)
        .map_err(|e| BridgeError::GatewayError(format!("invalid header name {}: {}", name, e)))
}

fn parse_header_value(value: &str) -> Result<HeaderValue, BridgeError> {
    HeaderValue::from_str(value)
        .map_err(|e| BridgeError::GatewayError(format!("invalid header value: {}", e)))
}

/// Read the client certificate pair, if both files are present
fn load_client_certificate(dir: &Path) -> Option<reqwest::Identity> {
    let cert_path = dir.join(CERT_FILE);
    let key_path = dir.join(KEY_FILE);

    if !cert_path.exists() || !key_path.exists() {
        return None;
    }

    let mut pem = match std::fs::read(&cert_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read client certificate {:?}: {}", cert_path, e);
            return None;
        }
    };
    match std::fs::read(&key_path) {
        Ok(bytes) => pem.extend_from_slice(&bytes),
        Err(e) => {
            warn!("Failed to read client key {:?}: {}", key_path, e);
            return None;
        }
    }

    match reqwest::Identity::from_pem(&pem) {
        Ok(identity) => Some(identity),
        Err(e) => {
            warn!("Failed to parse client certificate pair: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GwmClient {
        let options = GwmOptions {
            // Unroutable on purpose: these tests must never touch the network
            base_url: "https://127.0.0.1:1/".to_string(),
            app_key: "4694605273".to_string(),
            app_secret: "testsecret".to_string(),
            auth_prefix: "gwm".to_string(),
            certificates_dir: None,
        };
        GwmClient::new(&options, DeviceIdentity::generate()).unwrap()
    }

    #[tokio::test]
    async fn test_authenticated_calls_gate_on_token() {
        let client = test_client();
        assert!(!client.is_authenticated());

        // Without a token both calls return the unset result without
        // sending anything (an attempted request would error, not hang)
        assert!(client.get_vehicles_list().await.is_none());
        assert!(client.get_vehicle_by_vin("VIN123").await.is_none());
    }

    #[test]
    fn test_build_headers_composition() {
        let mut client = test_client();
        let url = "https://127.0.0.1:1/app-api/api/v1.0/vehicle/acquireVehicles";

        let headers = client.build_headers("GET", url, None, None).unwrap();
        assert!(headers.contains_key("gwm-auth-appkey"));
        assert!(headers.contains_key("gwm-auth-sign"));
        assert!(headers.contains_key("gwm-auth-nonce"));
        assert!(headers.contains_key("gwm-auth-timestamp"));
        assert_eq!(headers.get("regionCode").unwrap(), "RU");
        assert_eq!(headers.get("channel").unwrap(), "APP");
        assert_eq!(headers.get("deviceId").unwrap(), headers.get("iccid").unwrap());
        assert!(!headers.contains_key("accessToken"));

        client.access_token = Some("token123".to_string());
        let headers = client.build_headers("GET", url, None, None).unwrap();
        assert_eq!(headers.get("accessToken").unwrap(), "token123");
    }

    #[test]
    fn test_base_url_normalization() {
        let options = GwmOptions {
            base_url: "https://gateway.example".to_string(),
            app_key: "k".to_string(),
            app_secret: "s".to_string(),
            auth_prefix: "gwm".to_string(),
            certificates_dir: None,
        };
        let client = GwmClient::new(&options, DeviceIdentity::generate()).unwrap();
        assert_eq!(client.base_url, "https://gateway.example/");
    }
}

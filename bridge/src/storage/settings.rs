//! Settings file management

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::logs::LogLevel;

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// MQTT broker configuration
    #[serde(default)]
    pub mqtt_broker: MqttBrokerSettings,

    /// Polling interval in seconds
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Account and vehicle selected by the setup wizard
    #[serde(default)]
    pub account: Option<AccountSettings>,
}

fn default_polling_interval() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            gateway: GatewaySettings::default(),
            mqtt_broker: MqttBrokerSettings::default(),
            polling_interval_secs: 30,
            account: None,
        }
    }
}

/// Cloud gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL for the gateway API
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Application key sent in the auth headers
    #[serde(default = "default_app_key")]
    pub app_key: String,

    /// Application secret folded into the signature base string
    #[serde(default = "default_app_secret")]
    pub app_secret: String,

    /// Prefix of the auth header names
    #[serde(default = "default_auth_prefix")]
    pub auth_prefix: String,
}

fn default_gateway_url() -> String {
    "https://rus-h5-gateway.gwmcloud.com/".to_string()
}

fn default_app_key() -> String {
    "4694605273".to_string()
}

fn default_app_secret() -> String {
    "e4e478c00f570e76a8993653a7b81d57".to_string()
}

fn default_auth_prefix() -> String {
    "gwm".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            app_key: default_app_key(),
            app_secret: default_app_secret(),
            auth_prefix: default_auth_prefix(),
        }
    }
}

/// MQTT broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttBrokerSettings {
    /// Broker host; empty disables publishing
    #[serde(default)]
    pub host: String,

    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Use TLS
    #[serde(default)]
    pub tls: bool,

    /// Optional path to a PEM-encoded CA certificate for broker TLS verification.
    /// When absent, the system certificate store is used.
    #[serde(default)]
    pub ca_cert_path: Option<String>,

    /// Broker username
    #[serde(default)]
    pub username: Option<String>,

    /// Broker password
    #[serde(default)]
    pub password: Option<String>,

    /// Home Assistant discovery topic prefix
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}

impl Default for MqttBrokerSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_mqtt_port(),
            tls: false,
            ca_cert_path: None,
            username: None,
            password: None,
            discovery_prefix: default_discovery_prefix(),
        }
    }
}

/// Account record persisted by the setup wizard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettings {
    pub email: String,

    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,

    pub vin: String,

    pub model: String,

    #[serde(default)]
    pub vehicle_number: Option<String>,
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.polling_interval_secs, 30);
        assert_eq!(settings.gateway.auth_prefix, "gwm");
        assert_eq!(settings.mqtt_broker.discovery_prefix, "homeassistant");
        assert!(settings.account.is_none());
    }

    #[test]
    fn test_account_round_trip() {
        let account = AccountSettings {
            email: "user@example.com".to_string(),
            password: SecretString::from("hunter2"),
            vin: "LGWFF7A54PJ658007".to_string(),
            model: "TANK 300".to_string(),
            vehicle_number: Some("A123BC".to_string()),
        };
        let json = serde_json::to_string(&account).unwrap();
        let parsed: AccountSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.email, "user@example.com");
        assert_eq!(parsed.password.expose_secret(), "hunter2");
        assert_eq!(parsed.vin, "LGWFF7A54PJ658007");
    }
}

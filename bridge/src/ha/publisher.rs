//! Entity state publishing
//!
//! Publishes retained discovery configs once, then one retained state
//! document per successful tick plus a location attributes document for
//! the tracker. Availability flips to offline on a failed tick so the
//! host marks the entities unavailable until the next success.

use serde_json::json;
use tracing::info;

use crate::coordinator::VehicleData;
use crate::errors::BridgeError;
use crate::ha::discovery::{EntityDef, ENTITIES};
use crate::mqtt::client::MqttClient;

/// Topic names for one vehicle
#[derive(Debug, Clone)]
pub struct Topics {
    discovery_prefix: String,
    vin: String,
}

impl Topics {
    pub fn new(discovery_prefix: impl Into<String>, vin: impl Into<String>) -> Self {
        Self {
            discovery_prefix: discovery_prefix.into(),
            vin: vin.into(),
        }
    }

    pub fn state(&self) -> String {
        format!("gwm-bridge/{}/state", self.vin)
    }

    pub fn availability(&self) -> String {
        format!("gwm-bridge/{}/availability", self.vin)
    }

    pub fn location(&self) -> String {
        format!("gwm-bridge/{}/location", self.vin)
    }

    pub fn discovery(&self, component: &str, object_id: &str) -> String {
        format!(
            "{}/{}/gwm_{}/{}/config",
            self.discovery_prefix, component, self.vin, object_id
        )
    }
}

/// Publishes one vehicle's entities to the broker
pub struct EntityPublisher {
    mqtt: MqttClient,
    topics: Topics,
    vin: String,
    model: String,
}

impl EntityPublisher {
    pub fn new(mqtt: MqttClient, discovery_prefix: &str, vin: &str, model: &str) -> Self {
        Self {
            mqtt,
            topics: Topics::new(discovery_prefix, vin),
            vin: vin.to_string(),
            model: model.to_string(),
        }
    }

    /// Publish retained discovery configs for every entity
    pub async fn publish_discovery(&self) -> Result<(), BridgeError> {
        for def in ENTITIES {
            let topic = self.topics.discovery(def.component, def.object_id);
            let payload = serde_json::to_vec(&self.discovery_payload(def))?;
            self.mqtt.publish(&topic, payload, true).await?;
        }

        // The tracker reads coordinates from its attributes document
        let topic = self.topics.discovery("device_tracker", "location");
        let config = json!({
            "name": "Location",
            "unique_id": format!("{}_location_tracker", self.vin),
            "json_attributes_topic": self.topics.location(),
            "availability_topic": self.topics.availability(),
            "icon": "mdi:car",
            "source_type": "gps",
            "device": self.device_info(),
        });
        self.mqtt.publish(&topic, serde_json::to_vec(&config)?, true).await?;

        info!("Published discovery configs for {} entities", ENTITIES.len() + 1);
        Ok(())
    }

    /// Publish the state, location, and availability for one tick
    pub async fn publish_data(&self, data: &VehicleData) -> Result<(), BridgeError> {
        let state = serde_json::to_vec(&state_payload(data)?)?;
        self.mqtt.publish(&self.topics.state(), state, true).await?;

        let location = serde_json::to_vec(&location_payload(data))?;
        self.mqtt.publish(&self.topics.location(), location, true).await?;

        self.mqtt
            .publish(&self.topics.availability(), b"online".to_vec(), true)
            .await
    }

    /// Mark the entities unavailable after a failed tick
    pub async fn publish_unavailable(&self) -> Result<(), BridgeError> {
        self.mqtt
            .publish(&self.topics.availability(), b"offline".to_vec(), true)
            .await
    }

    pub async fn disconnect(&self) -> Result<(), BridgeError> {
        self.mqtt.disconnect().await
    }

    fn device_info(&self) -> serde_json::Value {
        json!({
            "identifiers": [self.vin],
            "manufacturer": "GWM",
            "model": self.model,
            "name": format!("GWM {}", self.model),
            "sw_version": env!("CARGO_PKG_VERSION"),
        })
    }

    fn discovery_payload(&self, def: &EntityDef) -> serde_json::Value {
        let mut config = json!({
            "name": def.name,
            "unique_id": format!("{}_{}", self.vin, def.object_id),
            "state_topic": self.topics.state(),
            "value_template": def.value_template,
            "availability_topic": self.topics.availability(),
            "device": self.device_info(),
        });

        if let Some(value) = def.device_class {
            config["device_class"] = value.into();
        }
        if let Some(value) = def.state_class {
            config["state_class"] = value.into();
        }
        if let Some(value) = def.unit {
            config["unit_of_measurement"] = value.into();
        }
        if let Some(value) = def.icon {
            config["icon"] = value.into();
        }
        if let Some(value) = def.entity_category {
            config["entity_category"] = value.into();
        }

        config
    }
}

/// Flat state document all sensor templates read from
pub fn state_payload(data: &VehicleData) -> Result<serde_json::Value, BridgeError> {
    let mut doc = serde_json::to_value(&data.snapshot)?;

    doc["service_status"] = match data.service_status {
        Some(1) => "active".into(),
        Some(0) => "inactive".into(),
        _ => "unknown".into(),
    };
    doc["update_time"] = match data
        .update_time
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
    {
        Some(dt) => dt.to_rfc3339().into(),
        None => serde_json::Value::Null,
    };

    Ok(doc)
}

/// Attributes document for the location tracker
pub fn location_payload(data: &VehicleData) -> serde_json::Value {
    json!({
        "latitude": data.latitude,
        "longitude": data.longitude,
        "gps_accuracy": 50,
        "vin": data.vin,
        "model": data.model,
        "vehicle_number": data.vehicle_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    use crate::coordinator::VehicleData;
    use crate::gwm::models::{TelemetryItem, VehicleStatus};
    use crate::storage::settings::AccountSettings;

    fn data() -> VehicleData {
        let status = VehicleStatus {
            items: vec![
                TelemetryItem::new("2103010", json!("12345")),
                TelemetryItem::new("2016001", json!("2")),
                TelemetryItem::new("2208001", json!("0")),
            ],
            latitude: Some(55.0),
            longitude: Some(37.0),
            update_time: Some(1700000000000),
            service_status: Some(1),
        };
        let account = AccountSettings {
            email: "user@example.com".to_string(),
            password: SecretString::from("hunter2"),
            vin: "VIN123".to_string(),
            model: "TANK 300".to_string(),
            vehicle_number: Some("A123BC".to_string()),
        };
        VehicleData::from_status(&status, &account)
    }

    #[test]
    fn test_state_payload_fields() {
        let doc = state_payload(&data()).unwrap();
        assert_eq!(doc["mileage"], json!(12345));
        assert_eq!(doc["engine_state"], json!("running"));
        assert_eq!(doc["doors_locked"], json!(true));
        assert_eq!(doc["service_status"], json!("active"));
        assert_eq!(doc["update_time"], json!("2023-11-14T22:13:20+00:00"));
        // Absent readings stay null so templates resolve cleanly
        assert_eq!(doc["fuel_volume"], json!(null));
    }

    #[test]
    fn test_location_payload_fields() {
        let doc = location_payload(&data());
        assert_eq!(doc["latitude"], json!(55.0));
        assert_eq!(doc["longitude"], json!(37.0));
        assert_eq!(doc["gps_accuracy"], json!(50));
        assert_eq!(doc["vin"], json!("VIN123"));
        assert_eq!(doc["vehicle_number"], json!("A123BC"));
    }

    #[test]
    fn test_topics() {
        let topics = Topics::new("homeassistant", "VIN123");
        assert_eq!(topics.state(), "gwm-bridge/VIN123/state");
        assert_eq!(topics.availability(), "gwm-bridge/VIN123/availability");
        assert_eq!(
            topics.discovery("sensor", "mileage"),
            "homeassistant/sensor/gwm_VIN123/mileage/config"
        );
    }
}

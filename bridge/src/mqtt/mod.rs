//! MQTT broker connection

pub mod client;

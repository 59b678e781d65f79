//! GWM cloud gateway: request signing, API client, telemetry decoding

pub mod client;
pub mod decode;
pub mod models;
pub mod sign;

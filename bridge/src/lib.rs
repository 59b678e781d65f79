//! GWM Bridge Library
//!
//! Core modules for the GWM cloud telemetry bridge.

pub mod app;
pub mod coordinator;
pub mod errors;
pub mod filesys;
pub mod gwm;
pub mod ha;
pub mod logs;
pub mod mqtt;
pub mod setup;
pub mod storage;
pub mod utils;
pub mod workers;

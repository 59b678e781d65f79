//! Settings persistence round trip

use secrecy::{ExposeSecret, SecretString};

use gwm_bridge::filesys::file::File;
use gwm_bridge::storage::layout::StorageLayout;
use gwm_bridge::storage::settings::{AccountSettings, Settings};

#[tokio::test]
async fn settings_round_trip_through_layout() {
    let dir = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(dir.path());
    layout.setup().await.unwrap();

    let mut settings = Settings::default();
    settings.mqtt_broker.host = "broker.local".to_string();
    settings.account = Some(AccountSettings {
        email: "user@example.com".to_string(),
        password: SecretString::from("hunter2"),
        vin: "VIN123".to_string(),
        model: "TANK 300".to_string(),
        vehicle_number: None,
    });

    layout.settings_file().write_json(&settings).await.unwrap();

    let loaded: Settings = layout.settings_file().read_json().await.unwrap();
    assert_eq!(loaded.mqtt_broker.host, "broker.local");
    assert_eq!(loaded.polling_interval_secs, 30);
    let account = loaded.account.unwrap();
    assert_eq!(account.vin, "VIN123");
    assert_eq!(account.password.expose_secret(), "hunter2");
}

#[tokio::test]
async fn missing_settings_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let file = File::new(dir.path().join("settings.json"));
    assert!(file.read_json::<Settings>().await.is_err());
}

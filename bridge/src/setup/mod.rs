//! Setup wizard
//!
//! Validates the account, lets the user pick one of the bound vehicles,
//! and persists the account record into the settings file. This is the
//! only layer that distinguishes rejected credentials from connectivity
//! trouble.

use std::collections::HashMap;

use secrecy::SecretString;
use thiserror::Error;
use tracing::error;

use crate::errors::BridgeError;
use crate::gwm::client::{GwmClient, GwmOptions};
use crate::gwm::models::Vehicle;
use crate::storage::identity::DeviceIdentity;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::{AccountSettings, Settings};
use crate::utils::mask_email;

/// User-facing setup failures
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Cannot connect to the gateway: {0}")]
    CannotConnect(String),

    #[error("Invalid email or password")]
    InvalidAuth,

    #[error("Invalid VIN: {0}")]
    InvalidVin(String),
}

/// Run the setup wizard
pub async fn run_setup(cli_args: &HashMap<String, String>) {
    match setup_impl(cli_args).await {
        Ok(vin) => {
            println!();
            println!("[SUCCESS] Vehicle {} configured.", vin);
            println!("Start the bridge with: gwm-bridge");
        }
        Err(e) => {
            error!("Setup failed: {}", e);
            eprintln!();
            eprintln!("[ERROR] Setup failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn setup_impl(cli_args: &HashMap<String, String>) -> Result<String, SetupError> {
    println!("GWM Bridge Setup");
    println!("================");
    println!();

    let email = cli_args
        .get("email")
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| SetupError::CannotConnect("Missing --email=<address>".to_string()))?;
    let password = cli_args
        .get("password")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or(SetupError::InvalidAuth)?;

    if !looks_like_email(&email) {
        return Err(SetupError::InvalidAuth);
    }

    // Setup storage layout
    let layout = StorageLayout::default();
    println!("Setting up storage at: {:?}", layout.base_dir);
    layout
        .setup()
        .await
        .map_err(|e| SetupError::CannotConnect(format!("storage setup failed: {}", e)))?;

    let settings = match layout.settings_file().read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(_) => Settings::default(),
    };

    let identity = DeviceIdentity::load_or_create(&layout.identity_file()).await;
    let options = GwmOptions {
        base_url: settings.gateway.base_url.clone(),
        app_key: settings.gateway.app_key.clone(),
        app_secret: settings.gateway.app_secret.clone(),
        auth_prefix: settings.gateway.auth_prefix.clone(),
        certificates_dir: Some(layout.certificates_dir().path().to_path_buf()),
    };
    let mut client = GwmClient::new(&options, identity)
        .map_err(|e| SetupError::CannotConnect(e.to_string()))?;

    println!("Logging in as {}...", mask_email(&email));
    match client.try_login(&email, &password).await {
        Ok(()) => {}
        Err(BridgeError::AuthError(_)) => return Err(SetupError::InvalidAuth),
        Err(e) => return Err(SetupError::CannotConnect(e.to_string())),
    }

    let vehicles = client
        .get_vehicles_list()
        .await
        .and_then(|envelope| envelope.data)
        .unwrap_or_default();
    if vehicles.is_empty() {
        return Err(SetupError::CannotConnect(
            "No vehicles bound to this account".to_string(),
        ));
    }

    let vehicle = choose_vehicle(&vehicles, cli_args.get("vin").map(String::as_str)).await?;
    let vin = vehicle
        .vin
        .clone()
        .ok_or_else(|| SetupError::InvalidVin("selected vehicle carries no VIN".to_string()))?;
    let model = vehicle.vtype.clone().unwrap_or_else(|| "Unknown model".to_string());

    // Verify the selected vehicle actually answers
    println!("Checking vehicle {}...", vin);
    if client.get_vehicle_by_vin(&vin).await.is_none() {
        return Err(SetupError::CannotConnect(format!(
            "Vehicle {} returned no status",
            vin
        )));
    }

    let account = AccountSettings {
        email,
        password: SecretString::from(password),
        vin: vin.clone(),
        model,
        vehicle_number: vehicle.vehicle_number.clone(),
    };

    let mut settings = settings;
    settings.account = Some(account);
    layout
        .settings_file()
        .write_json(&settings)
        .await
        .map_err(|e| SetupError::CannotConnect(format!("failed to write settings: {}", e)))?;
    println!("Settings saved to: {:?}", layout.settings_file().path());

    Ok(vin)
}

/// Pick a vehicle: an explicit --vin wins, a single bound vehicle is
/// taken as-is, otherwise the user chooses interactively
async fn choose_vehicle<'v>(
    vehicles: &'v [Vehicle],
    requested_vin: Option<&str>,
) -> Result<&'v Vehicle, SetupError> {
    if let Some(requested) = requested_vin {
        return vehicles
            .iter()
            .find(|v| v.vin.as_deref() == Some(requested))
            .ok_or_else(|| SetupError::InvalidVin(requested.to_string()));
    }

    if vehicles.len() == 1 {
        return Ok(&vehicles[0]);
    }

    println!();
    println!("Bound vehicles:");
    for (index, vehicle) in vehicles.iter().enumerate() {
        println!("  {}. {}", index + 1, vehicle.label());
    }
    println!();
    println!("Select a vehicle [1-{}]: ", vehicles.len());

    let line = read_stdin_line()
        .await
        .map_err(|e| SetupError::CannotConnect(format!("failed to read selection: {}", e)))?;
    let choice: usize = line
        .trim()
        .parse()
        .map_err(|_| SetupError::InvalidVin(line.trim().to_string()))?;

    vehicles
        .get(choice.wrapping_sub(1))
        .ok_or_else(|| SetupError::InvalidVin(line.trim().to_string()))
}

async fn read_stdin_line() -> Result<String, std::io::Error> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line)
}

/// Loose shape check; the gateway is the real validator
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(vin: &str) -> Vehicle {
        serde_json::from_str(&format!(r#"{{"vin": "{}", "vtype": "TANK 300"}}"#, vin)).unwrap()
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("user@example.com"));
        assert!(!looks_like_email("user@example"));
        assert!(!looks_like_email("not-an-email"));
        assert!(!looks_like_email("user name@example.com"));
    }

    #[tokio::test]
    async fn test_choose_vehicle_by_vin() {
        let vehicles = vec![vehicle("VIN1"), vehicle("VIN2")];
        let chosen = choose_vehicle(&vehicles, Some("VIN2")).await.unwrap();
        assert_eq!(chosen.vin.as_deref(), Some("VIN2"));
    }

    #[tokio::test]
    async fn test_choose_vehicle_unknown_vin() {
        let vehicles = vec![vehicle("VIN1")];
        let err = choose_vehicle(&vehicles, Some("VIN9")).await.unwrap_err();
        assert!(matches!(err, SetupError::InvalidVin(_)));
    }

    #[tokio::test]
    async fn test_choose_vehicle_single_is_implicit() {
        let vehicles = vec![vehicle("VIN1")];
        let chosen = choose_vehicle(&vehicles, None).await.unwrap();
        assert_eq!(chosen.vin.as_deref(), Some("VIN1"));
    }
}

//! Update coordinator
//!
//! One unit of work per poll tick: log in when no token is cached, fetch
//! the vehicle's last-known status, decode it, and cache the result. A
//! failed tick is transient; the poller simply tries again on the next
//! interval.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

use crate::errors::BridgeError;
use crate::gwm::client::GwmClient;
use crate::gwm::decode::{decode, StatusSnapshot};
use crate::gwm::models::VehicleStatus;
use crate::storage::settings::AccountSettings;

/// Client operations the coordinator depends on
#[async_trait]
pub trait VehicleApi: Send {
    fn is_authenticated(&self) -> bool;

    async fn login(&mut self, email: &str, password: &str) -> bool;

    async fn vehicle_status(&mut self, vin: &str) -> Option<VehicleStatus>;
}

#[async_trait]
impl VehicleApi for GwmClient {
    fn is_authenticated(&self) -> bool {
        GwmClient::is_authenticated(self)
    }

    async fn login(&mut self, email: &str, password: &str) -> bool {
        GwmClient::login(self, email, password).await
    }

    async fn vehicle_status(&mut self, vin: &str) -> Option<VehicleStatus> {
        self.get_vehicle_by_vin(vin).await
    }
}

/// Host-facing record produced by one successful tick
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleData {
    pub snapshot: StatusSnapshot,
    pub vin: String,
    pub model: String,
    pub vehicle_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Epoch milliseconds
    pub update_time: Option<i64>,
    pub service_status: Option<i64>,
}

impl VehicleData {
    pub fn from_status(status: &VehicleStatus, account: &AccountSettings) -> Self {
        Self {
            snapshot: decode(&status.items),
            vin: account.vin.clone(),
            model: account.model.clone(),
            vehicle_number: account.vehicle_number.clone(),
            latitude: status.latitude,
            longitude: status.longitude,
            update_time: status.update_time,
            service_status: status.service_status,
        }
    }
}

/// Poll bookkeeping
#[derive(Debug, Clone)]
pub struct PollState {
    pub last_attempted_at: DateTime<Utc>,
    pub last_success_at: DateTime<Utc>,
    pub last_update_success: bool,
    pub err_streak: u32,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            last_attempted_at: DateTime::<Utc>::MIN_UTC,
            last_success_at: DateTime::<Utc>::MIN_UTC,
            last_update_success: false,
            err_streak: 0,
        }
    }
}

/// Update coordinator for a single vehicle
pub struct Coordinator<C: VehicleApi> {
    client: Mutex<C>,
    account: AccountSettings,
    data: RwLock<Option<VehicleData>>,
    state: RwLock<PollState>,
}

impl<C: VehicleApi> Coordinator<C> {
    pub fn new(client: C, account: AccountSettings) -> Self {
        Self {
            client: Mutex::new(client),
            account,
            data: RwLock::new(None),
            state: RwLock::new(PollState::default()),
        }
    }

    pub fn vin(&self) -> &str {
        &self.account.vin
    }

    pub fn model(&self) -> &str {
        &self.account.model
    }

    /// Run one tick of work and cache the result
    pub async fn refresh(&self) -> Result<VehicleData, BridgeError> {
        {
            let mut state = self.state.write().await;
            state.last_attempted_at = Utc::now();
        }

        match self.refresh_impl().await {
            Ok(data) => {
                let mut state = self.state.write().await;
                state.last_success_at = Utc::now();
                state.last_update_success = true;
                state.err_streak = 0;
                debug!("Update completed for vin {}", self.account.vin);
                Ok(data)
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.last_update_success = false;
                state.err_streak += 1;
                error!(
                    "Update failed for vin {} (streak {}): {}",
                    self.account.vin, state.err_streak, e
                );
                Err(e)
            }
        }
    }

    async fn refresh_impl(&self) -> Result<VehicleData, BridgeError> {
        let mut client = self.client.lock().await;

        if !client.is_authenticated() {
            let logged_in = client
                .login(&self.account.email, self.account.password.expose_secret())
                .await;
            if !logged_in {
                return Err(BridgeError::AuthError("login rejected".to_string()));
            }
        }

        let status = client
            .vehicle_status(&self.account.vin)
            .await
            .ok_or_else(|| BridgeError::UpdateFailed("no vehicle status returned".to_string()))?;
        drop(client);

        let data = VehicleData::from_status(&status, &self.account);
        *self.data.write().await = Some(data.clone());
        Ok(data)
    }

    /// Most recent successfully decoded record
    pub async fn data(&self) -> Option<VehicleData> {
        self.data.read().await.clone()
    }

    pub async fn state(&self) -> PollState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;

    use crate::gwm::decode::TelemetryValue;
    use crate::gwm::models::TelemetryItem;

    struct MockApi {
        authenticated: bool,
        login_ok: bool,
        status: Option<VehicleStatus>,
        login_calls: u32,
        status_calls: u32,
    }

    #[async_trait]
    impl VehicleApi for MockApi {
        fn is_authenticated(&self) -> bool {
            self.authenticated
        }

        async fn login(&mut self, _email: &str, _password: &str) -> bool {
            self.login_calls += 1;
            self.authenticated = self.login_ok;
            self.login_ok
        }

        async fn vehicle_status(&mut self, _vin: &str) -> Option<VehicleStatus> {
            self.status_calls += 1;
            self.status.clone()
        }
    }

    fn account() -> AccountSettings {
        AccountSettings {
            email: "user@example.com".to_string(),
            password: SecretString::from("hunter2"),
            vin: "VIN123".to_string(),
            model: "TANK 300".to_string(),
            vehicle_number: Some("A123BC".to_string()),
        }
    }

    fn status() -> VehicleStatus {
        VehicleStatus {
            items: vec![
                TelemetryItem::new("2103010", json!("12345")),
                TelemetryItem::new("2016001", json!("2")),
            ],
            latitude: Some(55.0),
            longitude: Some(37.0),
            update_time: Some(1700000000000),
            service_status: Some(1),
        }
    }

    #[tokio::test]
    async fn test_refresh_logs_in_when_no_token() {
        let coordinator = Coordinator::new(
            MockApi {
                authenticated: false,
                login_ok: true,
                status: Some(status()),
                login_calls: 0,
                status_calls: 0,
            },
            account(),
        );

        let data = coordinator.refresh().await.unwrap();
        assert_eq!(data.snapshot.mileage, Some(TelemetryValue::Integer(12345)));
        assert_eq!(data.latitude, Some(55.0));
        assert_eq!(data.longitude, Some(37.0));

        let client = coordinator.client.lock().await;
        assert_eq!(client.login_calls, 1);
        assert_eq!(client.status_calls, 1);
    }

    #[tokio::test]
    async fn test_refresh_skips_login_with_token() {
        let coordinator = Coordinator::new(
            MockApi {
                authenticated: true,
                login_ok: true,
                status: Some(status()),
                login_calls: 0,
                status_calls: 0,
            },
            account(),
        );

        coordinator.refresh().await.unwrap();
        let client = coordinator.client.lock().await;
        assert_eq!(client.login_calls, 0);
        assert_eq!(client.status_calls, 1);
    }

    #[tokio::test]
    async fn test_failed_login_aborts_tick_before_fetch() {
        let coordinator = Coordinator::new(
            MockApi {
                authenticated: false,
                login_ok: false,
                status: Some(status()),
                login_calls: 0,
                status_calls: 0,
            },
            account(),
        );

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, BridgeError::AuthError(_)));
        assert!(coordinator.data().await.is_none());

        let state = coordinator.state().await;
        assert!(!state.last_update_success);
        assert_eq!(state.err_streak, 1);

        let client = coordinator.client.lock().await;
        assert_eq!(client.status_calls, 0);
    }

    #[tokio::test]
    async fn test_missing_status_is_transient_failure() {
        let coordinator = Coordinator::new(
            MockApi {
                authenticated: true,
                login_ok: true,
                status: None,
                login_calls: 0,
                status_calls: 0,
            },
            account(),
        );

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, BridgeError::UpdateFailed(_)));
        assert_eq!(coordinator.state().await.err_streak, 1);
    }

    #[tokio::test]
    async fn test_successful_refresh_caches_data() {
        let coordinator = Coordinator::new(
            MockApi {
                authenticated: true,
                login_ok: true,
                status: Some(status()),
                login_calls: 0,
                status_calls: 0,
            },
            account(),
        );

        let fresh = coordinator.refresh().await.unwrap();
        let cached = coordinator.data().await.unwrap();
        assert_eq!(fresh, cached);
        assert_eq!(cached.snapshot.engine_state.as_ref().map(|s| s.to_string()), Some("running".to_string()));
        assert!(coordinator.state().await.last_update_success);
    }
}

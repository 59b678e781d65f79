//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::coordinator::Coordinator;
use crate::errors::BridgeError;
use crate::gwm::client::{GwmClient, GwmOptions};
use crate::ha::publisher::EntityPublisher;
use crate::mqtt::client::{MqttAddress, MqttClient};
use crate::storage::identity::DeviceIdentity;
use crate::storage::settings::AccountSettings;
use crate::workers::poller;

/// Run the bridge
pub async fn run(
    options: AppOptions,
    account: AccountSettings,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BridgeError> {
    info!("Initializing GWM bridge for vin {}...", account.vin);

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(options.lifecycle.clone());

    if let Err(e) = init(&options, account, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start bridge: {}", e);
        let _ = shutdown_tx.send(());
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    let _ = shutdown_tx.send(());
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

async fn init(
    options: &AppOptions,
    account: AccountSettings,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), BridgeError> {
    options.storage.setup().await?;

    let identity = DeviceIdentity::load_or_create(&options.storage.identity_file()).await;

    let gwm_options = GwmOptions {
        base_url: options.gateway.base_url.clone(),
        app_key: options.gateway.app_key.clone(),
        app_secret: options.gateway.app_secret.clone(),
        auth_prefix: options.gateway.auth_prefix.clone(),
        certificates_dir: Some(options.storage.certificates_dir().path().to_path_buf()),
    };
    let client = GwmClient::new(&gwm_options, identity)?;
    let coordinator = Arc::new(Coordinator::new(client, account));

    let publisher = if options.mqtt_broker.host.is_empty() {
        info!("MQTT host not configured, entity publishing disabled");
        None
    } else {
        let address = MqttAddress {
            host: options.mqtt_broker.host.clone(),
            port: options.mqtt_broker.port,
            use_tls: options.mqtt_broker.tls,
            ca_cert_path: options.mqtt_broker.ca_cert_path.clone(),
            username: options.mqtt_broker.username.clone(),
            password: options.mqtt_broker.password.clone(),
        };
        let client_id = format!("gwm-bridge-{}", coordinator.vin());
        let mqtt = MqttClient::connect(&address, &client_id).await?;
        Some(EntityPublisher::new(
            mqtt,
            &options.mqtt_broker.discovery_prefix,
            coordinator.vin(),
            coordinator.model(),
        ))
    };

    init_poller_worker(
        options.poller.clone(),
        coordinator,
        publisher,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    Ok(())
}

fn init_poller_worker(
    options: poller::Options,
    coordinator: Arc<Coordinator<GwmClient>>,
    publisher: Option<EntityPublisher>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), BridgeError> {
    info!("Initializing poller worker...");

    let poller_handle = tokio::spawn(async move {
        poller::run(
            &options,
            coordinator.as_ref(),
            publisher.as_ref(),
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;

        if let Some(publisher) = publisher {
            if let Err(e) = publisher.disconnect().await {
                warn!("MQTT disconnect failed: {}", e);
            }
        }
    });

    shutdown_manager.with_poller_worker_handle(poller_handle)?;
    Ok(())
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    lifecycle_options: LifecycleOptions,
    poller_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(lifecycle_options: LifecycleOptions) -> Self {
        Self {
            lifecycle_options,
            poller_worker_handle: None,
        }
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), BridgeError> {
        if self.poller_worker_handle.is_some() {
            return Err(BridgeError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), BridgeError> {
        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), BridgeError> {
        info!("Shutting down GWM bridge...");

        if let Some(handle) = self.poller_worker_handle.take() {
            handle
                .await
                .map_err(|e| BridgeError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}

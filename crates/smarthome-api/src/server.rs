use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use smarthome_common::{Error, Result};
use smarthome_config::AppConfig;
use smarthome_db::{Database, Migrator, SensorStore};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::{AppState, SharedState};
use crate::temperature::TemperatureClient;

/// The sensor registry server: binds to a port and serves the REST API.
pub struct ApiServer {
    config: AppConfig,
}

impl ApiServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then give in-flight requests the
    /// configured grace period to finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);

        let state = self.init_state()?;
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("sensor registry listening on {}", addr);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        tokio::select! {
            joined = &mut server => return flatten(joined),
            _ = shutdown => {}
        }

        info!("shutting down server...");
        let _ = stop_tx.send(());

        match tokio::time::timeout(grace, &mut server).await {
            Ok(joined) => {
                flatten(joined)?;
                info!("server exited properly");
            }
            Err(_) => {
                warn!(
                    "server forced to shutdown after {}s grace period",
                    grace.as_secs()
                );
                server.abort();
            }
        }
        Ok(())
    }

    fn init_state(&self) -> Result<SharedState> {
        let database = &self.config.database;
        let db = Arc::new(Database::connect(
            &database.url,
            Duration::from_secs(database.connect_timeout_secs),
        )?);
        info!("connected to database successfully");

        if database.run_migrations {
            info!("running database migrations...");
            let report = Migrator::new(db.clone()).run()?;
            info!(
                "database migrations completed successfully ({} applied)",
                report.applied.len()
            );
        }

        let sensors = SensorStore::new(db);
        info!("registry holds {} sensor(s)", sensors.count()?);

        let api = &self.config.temperature_api;
        let temperature =
            TemperatureClient::new(&api.url, Duration::from_secs(api.timeout_secs))?;
        info!("temperature service initialized with API URL: {}", api.url);

        Ok(Arc::new(AppState::new(sensors, temperature)))
    }
}

fn flatten(
    joined: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Other(format!("server error: {e}"))),
        Err(e) => Err(Error::Other(format!("server task failed: {e}"))),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

//! The Supervisor module manages the lifecycle of the seekwatch application.
//!
//! It owns the long-running services (today, the poller), listens for
//! shutdown signals (Ctrl+C or SIGTERM) and orchestrates a clean shutdown. If
//! a supervised task fails, the supervisor cancels everything else so the
//! process exits instead of limping along half-functional.

mod builder;

use std::sync::Arc;

pub use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::signal;

use crate::{config::AppConfig, engine::Poller, persistence::error::PersistenceError};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A state store was not provided to the `SupervisorBuilder`.
    #[error("Missing state store for Supervisor")]
    MissingStateStore,

    /// A data source was not provided to the `SupervisorBuilder`.
    #[error("Missing data source for Supervisor")]
    MissingDataSource,

    /// A report sink was not provided to the `SupervisorBuilder`.
    #[error("Missing report sink for Supervisor")]
    MissingReportSink,

    /// Loading persisted state at startup failed.
    #[error("Failed to load persisted state: {0}")]
    StateLoadError(#[from] PersistenceError),
}

/// The primary runtime manager for the application.
///
/// Once `run` is called it becomes the main process loop: it spawns the
/// poller and the signal handler, then waits for either to finish.
pub struct Supervisor<S: crate::persistence::StateStore + 'static> {
    config: Arc<AppConfig>,
    poller: Arc<Poller<S>>,
    cancellation_token: tokio_util::sync::CancellationToken,
    join_set: tokio::task::JoinSet<()>,
}

impl<S: crate::persistence::StateStore + 'static> Supervisor<S> {
    fn new(config: AppConfig, poller: Poller<S>) -> Self {
        Self {
            config: Arc::new(config),
            poller: Arc::new(poller),
            cancellation_token: tokio_util::sync::CancellationToken::new(),
            join_set: tokio::task::JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder<S> {
        SupervisorBuilder::new()
    }

    /// Starts the supervisor and all its managed services, blocking until
    /// shutdown.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        // Spawn a task to listen for shutdown signals.
        let cancellation_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut signal) => {
                        signal.recv().await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to register SIGTERM handler.");
                        std::future::pending::<()>().await;
                    }
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
            }

            cancellation_token.cancel();
        });

        // Spawn the poller service.
        let poller = Arc::clone(&self.poller);
        let poller_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            poller.run(poller_token).await;
        });

        // Monitor task health and the shutdown signal.
        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => break,
            }
        }

        // Wait for everything to wind down, bounded by the shutdown timeout.
        let shutdown_timeout = self.config.shutdown_timeout;
        if tokio::time::timeout(shutdown_timeout, self.join_set.shutdown()).await.is_err() {
            tracing::warn!(
                "Shutdown did not complete within {:?}. Continuing exit.",
                shutdown_timeout
            );
        }
        tracing::info!("Supervisor shutdown complete.");
        Ok(())
    }
}

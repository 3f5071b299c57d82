//! Listener and serve loop.

use probe_config::ServiceConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::errors::ServeError;
use crate::routes::router;
use crate::state::AppState;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type ServeResult<T> = std::result::Result<T, BoxedError>;

/// Handle to a serve loop running on its own task.
pub type ServeHandle = tokio::task::JoinHandle<ServeResult<()>>;

pub trait Operator {
    fn run(&self, signal: broadcast::Receiver<()>) -> ServeHandle;
}

#[derive(Debug, Clone)]
pub struct ProbeServer {
    config: ServiceConfig,
}

impl ProbeServer {
    /// # Errors
    ///
    /// [`ServeError::InvalidConfig`] when the configuration fails validation.
    pub fn new(config: ServiceConfig) -> Result<Self, ServeError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// [`ServeError::Io`] when the address cannot be bound.
    pub async fn listen(&self) -> Result<TcpListener, ServeError> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        probe_trace::info!("probe listening on {}", address);
        Ok(listener)
    }

    /// Serves requests on `listener` until `signal` fires or its sender is dropped,
    /// then lets in-flight responses finish.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the serve loop.
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut signal: broadcast::Receiver<()>,
    ) -> ServeResult<()> {
        let app = router(AppState::from_config(&self.config).shared());

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = signal.recv().await;
                probe_trace::info!("shutdown requested, draining connections");
            })
            .await?;

        probe_trace::info!("probe server stopped");
        Ok(())
    }
}

impl Operator for Arc<ProbeServer> {
    fn run(&self, signal: broadcast::Receiver<()>) -> ServeHandle {
        let server = Arc::clone(self);
        tokio::spawn(async move {
            let listener = server.listen().await?;
            server.serve(listener, signal).await
        })
    }
}

use std::{net::SocketAddr, sync::Arc};

use anyhow::{anyhow, Result};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use tracing::info;

/// A bound, not yet serving, HTTPS listener
pub(crate) struct Server {
    listener: std::net::TcpListener,
    tls_config: RustlsConfig,
}

impl Server {
    /// Bind the listening socket. Connections queue up in the backlog until
    /// `serve` is invoked.
    pub(crate) fn bind(addr: SocketAddr, server_config: Arc<ServerConfig>) -> Result<Self> {
        let listener = std::net::TcpListener::bind(addr)
            .map_err(|e| anyhow!("Cannot bind to {}: {}", addr, e))?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            tls_config: RustlsConfig::from_config(server_config),
        })
    }

    pub(crate) fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub(crate) async fn serve(self, router: Router) -> Result<()> {
        info!(address = %self.local_addr()?, "started HTTPS server");

        axum_server::from_tcp_rustls(self.listener, self.tls_config)
            .serve(router.into_make_service())
            .await
            .map_err(|e| anyhow!("HTTPS server error: {}", e))
    }
}

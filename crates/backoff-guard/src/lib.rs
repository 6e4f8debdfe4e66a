pub mod admission_review;
pub mod api;
mod certs;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod policy;
pub mod registration;
mod server;
mod tracing;

#[cfg(test)]
mod test_utils;

use ::tracing::{error, info, warn};
use anyhow::Result;
use kube::config::{KubeConfigOptions, Kubeconfig};
use lazy_static::lazy_static;
use std::{path::Path, process, sync::Arc, sync::RwLock};
use tokio::runtime::Runtime;

use crate::api::ApiServerState;
use crate::cluster::ClusterClient;
use crate::config::Config;
use crate::server::Server;

lazy_static! {
    static ref TRACE_SYSTEM_INITIALIZED: RwLock<bool> = RwLock::new(false);
}

pub fn run(config: Config) -> Result<()> {
    // kube and the HTTPS server must agree on the crypto backend
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("a rustls crypto provider was already installed");
    }

    let runtime = Runtime::new()?;
    runtime.block_on(async move {
        if let Err(err) = tracing::setup_tracing(
            &config.log_level,
            &config.log_fmt,
            config.log_no_color,
        ) {
            fatal_error(err.to_string());
        }
        {
            let mut w = TRACE_SYSTEM_INITIALIZED.write().unwrap();
            *w = true;
        }

        let tls_material = match certs::load_tls_material(&config.tls_config) {
            Ok(tls_material) => tls_material,
            Err(e) => fatal_error(format!("Cannot load TLS material: {e}")),
        };

        let kube_client = match build_kube_client(config.kubeconfig.as_deref()).await {
            Ok(kube_client) => kube_client,
            Err(e) => fatal_error(format!("Cannot connect to Kubernetes: {e}")),
        };

        let server = match Server::bind(config.addr, tls_material.server_config.clone()) {
            Ok(server) => server,
            Err(e) => fatal_error(e.to_string()),
        };

        // The socket is bound, the registration can be started: requests
        // sent by the API server wait in the backlog until `serve` runs
        match config.registration {
            Some(registration_config) => {
                let client = ClusterClient::from_kube_client(kube_client.clone());
                let ca_bundle = tls_material.ca_bundle;
                let agent = tokio::spawn(async move {
                    registration::register(&client, &registration_config, &ca_bundle).await
                });
                tokio::spawn(async move {
                    match agent.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => fatal_error(e.to_string()),
                        Err(e) => fatal_error(format!("webhook registration task failed: {e}")),
                    }
                });
            }
            None => info!("webhook registration is disabled"),
        }

        let state = Arc::new(ApiServerState::new(ClusterClient::from_kube_client(
            kube_client,
        )));
        if let Err(e) = server.serve(api::router(state)).await {
            fatal_error(e.to_string());
        }
    });

    Ok(())
}

/// Build a kube client from the given kubeconfig file, the in-cluster
/// configuration is used when no file is given or when it cannot be read.
async fn build_kube_client(kubeconfig: Option<&Path>) -> Result<kube::Client> {
    let kube_config = match kubeconfig.map(Kubeconfig::read_from) {
        Some(Ok(kubeconfig)) => {
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        Some(Err(e)) => {
            warn!(error = %e, "cannot read kubeconfig, using in-cluster configuration");
            kube::Config::incluster()?
        }
        None => kube::Config::incluster()?,
    };

    Ok(kube::Client::try_from(kube_config)?)
}

pub fn fatal_error(msg: String) -> ! {
    let trace_system_ready = TRACE_SYSTEM_INITIALIZED.read().unwrap();
    if *trace_system_ready {
        error!("{}", msg);
    } else {
        eprintln!("{msg}");
    }

    process::exit(1);
}

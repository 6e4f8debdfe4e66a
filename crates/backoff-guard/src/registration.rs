use std::time::Duration;

use k8s_openapi::{
    api::admissionregistration::v1::{
        RuleWithOperations, ServiceReference, ValidatingWebhook, ValidatingWebhookConfiguration,
        WebhookClientConfig,
    },
    ByteString,
};
use kube::core::ObjectMeta;
use thiserror::Error;
use tracing::{info, warn};

use crate::cluster::{errors::ClusterClientError, ClusterClient};
use crate::config::RegistrationConfig;

/// Time given to the HTTPS server to come up before the API server is told
/// to send requests to it
pub const DEFAULT_REGISTRATION_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("cannot remove stale webhook registration: {0}")]
    Delete(#[source] ClusterClientError),

    #[error("cannot register webhook: {0}")]
    Create(#[source] ClusterClientError),
}

/// Build the ValidatingWebhookConfiguration pointing the API server to this
/// process for every Pod creation
pub fn build_registration(
    config: &RegistrationConfig,
    ca_bundle: &[u8],
) -> ValidatingWebhookConfiguration {
    let webhook = ValidatingWebhook {
        name: config.webhook_name.clone(),
        admission_review_versions: vec![String::from("v1")],
        client_config: WebhookClientConfig {
            ca_bundle: Some(ByteString(ca_bundle.to_vec())),
            service: Some(ServiceReference {
                namespace: config.service_namespace.clone(),
                name: config.service_name.clone(),
                path: Some(String::from("/")),
                port: Some(config.service_port),
            }),
            url: None,
        },
        rules: Some(vec![RuleWithOperations {
            api_groups: Some(vec![String::new()]),
            api_versions: Some(vec![String::from("v1")]),
            operations: Some(vec![String::from("CREATE")]),
            resources: Some(vec![String::from("pods")]),
            scope: None,
        }]),
        failure_policy: Some(config.failure_policy.clone()),
        side_effects: String::from("None"),
        timeout_seconds: Some(config.timeout_seconds),
        ..Default::default()
    };

    ValidatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(config.name.clone()),
            ..Default::default()
        },
        webhooks: Some(vec![webhook]),
    }
}

/// Register the webhook inside of the cluster.
///
/// The registration is done after `config.delay`, so that the server is
/// already accepting connections. A registration left behind by a previous
/// run is always replaced, this ensures the CA bundle is the current one.
pub async fn register(
    client: &ClusterClient,
    config: &RegistrationConfig,
    ca_bundle: &[u8],
) -> Result<(), RegistrationError> {
    tokio::time::sleep(config.delay).await;

    let registration = build_registration(config, ca_bundle);

    let existing = match client.get_registration(&config.name).await {
        Ok(existing) => existing,
        Err(e) => {
            warn!(error = %e, "cannot lookup existing webhook registration, assuming there's none");
            None
        }
    };
    if existing.is_some() {
        info!(name = config.name.as_str(), "removing existing webhook registration");
        client
            .delete_registration(&config.name)
            .await
            .map_err(RegistrationError::Delete)?;
    }

    client
        .create_registration(&registration)
        .await
        .map_err(RegistrationError::Create)?;
    info!(name = config.name.as_str(), "webhook registered");

    Ok(())
}

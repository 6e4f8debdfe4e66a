use k8s_openapi::api::{
    admissionregistration::v1::ValidatingWebhookConfiguration, batch::v1::Job, core::v1::Pod,
};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use tracing::debug;

use crate::cluster::errors::{ClusterClientError, Result};

#[cfg(test)]
use mockall::automock;

/// Read/write access to the cluster state needed by the webhook.
///
/// This is a thin wrapper around `kube::Client`, which can be cloned and shared
/// between concurrent requests.
pub struct ClusterClient {
    kube_client: kube::Client,
}

#[cfg_attr(test, automock)]
#[cfg_attr(test, allow(dead_code))]
impl ClusterClient {
    pub fn from_kube_client(kube_client: kube::Client) -> Self {
        Self { kube_client }
    }

    /// Fetch a Job, `None` is returned when the Job doesn't exist
    pub async fn get_job(&self, namespace: &str, name: &str) -> Result<Option<Job>> {
        let api: Api<Job> = Api::namespaced(self.kube_client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| ClusterClientError::GetJob {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
                source: Box::new(e),
            })
    }

    /// List the Pods of a namespace that match the given label selector
    pub async fn list_pods_by_label(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.kube_client.clone(), namespace);
        let pods = api
            .list(&ListParams::default().labels(selector))
            .await
            .map_err(|e| ClusterClientError::ListPods {
                namespace: namespace.to_owned(),
                selector: selector.to_owned(),
                source: Box::new(e),
            })?;
        debug!(namespace, selector, count = pods.items.len(), "listed pods");

        Ok(pods.items)
    }

    pub async fn get_registration(
        &self,
        name: &str,
    ) -> Result<Option<ValidatingWebhookConfiguration>> {
        let api: Api<ValidatingWebhookConfiguration> = Api::all(self.kube_client.clone());
        api.get_opt(name)
            .await
            .map_err(|e| ClusterClientError::GetRegistration {
                name: name.to_owned(),
                source: Box::new(e),
            })
    }

    pub async fn delete_registration(&self, name: &str) -> Result<()> {
        let api: Api<ValidatingWebhookConfiguration> = Api::all(self.kube_client.clone());
        api.delete(name, &DeleteParams::default())
            .await
            .map_err(|e| ClusterClientError::DeleteRegistration {
                name: name.to_owned(),
                source: Box::new(e),
            })?;

        Ok(())
    }

    pub async fn create_registration(
        &self,
        registration: &ValidatingWebhookConfiguration,
    ) -> Result<()> {
        let name = registration.metadata.name.clone().unwrap_or_default();
        let api: Api<ValidatingWebhookConfiguration> = Api::all(self.kube_client.clone());
        api.create(&PostParams::default(), registration)
            .await
            .map_err(|e| ClusterClientError::CreateRegistration {
                name,
                source: Box::new(e),
            })?;

        Ok(())
    }
}

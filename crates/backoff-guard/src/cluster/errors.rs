use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterClientError>;

/// Underlying cause of a failed query, usually a `kube::Error`
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClusterClientError {
    #[error("cannot get Job {namespace}/{name}: {source}")]
    GetJob {
        namespace: String,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot list Pods in namespace {namespace} matching '{selector}': {source}")]
    ListPods {
        namespace: String,
        selector: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot get ValidatingWebhookConfiguration {name}: {source}")]
    GetRegistration {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot delete ValidatingWebhookConfiguration {name}: {source}")]
    DeleteRegistration {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot create ValidatingWebhookConfiguration {name}: {source}")]
    CreateRegistration {
        name: String,
        #[source]
        source: BoxError,
    },
}

use thiserror::Error;
use tracing::{debug, info};

use crate::admission_review::WorkloadUnit;
use crate::cluster::{errors::ClusterClientError, ClusterClient};

/// Label set by the Job controller on every Pod it creates
pub const JOB_NAME_LABEL: &str = "job-name";

/// Maximum number of Pods allowed when the backoff limit of the Job cannot be found
pub const DEFAULT_MAX_POD_COUNT: usize = 10;

pub const TOO_MANY_PODS_MESSAGE: &str = "Too many pods (over the BackoffLimit) with same job-name!";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("cannot count the pods of job {job_name}: {source}")]
    CountPods {
        job_name: String,
        #[source]
        source: ClusterClientError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn allow() -> Self {
        Verdict {
            allowed: true,
            reason: None,
        }
    }

    fn reject(reason: &str) -> Self {
        Verdict {
            allowed: false,
            reason: Some(reason.to_owned()),
        }
    }
}

/// Decide whether the Pod can be created.
///
/// Pods owned by a Job are rejected once the namespace already holds as many
/// Pods of the same Job as its `backoffLimit`. The count is read live and is not
/// reserved: concurrent admissions can both be allowed.
pub async fn decide(unit: &WorkloadUnit, client: &ClusterClient) -> Result<Verdict, PolicyError> {
    let job_name = match unit.labels.get(JOB_NAME_LABEL) {
        Some(job_name) => job_name,
        None => return Ok(Verdict::allow()),
    };

    let max_pod_count = max_pod_count(client, &unit.namespace, job_name).await;

    let selector = format!("{JOB_NAME_LABEL}={job_name}");
    let pods = client
        .list_pods_by_label(&unit.namespace, &selector)
        .await
        .map_err(|source| PolicyError::CountPods {
            job_name: job_name.to_owned(),
            source,
        })?;

    info!(
        job_name = job_name.as_str(),
        namespace = unit.namespace.as_str(),
        pods = pods.len(),
        max_pod_count,
        "pods of the job in the cluster"
    );

    if pods.len() >= max_pod_count {
        Ok(Verdict::reject(TOO_MANY_PODS_MESSAGE))
    } else {
        Ok(Verdict::allow())
    }
}

/// Resolve the backoff limit of the Job. Any problem falls back to
/// `DEFAULT_MAX_POD_COUNT`.
async fn max_pod_count(client: &ClusterClient, namespace: &str, job_name: &str) -> usize {
    let job = match client.get_job(namespace, job_name).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            debug!(namespace, job_name, "job not found, using default limit");
            return DEFAULT_MAX_POD_COUNT;
        }
        Err(e) => {
            debug!(error = %e, "cannot lookup job, using default limit");
            return DEFAULT_MAX_POD_COUNT;
        }
    };

    job.spec
        .and_then(|spec| spec.backoff_limit)
        .and_then(|limit| usize::try_from(limit).ok())
        .unwrap_or(DEFAULT_MAX_POD_COUNT)
}

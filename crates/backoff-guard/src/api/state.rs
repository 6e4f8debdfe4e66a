use crate::cluster::ClusterClient;

/// State shared by all the request handlers. It is never changed once the
/// server is started.
pub struct ApiServerState {
    pub(crate) cluster_client: ClusterClient,
}

impl ApiServerState {
    pub fn new(cluster_client: ClusterClient) -> Self {
        Self { cluster_client }
    }
}

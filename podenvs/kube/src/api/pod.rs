use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use tracing::debug;

use crate::{
    api::kubernetes::get_k8s_resource_api,
    error::{PodEnvError, Result},
};

/// Where the [`Pod`] whose environment we resolve comes from.
#[derive(Debug)]
pub enum PodSource {
    /// Fetch the pod from the cluster.
    Cluster { name: String, namespace: String },

    /// A serialized pod, YAML or JSON (e.g. `kubectl get pod -oyaml`).
    Document(Vec<u8>),
}

impl PodSource {
    #[tracing::instrument(level = "debug", skip(self, client), err)]
    pub async fn get_pod(&self, client: &Client) -> Result<Pod> {
        match self {
            PodSource::Cluster { name, namespace } => {
                let pod_api: Api<Pod> = get_k8s_resource_api(client, namespace);

                pod_api
                    .get_opt(name)
                    .await?
                    .ok_or_else(|| PodEnvError::PodNotFound {
                        name: name.clone(),
                        namespace: namespace.clone(),
                    })
            }
            PodSource::Document(bytes) => parse_pod(bytes),
        }
    }
}

/// Deserializes a pod document. YAML is a superset of JSON, so both are accepted.
pub fn parse_pod(bytes: &[u8]) -> Result<Pod> {
    let pod: Pod = serde_yaml::from_slice(bytes)?;
    debug!(name = ?pod.metadata.name, "parsed pod document");

    Ok(pod)
}

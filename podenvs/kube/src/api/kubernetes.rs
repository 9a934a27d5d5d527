use std::ops::Deref;

use k8s_openapi::NamespaceResourceScope;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use tracing::debug;

use crate::error::{PodEnvError, Result};

/// Builds a [`Config`] from an explicit kubeconfig path, a named context, or by inference
/// (local kubeconfig, then in-cluster).
pub async fn create_kube_config<P>(
    accept_invalid_certificates: bool,
    kubeconfig: Option<P>,
    kube_context: Option<String>,
) -> Result<Config>
where
    P: AsRef<str>,
{
    let kube_config_opts = KubeConfigOptions {
        context: kube_context,
        ..Default::default()
    };

    let mut config = if let Some(kubeconfig) = kubeconfig {
        let kubeconfig = shellexpand::full(&kubeconfig)
            .map_err(|e| PodEnvError::ConfigPathExpansionError(e.to_string()))?;
        debug!(path = %kubeconfig, "loading kubeconfig");
        let parsed_kube_config = Kubeconfig::read_from(kubeconfig.deref())?;
        Config::from_custom_kubeconfig(parsed_kube_config, &kube_config_opts).await?
    } else if kube_config_opts.context.is_some() {
        // if context is set, it's not in cluster so it has to be a kubeconfig.
        Config::from_kubeconfig(&kube_config_opts).await?
    } else {
        Config::infer().await?
    };
    config.accept_invalid_certs = accept_invalid_certificates;

    Ok(config)
}

pub async fn create_kube_api<P>(
    accept_invalid_certificates: bool,
    kubeconfig: Option<P>,
    kube_context: Option<String>,
) -> Result<Client>
where
    P: AsRef<str>,
{
    let config = create_kube_config(accept_invalid_certificates, kubeconfig, kube_context).await?;
    Client::try_from(config).map_err(PodEnvError::from)
}

pub fn get_k8s_resource_api<K>(client: &Client, namespace: &str) -> Api<K>
where
    K: kube::Resource<Scope = NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    Api::namespaced(client.clone(), namespace)
}

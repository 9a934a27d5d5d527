use std::collections::HashMap;

use k8s_openapi::{
    api::core::v1::{ConfigMap, Container, Pod, Secret},
    NamespaceResourceScope,
};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::{debug, trace};

use super::{
    field::extract_field_path, resource::extract_container_resource_value, EnvReference,
    ReferenceResolver,
};
use crate::{
    api::kubernetes::get_k8s_resource_api,
    error::{ObjectKind, ReferenceError},
};

/// Secrets and config maps fetched during one run, keyed by `(namespace, name)`.
#[derive(Debug, Default)]
pub struct ResourceStore {
    secrets: HashMap<(String, String), Secret>,
    config_maps: HashMap<(String, String), ConfigMap>,
}

/// Dereferences [`EnvReference`]s against a live cluster.
pub struct ClusterReferenceResolver {
    client: Client,
    store: ResourceStore,
}

impl ClusterReferenceResolver {
    pub fn new(client: Client) -> Self {
        ClusterReferenceResolver {
            client,
            store: ResourceStore::default(),
        }
    }

    async fn secret(&mut self, namespace: &str, name: &str) -> Result<&Secret, ReferenceError> {
        let key = (namespace.to_owned(), name.to_owned());

        if !self.store.secrets.contains_key(&key) {
            let secret = fetch::<Secret>(&self.client, namespace, name, ObjectKind::Secret).await?;
            self.store.secrets.insert(key.clone(), secret);
        } else {
            trace!(namespace, name, "secret already fetched");
        }

        Ok(&self.store.secrets[&key])
    }

    async fn config_map(
        &mut self,
        namespace: &str,
        name: &str,
    ) -> Result<&ConfigMap, ReferenceError> {
        let key = (namespace.to_owned(), name.to_owned());

        if !self.store.config_maps.contains_key(&key) {
            let config_map =
                fetch::<ConfigMap>(&self.client, namespace, name, ObjectKind::ConfigMap).await?;
            self.store.config_maps.insert(key.clone(), config_map);
        } else {
            trace!(namespace, name, "configmap already fetched");
        }

        Ok(&self.store.config_maps[&key])
    }
}

/// Value of `key` in the secret's `data`, decoded as UTF-8 (lossy).
fn secret_value(secret: &Secret, name: &str, key: &str) -> Result<String, ReferenceError> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| String::from_utf8_lossy(&value.0).into_owned())
        .ok_or_else(|| ReferenceError::KeyNotFound {
            kind: ObjectKind::Secret,
            name: name.to_owned(),
            key: key.to_owned(),
        })
}

/// Value of `key` in the config map's `data`, falling back to `binaryData`.
fn config_map_value(
    config_map: &ConfigMap,
    name: &str,
    key: &str,
) -> Result<String, ReferenceError> {
    config_map
        .data
        .as_ref()
        .and_then(|data| data.get(key).cloned())
        .or_else(|| {
            config_map
                .binary_data
                .as_ref()
                .and_then(|data| data.get(key))
                .map(|value| String::from_utf8_lossy(&value.0).into_owned())
        })
        .ok_or_else(|| ReferenceError::KeyNotFound {
            kind: ObjectKind::ConfigMap,
            name: name.to_owned(),
            key: key.to_owned(),
        })
}

/// Transient failures worth another attempt: throttling, server errors and transport errors.
fn is_transient(error: &kube::Error) -> bool {
    match error {
        kube::Error::Api(response) => response.code == 429 || response.code >= 500,
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}

/// Maps a failed `get` of a referenced object to its [`ReferenceError`].
fn fetch_error(
    kind: ObjectKind,
    name: &str,
    namespace: &str,
    error: kube::Error,
) -> ReferenceError {
    match error {
        kube::Error::Api(response) if response.code == 404 => ReferenceError::ObjectNotFound {
            kind,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        },
        kube::Error::Api(response) if response.code == 403 => ReferenceError::Forbidden {
            kind,
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            message: response.message,
        },
        other => ReferenceError::Kube(other),
    }
}

async fn fetch<K>(
    client: &Client,
    namespace: &str,
    name: &str,
    kind: ObjectKind,
) -> Result<K, ReferenceError>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + std::fmt::Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = get_k8s_resource_api(client, namespace);
    let retry_strategy = ExponentialBackoff::from_millis(10).map(jitter).take(3);

    debug!(%kind, namespace, name, "fetching referenced object");

    RetryIf::spawn(retry_strategy, || api.get(name), is_transient)
        .await
        .map_err(|error| fetch_error(kind, name, namespace, error))
}

/// Picks the container a `resourceFieldRef` is evaluated against.
fn resource_container<'a>(
    pod: &'a Pod,
    container: &'a Container,
    container_name: Option<&str>,
) -> Result<&'a Container, ReferenceError> {
    match container_name {
        Some(name) if name != container.name => pod
            .spec
            .as_ref()
            .and_then(|spec| spec.containers.iter().find(|other| other.name == name))
            .ok_or_else(|| ReferenceError::ResourceContainerNotFound(name.to_owned())),
        _ => Ok(container),
    }
}

impl ReferenceResolver for ClusterReferenceResolver {
    #[tracing::instrument(level = "trace", skip(self, pod, container), err)]
    async fn dereference(
        &mut self,
        namespace: &str,
        reference: &EnvReference,
        pod: &Pod,
        container: &Container,
    ) -> Result<String, ReferenceError> {
        match reference {
            EnvReference::SecretKey { name, key } => {
                let secret = self.secret(namespace, name).await?;
                secret_value(secret, name, key)
            }
            EnvReference::ConfigMapKey { name, key } => {
                let config_map = self.config_map(namespace, name).await?;
                config_map_value(config_map, name, key)
            }
            EnvReference::Field { field_path } => extract_field_path(pod, field_path),
            EnvReference::ResourceField {
                container_name,
                resource,
                divisor,
            } => {
                let container = resource_container(pod, container, container_name.as_deref())?;
                extract_container_resource_value(container, resource, divisor.as_ref())
            }
        }
    }
}

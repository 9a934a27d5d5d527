//! Resolves the effective environment of a single container in a Kubernetes pod, including
//! values that live in config maps, secrets, pod fields and container resources.

use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use crate::{
    container::select_container,
    env::{EnvResolver, ResolvedEnvMap},
    error::{PodEnvError, Result},
    reference::ReferenceResolver,
};

pub mod api;
pub mod container;
pub mod env;
pub mod error;
pub mod quantity;
pub mod reference;

/// Picks `target_container` out of `pod` and resolves its env.
///
/// References are looked up in the pod's own namespace, `fallback_namespace` is only used when
/// the pod doesn't carry one (e.g. a document without `metadata.namespace`).
#[tracing::instrument(level = "debug", skip(pod, references), fields(pod = ?pod.metadata.name), err)]
pub async fn resolve_pod_env<R>(
    pod: &Pod,
    target_container: &str,
    fallback_namespace: &str,
    references: R,
) -> Result<ResolvedEnvMap>
where
    R: ReferenceResolver,
{
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .ok_or(PodEnvError::PodSpecNotFound)?;

    let container = select_container(containers, target_container)?;
    let namespace = pod
        .metadata
        .namespace
        .as_deref()
        .unwrap_or(fallback_namespace);

    debug!(container = %container.name, namespace, "selected container");

    let mut resolver = EnvResolver::new(references);
    resolver.resolve(namespace, pod, container).await
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Container;
    use serde_json::json;

    use super::*;
    use crate::{error::ReferenceError, reference::EnvReference};

    /// Echoes the namespace a reference was resolved in.
    struct NamespaceEcho;

    impl ReferenceResolver for NamespaceEcho {
        async fn dereference(
            &mut self,
            namespace: &str,
            _reference: &EnvReference,
            _pod: &Pod,
            _container: &Container,
        ) -> Result<String, ReferenceError> {
            Ok(namespace.to_owned())
        }
    }

    fn pod(value: serde_json::Value) -> Pod {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn single_container_pod() {
        let pod = pod(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web" },
            "spec": { "containers": [{ "name": "app", "env": [{ "name": "PORT", "value": "8080" }] }] }
        }));

        let resolved = resolve_pod_env(&pod, "", "default", NamespaceEcho)
            .await
            .unwrap();

        assert_eq!(resolved, ResolvedEnvMap::from_iter([("PORT", "8080")]));
    }

    #[tokio::test]
    async fn ambiguous_container_fails() {
        let pod = pod(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web" },
            "spec": { "containers": [{ "name": "app" }, { "name": "sidecar" }] }
        }));

        let error = resolve_pod_env(&pod, "", "default", NamespaceEcho)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            PodEnvError::ContainerNotFound { ref available, .. } if available == &["app", "sidecar"]
        ));
    }

    #[tokio::test]
    async fn pod_namespace_wins_over_fallback() {
        let env = json!([{ "name": "NS", "valueFrom": { "fieldRef": { "fieldPath": "metadata.namespace" } } }]);
        let namespaced = pod(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web", "namespace": "shop" },
            "spec": { "containers": [{ "name": "app", "env": env.clone() }] }
        }));
        let bare = pod(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "web" },
            "spec": { "containers": [{ "name": "app", "env": env }] }
        }));

        let namespaced = resolve_pod_env(&namespaced, "app", "default", NamespaceEcho)
            .await
            .unwrap();
        let bare = resolve_pod_env(&bare, "app", "default", NamespaceEcho)
            .await
            .unwrap();

        assert_eq!(namespaced.get("NS"), Some("shop"));
        assert_eq!(bare.get("NS"), Some("default"));
    }

    #[tokio::test]
    async fn pod_without_spec() {
        let pod = pod(json!({ "apiVersion": "v1", "kind": "Pod", "metadata": { "name": "web" } }));

        assert!(matches!(
            resolve_pod_env(&pod, "app", "default", NamespaceEcho).await,
            Err(PodEnvError::PodSpecNotFound)
        ));
    }
}

//! Resolution of a container's `env` list into concrete values.

use indexmap::IndexMap;
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    error::{PodEnvError, ReferenceError, Result},
    reference::{EnvReference, ReferenceResolver},
};

/// Resolved env variables, name to value.
///
/// Keeps the position a name was first inserted at, a later insert of the same name only
/// replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedEnvMap(IndexMap<String, String>);

impl ResolvedEnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value previously stored under `name`, if any.
    pub fn insert(&mut self, name: String, value: String) -> Option<String> {
        self.0.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Entries ordered by name instead of resolution order.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_unstable_by_key(|(name, _)| *name);
        sorted
    }
}

impl<N, V> FromIterator<(N, V)> for ResolvedEnvMap
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        ResolvedEnvMap(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Walks a container's `env` in declaration order and resolves every entry, dereferencing
/// `valueFrom` through `R`.
///
/// Stops at the first reference that fails, nothing partial is returned.
pub struct EnvResolver<R> {
    references: R,
}

impl<R> EnvResolver<R>
where
    R: ReferenceResolver,
{
    pub fn new(references: R) -> Self {
        EnvResolver { references }
    }

    pub fn into_inner(self) -> R {
        self.references
    }

    /// `namespace` is where `configMapKeyRef`/`secretKeyRef` objects are looked up.
    #[tracing::instrument(level = "debug", skip_all, fields(container = %container.name), err)]
    pub async fn resolve(
        &mut self,
        namespace: &str,
        pod: &Pod,
        container: &Container,
    ) -> Result<ResolvedEnvMap> {
        let env = container.env.as_deref().unwrap_or_default();
        let mut resolved = ResolvedEnvMap::new();

        for entry in env {
            let value = self.resolve_entry(namespace, pod, container, entry).await?;

            if resolved.insert(entry.name.clone(), value).is_some() {
                trace!(name = %entry.name, "env overridden by a later entry");
            }
        }

        debug!(count = resolved.len(), "resolved container env");

        Ok(resolved)
    }

    async fn resolve_entry(
        &mut self,
        namespace: &str,
        pod: &Pod,
        container: &Container,
        entry: &EnvVar,
    ) -> Result<String> {
        // An empty `value` is the same as no `value`, it doesn't stop `valueFrom`.
        if let Some(value) = entry.value.as_ref().filter(|value| !value.is_empty()) {
            return Ok(value.clone());
        }

        let Some(source) = entry.value_from.as_ref() else {
            return Ok(String::new());
        };

        let wrap = |source: ReferenceError| PodEnvError::ReferenceResolutionError {
            variable: entry.name.clone(),
            source,
        };

        let reference = EnvReference::try_from(source).map_err(wrap)?;
        trace!(name = %entry.name, ?reference, "dereferencing env");

        self.references
            .dereference(namespace, &reference, pod, container)
            .await
            .map_err(wrap)
    }
}

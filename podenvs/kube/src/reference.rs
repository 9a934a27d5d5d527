//! Indirect env values, `env[].valueFrom` in a container spec.

use k8s_openapi::{
    api::core::v1::{Container, EnvVarSource, Pod},
    apimachinery::pkg::api::resource::Quantity,
};

use crate::error::ReferenceError;

pub mod cluster;
pub mod field;
pub mod resource;

/// One `valueFrom` source. Exactly one of the `EnvVarSource` selectors is set, so each kind
/// carries only its own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvReference {
    /// `configMapKeyRef`
    ConfigMapKey { name: String, key: String },

    /// `secretKeyRef`
    SecretKey { name: String, key: String },

    /// `fieldRef`, e.g. `status.podIP`.
    Field { field_path: String },

    /// `resourceFieldRef`, e.g. `limits.cpu`.
    ResourceField {
        container_name: Option<String>,
        resource: String,
        divisor: Option<Quantity>,
    },
}

impl TryFrom<&EnvVarSource> for EnvReference {
    type Error = ReferenceError;

    fn try_from(source: &EnvVarSource) -> Result<Self, Self::Error> {
        if let Some(selector) = &source.secret_key_ref {
            Ok(EnvReference::SecretKey {
                name: selector.name.clone(),
                key: selector.key.clone(),
            })
        } else if let Some(selector) = &source.config_map_key_ref {
            Ok(EnvReference::ConfigMapKey {
                name: selector.name.clone(),
                key: selector.key.clone(),
            })
        } else if let Some(selector) = &source.field_ref {
            Ok(EnvReference::Field {
                field_path: selector.field_path.clone(),
            })
        } else if let Some(selector) = &source.resource_field_ref {
            Ok(EnvReference::ResourceField {
                container_name: selector
                    .container_name
                    .clone()
                    .filter(|name| !name.is_empty()),
                resource: selector.resource.clone(),
                divisor: selector.divisor.clone(),
            })
        } else {
            Err(ReferenceError::InvalidValueFrom)
        }
    }
}

/// Turns an [`EnvReference`] into a concrete value.
///
/// [`ClusterReferenceResolver`](cluster::ClusterReferenceResolver) talks to the cluster, tests
/// plug in their own.
#[allow(async_fn_in_trait)]
pub trait ReferenceResolver {
    async fn dereference(
        &mut self,
        namespace: &str,
        reference: &EnvReference,
        pod: &Pod,
        container: &Container,
    ) -> Result<String, ReferenceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn source(value: serde_json::Value) -> EnvVarSource {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn secret_key_ref() {
        let reference = EnvReference::try_from(&source(json!({
            "secretKeyRef": { "name": "db-secret", "key": "password" }
        })))
        .unwrap();

        assert_eq!(
            reference,
            EnvReference::SecretKey {
                name: "db-secret".to_string(),
                key: "password".to_string(),
            }
        );
    }

    #[test]
    fn config_map_key_ref() {
        let reference = EnvReference::try_from(&source(json!({
            "configMapKeyRef": { "name": "settings", "key": "mode", "optional": true }
        })))
        .unwrap();

        assert_eq!(
            reference,
            EnvReference::ConfigMapKey {
                name: "settings".to_string(),
                key: "mode".to_string(),
            }
        );
    }

    #[test]
    fn resource_field_ref_drops_empty_container_name() {
        let reference = EnvReference::try_from(&source(json!({
            "resourceFieldRef": { "containerName": "", "resource": "limits.cpu", "divisor": "1m" }
        })))
        .unwrap();

        assert_eq!(
            reference,
            EnvReference::ResourceField {
                container_name: None,
                resource: "limits.cpu".to_string(),
                divisor: Some(Quantity("1m".to_string())),
            }
        );
    }

    #[test]
    fn empty_source_is_invalid() {
        assert!(matches!(
            EnvReference::try_from(&EnvVarSource::default()),
            Err(ReferenceError::InvalidValueFrom)
        ));
    }
}

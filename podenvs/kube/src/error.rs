use std::fmt;

use thiserror::Error;

pub type Result<T, E = PodEnvError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PodEnvError {
    #[error("Kube failed: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to infer Kube config: {0}")]
    InferKubeConfigError(#[from] kube::config::InferConfigError),

    #[error("Failed to load Kube config: {0}")]
    KubeConfigPathError(#[from] kube::config::KubeconfigError),

    #[error("Path expansion for kubeconfig failed: {0}")]
    ConfigPathExpansionError(String),

    #[error("Pod `{namespace}/{name}` not found")]
    PodNotFound { name: String, namespace: String },

    #[error("Failed to deserialize pod document: {0}")]
    DeserializationError(#[from] serde_yaml::Error),

    #[error("Failed to get `Spec` for Pod!")]
    PodSpecNotFound,

    #[error(
        "there is no {name:?} container in the pod, list of container names: {}",
        ContainerNames(.available)
    )]
    ContainerNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("failed to get env `{variable}` from ref value: {source}")]
    ReferenceResolutionError {
        variable: String,
        #[source]
        source: ReferenceError,
    },
}

/// Why a single `valueFrom` reference could not be turned into a value.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid valueFrom, none of configMapKeyRef, secretKeyRef, fieldRef or resourceFieldRef is set")]
    InvalidValueFrom,

    #[error("{kind} `{namespace}/{name}` not found")]
    ObjectNotFound {
        kind: ObjectKind,
        name: String,
        namespace: String,
    },

    #[error("key `{key}` not found in {kind} `{name}`")]
    KeyNotFound {
        kind: ObjectKind,
        name: String,
        key: String,
    },

    #[error("access to {kind} `{namespace}/{name}` is forbidden: {message}")]
    Forbidden {
        kind: ObjectKind,
        name: String,
        namespace: String,
        message: String,
    },

    #[error("invalid fieldPath `{path}`: {reason}")]
    InvalidFieldPath { path: String, reason: String },

    #[error("unsupported container resource `{0}`")]
    UnsupportedResource(String),

    #[error("container `{0}` referenced by resourceFieldRef not found in the pod")]
    ResourceContainerNotFound(String),

    #[error("invalid quantity `{0}`")]
    InvalidQuantity(String),

    #[error("Kube failed: {0}")]
    Kube(#[from] kube::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::ConfigMap => write!(f, "configmap"),
            ObjectKind::Secret => write!(f, "secret"),
        }
    }
}

/// Formats container names the way they show up in [`PodEnvError::ContainerNotFound`].
struct ContainerNames<'a>(&'a [String]);

impl fmt::Display for ContainerNames<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, name) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name:?}")?;
        }
        write!(f, "]")
    }
}

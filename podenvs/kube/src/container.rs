use k8s_openapi::api::core::v1::Container;

use crate::error::{PodEnvError, Result};

/// Choose container logic:
/// 1. A pod with a single container always resolves to it, whatever name was asked for
/// 2. Otherwise the first container named `target`
///
/// Containers are compared by name only.
pub fn select_container<'a>(containers: &'a [Container], target: &str) -> Result<&'a Container> {
    if let [only] = containers {
        return Ok(only);
    }

    containers
        .iter()
        .find(|container| container.name == target)
        .ok_or_else(|| PodEnvError::ContainerNotFound {
            name: target.to_owned(),
            available: containers
                .iter()
                .map(|container| container.name.clone())
                .collect(),
        })
}

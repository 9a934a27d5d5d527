use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::Container,
    apimachinery::pkg::api::resource::Quantity,
};

use crate::{
    error::ReferenceError,
    quantity::{ceil_div, ParsedQuantity},
};

fn resource_quantity(
    resources: Option<&BTreeMap<String, Quantity>>,
    name: &str,
) -> Result<ParsedQuantity, ReferenceError> {
    resources
        .and_then(|resources| resources.get(name))
        .map(|Quantity(quantity)| quantity.parse())
        .unwrap_or(Ok(ParsedQuantity::ZERO))
}

/// Computes the value of a `resourceFieldRef` against `container`.
///
/// CPU is scaled through milli-units so that `divisor: 1m` yields millicores, everything else
/// through whole units. Both round up. Resources the container does not set count as zero.
pub fn extract_container_resource_value(
    container: &Container,
    resource: &str,
    divisor: Option<&Quantity>,
) -> Result<String, ReferenceError> {
    let divisor = match divisor {
        Some(Quantity(raw)) => {
            let parsed = raw.parse::<ParsedQuantity>()?;
            if parsed.is_zero() {
                ParsedQuantity::ONE
            } else if parsed.is_positive() {
                parsed
            } else {
                return Err(ReferenceError::InvalidQuantity(raw.clone()));
            }
        }
        None => ParsedQuantity::ONE,
    };

    let (section, name) = resource
        .split_once('.')
        .ok_or_else(|| ReferenceError::UnsupportedResource(resource.to_owned()))?;

    let requirements = container.resources.as_ref();
    let resources = match section {
        "limits" => requirements.and_then(|requirements| requirements.limits.as_ref()),
        "requests" => requirements.and_then(|requirements| requirements.requests.as_ref()),
        _ => return Err(ReferenceError::UnsupportedResource(resource.to_owned())),
    };

    let value = match name {
        "cpu" => {
            let quantity = resource_quantity(resources, name)?;
            ceil_div(quantity.milli_value(), divisor.milli_value())
        }
        "memory" | "ephemeral-storage" => {
            let quantity = resource_quantity(resources, name)?;
            ceil_div(quantity.value(), divisor.value())
        }
        _ => return Err(ReferenceError::UnsupportedResource(resource.to_owned())),
    };

    Ok(value.to_string())
}

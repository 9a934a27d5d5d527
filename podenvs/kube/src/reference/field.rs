use std::{collections::BTreeMap, sync::LazyLock};

use k8s_openapi::api::core::v1::Pod;
use regex::Regex;

use crate::error::ReferenceError;

static QUALIFIED_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$")
        .expect("failed to create qualified name regex")
});

static DNS_SUBDOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("failed to create dns subdomain regex")
});

/// Label/annotation key syntax: an optional DNS subdomain prefix (at most 253 characters)
/// and `/`, then a name of at most 63 alphanumerics, `-`, `_` or `.`, starting and ending
/// alphanumeric.
fn is_qualified_name(key: &str) -> bool {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    let prefix_valid = prefix.map_or(true, |prefix| {
        !prefix.is_empty() && prefix.len() <= 253 && DNS_SUBDOMAIN_REGEX.is_match(prefix)
    });

    prefix_valid && name.len() <= 63 && QUALIFIED_NAME_REGEX.is_match(name)
}

/// Splits `metadata.labels['app']` into `("metadata.labels", "app")`.
fn split_subscript(field_path: &str) -> Option<(&str, &str)> {
    let (path, rest) = field_path.split_once("['")?;
    let subscript = rest.strip_suffix("']")?;

    Some((path, subscript))
}

/// Renders a map as `key="value"` lines sorted by key, the downward API format.
fn format_map(map: Option<&BTreeMap<String, String>>) -> String {
    map.map(|map| {
        map.iter()
            .map(|(key, value)| format!("{key}={value:?}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
    .unwrap_or_default()
}

/// Reads the value a `fieldRef` points at. Fields that are not set resolve to `""`.
pub fn extract_field_path(pod: &Pod, field_path: &str) -> Result<String, ReferenceError> {
    let invalid = |reason: &str| ReferenceError::InvalidFieldPath {
        path: field_path.to_owned(),
        reason: reason.to_owned(),
    };
    let metadata = &pod.metadata;

    if let Some((path, subscript)) = split_subscript(field_path) {
        if !is_qualified_name(&subscript.to_lowercase()) {
            return Err(invalid("invalid key subscript"));
        }

        let map = match path {
            "metadata.annotations" => metadata.annotations.as_ref(),
            "metadata.labels" => metadata.labels.as_ref(),
            _ => return Err(invalid("fieldPath does not support subscript")),
        };

        return Ok(map
            .and_then(|map| map.get(subscript))
            .cloned()
            .unwrap_or_default());
    }

    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let value = match field_path {
        "metadata.name" => metadata.name.clone(),
        "metadata.namespace" => metadata.namespace.clone(),
        "metadata.uid" => metadata.uid.clone(),
        "metadata.labels" => Some(format_map(metadata.labels.as_ref())),
        "metadata.annotations" => Some(format_map(metadata.annotations.as_ref())),
        "spec.nodeName" => spec.and_then(|spec| spec.node_name.clone()),
        "spec.serviceAccountName" => spec.and_then(|spec| spec.service_account_name.clone()),
        "status.hostIP" => status.and_then(|status| status.host_ip.clone()),
        "status.hostIPs" => status.map(|status| {
            status
                .host_ips
                .iter()
                .flatten()
                .map(|host_ip| host_ip.ip.as_str())
                .collect::<Vec<_>>()
                .join(",")
        }),
        "status.podIP" => status.and_then(|status| status.pod_ip.clone()),
        "status.podIPs" => status.map(|status| {
            status
                .pod_ips
                .iter()
                .flatten()
                .map(|pod_ip| pod_ip.ip.as_str())
                .collect::<Vec<_>>()
                .join(",")
        }),
        _ => return Err(invalid("unsupported fieldPath")),
    };

    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    #[fixture]
    fn pod() -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web-7d9f",
                "namespace": "shop",
                "uid": "2f1c6a4e-1111-2222-3333-444455556666",
                "labels": { "app": "web", "tier": "frontend" },
                "annotations": { "owner": "team \"a\"", "example.com/owner": "ops" }
            },
            "spec": {
                "nodeName": "node-1",
                "serviceAccountName": "web",
                "containers": [{ "name": "app" }]
            },
            "status": {
                "hostIP": "10.0.0.5",
                "hostIPs": [{ "ip": "10.0.0.5" }],
                "podIP": "10.1.2.3",
                "podIPs": [{ "ip": "10.1.2.3" }, { "ip": "fd00::3" }]
            }
        }))
        .unwrap()
    }

    #[rstest]
    #[case("metadata.name", "web-7d9f")]
    #[case("metadata.namespace", "shop")]
    #[case("metadata.uid", "2f1c6a4e-1111-2222-3333-444455556666")]
    #[case("metadata.labels['app']", "web")]
    #[case("metadata.labels['missing']", "")]
    #[case("metadata.labels", "app=\"web\"\ntier=\"frontend\"")]
    #[case("metadata.annotations['example.com/owner']", "ops")]
    #[case("metadata.annotations['Example.com/owner']", "")]
    #[case(
        "metadata.annotations",
        "example.com/owner=\"ops\"\nowner=\"team \\\"a\\\"\""
    )]
    #[case("spec.nodeName", "node-1")]
    #[case("spec.serviceAccountName", "web")]
    #[case("status.hostIP", "10.0.0.5")]
    #[case("status.hostIPs", "10.0.0.5")]
    #[case("status.podIP", "10.1.2.3")]
    #[case("status.podIPs", "10.1.2.3,fd00::3")]
    fn extracts_supported_paths(pod: Pod, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(extract_field_path(&pod, path).unwrap(), expected);
    }

    #[rstest]
    #[case("metadata.generateName")]
    #[case("spec.nodeName['x']")]
    #[case("metadata.labels['']")]
    #[case("metadata.labels['a b']")]
    #[case("metadata.labels['-app']")]
    #[case("metadata.annotations['/owner']")]
    fn rejects_invalid_paths(pod: Pod, #[case] path: &str) {
        assert!(matches!(
            extract_field_path(&pod, path),
            Err(ReferenceError::InvalidFieldPath { .. })
        ));
    }
}

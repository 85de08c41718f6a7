//! Namespace reshaping: raw namespace entries into labeled, flattened records.

use crate::models::RawNamespace;
use crate::normalize::{flatten, ClientCounts};
use serde::Serialize;

/// Label of the top-level namespace. The API reports its path as an empty string.
pub const ROOT_NAMESPACE: &str = "root";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledMount {
    pub label: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledNamespace {
    pub label: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
    pub mounts: Vec<LabeledMount>,
}

impl LabeledNamespace {
    pub fn find_mount(&self, label: &str) -> Option<&LabeledMount> {
        self.mounts.iter().find(|mount| mount.label == label)
    }
}

/// Label a namespace by its path, with `root` substituted for the root namespace.
pub fn namespace_label(raw: &RawNamespace) -> String {
    if raw.namespace_id == ROOT_NAMESPACE {
        ROOT_NAMESPACE.to_string()
    } else {
        raw.namespace_path.clone()
    }
}

/// Reshape namespaces in input order; mounts keep their input order as well.
pub fn reshape_namespaces(raw: &[RawNamespace]) -> Vec<LabeledNamespace> {
    raw.iter()
        .map(|namespace| LabeledNamespace {
            label: namespace_label(namespace),
            counts: flatten(namespace),
            mounts: namespace
                .mounts
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|mount| LabeledMount {
                    label: mount.mount_path.clone(),
                    counts: flatten(mount),
                })
                .collect(),
        })
        .collect()
}

/// Find the first namespace carrying `label`.
pub fn find_namespace<'a>(
    namespaces: &'a [LabeledNamespace],
    label: &str,
) -> Option<&'a LabeledNamespace> {
    namespaces.iter().find(|namespace| namespace.label == label)
}

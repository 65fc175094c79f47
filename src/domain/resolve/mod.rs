// Copyright 2025 kube-envset contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Environment resolution
//!
//! Computes the effective environment variables a container would see, by
//! resolving `env[].valueFrom` and `envFrom` references against the ConfigMaps
//! and Secrets loaded from the same directory. Resolution is best-effort:
//! a reference whose target is not in the scanned directory resolves to
//! nothing rather than failing the run.

use crate::domain::manifest::ManifestSet;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, Container, EnvVar, Secret, SecretKeySelector,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resolved variable. `slotSetting` is carried for compatibility with the
/// app-settings consumers of the output files and is always `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEnvVar {
    pub name: String,
    pub value: String,
    #[serde(rename = "slotSetting")]
    pub slot_setting: bool,
}

impl ResolvedEnvVar {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            slot_setting: false,
        }
    }
}

/// Resolve every container of `deployment` into one flat variable list,
/// sorted by name ascending. Containers are processed in manifest order and
/// share a single namespace.
pub fn resolve_deployment(deployment: &Deployment, manifests: &ManifestSet) -> Vec<ResolvedEnvVar> {
    let mut resolved = Vec::new();

    let containers = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod| pod.containers.as_slice())
        .unwrap_or_default();

    for container in containers {
        resolve_container(container, manifests, &mut resolved);
    }

    resolved.sort_by(|a, b| a.name.cmp(&b.name));
    resolved
}

fn resolve_container(container: &Container, manifests: &ManifestSet, out: &mut Vec<ResolvedEnvVar>) {
    for env in container.env.as_deref().unwrap_or_default() {
        let value = resolve_env_entry(env, manifests);
        // Direct entries that resolve to nothing are suppressed entirely.
        if !value.is_empty() {
            out.push(ResolvedEnvVar::new(&env.name, value));
        }
    }

    for source in container.env_from.as_deref().unwrap_or_default() {
        if let Some(cm_ref) = &source.config_map_ref {
            let name = cm_ref.name.as_str();
            if let Some(data) = manifests.config_maps.get(name).and_then(|cm| cm.data.as_ref()) {
                // Bulk imports keep empty values, unlike direct entries.
                for (key, value) in data {
                    out.push(ResolvedEnvVar::new(key, value));
                }
            }
        } else if let Some(secret_ref) = &source.secret_ref {
            let name = secret_ref.name.as_str();
            if let Some(secret) = manifests.secrets.get(name) {
                for (key, value) in secret_entries(secret) {
                    out.push(ResolvedEnvVar::new(key, value));
                }
            }
        }
    }
}

/// Precedence for a direct `env[]` entry: a non-empty literal value always
/// wins, even when a `valueFrom` reference is populated alongside it; then a
/// ConfigMap key reference, then a Secret key reference. Missing targets and
/// missing keys resolve to the empty string.
fn resolve_env_entry(env: &EnvVar, manifests: &ManifestSet) -> String {
    if let Some(value) = env.value.as_deref() {
        if !value.is_empty() {
            return value.to_string();
        }
    }

    let Some(source) = &env.value_from else {
        return String::new();
    };

    if let Some(cm_ref) = &source.config_map_key_ref {
        config_map_value(manifests, cm_ref)
    } else if let Some(secret_ref) = &source.secret_key_ref {
        secret_value(manifests, secret_ref)
    } else {
        // Downward API and resource field refs need a live cluster.
        String::new()
    }
}

fn config_map_value(manifests: &ManifestSet, selector: &ConfigMapKeySelector) -> String {
    let name = selector.name.as_str();
    manifests
        .config_maps
        .get(name)
        .and_then(|cm| cm.data.as_ref())
        .and_then(|data| data.get(&selector.key))
        .cloned()
        .unwrap_or_default()
}

fn secret_value(manifests: &ManifestSet, selector: &SecretKeySelector) -> String {
    let name = selector.name.as_str();
    let Some(secret) = manifests.secrets.get(name) else {
        return String::new();
    };

    // stringData takes precedence over the base64 data field; manifests in
    // the wild use either one for the same purpose.
    if let Some(value) = secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(&selector.key))
    {
        return value.clone();
    }

    secret
        .data
        .as_ref()
        .and_then(|data| data.get(&selector.key))
        .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
        .unwrap_or_default()
}

/// Union of a Secret's `data` and `stringData` maps as text, with
/// `stringData` winning on key collision.
fn secret_entries(secret: &Secret) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();

    if let Some(data) = &secret.data {
        for (key, bytes) in data {
            entries.insert(key.clone(), String::from_utf8_lossy(&bytes.0).into_owned());
        }
    }
    if let Some(string_data) = &secret.string_data {
        for (key, value) in string_data {
            entries.insert(key.clone(), value.clone());
        }
    }

    entries
}

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

//! Manifest ingestion
//!
//! Walks a directory tree, splits every file into YAML documents and collects
//! the Deployments, ConfigMaps and Secrets found there. Documents of any other
//! kind are skipped; I/O failures abort the load.

use crate::shared::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// Minimal envelope read before dispatching to a typed decoder. Looking at
/// `kind` first avoids speculative full parses against every known schema.
#[derive(Debug, Deserialize)]
struct KindEnvelope {
    kind: Option<String>,
}

/// All manifests collected from one input directory.
///
/// Deployments keep encounter order, duplicates included. ConfigMaps and
/// Secrets are keyed by metadata name with last-loaded-wins replacement.
#[derive(Debug, Default)]
pub struct ManifestSet {
    pub deployments: Vec<Deployment>,
    pub config_maps: HashMap<String, ConfigMap>,
    pub secrets: HashMap<String, Secret>,
}

impl ManifestSet {
    /// Recursively load every regular file under `input` as a candidate
    /// multi-document YAML manifest, regardless of extension.
    pub fn load_dir(input: impl AsRef<Path>) -> Result<ManifestSet> {
        let mut set = ManifestSet::default();

        // Sorted traversal keeps last-loaded-wins deterministic across runs.
        for entry in WalkDir::new(input.as_ref()).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let content = std::fs::read(entry.path())?;
            let content = String::from_utf8_lossy(&content);

            // Plain substring split. A "---" inside a scalar value splits
            // incorrectly; the resulting fragments simply fail to classify.
            for doc in content.split("---") {
                set.ingest_document(doc);
            }
        }

        tracing::info!(
            deployments = set.deployments.len(),
            config_maps = set.config_maps.len(),
            secrets = set.secrets.len(),
            "loaded manifests"
        );

        Ok(set)
    }

    /// Classify one document fragment and store it if it is a Deployment,
    /// ConfigMap or Secret. Anything else is dropped without error.
    fn ingest_document(&mut self, doc: &str) {
        let kind = match serde_yaml::from_str::<KindEnvelope>(doc) {
            Ok(envelope) => envelope.kind,
            Err(_) => None,
        };

        // The typed decoders verify the kind/apiVersion literals again, so a
        // fragment that names a kind but does not match its schema falls
        // through to the skip path rather than being misclassified.
        match kind.as_deref() {
            Some("Deployment") => match serde_yaml::from_str::<Deployment>(doc) {
                Ok(deploy) if deploy.metadata.name.is_some() => self.deployments.push(deploy),
                Ok(_) => tracing::debug!("skipping Deployment without metadata.name"),
                Err(e) => tracing::debug!(error = %e, "skipping malformed Deployment document"),
            },
            Some("ConfigMap") => match serde_yaml::from_str::<ConfigMap>(doc) {
                Ok(cm) => {
                    if let Some(name) = cm.metadata.name.clone() {
                        self.config_maps.insert(name, cm);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping malformed ConfigMap document"),
            },
            Some("Secret") => match serde_yaml::from_str::<Secret>(doc) {
                Ok(secret) => {
                    if let Some(name) = secret.metadata.name.clone() {
                        self.secrets.insert(name, secret);
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping malformed Secret document"),
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const WEB_DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  selector:
    matchLabels:
      app: web
  template:
    spec:
      containers:
        - name: web
          env:
            - name: PORT
              value: "8080"
"#;

    const DB_CONFIGMAP: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: db-cfg
data:
  host: db.internal
"#;

    #[test]
    fn multi_document_file_is_split_and_classified() {
        let dir = tempfile::tempdir().unwrap();
        let combined = format!("{}\n---\n{}", WEB_DEPLOYMENT, DB_CONFIGMAP);
        fs::write(dir.path().join("stack.yaml"), combined).unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.deployments.len(), 1);
        assert_eq!(set.deployments[0].metadata.name.as_deref(), Some("web"));
        assert!(set.config_maps.contains_key("db-cfg"));
        assert!(set.secrets.is_empty());
    }

    #[test]
    fn unrecognized_kind_is_invisible() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("svc.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not yaml at all {{{{").unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        assert!(set.deployments.is_empty());
        assert!(set.config_maps.is_empty());
        assert!(set.secrets.is_empty());
    }

    #[test]
    fn nested_directories_are_walked() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("cm.yml"), DB_CONFIGMAP).unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        let cm = set.config_maps.get("db-cfg").unwrap();
        assert_eq!(
            cm.data.as_ref().unwrap().get("host").map(String::as_str),
            Some("db.internal")
        );
    }

    #[test]
    fn later_config_map_replaces_earlier_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let second = DB_CONFIGMAP.replace("db.internal", "db.override");
        // Files are visited in name order within a directory.
        fs::write(dir.path().join("1-first.yaml"), DB_CONFIGMAP).unwrap();
        fs::write(dir.path().join("2-second.yaml"), second).unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.config_maps.len(), 1);
        let cm = set.config_maps.get("db-cfg").unwrap();
        assert_eq!(
            cm.data.as_ref().unwrap().get("host").map(String::as_str),
            Some("db.override")
        );
    }

    #[test]
    fn duplicate_deployments_are_appended_not_merged() {
        let dir = tempfile::tempdir().unwrap();
        let combined = format!("{}\n---\n{}", WEB_DEPLOYMENT, WEB_DEPLOYMENT);
        fs::write(dir.path().join("dup.yaml"), combined).unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.deployments.len(), 2);
    }

    #[test]
    fn missing_input_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        assert!(ManifestSet::load_dir(&gone).is_err());
    }

    #[test]
    fn secret_with_base64_data_parses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("secret.yaml"),
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: db-auth\ndata:\n  password: cGFzc3dvcmQ=\n",
        )
        .unwrap();

        let set = ManifestSet::load_dir(dir.path()).unwrap();
        let secret = set.secrets.get("db-auth").unwrap();
        let data = secret.data.as_ref().unwrap();
        assert_eq!(data.get("password").unwrap().0, b"password");
    }
}

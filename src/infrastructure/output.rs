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

//! JSON output emission

use crate::domain::resolve::ResolvedEnvVar;
use crate::shared::Result;
use std::path::{Path, PathBuf};

/// Write one Deployment's resolved variables as an indented JSON array to
/// `<out_dir>/<deployment_name>.json`, creating the directory if absent.
///
/// An empty set produces no file and returns `Ok(None)`. Serialization and
/// write failures are fatal.
pub fn write_resolved(
    out_dir: &Path,
    deployment_name: &str,
    vars: &[ResolvedEnvVar],
) -> Result<Option<PathBuf>> {
    if vars.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(out_dir)?;

    let json = serde_json::to_vec_pretty(vars)?;
    let path = out_dir.join(format!("{deployment_name}.json"));
    std::fs::write(&path, json)?;

    Ok(Some(path))
}

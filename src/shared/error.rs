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

use thiserror::Error;
pub type Result<T> = std::result::Result<T, EnvsetError>;

/// Fatal pipeline errors. Unclassifiable manifest fragments and missing
/// ConfigMap/Secret references are handled silently and never reach this type.
#[derive(Error, Debug)]
pub enum EnvsetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON serialize error: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

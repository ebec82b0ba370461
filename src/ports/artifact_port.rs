// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::errors::Result;
use crate::domain::mapping::Mapping;
use crate::domain::report::PlanReport;
use crate::domain::size_estimator::CollectionSizeEstimate;

/// Everything a planning run produces.
#[derive(Debug, Clone, Copy)]
pub struct PlanArtifacts<'a> {
    pub mapping: &'a Mapping,
    pub size_report: &'a [CollectionSizeEstimate],
    pub script: &'a str,
    pub report: &'a PlanReport,
}

/// Port for reading an edited mapping back and persisting plan artifacts.
pub trait ArtifactPort: Send + Sync {
    /// Loads a mapping document (YAML or JSON).
    fn read_mapping(&self, location: &str) -> Result<Mapping>;

    /// Writes all artifacts and returns where each one went.
    fn write_artifacts(&self, artifacts: &PlanArtifacts<'_>) -> Result<Vec<String>>;
}

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

//! Summary of one planning run, written next to the generated artifacts.

use crate::domain::type_map::SourceDialect;
use crate::domain::validation::MappingIssue;
use serde::Serialize;

/// Where the mapping of a run came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum MappingOrigin {
    Suggested,
    /// Loaded from a hand-edited file.
    Edited(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanReport {
    /// RFC 3339 time the plan was produced.
    pub generated_at: String,
    pub source_dialect: SourceDialect,
    pub mapping_origin: MappingOrigin,
    pub tables_selected: usize,
    /// Collections written, including referenced-only tables.
    pub collection_count: usize,
    pub oversize_collections: Vec<String>,
    pub notes: Vec<String>,
    pub issues: Vec<MappingIssue>,
}

impl PlanReport {
    pub fn has_oversize(&self) -> bool {
        !self.oversize_collections.is_empty()
    }
}

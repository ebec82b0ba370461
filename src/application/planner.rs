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

//! The application logic that orchestrates one planning run.
//!
//! This module coordinates between the schema port and the artifact port:
//! load the schema, suggest (or load) a mapping, validate it, estimate
//! document sizes, generate the load script, and hand everything to the
//! artifact port.

use crate::config::AppConfig as Config;
use crate::domain::errors::Result;
use crate::domain::mapping::Mapping;
use crate::domain::report::{MappingOrigin, PlanReport};
use crate::domain::size_estimator::estimate_sizes;
use crate::domain::suggester::suggest_with_notes;
use crate::domain::type_map::TypeMap;
use crate::domain::validation::validate_mapping;
use crate::generator::{generate, GenerationRequest};
use crate::ports::artifact_port::{ArtifactPort, PlanArtifacts};
use crate::ports::schema_port::SchemaPort;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates schema -> mapping -> size report -> script.
pub struct Planner {
    schema_port: Arc<dyn SchemaPort>,
    artifact_port: Arc<dyn ArtifactPort>,
    config: Config,
}

impl Planner {
    pub fn new(
        schema_port: Arc<dyn SchemaPort>,
        artifact_port: Arc<dyn ArtifactPort>,
        config: Config,
    ) -> Self {
        Self {
            schema_port,
            artifact_port,
            config,
        }
    }

    /// Entry point for a full planning run.
    pub fn run(&self) -> Result<PlanReport> {
        let start_time = Instant::now();
        info!("Starting migration planner...");

        let schema = self.schema_port.load_schema()?;
        let selected = if self.config.planning.tables.is_empty() {
            schema.table_names()
        } else {
            self.config.planning.tables.clone()
        };
        info!("{} tables selected", selected.len());

        let (mapping, notes, mapping_origin) = match &self.config.planning.mapping_file {
            Some(path) => {
                info!("Planning from edited mapping {}", path);
                let mapping = self.artifact_port.read_mapping(path)?;
                (mapping, Vec::new(), MappingOrigin::Edited(path.clone()))
            }
            None => {
                let suggestion =
                    suggest_with_notes(&schema, &selected, &self.config.planning.root_hints);
                (suggestion.mapping, suggestion.notes, MappingOrigin::Suggested)
            }
        };

        let issues = validate_mapping(&mapping, &schema, &selected);
        for issue in &issues {
            warn!("Mapping issue: {}", issue.message);
        }

        let size_report = estimate_sizes(&schema, &mapping);
        let oversize_collections: Vec<String> = size_report
            .iter()
            .filter(|e| e.exceeds_limit)
            .map(|e| e.collection.clone())
            .collect();

        let type_map = TypeMap::for_dialect(self.config.source.dialect)
            .with_overrides(self.config.type_overrides.iter());
        let script = generate(&GenerationRequest {
            config: Some(&self.config),
            schema: Some(&schema),
            mapping: Some(&mapping),
            type_map: &type_map,
        })?;

        let report = PlanReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            source_dialect: self.config.source.dialect,
            mapping_origin,
            tables_selected: selected.len(),
            collection_count: target_collection_count(&mapping),
            oversize_collections,
            notes,
            issues,
        };

        self.artifact_port.write_artifacts(&PlanArtifacts {
            mapping: &mapping,
            size_report: &size_report,
            script: &script,
            report: &report,
        })?;

        info!(
            "Planned {} collections in {:.2}s ({} oversize, {} issues)",
            report.collection_count,
            start_time.elapsed().as_secs_f64(),
            report.oversize_collections.len(),
            report.issues.len()
        );
        Ok(report)
    }
}

/// Mapping collections plus the referenced-only tables the script also writes.
fn target_collection_count(mapping: &Mapping) -> usize {
    let mut placed = BTreeSet::new();
    for collection in &mapping.collections {
        placed.insert(collection.source_table.as_str());
        for (_, node) in collection.embedded_nodes() {
            placed.insert(node.source_table.as_str());
        }
    }
    let referenced_only: BTreeSet<&str> = mapping
        .collections
        .iter()
        .flat_map(|c| c.references.iter())
        .map(|r| r.source_table.as_str())
        .filter(|t| !placed.contains(t))
        .collect();
    mapping.collections.len() + referenced_only.len()
}

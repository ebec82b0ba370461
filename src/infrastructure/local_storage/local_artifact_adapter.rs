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

//! Infrastructure adapter for plan artifacts on local storage.
//!
//! One planning run produces four files in the output directory:
//! 1. `mapping.yaml`: the mapping, ready for hand editing and re-planning.
//! 2. `size_report.json`: worst-case document size per collection.
//! 3. `migrate.py`: the PySpark load script.
//! 4. `plan_report.json`: what was decided, flagged and noted.

use crate::domain::errors::{MigrationError, Result};
use crate::domain::mapping::Mapping;
use crate::ports::artifact_port::{ArtifactPort, PlanArtifacts};
use log::{info, warn};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAPPING_FILE: &str = "mapping.yaml";
pub const SIZE_REPORT_FILE: &str = "size_report.json";
pub const SCRIPT_FILE: &str = "migrate.py";
pub const PLAN_REPORT_FILE: &str = "plan_report.json";

/// Concrete implementation of `ArtifactPort` for the local filesystem.
pub struct LocalArtifactAdapter {
    output_dir: PathBuf,
}

impl LocalArtifactAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Helper to write string content to a file at the specified path.
    fn write_file(&self, path: &Path, content: &str) -> std::io::Result<()> {
        let mut f = File::create(path)?;
        f.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl ArtifactPort for LocalArtifactAdapter {
    fn read_mapping(&self, location: &str) -> Result<Mapping> {
        let text = fs::read_to_string(location)?;
        let mapping = if location.ends_with(".json") {
            Mapping::from_json_str(&text)?
        } else {
            Mapping::from_yaml_str(&text)?
        };
        info!(
            "Loaded mapping with {} collections from {}",
            mapping.collections.len(),
            location
        );
        Ok(mapping)
    }

    fn write_artifacts(&self, artifacts: &PlanArtifacts<'_>) -> Result<Vec<String>> {
        fs::create_dir_all(&self.output_dir)?;

        let size_report = serde_json::to_string_pretty(artifacts.size_report)
            .map_err(|e| MigrationError::ArtifactError(e.to_string()))?;
        let plan_report = serde_json::to_string_pretty(artifacts.report)
            .map_err(|e| MigrationError::ArtifactError(e.to_string()))?;

        let files = [
            (MAPPING_FILE, artifacts.mapping.to_yaml_string()?),
            (SIZE_REPORT_FILE, size_report),
            (SCRIPT_FILE, artifacts.script.to_string()),
            (PLAN_REPORT_FILE, plan_report),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (name, content) in &files {
            let path = self.output_dir.join(name);
            self.write_file(&path, content)?;
            written.push(path.display().to_string());
        }

        // Make the script executable on Linux/Mac.
        let script_path = self.output_dir.join(SCRIPT_FILE);
        if let Err(e) = mark_executable(&script_path) {
            warn!(
                "Could not mark {} executable: {}",
                script_path.display(),
                e
            );
        }

        info!(
            "Wrote {} artifacts to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::{Collection, Embedded, RelationshipKind};
    use crate::domain::report::{MappingOrigin, PlanReport};
    use crate::domain::size_estimator::CollectionSizeEstimate;
    use crate::domain::type_map::SourceDialect;

    fn sample_mapping() -> Mapping {
        let mut customers = Collection::new("customers");
        customers.embedded.push(Embedded::new(
            "orders",
            RelationshipKind::Array,
            "customer_id",
            "id",
        ));
        Mapping::new(vec![customers])
    }

    fn sample_report() -> PlanReport {
        PlanReport {
            generated_at: "2026-01-01T00:00:00+00:00".into(),
            source_dialect: SourceDialect::Postgresql,
            mapping_origin: MappingOrigin::Suggested,
            tables_selected: 2,
            collection_count: 1,
            oversize_collections: vec![],
            notes: vec![],
            issues: vec![],
        }
    }

    #[test]
    fn test_write_artifacts_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plan");
        let adapter = LocalArtifactAdapter::new(&out);

        let mapping = sample_mapping();
        let report = sample_report();
        let sizes = vec![CollectionSizeEstimate {
            collection: "customers".into(),
            estimated_bytes: 1024,
            exceeds_limit: false,
            breakdown: vec![],
            notes: vec![],
        }];
        let written = adapter
            .write_artifacts(&PlanArtifacts {
                mapping: &mapping,
                size_report: &sizes,
                script: "print('hello')\n",
                report: &report,
            })
            .unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(
            fs::read_to_string(out.join(SCRIPT_FILE)).unwrap(),
            "print('hello')\n"
        );
        let report_json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(PLAN_REPORT_FILE)).unwrap())
                .unwrap();
        assert_eq!(report_json["mapping_origin"]["kind"], "suggested");
        assert_eq!(report_json["source_dialect"], "postgresql");
        let sizes_json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(SIZE_REPORT_FILE)).unwrap())
                .unwrap();
        assert_eq!(sizes_json[0]["estimated_bytes"], 1024);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(out.join(SCRIPT_FILE))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // The written mapping reads back unchanged.
        let location = out.join(MAPPING_FILE);
        let again = adapter.read_mapping(location.to_str().unwrap()).unwrap();
        assert_eq!(again, mapping);
    }

    #[test]
    fn test_mark_executable_reports_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(SCRIPT_FILE);
        if cfg!(unix) {
            assert!(mark_executable(&missing).is_err());
        } else {
            assert!(mark_executable(&missing).is_ok());
        }
    }

    #[test]
    fn test_read_json_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited.json");
        fs::write(&path, sample_mapping().to_json_string().unwrap()).unwrap();

        let adapter = LocalArtifactAdapter::new(dir.path());
        let mapping = adapter.read_mapping(path.to_str().unwrap()).unwrap();
        assert_eq!(mapping.collections[0].embedded[0].field_name, "orders");
    }
}

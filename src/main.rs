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

//! Command-line driver: reads a discovered schema and a configuration file,
//! plans the migration and writes the artifacts to the output directory.

use clap::Parser;
use log::{error, info, warn};
use mongo_migration_planner::application::planner::Planner;
use mongo_migration_planner::config::{AppConfig, CliArgs};
use mongo_migration_planner::infrastructure::local_storage::local_artifact_adapter::LocalArtifactAdapter;
use mongo_migration_planner::infrastructure::local_storage::schema_file_adapter::SchemaFileAdapter;
use std::process;
use std::sync::Arc;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    // 4. Initialize Hexagonal Components
    let schema_file = config.planning.schema_file.clone().unwrap_or_default();
    let schema_port = Arc::new(SchemaFileAdapter::new(schema_file));
    let artifact_port = Arc::new(LocalArtifactAdapter::new(config.output_dir()));

    // 5. Run Planner
    let planner = Planner::new(schema_port, artifact_port, config);
    match planner.run() {
        Ok(report) => {
            info!(
                "Planning finished: {} collections, {} issues.",
                report.collection_count,
                report.issues.len()
            );
            for collection in &report.oversize_collections {
                warn!(
                    "Collection '{}' may exceed the 16 MiB document limit",
                    collection
                );
            }
            if args.fail_on_oversize && report.has_oversize() {
                error!(
                    "{} collection(s) may exceed the document size limit",
                    report.oversize_collections.len()
                );
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Planner failed: {}", e);
            process::exit(1);
        }
    }
}

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

//! # Configuration
//!
//! Settings come from a YAML or JSON file and can be overridden on the command
//! line. Secrets (source password, target URI) are never stored here; the
//! generated script reads them from the environment at run time.

use crate::domain::errors::{MigrationError, Result};
use crate::domain::type_map::SourceDialect;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

/// Parallel JDBC connections used when none are configured.
pub const DEFAULT_MAX_SOURCE_CONNECTIONS: u32 = 20;
/// Upper bound on parallel JDBC connections against the source.
pub const MAX_SOURCE_CONNECTIONS_LIMIT: u32 = 50;
pub const DEFAULT_FETCH_SIZE: u32 = 10_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    /// Source type name -> BSON type name.
    #[serde(default)]
    pub type_overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default)]
    pub dialect: SourceDialect,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name (PostgreSQL) or service name (Oracle).
    #[serde(default)]
    pub database: String,
    pub schema: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ssl: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dialect: SourceDialect::default(),
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            schema: None,
            username: String::new(),
            ssl: false,
        }
    }
}

impl SourceConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.dialect {
            SourceDialect::Postgresql => 5432,
            SourceDialect::Oracle => 1521,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    /// Environment variable the generated script reads the MongoDB URI from.
    #[serde(default = "default_uri_env")]
    pub uri_env: String,
    #[serde(default)]
    pub database: String,
}

fn default_uri_env() -> String {
    "MONGODB_URI".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            uri_env: default_uri_env(),
            database: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    pub max_source_connections: Option<u32>,
    pub fetch_size: Option<u32>,
}

impl RuntimeConfig {
    /// Read partitions per table, clamped to what the source can bear.
    pub fn num_partitions(&self) -> u32 {
        self.max_source_connections
            .unwrap_or(DEFAULT_MAX_SOURCE_CONNECTIONS)
            .clamp(1, MAX_SOURCE_CONNECTIONS_LIMIT)
    }

    pub fn fetch_size(&self) -> u32 {
        self.fetch_size.unwrap_or(DEFAULT_FETCH_SIZE).max(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanningConfig {
    /// Tables to migrate; empty means every table in the schema.
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub root_hints: Vec<String>,
    /// Hand-edited mapping to use instead of a fresh suggestion.
    pub mapping_file: Option<String>,
    pub schema_file: Option<String>,
    pub output_dir: Option<String>,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Discovered schema document (YAML or JSON)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Edited mapping to plan from instead of suggesting one
    #[arg(short, long)]
    pub mapping: Option<String>,

    /// Comma separated list of tables to migrate
    #[arg(long, value_delimiter = ',')]
    pub tables: Option<Vec<String>>,

    /// Table to force as a root collection (repeatable)
    #[arg(long)]
    pub root: Vec<String>,

    #[arg(short, long)]
    pub output: Option<String>,

    // Overrides for ad-hoc runs
    #[arg(long)]
    pub dialect: Option<SourceDialect>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub database: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub target_database: Option<String>,

    /// Exit with status 2 when a collection may exceed the document size limit
    #[arg(long)]
    pub fail_on_oversize: bool,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(s) = &args.schema {
            self.planning.schema_file = Some(s.clone());
        }
        if let Some(m) = &args.mapping {
            self.planning.mapping_file = Some(m.clone());
        }
        if let Some(t) = &args.tables {
            self.planning.tables = t.clone();
        }
        if !args.root.is_empty() {
            self.planning.root_hints = args.root.clone();
        }
        if let Some(o) = &args.output {
            self.planning.output_dir = Some(o.clone());
        }
        if let Some(d) = args.dialect {
            self.source.dialect = d;
        }
        if let Some(h) = &args.host {
            self.source.host = h.clone();
        }
        if let Some(p) = args.port {
            self.source.port = Some(p);
        }
        if let Some(d) = &args.database {
            self.source.database = d.clone();
        }
        if let Some(u) = &args.username {
            self.source.username = u.clone();
        }
        if let Some(t) = &args.target_database {
            self.target.database = t.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.planning.schema_file.is_none() {
            return Err(MigrationError::ConfigError(
                "a schema document is required (--schema or planning.schema_file)".into(),
            ));
        }
        if self.source.host.trim().is_empty() {
            return Err(MigrationError::ConfigError("source.host is empty".into()));
        }
        if self.source.database.trim().is_empty() {
            return Err(MigrationError::ConfigError(
                "source.database is empty".into(),
            ));
        }
        if self.target.database.trim().is_empty() {
            return Err(MigrationError::ConfigError(
                "target.database is empty".into(),
            ));
        }
        if self.runtime.max_source_connections == Some(0) {
            return Err(MigrationError::ConfigError(
                "runtime.max_source_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> &str {
        self.planning.output_dir.as_deref().unwrap_or(".")
    }
}

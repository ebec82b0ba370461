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

//! Reads a discovered schema from a YAML or JSON document.

use crate::domain::entities::Schema;
use crate::domain::errors::{MigrationError, Result};
use crate::ports::schema_port::SchemaPort;
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;

pub struct SchemaFileAdapter {
    path: String,
}

impl SchemaFileAdapter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemaPort for SchemaFileAdapter {
    fn load_schema(&self) -> Result<Schema> {
        let contents = fs::read_to_string(&self.path)?;
        let schema: Schema = if self.path.ends_with(".json") {
            serde_json::from_str(&contents)
                .map_err(|e| MigrationError::SchemaError(format!("{}: {}", self.path, e)))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| MigrationError::SchemaError(format!("{}: {}", self.path, e)))?
        };

        let mut seen = BTreeSet::new();
        for table in &schema.tables {
            if !seen.insert(table.name.as_str()) {
                return Err(MigrationError::SchemaError(format!(
                    "table '{}' is listed more than once",
                    table.name
                )));
            }
            if table.row_count == 0 {
                warn!(
                    "Table '{}' has no row statistics; its size estimate will be deferred",
                    table.name
                );
            }
        }

        info!("Loaded {} tables from {}", schema.tables.len(), self.path);
        Ok(schema)
    }
}

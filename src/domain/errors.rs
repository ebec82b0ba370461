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

//! Core error definitions for the migration planner.
//!
//! This module provides a centralized `MigrationError` enum and a `Result` type
//! used throughout the crate. Only two kinds of failure are fatal to a planning
//! call: a required input is missing, or an input contains a construct the
//! planner does not understand. Everything else degrades to a best-effort
//! result with notes.

use thiserror::Error;

/// Error types encountered while planning a migration.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("unrecognized transformation operation '{0}'")]
    UnknownOperation(String),

    #[error("Table '{0}' is not present in the source schema")]
    UnknownTable(String),

    #[error("Mapping error: {0}")]
    MappingError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Artifact generation failed: {0}")]
    ArtifactError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// A specialized Result type for the migration planner.
pub type Result<T> = std::result::Result<T, MigrationError>;

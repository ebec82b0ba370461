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

//! # Domain Entities
//!
//! Entities are the "Nouns" of the source side: the Schema, its Tables, and
//! their Columns and keys. An external discovery step produces them; the
//! planner only ever reads them.
//!
//! We use `serde` (Serialize/Deserialize) so a discovered schema can be saved
//! to, and loaded from, JSON or YAML.

use crate::domain::type_map::normalize_type_name;
use serde::{Deserialize, Serialize};

/// `Schema` is the whole discovered source database, restricted to one owner/namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Looks up a table by its exact name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns every table name, sorted, which is the default selection.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// `Table` is the blueprint for a single relational table plus its statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub name: String,
    /// Columns in their declared order.
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Estimated number of rows (0 when statistics were never gathered).
    #[serde(default)]
    pub row_count: u64,
    /// Estimated on-disk size in bytes.
    #[serde(default)]
    pub size_bytes: u64,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Primary key column names, empty when the table has no primary key.
    pub fn pk_columns(&self) -> &[String] {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Foreign keys whose referenced table is the table itself.
    pub fn self_references(&self) -> impl Iterator<Item = &ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.referenced_table == self.name)
    }
}

/// `Column` represents everything we need to know about a single source column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    /// What the source database calls the type (e.g. "character varying(255)", "NUMBER(10,0)").
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Backed by a sequence / identity / serial generator.
    #[serde(default)]
    pub is_sequence: bool,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            ..Default::default()
        }
    }

    /// Type name without length/precision arguments, lowercased.
    pub fn base_type(&self) -> String {
        normalize_type_name(&self.data_type)
    }

    /// Integer and exact/approximate numeric types usable as range partition keys.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.base_type().as_str(),
            "smallint"
                | "integer"
                | "int"
                | "int2"
                | "int4"
                | "int8"
                | "bigint"
                | "serial"
                | "smallserial"
                | "bigserial"
                | "numeric"
                | "decimal"
                | "number"
                | "real"
                | "double precision"
                | "float"
                | "float4"
                | "float8"
                | "binary_float"
                | "binary_double"
        )
    }

    /// Date and timestamp types, with or without time zone.
    pub fn is_temporal(&self) -> bool {
        let base = self.base_type();
        base == "date" || base == "datetime" || base.starts_with("timestamp")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
}

/// A (possibly composite) foreign key from this table to `referenced_table`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForeignKey {
    #[serde(default)]
    pub name: String,
    /// Local columns, positionally matched with `referenced_columns`.
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// Worst observed number of rows in this table sharing one parent key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows_per_parent: Option<u64>,
}

impl ForeignKey {
    /// Local/referenced column pairs in key order.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.referenced_columns.iter())
            .map(|(l, r)| (l.as_str(), r.as_str()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

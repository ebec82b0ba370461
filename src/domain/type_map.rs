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

//! # Type Mapping Logic
//!
//! This module is the "Translator". PostgreSQL, Oracle and MongoDB speak
//! different languages when it comes to data types. This module makes sure a
//! `NUMBER(10,0)` in Oracle becomes a BSON `long`, a `jsonb` in PostgreSQL
//! becomes an embedded `object`, and so on.
//!
//! A `TypeMap` is two immutable tables: the built-in defaults for a dialect and
//! the user's overrides. Resolution is a pure lookup:
//! `overrides[t] ?? defaults[t] ?? "string"`. Whether a type is overridden is
//! answered from the override table, never stored a second time.

use crate::domain::entities::Column;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Target type used for any source type the map does not know.
pub const FALLBACK_TARGET_TYPE: &str = "string";

/// Source databases with built-in defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceDialect {
    #[default]
    Postgresql,
    Oracle,
}

impl fmt::Display for SourceDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDialect::Postgresql => write!(f, "postgresql"),
            SourceDialect::Oracle => write!(f, "oracle"),
        }
    }
}

impl FromStr for SourceDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SourceDialect::Postgresql),
            "oracle" => Ok(SourceDialect::Oracle),
            other => Err(format!("unsupported source dialect '{}'", other)),
        }
    }
}

const POSTGRES_DEFAULTS: &[(&str, &str)] = &[
    ("smallint", "int"),
    ("integer", "int"),
    ("int", "int"),
    ("int2", "int"),
    ("int4", "int"),
    ("serial", "int"),
    ("smallserial", "int"),
    ("bigint", "long"),
    ("int8", "long"),
    ("bigserial", "long"),
    ("numeric", "decimal"),
    ("decimal", "decimal"),
    ("money", "decimal"),
    ("real", "double"),
    ("float4", "double"),
    ("float8", "double"),
    ("double precision", "double"),
    ("boolean", "bool"),
    ("bool", "bool"),
    ("text", "string"),
    ("character varying", "string"),
    ("varchar", "string"),
    ("character", "string"),
    ("char", "string"),
    ("citext", "string"),
    ("uuid", "string"),
    ("json", "object"),
    ("jsonb", "object"),
    ("bytea", "binData"),
    ("date", "date"),
    ("timestamp", "date"),
    ("timestamp without time zone", "date"),
    ("timestamp with time zone", "date"),
    ("timestamptz", "date"),
    ("time", "string"),
    ("time without time zone", "string"),
    ("interval", "string"),
    ("inet", "string"),
];

const ORACLE_DEFAULTS: &[(&str, &str)] = &[
    ("number", "decimal"),
    ("integer", "long"),
    ("float", "double"),
    ("binary_float", "double"),
    ("binary_double", "double"),
    ("varchar2", "string"),
    ("nvarchar2", "string"),
    ("char", "string"),
    ("nchar", "string"),
    ("clob", "string"),
    ("nclob", "string"),
    ("long", "string"),
    ("rowid", "string"),
    ("urowid", "string"),
    ("xmltype", "string"),
    ("raw", "binData"),
    ("long raw", "binData"),
    ("blob", "binData"),
    ("date", "date"),
    ("timestamp", "date"),
    ("timestamp with time zone", "date"),
    ("timestamp with local time zone", "date"),
    ("interval year to month", "string"),
    ("interval day to second", "string"),
    ("json", "object"),
    ("boolean", "bool"),
];

/// Strips length/precision arguments and normalizes case and spacing.
///
/// `"TIMESTAMP(6) WITH TIME ZONE"` becomes `"timestamp with time zone"`.
pub fn normalize_type_name(raw: &str) -> String {
    static ARGS: OnceLock<Regex> = OnceLock::new();
    let args = ARGS.get_or_init(|| Regex::new(r"\([^)]*\)").expect("static regex"));
    let stripped = args.replace_all(raw, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One row of the effective map, for display and reports.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TypeMapEntry {
    pub source_type: String,
    pub target_type: String,
    pub overridden: bool,
}

/// Source type name -> BSON type name, with a user override overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMap {
    dialect: SourceDialect,
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl TypeMap {
    /// Built-in defaults for a dialect, with no overrides.
    pub fn for_dialect(dialect: SourceDialect) -> Self {
        let table = match dialect {
            SourceDialect::Postgresql => POSTGRES_DEFAULTS,
            SourceDialect::Oracle => ORACLE_DEFAULTS,
        };
        let defaults = table
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect();
        Self {
            dialect,
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Returns a new map with the given overrides layered on top.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (source, target) in overrides {
            self.overrides
                .insert(normalize_type_name(source.as_ref()), target.into());
        }
        self
    }

    pub fn dialect(&self) -> SourceDialect {
        self.dialect
    }

    /// Resolves a source type name to its BSON type name.
    pub fn resolve(&self, source_type: &str) -> &str {
        let key = normalize_type_name(source_type);
        self.overrides
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
            .unwrap_or(FALLBACK_TARGET_TYPE)
    }

    /// Resolves a column, narrowing exact numerics by precision and scale.
    ///
    /// An override on the base type always wins over the narrowing.
    pub fn resolve_column(&self, column: &Column) -> String {
        let base = column.base_type();
        if !self.is_overridden(&base) && matches!(base.as_str(), "number" | "numeric" | "decimal")
        {
            if let Some(narrowed) = narrow_exact_numeric(column.precision, column.scale) {
                return narrowed.to_string();
            }
        }
        self.resolve(&column.data_type).to_string()
    }

    pub fn is_overridden(&self, source_type: &str) -> bool {
        self.overrides
            .contains_key(&normalize_type_name(source_type))
    }

    /// The effective map: every default and override, sorted by source type.
    pub fn entries(&self) -> Vec<TypeMapEntry> {
        let mut keys: Vec<&String> = self.defaults.keys().chain(self.overrides.keys()).collect();
        keys.sort();
        keys.dedup();
        keys.into_iter()
            .map(|k| TypeMapEntry {
                source_type: k.clone(),
                target_type: self.resolve(k).to_string(),
                overridden: self.is_overridden(k),
            })
            .collect()
    }
}

fn narrow_exact_numeric(precision: Option<u32>, scale: Option<i32>) -> Option<&'static str> {
    match (precision, scale) {
        (Some(p), Some(0)) if (1..=9).contains(&p) => Some("int"),
        (Some(p), Some(0)) if (10..=18).contains(&p) => Some("long"),
        _ => None,
    }
}

/// Spark SQL type used when coercing a column to the given BSON type.
pub fn spark_type_for(bson_type: &str) -> &'static str {
    match bson_type {
        "int" => "int",
        "long" => "bigint",
        "double" => "double",
        "decimal" => "decimal(38,18)",
        "bool" => "boolean",
        "date" => "timestamp",
        "binData" => "binary",
        _ => "string",
    }
}

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

//! # PySpark Script Generator
//!
//! Turns a schema, a mapping and a type map into a self-contained PySpark
//! script that performs the bulk load. The script is assembled section by
//! section, in the order it runs:
//!
//! 1. `connection`: header, imports, JDBC and MongoDB connection constants.
//! 2. `reads`: one partitioned JDBC read per participating table.
//! 3. `transforms`: per-collection field transformations.
//! 4. `nesting`: bottom-up aggregation of children into their parents.
//! 5. `writes`: one bulk write per target collection, then a summary.
//!
//! The output depends only on the inputs: no timestamps, no hash-ordered
//! iteration. Generating twice yields the same bytes.

mod connection;
mod nesting;
mod reads;
mod transforms;
mod writes;

use crate::config::AppConfig;
use crate::domain::entities::{Schema, Table};
use crate::domain::errors::{MigrationError, Result};
use crate::domain::mapping::{Embedded, Mapping, Operation, RelationshipKind};
use crate::domain::type_map::TypeMap;
use log::info;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Everything the generator reads. Missing pieces are reported, not defaulted.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub config: Option<&'a AppConfig>,
    pub schema: Option<&'a Schema>,
    pub mapping: Option<&'a Mapping>,
    pub type_map: &'a TypeMap,
}

/// Generates the migration script for `request`.
pub fn generate(request: &GenerationRequest<'_>) -> Result<String> {
    let config = request
        .config
        .ok_or(MigrationError::MissingInput("configuration"))?;
    let schema = request.schema.ok_or(MigrationError::MissingInput("schema"))?;
    let mapping = request
        .mapping
        .ok_or(MigrationError::MissingInput("mapping"))?;

    let ctx = ScriptContext::new(config, schema, mapping, request.type_map)?;

    let mut out = String::new();
    connection::write_header(&mut out, &ctx);
    reads::write_reads(&mut out, &ctx);
    for collection in &mapping.collections {
        transforms::write_transformations(&mut out, &ctx, collection);
    }
    for collection in &mapping.collections {
        nesting::write_nesting(&mut out, &ctx, collection);
    }
    writes::write_writes(&mut out, &ctx);
    writes::write_summary(&mut out);

    info!(
        "Generated script for {} collections reading {} tables",
        mapping.collections.len() + ctx.referenced_only.len(),
        ctx.tables.len()
    );
    Ok(out)
}

/// Resolved view of the inputs shared by every section writer.
pub(crate) struct ScriptContext<'a> {
    pub config: &'a AppConfig,
    pub mapping: &'a Mapping,
    pub type_map: &'a TypeMap,
    /// Every table the script reads, in first-use order.
    pub tables: Vec<&'a Table>,
    /// Tables named only by references; each is written as its own collection.
    pub referenced_only: Vec<&'a Table>,
    vars: BTreeMap<&'a str, String>,
}

impl<'a> ScriptContext<'a> {
    fn new(
        config: &'a AppConfig,
        schema: &'a Schema,
        mapping: &'a Mapping,
        type_map: &'a TypeMap,
    ) -> Result<Self> {
        fn collect<'s>(schema: &'s Schema, nodes: &[Embedded], out: &mut Vec<&'s Table>) -> Result<()> {
            for node in nodes {
                out.push(lookup(schema, &node.source_table)?);
                collect(schema, &node.embedded, out)?;
            }
            Ok(())
        }

        let mut placed = Vec::new();
        for collection in &mapping.collections {
            placed.push(lookup(schema, &collection.source_table)?);
            collect(schema, &collection.embedded, &mut placed)?;
        }

        let placed_names: BTreeSet<&str> = placed.iter().map(|t| t.name.as_str()).collect();
        let mut referenced_only: Vec<&Table> = Vec::new();
        for collection in &mapping.collections {
            for reference in &collection.references {
                let table = lookup(schema, &reference.source_table)?;
                if !placed_names.contains(table.name.as_str())
                    && !referenced_only.iter().any(|t| t.name == table.name)
                {
                    referenced_only.push(table);
                }
            }
        }

        let mut tables: Vec<&Table> = Vec::new();
        for table in placed.into_iter().chain(referenced_only.iter().copied()) {
            if !tables.iter().any(|t| t.name == table.name) {
                tables.push(table);
            }
        }

        let mut vars = BTreeMap::new();
        let mut taken = BTreeSet::new();
        for table in &tables {
            let base = format!("df_{}", python_identifier(&table.name));
            let mut var = base.clone();
            let mut n = 2;
            while !taken.insert(var.clone()) {
                var = format!("{}_{}", base, n);
                n += 1;
            }
            vars.insert(table.name.as_str(), var);
        }

        Ok(Self {
            config,
            mapping,
            type_map,
            tables,
            referenced_only,
            vars,
        })
    }

    /// Python variable holding the DataFrame of `table`.
    pub fn var(&self, table: &str) -> &str {
        self.vars.get(table).map(String::as_str).unwrap_or("df")
    }

    pub fn table(&self, name: &str) -> Option<&'a Table> {
        self.tables.iter().copied().find(|t| t.name == name)
    }

    /// Source table name as the JDBC reader should see it.
    pub fn qualified_name(&self, table: &str) -> String {
        match &self.config.source.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, table),
            _ => table.to_string(),
        }
    }

    pub fn has_embedding(&self, kind: RelationshipKind) -> bool {
        fn any(nodes: &[Embedded], kind: RelationshipKind) -> bool {
            nodes
                .iter()
                .any(|n| n.relationship == kind || any(&n.embedded, kind))
        }
        self.mapping
            .collections
            .iter()
            .any(|c| any(&c.embedded, kind))
    }

    pub fn has_operation(&self, predicate: impl Fn(&Operation) -> bool) -> bool {
        self.mapping
            .collections
            .iter()
            .flat_map(|c| c.transformations.iter())
            .any(|t| predicate(&t.operation))
    }
}

fn lookup<'s>(schema: &'s Schema, name: &str) -> Result<&'s Table> {
    schema
        .table(name)
        .ok_or_else(|| MigrationError::UnknownTable(name.to_string()))
}

/// Lowercased, with anything outside `[a-z0-9_]` replaced by `_`.
pub(crate) fn python_identifier(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-z0-9_]").expect("static regex"));
    let ident = invalid.replace_all(&name.to_lowercase(), "_").into_owned();
    if ident.starts_with(|c: char| c.is_ascii_digit()) || ident.is_empty() {
        format!("t_{}", ident)
    } else {
        ident
    }
}

/// A Python string literal. JSON string escapes are valid Python escapes.
pub(crate) fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A Python literal for a JSON value.
pub(crate) fn py_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => py_str(s),
        other => py_str(&other.to_string()),
    }
}

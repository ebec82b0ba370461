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

//! # Mapping Validation
//!
//! A suggested mapping is correct by construction, but a hand-edited one may
//! not be. These checks report what a human broke: a table placed twice, a
//! table or column that does not exist, or a selected table that was dropped.
//!
//! Validation never fails; it returns the issues found, in a stable order.

use crate::domain::entities::{Schema, Table};
use crate::domain::mapping::{Embedded, Mapping, Operation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicatePlacement,
    DuplicateCollection,
    UnknownTable,
    UnknownColumn,
    OmittedTable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MappingIssue {
    pub kind: IssueKind,
    pub table: String,
    pub message: String,
}

impl MappingIssue {
    fn new(kind: IssueKind, table: &str, message: String) -> Self {
        Self {
            kind,
            table: table.to_string(),
            message,
        }
    }
}

/// Checks `mapping` against `schema` and the tables the user `selected`.
pub fn validate_mapping(mapping: &Mapping, schema: &Schema, selected: &[String]) -> Vec<MappingIssue> {
    let mut issues = Vec::new();
    let mut placements: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    let mut collection_names: BTreeSet<&str> = BTreeSet::new();

    for collection in &mapping.collections {
        if !collection_names.insert(collection.name.as_str()) {
            issues.push(MappingIssue::new(
                IssueKind::DuplicateCollection,
                &collection.source_table,
                format!("collection name '{}' is used more than once", collection.name),
            ));
        }
        placements
            .entry(collection.source_table.as_str())
            .or_default()
            .push(format!("collection '{}'", collection.name));

        let root = schema.table(&collection.source_table);
        if root.is_none() {
            issues.push(MappingIssue::new(
                IssueKind::UnknownTable,
                &collection.source_table,
                format!(
                    "collection '{}' reads from unknown table '{}'",
                    collection.name, collection.source_table
                ),
            ));
        }

        check_embedded(
            schema,
            root,
            &collection.embedded,
            &collection.name,
            &mut placements,
            &mut issues,
        );

        for reference in &collection.references {
            referenced.insert(reference.source_table.as_str());
            if schema.table(&reference.source_table).is_none() {
                issues.push(MappingIssue::new(
                    IssueKind::UnknownTable,
                    &reference.source_table,
                    format!(
                        "reference '{}' in '{}' points at unknown table '{}'",
                        reference.field_name, collection.name, reference.source_table
                    ),
                ));
            }
        }

        if let Some(root) = root {
            for t in &collection.transformations {
                // Only a cast without an explicit type needs the source column.
                if matches!(t.operation, Operation::Cast { target_type: None })
                    && !root.has_column(&t.source_field)
                {
                    issues.push(MappingIssue::new(
                        IssueKind::UnknownColumn,
                        &root.name,
                        format!(
                            "cast of '{}' has no target_type and '{}' has no such column",
                            t.source_field, root.name
                        ),
                    ));
                }
            }
        }
    }

    for (table, places) in &placements {
        if places.len() > 1 {
            issues.push(MappingIssue::new(
                IssueKind::DuplicatePlacement,
                table,
                format!("'{}' is placed {} times: {}", table, places.len(), places.join(", ")),
            ));
        }
    }

    let mut wanted: Vec<&str> = selected.iter().map(String::as_str).collect();
    wanted.sort_unstable();
    wanted.dedup();
    for table in wanted {
        if schema.table(table).is_none() {
            continue;
        }
        if !placements.contains_key(table) && !referenced.contains(table) {
            issues.push(MappingIssue::new(
                IssueKind::OmittedTable,
                table,
                format!("selected table '{}' is not placed anywhere in the mapping", table),
            ));
        }
    }

    issues
}

fn check_embedded<'m>(
    schema: &Schema,
    parent: Option<&Table>,
    nodes: &'m [Embedded],
    location: &str,
    placements: &mut BTreeMap<&'m str, Vec<String>>,
    issues: &mut Vec<MappingIssue>,
) {
    for node in nodes {
        let path = format!("{}.{}", location, node.field_name);
        placements
            .entry(node.source_table.as_str())
            .or_default()
            .push(format!("embedded at '{}'", path));

        let child = schema.table(&node.source_table);
        match child {
            None => issues.push(MappingIssue::new(
                IssueKind::UnknownTable,
                &node.source_table,
                format!("'{}' embeds unknown table '{}'", path, node.source_table),
            )),
            Some(child) => {
                for (join_column, parent_column) in node.key_pairs() {
                    if !child.has_column(join_column) {
                        issues.push(MappingIssue::new(
                            IssueKind::UnknownColumn,
                            &child.name,
                            format!(
                                "'{}': join column '{}' does not exist on '{}'",
                                path, join_column, child.name
                            ),
                        ));
                    }
                    if let Some(parent) = parent {
                        if !parent.has_column(parent_column) {
                            issues.push(MappingIssue::new(
                                IssueKind::UnknownColumn,
                                &parent.name,
                                format!(
                                    "'{}': parent column '{}' does not exist on '{}'",
                                    path, parent_column, parent.name
                                ),
                            ));
                        }
                    }
                }
            }
        }

        check_embedded(schema, child, &node.embedded, &path, placements, issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Column, ForeignKey, Table};
    use crate::domain::mapping::{Collection, Embedded, Reference, RelationshipKind};
    use crate::domain::suggester::suggest;

    fn table(name: &str, cols: &[&str], fk: Option<(&str, &str)>) -> Table {
        Table {
            name: name.into(),
            columns: cols.iter().map(|c| Column::new(*c, "integer")).collect(),
            foreign_keys: fk
                .into_iter()
                .map(|(col, parent)| ForeignKey {
                    name: format!("{}_fk", name),
                    columns: vec![col.into()],
                    referenced_table: parent.into(),
                    referenced_columns: vec!["id".into()],
                    max_rows_per_parent: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn schema() -> Schema {
        Schema::new(vec![
            table("customers", &["id"], None),
            table("orders", &["id", "customer_id"], Some(("customer_id", "customers"))),
            table("products", &["id"], None),
        ])
    }

    fn all() -> Vec<String> {
        vec!["customers".into(), "orders".into(), "products".into()]
    }

    #[test]
    fn test_suggested_mapping_is_clean() {
        let schema = schema();
        let mapping = suggest(&schema, &all(), &[]);
        assert!(validate_mapping(&mapping, &schema, &all()).is_empty());
    }

    #[test]
    fn test_hand_edit_mistakes_are_reported() {
        let schema = schema();
        let mut customers = Collection::new("customers");
        customers.embedded.push(Embedded::new(
            "orders",
            RelationshipKind::Array,
            "cust_id",
            "id",
        ));
        customers.references.push(Reference {
            source_table: "warehouses".into(),
            field_name: "warehouse_id".into(),
            referenced_column: "id".into(),
        });
        let orders = Collection::new("orders");
        let mapping = Mapping::new(vec![customers, orders]);

        let issues = validate_mapping(&mapping, &schema, &all());
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();

        assert!(kinds.contains(&IssueKind::UnknownColumn));
        assert!(kinds.contains(&IssueKind::UnknownTable));
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::DuplicatePlacement && i.table == "orders"));
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::OmittedTable && i.table == "products"));
    }

    #[test]
    fn test_referenced_only_table_counts_as_placed() {
        let schema = schema();
        let mut orders = Collection::new("orders");
        orders.references.push(Reference {
            source_table: "customers".into(),
            field_name: "customer_id".into(),
            referenced_column: "id".into(),
        });
        let mapping = Mapping::new(vec![orders, Collection::new("products")]);
        assert!(validate_mapping(&mapping, &schema, &all()).is_empty());
    }
}

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

//! # Worst-Case Document Size
//!
//! MongoDB rejects any document over 16 MiB. Embedding is what makes documents
//! grow, so for every collection we walk the mapping tree and ask: how big is
//! the document of the *most crowded* parent?
//!
//! For each embedded array we multiply by the worst observed number of child
//! rows per parent (`ForeignKey::max_rows_per_parent`), not the average. Nested
//! arrays compound. When discovery did not collect the worst case we assume
//! every child row sits under one parent and quote the mean in the notes; when
//! row counts are missing altogether the children contribute nothing until
//! real numbers exist.
//!
//! How big one row is comes from a [`RowSizeStrategy`], so the heuristic can be
//! swapped without touching the tree walk.

use crate::domain::entities::{Column, Schema, Table};
use crate::domain::mapping::{Collection, Embedded, Mapping, RelationshipKind};
use log::{debug, warn};
use serde::Serialize;

/// MongoDB's hard limit for a single BSON document.
pub const MAX_DOCUMENT_BYTES: u64 = 16 * 1024 * 1024;

/// Array element key ("0", "1", ...) and type byte added by BSON.
const ARRAY_ELEMENT_OVERHEAD: f64 = 8.0;

/// Document length prefix and terminator.
const DOCUMENT_OVERHEAD: f64 = 5.0;

/// Width assumed for variable-length text without a declared maximum.
const DEFAULT_TEXT_WIDTH: f64 = 64.0;

/// Decides how many bytes one row of a table takes once it is a BSON (sub)document.
pub trait RowSizeStrategy {
    fn average_row_bytes(&self, table: &Table) -> f64;
}

/// Sums a per-type width for every column, plus BSON field overhead.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnWidthStrategy;

impl RowSizeStrategy for ColumnWidthStrategy {
    fn average_row_bytes(&self, table: &Table) -> f64 {
        DOCUMENT_OVERHEAD
            + table
                .columns
                .iter()
                .map(|c| field_overhead(c) + column_width(c))
                .sum::<f64>()
    }
}

/// On-disk size divided by row count; column widths when either is unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSizeStrategy;

impl RowSizeStrategy for DiskSizeStrategy {
    fn average_row_bytes(&self, table: &Table) -> f64 {
        if table.row_count > 0 && table.size_bytes > 0 {
            table.size_bytes as f64 / table.row_count as f64
        } else {
            ColumnWidthStrategy.average_row_bytes(table)
        }
    }
}

fn field_overhead(column: &Column) -> f64 {
    // type byte + key + key terminator
    (column.name.len() + 2) as f64
}

fn column_width(column: &Column) -> f64 {
    let declared = column.max_length.map(|l| f64::from(l.min(4096)));
    match column.base_type().as_str() {
        "boolean" | "bool" => 1.0,
        "smallint" | "int2" | "integer" | "int" | "int4" | "serial" | "smallserial" => 4.0,
        "bigint" | "int8" | "bigserial" | "real" | "float4" | "float8" | "double precision"
        | "float" | "binary_float" | "binary_double" => 8.0,
        "numeric" | "decimal" | "number" | "money" => 16.0,
        "uuid" => 21.0,
        "json" | "jsonb" | "xmltype" | "clob" | "nclob" => 256.0,
        "bytea" | "blob" | "raw" | "long raw" => declared.unwrap_or(256.0) + 5.0,
        t if t == "date" || t.starts_with("timestamp") => 8.0,
        _ => declared.unwrap_or(DEFAULT_TEXT_WIDTH) + 5.0,
    }
}

/// Bytes one table contributes to the worst-case document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableContribution {
    pub table: String,
    /// Dotted field path; empty for the collection's own table.
    pub path: String,
    /// How many rows of this table the worst-case document holds.
    pub multiplier: u64,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionSizeEstimate {
    pub collection: String,
    pub estimated_bytes: u64,
    pub exceeds_limit: bool,
    pub breakdown: Vec<TableContribution>,
    pub notes: Vec<String>,
}

/// Estimates worst-case document sizes for every collection of a mapping.
pub fn estimate_sizes(schema: &Schema, mapping: &Mapping) -> Vec<CollectionSizeEstimate> {
    SizeEstimator::<DiskSizeStrategy>::default().estimate(schema, mapping)
}

#[derive(Debug, Default)]
pub struct SizeEstimator<S: RowSizeStrategy = DiskSizeStrategy> {
    strategy: S,
}

impl<S: RowSizeStrategy> SizeEstimator<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn estimate(&self, schema: &Schema, mapping: &Mapping) -> Vec<CollectionSizeEstimate> {
        mapping
            .collections
            .iter()
            .map(|c| self.estimate_collection(schema, c))
            .collect()
    }

    fn estimate_collection(&self, schema: &Schema, collection: &Collection) -> CollectionSizeEstimate {
        let mut breakdown = Vec::new();
        let mut notes = Vec::new();

        let Some(root) = schema.table(&collection.source_table) else {
            notes.push(format!(
                "source table '{}' is not in the schema; size unknown",
                collection.source_table
            ));
            return CollectionSizeEstimate {
                collection: collection.name.clone(),
                estimated_bytes: 0,
                exceeds_limit: false,
                breakdown,
                notes,
            };
        };

        let root_bytes = self.strategy.average_row_bytes(root);
        breakdown.push(TableContribution {
            table: root.name.clone(),
            path: String::new(),
            multiplier: 1,
            bytes: root_bytes.ceil() as u64,
        });
        let nested = self.nested_bytes(
            schema,
            root,
            &collection.embedded,
            "",
            1,
            &mut breakdown,
            &mut notes,
        );

        let estimated_bytes = (root_bytes + nested).ceil() as u64;
        let exceeds_limit = estimated_bytes >= MAX_DOCUMENT_BYTES;
        if exceeds_limit {
            warn!(
                "Collection '{}' may reach {} bytes per document, over the 16 MiB limit",
                collection.name, estimated_bytes
            );
        } else {
            debug!(
                "Collection '{}' worst case {} bytes",
                collection.name, estimated_bytes
            );
        }

        CollectionSizeEstimate {
            collection: collection.name.clone(),
            estimated_bytes,
            exceeds_limit,
            breakdown,
            notes,
        }
    }

    /// Bytes that `nodes` add to one row of `parent`.
    #[allow(clippy::too_many_arguments)]
    fn nested_bytes(
        &self,
        schema: &Schema,
        parent: &Table,
        nodes: &[Embedded],
        prefix: &str,
        parent_multiplier: u64,
        breakdown: &mut Vec<TableContribution>,
        notes: &mut Vec<String>,
    ) -> f64 {
        let mut total = 0.0;
        for node in nodes {
            let path = if prefix.is_empty() {
                node.field_name.clone()
            } else {
                format!("{}.{}", prefix, node.field_name)
            };
            let Some(child) = schema.table(&node.source_table) else {
                notes.push(format!(
                    "'{}': table '{}' is not in the schema; ignored",
                    path, node.source_table
                ));
                continue;
            };

            let per_parent = worst_rows_per_parent(parent, child, node, &path, notes);
            let element_overhead = match node.relationship {
                RelationshipKind::Array => ARRAY_ELEMENT_OVERHEAD,
                RelationshipKind::Single => field_overhead_for(&node.field_name),
            };
            let row_bytes = self.strategy.average_row_bytes(child) + element_overhead;
            let multiplier = parent_multiplier.saturating_mul(per_parent);

            breakdown.push(TableContribution {
                table: child.name.clone(),
                path: path.clone(),
                multiplier,
                bytes: (multiplier as f64 * row_bytes).ceil() as u64,
            });

            let grandchildren = self.nested_bytes(
                schema,
                child,
                &node.embedded,
                &path,
                multiplier,
                breakdown,
                notes,
            );
            total += per_parent as f64 * (row_bytes + grandchildren);
        }
        total
    }
}

fn field_overhead_for(field_name: &str) -> f64 {
    (field_name.len() + 2) as f64
}

/// The worst number of `child` rows nested under one `parent` row.
fn worst_rows_per_parent(
    parent: &Table,
    child: &Table,
    node: &Embedded,
    path: &str,
    notes: &mut Vec<String>,
) -> u64 {
    if child.row_count == 0 || parent.row_count == 0 {
        notes.push(format!(
            "'{}': row counts unknown; size deferred until cardinality is known",
            path
        ));
        return 0;
    }
    if node.relationship == RelationshipKind::Single {
        return 1;
    }
    let observed = child
        .foreign_keys
        .iter()
        .find(|fk| {
            fk.referenced_table == parent.name && fk.columns.first() == Some(&node.join_column)
        })
        .and_then(|fk| fk.max_rows_per_parent);
    match observed {
        Some(max) => max,
        None => {
            notes.push(format!(
                "'{}': worst-case cardinality not collected; assuming all {} rows under one parent (mean is {})",
                path,
                child.row_count,
                child.row_count.div_ceil(parent.row_count)
            ));
            child.row_count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ForeignKey;

    fn table(name: &str, rows: u64, avg: u64, fk: Option<(&str, &str, Option<u64>)>) -> Table {
        Table {
            name: name.into(),
            columns: vec![Column::new("id", "bigint")],
            foreign_keys: fk
                .into_iter()
                .map(|(col, parent, max)| ForeignKey {
                    name: format!("{}_fk", name),
                    columns: vec![col.into()],
                    referenced_table: parent.into(),
                    referenced_columns: vec!["id".into()],
                    max_rows_per_parent: max,
                })
                .collect(),
            row_count: rows,
            size_bytes: rows * avg,
            ..Default::default()
        }
    }

    fn customers_with_orders(orders: Table, customers_rows: u64) -> (Schema, Mapping) {
        let schema = Schema::new(vec![table("customers", customers_rows, 100, None), orders]);
        let mut customers = Collection::new("customers");
        customers.embedded.push(Embedded::new(
            "orders",
            RelationshipKind::Array,
            "customer_id",
            "id",
        ));
        (schema, Mapping::new(vec![customers]))
    }

    #[test]
    fn test_worst_case_over_limit_is_flagged() {
        let orders = table(
            "orders",
            2_000_000,
            64,
            Some(("customer_id", "customers", Some(500_000))),
        );
        let (schema, mapping) = customers_with_orders(orders, 10_000);
        let estimates = estimate_sizes(&schema, &mapping);

        assert_eq!(estimates.len(), 1);
        let e = &estimates[0];
        assert!(e.exceeds_limit);
        assert!(e.estimated_bytes >= MAX_DOCUMENT_BYTES);
        assert_eq!(e.breakdown[1].table, "orders");
        assert_eq!(e.breakdown[1].multiplier, 500_000);
    }

    #[test]
    fn test_worst_case_not_mean_is_used() {
        // Mean is 2 orders per customer; the worst customer has 500k.
        let orders = table(
            "orders",
            20_000,
            64,
            Some(("customer_id", "customers", Some(500_000))),
        );
        let (schema, mapping) = customers_with_orders(orders, 10_000);
        let e = &estimate_sizes(&schema, &mapping)[0];
        assert!(e.exceeds_limit);
        assert!(e.notes.is_empty());
    }

    #[test]
    fn test_zero_rows_never_flagged() {
        let orders = table("orders", 0, 0, Some(("customer_id", "customers", None)));
        let (schema, mapping) = customers_with_orders(orders, 0);
        let e = &estimate_sizes(&schema, &mapping)[0];
        assert!(!e.exceeds_limit);
        assert!(e.estimated_bytes < 1024);
        assert_eq!(e.breakdown[1].multiplier, 0);
        assert!(e.notes[0].contains("deferred"));
    }

    #[test]
    fn test_nested_embeddings_compound() {
        let schema = Schema::new(vec![
            table("customers", 1_000, 100, None),
            table("orders", 5_000, 50, Some(("customer_id", "customers", Some(10)))),
            table("order_items", 50_000, 30, Some(("order_id", "orders", Some(20)))),
        ]);
        let mut orders = Embedded::new("orders", RelationshipKind::Array, "customer_id", "id");
        orders
            .embedded
            .push(Embedded::new("order_items", RelationshipKind::Array, "order_id", "id"));
        let mut customers = Collection::new("customers");
        customers.embedded.push(orders);
        let mapping = Mapping::new(vec![customers]);

        let e = &estimate_sizes(&schema, &mapping)[0];
        // 100 + 10 * ((50 + 8) + 20 * (30 + 8))
        assert_eq!(e.estimated_bytes, 8_280);
        assert!(!e.exceeds_limit);
        let items = e.breakdown.iter().find(|b| b.table == "order_items").unwrap();
        assert_eq!(items.path, "orders.order_items");
        assert_eq!(items.multiplier, 200);
    }

    #[test]
    fn test_uncollected_cardinality_assumes_one_parent() {
        let orders = table("orders", 30_000, 40, Some(("customer_id", "customers", None)));
        let (schema, mapping) = customers_with_orders(orders, 10_000);
        let e = &estimate_sizes(&schema, &mapping)[0];
        assert_eq!(e.breakdown[1].multiplier, 30_000);
        assert!(e.notes[0].contains("not collected"));
        assert!(e.notes[0].contains("mean is 3"));
    }

    #[test]
    fn test_uncollected_cardinality_is_flagged_when_large() {
        // Mean is 200 orders per customer, about 14 KB per document.
        let orders = table("orders", 2_000_000, 64, Some(("customer_id", "customers", None)));
        let (schema, mapping) = customers_with_orders(orders, 10_000);
        let e = &estimate_sizes(&schema, &mapping)[0];
        assert!(e.exceeds_limit);
        assert!(e.estimated_bytes >= MAX_DOCUMENT_BYTES);
        assert_eq!(e.breakdown[1].multiplier, 2_000_000);
    }

    #[test]
    fn test_column_width_strategy_is_swappable() {
        let mut t = table("events", 10, 1_000, None);
        t.columns.push(Column::new("payload", "jsonb"));
        assert_eq!(DiskSizeStrategy.average_row_bytes(&t), 1_000.0);
        // 5 + (2 + 2 + 8) + (7 + 2 + 256)
        assert_eq!(ColumnWidthStrategy.average_row_bytes(&t), 282.0);

        let mapping = Mapping::new(vec![Collection::new("events")]);
        let schema = Schema::new(vec![t]);
        let e = &SizeEstimator::with_strategy(ColumnWidthStrategy).estimate(&schema, &mapping)[0];
        assert_eq!(e.estimated_bytes, 282);
    }
}

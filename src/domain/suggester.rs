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

//! # Mapping Suggester
//!
//! Turns the relationship graph into a first-draft document mapping:
//!
//! 1. **Join tables** (only foreign key and primary key columns, pointing at two
//!    or more selected tables) are dissolved. Their rows are embedded on the
//!    referenced table with the most rows; the other sides become references.
//! 2. **Roots** are tables with no foreign key to another selected table.
//!    Root hints are always roots. If there are no roots at all (every table
//!    sits on a cycle) every table is treated as a root.
//! 3. Starting from each root, tables that reference it are **embedded**,
//!    level by level, to any depth. A table is placed exactly once; any other
//!    foreign key it carries, including self references, becomes a
//!    **reference** on the collection that holds it.
//! 4. Whatever was not reached becomes its own collection.
//!
//! Suggesting never fails. Odd inputs (cycles, unknown names, missing row
//! counts) produce a usable mapping plus human-readable notes.

use crate::domain::entities::Schema;
use crate::domain::graph::{Edge, RelationshipGraph};
use crate::domain::mapping::{Collection, Embedded, KeyPair, Mapping, Reference, RelationshipKind};
use log::{debug, info};
use std::collections::BTreeSet;

/// A suggested mapping plus the notes a human should read before accepting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub mapping: Mapping,
    pub notes: Vec<String>,
}

/// Suggests a mapping for `selected` tables.
pub fn suggest(schema: &Schema, selected: &[String], root_hints: &[String]) -> Mapping {
    suggest_with_notes(schema, selected, root_hints).mapping
}

/// Suggests a mapping and explains the non-obvious decisions.
pub fn suggest_with_notes(schema: &Schema, selected: &[String], root_hints: &[String]) -> Suggestion {
    let graph = RelationshipGraph::build(schema, selected);
    let suggestion = Suggester::new(&graph).run(root_hints);
    info!(
        "Suggested {} collections for {} selected tables",
        suggestion.mapping.collections.len(),
        graph.len()
    );
    suggestion
}

/// Where a placed table lives: collection index and dotted path ("" for the root).
type Placement = (usize, String);

struct Suggester<'g, 'a> {
    graph: &'g RelationshipGraph<'a>,
    dissolved: Vec<bool>,
    /// For dissolved join tables, the edge to the side that embeds them.
    owner_edge: Vec<Option<usize>>,
    claimed: Vec<bool>,
    embedded_via: Vec<Option<usize>>,
    placement: Vec<Option<Placement>>,
    notes: Vec<String>,
}

impl<'g, 'a> Suggester<'g, 'a> {
    fn new(graph: &'g RelationshipGraph<'a>) -> Self {
        let n = graph.len();
        Self {
            graph,
            dissolved: vec![false; n],
            owner_edge: vec![None; n],
            claimed: vec![false; n],
            embedded_via: vec![None; n],
            placement: vec![None; n],
            notes: Vec::new(),
        }
    }

    fn run(mut self, root_hints: &[String]) -> Suggestion {
        self.note_graph_gaps();
        self.dissolve_join_tables();

        let roots = self.pick_roots(root_hints);
        for &root in &roots {
            self.claimed[root] = true;
        }

        let mut collections = Vec::new();
        for root in roots {
            let collection = self.build_collection(root, collections.len());
            collections.push(collection);
        }

        for idx in 0..self.graph.len() {
            if self.claimed[idx] || self.dissolved[idx] {
                continue;
            }
            self.notes.push(format!(
                "'{}' is not reachable from any root; kept as its own collection",
                self.graph.name(idx)
            ));
            self.claimed[idx] = true;
            let collection = self.build_collection(idx, collections.len());
            collections.push(collection);
        }

        // Join tables whose owner could not embed them still must not be dropped.
        for idx in 0..self.graph.len() {
            if !self.claimed[idx] {
                self.notes.push(format!(
                    "join table '{}' could not be embedded; kept as its own collection",
                    self.graph.name(idx)
                ));
                self.claimed[idx] = true;
                let collection = self.build_collection(idx, collections.len());
                collections.push(collection);
            }
        }

        self.attach_references(&mut collections);

        Suggestion {
            mapping: Mapping::new(collections),
            notes: self.notes,
        }
    }

    fn note_graph_gaps(&mut self) {
        for name in self.graph.missing() {
            self.notes
                .push(format!("table '{}' is not in the schema; skipped", name));
        }
        for (idx, fk) in self.graph.dangling() {
            self.notes.push(format!(
                "foreign key '{}' on '{}' references '{}', which is not selected; ignored",
                fk.name,
                self.graph.name(*idx),
                fk.referenced_table
            ));
        }
    }

    fn distinct_parents(&self, idx: usize) -> BTreeSet<usize> {
        self.graph
            .outgoing(idx)
            .iter()
            .map(|&e| self.graph.edge(e).parent)
            .collect()
    }

    /// A join table carries nothing but keys and points at two or more selected tables.
    fn is_join_candidate(&self, idx: usize) -> bool {
        if self.distinct_parents(idx).len() < 2 {
            return false;
        }
        let table = self.graph.table(idx);
        if table.columns.is_empty() {
            return false;
        }
        let mut key_columns: BTreeSet<&str> = table
            .foreign_keys
            .iter()
            .flat_map(|fk| fk.columns.iter().map(String::as_str))
            .collect();
        key_columns.extend(table.pk_columns().iter().map(String::as_str));
        table
            .columns
            .iter()
            .all(|c| key_columns.contains(c.name.as_str()))
    }

    fn dissolve_join_tables(&mut self) {
        let candidates: Vec<bool> = (0..self.graph.len())
            .map(|idx| self.is_join_candidate(idx))
            .collect();

        for idx in 0..self.graph.len() {
            if !candidates[idx] {
                continue;
            }
            // Both sides must survive as real tables, or there is nothing to dissolve into.
            let live_parents = self
                .distinct_parents(idx)
                .into_iter()
                .filter(|&p| !candidates[p])
                .count();
            if live_parents < 2 {
                continue;
            }
            let owner = self
                .graph
                .outgoing(idx)
                .iter()
                .copied()
                .filter(|&e| !candidates[self.graph.edge(e).parent])
                .fold(None, |best: Option<usize>, e| match best {
                    None => Some(e),
                    Some(b) if self.prefers_owner(e, b) => Some(e),
                    keep => keep,
                });
            if let Some(e) = owner {
                self.dissolved[idx] = true;
                self.owner_edge[idx] = Some(e);
                self.notes.push(format!(
                    "join table '{}' dissolved into '{}'",
                    self.graph.name(idx),
                    self.graph.name(self.graph.edge(e).parent)
                ));
            }
        }
    }

    /// The side with more rows owns a join table; ties go to the smaller name.
    fn prefers_owner(&self, candidate: usize, current: usize) -> bool {
        let c = self.graph.edge(candidate).parent;
        let b = self.graph.edge(current).parent;
        let c_rows = self.graph.table(c).row_count;
        let b_rows = self.graph.table(b).row_count;
        c_rows > b_rows || (c_rows == b_rows && c < b)
    }

    fn pick_roots(&mut self, root_hints: &[String]) -> Vec<usize> {
        let mut roots = Vec::new();
        for hint in root_hints {
            match self.graph.index_of(hint) {
                Some(idx) if self.dissolved[idx] => self.notes.push(format!(
                    "root hint '{}' is a dissolved join table; ignored",
                    hint
                )),
                Some(idx) => {
                    if !roots.contains(&idx) {
                        roots.push(idx);
                    }
                }
                None => self
                    .notes
                    .push(format!("root hint '{}' is not a selected table; ignored", hint)),
            }
        }
        let hinted = roots.len();

        let natural: Vec<usize> = (0..self.graph.len())
            .filter(|&idx| !self.dissolved[idx])
            .filter(|&idx| {
                self.graph
                    .outgoing(idx)
                    .iter()
                    .all(|&e| self.dissolved[self.graph.edge(e).parent])
            })
            .collect();

        if natural.is_empty() && hinted == 0 {
            let remaining: Vec<usize> = (0..self.graph.len())
                .filter(|&idx| !self.dissolved[idx])
                .collect();
            if !remaining.is_empty() {
                self.notes.push(
                    "every selected table references another (cyclic foreign keys); \
                     treating every table as a root"
                        .to_string(),
                );
            }
            return remaining;
        }

        for idx in natural {
            if !roots.contains(&idx) {
                roots.push(idx);
            }
        }
        roots
    }

    fn build_collection(&mut self, root: usize, collection_idx: usize) -> Collection {
        self.placement[root] = Some((collection_idx, String::new()));
        let mut collection = Collection::new(self.graph.name(root));
        collection.embedded = self.build_children(root, collection_idx, "");
        collection
    }

    /// Claims every unplaced child of `parent` first, then builds each one.
    fn build_children(&mut self, parent: usize, collection_idx: usize, prefix: &str) -> Vec<Embedded> {
        let mut claimed_now = Vec::new();
        for &e in self.graph.incoming(parent) {
            let child = self.graph.edge(e).child;
            if self.claimed[child] {
                continue;
            }
            if self.dissolved[child] && self.owner_edge[child] != Some(e) {
                continue;
            }
            self.claimed[child] = true;
            self.embedded_via[child] = Some(e);
            claimed_now.push(e);
        }
        claimed_now
            .into_iter()
            .map(|e| self.build_embedded(e, collection_idx, prefix))
            .collect()
    }

    fn build_embedded(&mut self, edge_id: usize, collection_idx: usize, prefix: &str) -> Embedded {
        let edge: Edge<'a> = *self.graph.edge(edge_id);
        let child = self.graph.table(edge.child);
        let parent = self.graph.table(edge.parent);

        let relationship = RelationshipKind::from_row_counts(child.row_count, parent.row_count);
        if child.row_count == 0 || parent.row_count == 0 {
            self.notes.push(format!(
                "row counts unknown for '{}' -> '{}'; embedding as an array",
                child.name, parent.name
            ));
        }

        let mut pairs = edge.foreign_key.column_pairs();
        let (join_column, parent_column) = pairs.next().unwrap_or_default();
        let mut node = Embedded::new(child.name.as_str(), relationship, join_column, parent_column);
        node.additional_keys = pairs
            .map(|(j, p)| KeyPair {
                join_column: j.to_string(),
                parent_column: p.to_string(),
            })
            .collect();

        let path = join_path(prefix, &node.field_name);
        debug!("Embedding '{}' at '{}'", child.name, path);
        self.placement[edge.child] = Some((collection_idx, path.clone()));
        node.embedded = self.build_children(edge.child, collection_idx, &path);
        node
    }

    /// Every foreign key not used for embedding becomes a reference where its table lives.
    fn attach_references(&mut self, collections: &mut [Collection]) {
        for idx in 0..self.graph.len() {
            let Some((collection_idx, prefix)) = self.placement[idx].clone() else {
                continue;
            };
            for &e in self.graph.outgoing(idx) {
                if self.embedded_via[idx] == Some(e) {
                    continue;
                }
                let edge = self.graph.edge(e);
                let (local, remote) = edge.foreign_key.column_pairs().next().unwrap_or_default();
                collections[collection_idx].references.push(Reference {
                    source_table: self.graph.name(edge.parent).to_string(),
                    field_name: join_path(&prefix, local),
                    referenced_column: remote.to_string(),
                });
            }
            for fk in self.graph.self_references(idx) {
                let (local, remote) = fk.column_pairs().next().unwrap_or_default();
                self.notes.push(format!(
                    "self reference '{}' on '{}' kept as a reference",
                    fk.name,
                    self.graph.name(idx)
                ));
                collections[collection_idx].references.push(Reference {
                    source_table: self.graph.name(idx).to_string(),
                    field_name: join_path(&prefix, local),
                    referenced_column: remote.to_string(),
                });
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Column, ForeignKey, PrimaryKey, Table};
    use std::collections::BTreeMap;

    fn table(name: &str, rows: u64, extra_cols: &[&str], fks: &[(&str, &str)]) -> Table {
        let mut columns = vec![Column::new("id", "integer")];
        columns.extend(extra_cols.iter().map(|c| Column::new(*c, "text")));
        columns.extend(fks.iter().map(|(c, _)| Column::new(*c, "integer")));
        Table {
            name: name.into(),
            columns,
            primary_key: Some(PrimaryKey {
                name: format!("{}_pkey", name),
                columns: vec!["id".into()],
            }),
            foreign_keys: fks
                .iter()
                .map(|(col, parent)| ForeignKey {
                    name: format!("{}_{}_fk", name, col),
                    columns: vec![col.to_string()],
                    referenced_table: parent.to_string(),
                    referenced_columns: vec!["id".into()],
                    max_rows_per_parent: None,
                })
                .collect(),
            row_count: rows,
            ..Default::default()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Table -> number of times it is placed as a collection or an embedded node.
    fn placements(mapping: &Mapping) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for c in &mapping.collections {
            *counts.entry(c.source_table.clone()).or_insert(0) += 1;
            for (_, node) in c.embedded_nodes() {
                *counts.entry(node.source_table.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn shop_schema() -> Schema {
        Schema::new(vec![
            table("customers", 1_000, &["name"], &[]),
            table("orders", 5_000, &["status"], &[("customer_id", "customers")]),
            table(
                "order_items",
                20_000,
                &["quantity"],
                &[("order_id", "orders"), ("product_id", "products")],
            ),
            table("products", 200, &["title"], &[]),
        ])
    }

    #[test]
    fn test_every_table_placed_exactly_once() {
        let schema = shop_schema();
        let selected = schema.table_names();
        let mapping = suggest(&schema, &selected, &[]);
        let counts = placements(&mapping);
        assert_eq!(counts.len(), selected.len());
        assert!(counts.values().all(|&n| n == 1), "{:?}", counts);
    }

    fn campus_schema() -> Schema {
        let mut enrollments = table(
            "enrollments",
            4_000,
            &[],
            &[("student_id", "students"), ("course_id", "courses")],
        );
        enrollments.columns.retain(|c| c.name != "id");
        enrollments.primary_key = None;
        Schema::new(vec![
            table("departments", 20, &["name"], &[]),
            table(
                "employees",
                300,
                &["name"],
                &[("department_id", "departments"), ("manager_id", "employees")],
            ),
            table("students", 1_000, &["name"], &[]),
            table("courses", 50, &["title"], &[("lecturer_id", "employees")]),
            enrollments,
            table(
                "grades",
                4_000,
                &["grade"],
                &[("student_id", "students"), ("course_id", "courses")],
            ),
            table("rooms", 30, &[], &[("booking_id", "bookings")]),
            table("bookings", 30, &[], &[("room_id", "rooms")]),
        ])
    }

    #[test]
    fn test_every_subset_places_each_table_once() {
        let schema = campus_schema();
        let all = schema.table_names();
        for bits in 1u32..(1 << all.len()) {
            let selected: Vec<String> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| bits & (1 << i) != 0)
                .map(|(_, name)| name.clone())
                .collect();
            let mapping = suggest(&schema, &selected, &[]);
            let counts = placements(&mapping);
            let placed: Vec<String> = counts.keys().cloned().collect();
            let mut expected = selected.clone();
            expected.sort();
            assert_eq!(placed, expected, "selection {:?}", selected);
            assert!(
                counts.values().all(|&n| n == 1),
                "selection {:?}: {:?}",
                selected,
                counts
            );
        }
    }

    #[test]
    fn test_multi_level_nesting() {
        let schema = shop_schema();
        let mapping = suggest(&schema, &schema.table_names(), &[]);

        let customers = mapping.collection("customers").unwrap();
        assert_eq!(customers.embedded.len(), 1);
        let orders = &customers.embedded[0];
        assert_eq!(orders.source_table, "orders");
        assert_eq!(orders.relationship, RelationshipKind::Array);
        assert_eq!(orders.join_column, "customer_id");
        assert_eq!(orders.parent_column, "id");
        assert_eq!(orders.embedded.len(), 1);
        assert_eq!(orders.embedded[0].source_table, "order_items");
        assert_eq!(orders.embedded[0].join_column, "order_id");

        // order_items -> products is not the embedding edge, so it is a reference.
        assert_eq!(
            customers.references,
            vec![Reference {
                source_table: "products".into(),
                field_name: "orders.order_items.product_id".into(),
                referenced_column: "id".into(),
            }]
        );
        assert!(mapping.collection("products").unwrap().embedded.is_empty());
    }

    #[test]
    fn test_relationship_kind_follows_row_ratio() {
        let cases = [
            (5_000, 1_000, RelationshipKind::Array),
            (1_000, 1_000, RelationshipKind::Single),
            (250, 1_000, RelationshipKind::Single),
            (800, 1_000, RelationshipKind::Single),
            (0, 1_000, RelationshipKind::Array),
            (1_000, 0, RelationshipKind::Array),
        ];
        for (child_rows, parent_rows, expected) in cases {
            let schema = Schema::new(vec![
                table("users", parent_rows, &[], &[]),
                table("profiles", child_rows, &["bio"], &[("user_id", "users")]),
            ]);
            let mapping = suggest(&schema, &schema.table_names(), &[]);
            let users = mapping.collection("users").unwrap();
            assert_eq!(
                users.embedded[0].relationship, expected,
                "child={} parent={}",
                child_rows, parent_rows
            );
        }
    }

    #[test]
    fn test_self_reference_is_never_embedded() {
        let schema = Schema::new(vec![table(
            "employees",
            300,
            &["name"],
            &[("manager_id", "employees")],
        )]);
        let suggestion = suggest_with_notes(&schema, &names(&["employees"]), &[]);
        let mapping = suggestion.mapping;
        assert_eq!(mapping.collections.len(), 1);
        let employees = &mapping.collections[0];
        assert!(employees.embedded.is_empty());
        assert_eq!(employees.references.len(), 1);
        assert_eq!(employees.references[0].source_table, "employees");
        assert_eq!(employees.references[0].field_name, "manager_id");
        assert!(suggestion.notes.iter().any(|n| n.contains("self reference")));
    }

    #[test]
    fn test_join_table_is_dissolved() {
        let mut enrollments = table(
            "enrollments",
            4_000,
            &[],
            &[("student_id", "students"), ("course_id", "courses")],
        );
        enrollments.columns.retain(|c| c.name != "id");
        enrollments.primary_key = None;
        let schema = Schema::new(vec![
            table("students", 1_000, &["name"], &[]),
            table("courses", 50, &["title"], &[]),
            enrollments,
        ]);
        let mapping = suggest(&schema, &schema.table_names(), &[]);

        assert!(mapping.collection("enrollments").is_none());
        let students = mapping.collection("students").unwrap();
        assert_eq!(students.embedded[0].source_table, "enrollments");
        assert_eq!(students.embedded[0].join_column, "student_id");
        assert_eq!(students.references[0].source_table, "courses");
        assert_eq!(students.references[0].field_name, "enrollments.course_id");
        assert!(mapping.collection("courses").unwrap().embedded.is_empty());
    }

    #[test]
    fn test_table_with_business_data_is_not_dissolved() {
        let schema = Schema::new(vec![
            table("students", 1_000, &["name"], &[]),
            table("courses", 50, &["title"], &[]),
            table(
                "enrollments",
                4_000,
                &["grade"],
                &[("student_id", "students"), ("course_id", "courses")],
            ),
        ]);
        let suggestion = suggest_with_notes(&schema, &schema.table_names(), &[]);
        assert!(!suggestion.notes.iter().any(|n| n.contains("dissolved")));
        let courses = suggestion.mapping.collection("courses").unwrap();
        assert_eq!(courses.embedded[0].source_table, "enrollments");
        assert_eq!(courses.references[0].source_table, "students");
    }

    #[test]
    fn test_cycle_falls_back_to_roots() {
        let schema = Schema::new(vec![
            table("a", 10, &[], &[("b_id", "b")]),
            table("b", 10, &[], &[("a_id", "a")]),
        ]);
        let suggestion = suggest_with_notes(&schema, &names(&["a", "b"]), &[]);
        assert!(!suggestion.mapping.collections.is_empty());
        let counts = placements(&suggestion.mapping);
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|&n| n == 1));
        assert!(suggestion.notes.iter().any(|n| n.contains("cyclic")));
    }

    #[test]
    fn test_unselected_parent_is_not_embedded_into() {
        let schema = shop_schema();
        let mapping = suggest(&schema, &names(&["orders"]), &[]);
        assert_eq!(mapping.collections.len(), 1);
        let orders = &mapping.collections[0];
        assert_eq!(orders.source_table, "orders");
        assert!(orders.embedded.is_empty());
        assert!(orders.references.is_empty());
    }

    #[test]
    fn test_root_hint_forces_root() {
        let schema = shop_schema();
        let mapping = suggest(&schema, &schema.table_names(), &names(&["orders"]));
        assert_eq!(mapping.collections[0].source_table, "orders");
        assert!(mapping.collection("customers").unwrap().embedded.is_empty());
        let orders = mapping.collection("orders").unwrap();
        assert_eq!(orders.embedded[0].source_table, "order_items");
        assert!(orders
            .references
            .iter()
            .any(|r| r.source_table == "customers" && r.field_name == "customer_id"));
        assert!(placements(&mapping).values().all(|&n| n == 1));
    }

    #[test]
    fn test_suggestion_is_deterministic() {
        let schema = shop_schema();
        let forward = suggest(&schema, &schema.table_names(), &[]);
        let mut reversed = schema.table_names();
        reversed.reverse();
        let backward = suggest(&schema, &reversed, &[]);
        assert_eq!(forward, backward);
    }
}

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

//! # Relationship Graph
//!
//! A directed graph of foreign keys, restricted to the tables the user selected.
//! An edge points from the child (the table holding the foreign key) to the
//! parent (the referenced table).
//!
//! Tables live in an index arena sorted by name and edges are sorted by
//! (child, foreign key name), so every walk over the graph happens in the same
//! order on every run.

use crate::domain::entities::{ForeignKey, Schema, Table};
use log::debug;
use std::collections::BTreeMap;

/// One foreign key between two distinct selected tables.
#[derive(Debug, Clone, Copy)]
pub struct Edge<'a> {
    pub child: usize,
    pub parent: usize,
    pub foreign_key: &'a ForeignKey,
}

#[derive(Debug)]
pub struct RelationshipGraph<'a> {
    tables: Vec<&'a Table>,
    index: BTreeMap<&'a str, usize>,
    edges: Vec<Edge<'a>>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    self_references: Vec<Vec<&'a ForeignKey>>,
    /// Foreign keys whose target is outside the selection, as (table, fk).
    dangling: Vec<(usize, &'a ForeignKey)>,
    /// Selected names that the schema does not contain.
    missing: Vec<String>,
}

impl<'a> RelationshipGraph<'a> {
    /// Builds the graph over `selected`; unknown names are recorded, not fatal.
    pub fn build(schema: &'a Schema, selected: &[String]) -> Self {
        let mut names: Vec<&str> = selected.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();

        let mut tables = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match schema.table(name) {
                Some(t) => tables.push(t),
                None => missing.push(name.to_string()),
            }
        }

        let index: BTreeMap<&'a str, usize> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();

        let mut edges = Vec::new();
        let mut self_references = vec![Vec::new(); tables.len()];
        let mut dangling = Vec::new();

        for (child, table) in tables.iter().enumerate() {
            let mut fks: Vec<&ForeignKey> = table.foreign_keys.iter().collect();
            fks.sort_by(|a, b| a.name.cmp(&b.name).then(a.columns.cmp(&b.columns)));
            for fk in fks {
                if fk.columns.is_empty() || fk.columns.len() != fk.referenced_columns.len() {
                    debug!("Ignoring malformed foreign key '{}' on '{}'", fk.name, table.name);
                    continue;
                }
                if fk.referenced_table == table.name {
                    self_references[child].push(fk);
                    continue;
                }
                match index.get(fk.referenced_table.as_str()) {
                    Some(&parent) => edges.push(Edge {
                        child,
                        parent,
                        foreign_key: fk,
                    }),
                    None => dangling.push((child, fk)),
                }
            }
        }

        let mut outgoing = vec![Vec::new(); tables.len()];
        let mut incoming = vec![Vec::new(); tables.len()];
        for (id, edge) in edges.iter().enumerate() {
            outgoing[edge.child].push(id);
            incoming[edge.parent].push(id);
        }

        Self {
            tables,
            index,
            edges,
            outgoing,
            incoming,
            self_references,
            dangling,
            missing,
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, idx: usize) -> &'a Table {
        self.tables[idx]
    }

    pub fn name(&self, idx: usize) -> &'a str {
        self.tables[idx].name.as_str()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn edge(&self, id: usize) -> &Edge<'a> {
        &self.edges[id]
    }

    pub fn edges(&self) -> &[Edge<'a>] {
        &self.edges
    }

    /// Edge ids where `idx` is the child, in (fk name) order.
    pub fn outgoing(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }

    /// Edge ids where `idx` is the parent, in (child name, fk name) order.
    pub fn incoming(&self, idx: usize) -> &[usize] {
        &self.incoming[idx]
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.outgoing[idx].len()
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    pub fn self_references(&self, idx: usize) -> &[&'a ForeignKey] {
        &self.self_references[idx]
    }

    pub fn dangling(&self) -> &[(usize, &'a ForeignKey)] {
        &self.dangling
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Column, ForeignKey, Table};

    fn table(name: &str, fks: &[(&str, &str)]) -> Table {
        Table {
            name: name.into(),
            columns: vec![Column::new("id", "integer")],
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
            ..Default::default()
        }
    }

    #[test]
    fn test_build_restricts_to_selection() {
        let schema = Schema::new(vec![
            table("orders", &[("customer_id", "customers"), ("region_id", "regions")]),
            table("customers", &[]),
            table("regions", &[]),
            table("employees", &[("manager_id", "employees")]),
        ]);
        let selected = vec![
            "orders".to_string(),
            "customers".to_string(),
            "employees".to_string(),
            "ghost".to_string(),
        ];
        let graph = RelationshipGraph::build(&schema, &selected);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.name(0), "customers");
        let orders = graph.index_of("orders").unwrap();
        let customers = graph.index_of("customers").unwrap();
        let employees = graph.index_of("employees").unwrap();

        assert_eq!(graph.out_degree(orders), 1);
        assert_eq!(graph.in_degree(customers), 1);
        assert_eq!(graph.out_degree(employees), 0);
        assert_eq!(graph.self_references(employees).len(), 1);
        assert_eq!(graph.dangling().len(), 1);
        assert_eq!(graph.dangling()[0].1.referenced_table, "regions");
        assert_eq!(graph.missing().to_vec(), vec!["ghost".to_string()]);
    }
}

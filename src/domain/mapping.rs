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

//! # Document Mapping
//!
//! The `Mapping` describes what the MongoDB side looks like: which tables become
//! collections, which are nested inside a parent document (`embedded`), which
//! stay separate but linked (`references`), and which per-field
//! `transformations` run during the load.
//!
//! The suggester produces a mapping, a human may edit the YAML, and the size
//! estimator and script generator read it back. Loading and saving is lossless.

use crate::domain::errors::{MigrationError, Result};
use serde::{Deserialize, Serialize};

/// The full target layout: an ordered list of collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Mapping {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// A top-level MongoDB collection fed by one source table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    /// Collection name (defaults to the source table name).
    #[serde(default)]
    pub name: String,
    pub source_table: String,
    #[serde(default)]
    pub embedded: Vec<Embedded>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

/// Whether the child rows become an array of sub-documents or a single one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    #[default]
    Array,
    Single,
}

impl RelationshipKind {
    /// `array` when there are more child rows than parent rows, `single` otherwise.
    ///
    /// Unknown counts (zero on either side) give `array`: the more general container.
    pub fn from_row_counts(child_rows: u64, parent_rows: u64) -> Self {
        if child_rows == 0 || parent_rows == 0 {
            return RelationshipKind::Array;
        }
        let ratio = child_rows as f64 / parent_rows as f64;
        if ratio > 1.0 {
            RelationshipKind::Array
        } else {
            RelationshipKind::Single
        }
    }
}

/// An extra column pair for composite foreign keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyPair {
    pub join_column: String,
    pub parent_column: String,
}

/// A child table nested inside its parent document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embedded {
    pub source_table: String,
    /// Field holding the nested data (defaults to the source table name).
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub relationship: RelationshipKind,
    /// Column on the child table.
    pub join_column: String,
    /// Column on the parent table.
    pub parent_column: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_keys: Vec<KeyPair>,
    #[serde(default)]
    pub embedded: Vec<Embedded>,
}

/// A table stored as its own collection and linked by a field value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reference {
    pub source_table: String,
    /// Dotted path of the linking field inside this collection's documents.
    pub field_name: String,
    #[serde(default)]
    pub referenced_column: String,
}

/// A per-field change applied while loading a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransformationDocument", into = "TransformationDocument")]
pub struct Transformation {
    pub source_field: String,
    pub operation: Operation,
}

/// The six supported operations, each with exactly the parameters it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Rename { target_field: String },
    Compute { target_field: String, expression: String },
    /// `target_type` overrides the type map's BSON type for the source column.
    Cast { target_type: Option<String> },
    Filter { condition: String },
    Default { value: serde_json::Value },
    Exclude,
}

impl Operation {
    pub const CODES: [&'static str; 6] =
        ["rename", "compute", "cast", "filter", "default", "exclude"];

    /// The operation code used in mapping documents.
    pub fn code(&self) -> &'static str {
        match self {
            Operation::Rename { .. } => "rename",
            Operation::Compute { .. } => "compute",
            Operation::Cast { .. } => "cast",
            Operation::Filter { .. } => "filter",
            Operation::Default { .. } => "default",
            Operation::Exclude => "exclude",
        }
    }
}

/// Flat on-disk form of a `Transformation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransformationDocument {
    source_field: String,
    operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<serde_json::Value>,
}

impl TryFrom<TransformationDocument> for Transformation {
    type Error = MigrationError;

    fn try_from(doc: TransformationDocument) -> Result<Self> {
        let field = doc.source_field;
        let require = |value: Option<String>, param: &str| {
            value.ok_or_else(|| {
                MigrationError::MappingError(format!(
                    "{} of '{}' requires {}",
                    doc.operation, field, param
                ))
            })
        };
        let operation = match doc.operation.as_str() {
            "rename" => Operation::Rename {
                target_field: require(doc.target_field, "target_field")?,
            },
            "compute" => Operation::Compute {
                target_field: require(doc.target_field, "target_field")?,
                expression: require(doc.expression, "expression")?,
            },
            "cast" => Operation::Cast {
                target_type: doc.target_type,
            },
            "filter" => Operation::Filter {
                condition: require(doc.condition, "condition")?,
            },
            "default" => Operation::Default {
                value: doc.default_value.ok_or_else(|| {
                    MigrationError::MappingError(format!(
                        "default of '{}' requires default_value",
                        field
                    ))
                })?,
            },
            "exclude" => Operation::Exclude,
            other => return Err(MigrationError::UnknownOperation(other.to_string())),
        };
        Ok(Transformation {
            source_field: field,
            operation,
        })
    }
}

impl From<Transformation> for TransformationDocument {
    fn from(t: Transformation) -> Self {
        let mut doc = TransformationDocument {
            source_field: t.source_field,
            operation: t.operation.code().to_string(),
            target_field: None,
            expression: None,
            target_type: None,
            condition: None,
            default_value: None,
        };
        match t.operation {
            Operation::Rename { target_field } => doc.target_field = Some(target_field),
            Operation::Compute {
                target_field,
                expression,
            } => {
                doc.target_field = Some(target_field);
                doc.expression = Some(expression);
            }
            Operation::Cast { target_type } => doc.target_type = target_type,
            Operation::Filter { condition } => doc.condition = Some(condition),
            Operation::Default { value } => doc.default_value = Some(value),
            Operation::Exclude => {}
        }
        doc
    }
}

impl Mapping {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Parses a YAML mapping document and fills in defaulted names.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if let Ok(scan) = serde_yaml::from_str::<OperationScan>(text) {
            scan.check()?;
        }
        let mut mapping: Mapping = serde_yaml::from_str(text)
            .map_err(|e| MigrationError::MappingError(e.to_string()))?;
        mapping.fill_defaults();
        Ok(mapping)
    }

    /// Parses a JSON mapping document and fills in defaulted names.
    pub fn from_json_str(text: &str) -> Result<Self> {
        if let Ok(scan) = serde_json::from_str::<OperationScan>(text) {
            scan.check()?;
        }
        let mut mapping: Mapping = serde_json::from_str(text)
            .map_err(|e| MigrationError::MappingError(e.to_string()))?;
        mapping.fill_defaults();
        Ok(mapping)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Collection and field names default to their source table names.
    pub fn fill_defaults(&mut self) {
        fn fill_embedded(nodes: &mut [Embedded]) {
            for node in nodes {
                if node.field_name.is_empty() {
                    node.field_name = node.source_table.clone();
                }
                fill_embedded(&mut node.embedded);
            }
        }
        for collection in &mut self.collections {
            if collection.name.is_empty() {
                collection.name = collection.source_table.clone();
            }
            fill_embedded(&mut collection.embedded);
        }
    }
}

/// Operation codes only, read ahead of the typed decode so an unknown code
/// surfaces as `UnknownOperation` rather than as decoder text.
#[derive(Deserialize)]
struct OperationScan {
    #[serde(default)]
    collections: Vec<ScannedCollection>,
}

#[derive(Deserialize)]
struct ScannedCollection {
    #[serde(default)]
    transformations: Vec<ScannedTransformation>,
}

#[derive(Deserialize)]
struct ScannedTransformation {
    #[serde(default)]
    operation: Option<String>,
}

impl OperationScan {
    fn check(self) -> Result<()> {
        let codes = self
            .collections
            .into_iter()
            .flat_map(|c| c.transformations)
            .filter_map(|t| t.operation);
        for code in codes {
            if !Operation::CODES.contains(&code.as_str()) {
                return Err(MigrationError::UnknownOperation(code));
            }
        }
        Ok(())
    }
}

impl Collection {
    pub fn new(source_table: impl Into<String>) -> Self {
        let source_table = source_table.into();
        Self {
            name: source_table.clone(),
            source_table,
            ..Default::default()
        }
    }

    /// Every embedded node in pre-order, with its dotted field path.
    pub fn embedded_nodes(&self) -> Vec<(String, &Embedded)> {
        fn walk<'a>(prefix: &str, nodes: &'a [Embedded], out: &mut Vec<(String, &'a Embedded)>) {
            for node in nodes {
                let path = if prefix.is_empty() {
                    node.field_name.clone()
                } else {
                    format!("{}.{}", prefix, node.field_name)
                };
                out.push((path.clone(), node));
                walk(&path, &node.embedded, out);
            }
        }
        let mut out = Vec::new();
        walk("", &self.embedded, &mut out);
        out
    }
}

impl Embedded {
    pub fn new(
        source_table: impl Into<String>,
        relationship: RelationshipKind,
        join_column: impl Into<String>,
        parent_column: impl Into<String>,
    ) -> Self {
        let source_table = source_table.into();
        Self {
            field_name: source_table.clone(),
            source_table,
            relationship,
            join_column: join_column.into(),
            parent_column: parent_column.into(),
            additional_keys: Vec::new(),
            embedded: Vec::new(),
        }
    }

    /// All (child column, parent column) pairs used to join this node to its parent.
    pub fn key_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = vec![(self.join_column.as_str(), self.parent_column.as_str())];
        pairs.extend(
            self.additional_keys
                .iter()
                .map(|k| (k.join_column.as_str(), k.parent_column.as_str())),
        );
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
collections:
  - source_table: customers
    embedded:
      - source_table: orders
        relationship: array
        join_column: customer_id
        parent_column: id
        embedded:
          - source_table: order_items
            field_name: items
            join_column: order_id
            parent_column: id
    references:
      - source_table: products
        field_name: orders.items.product_id
        referenced_column: id
    transformations:
      - source_field: fname
        operation: rename
        target_field: first_name
      - source_field: full_name
        operation: compute
        target_field: full_name
        expression: "first_name || ' ' || last_name"
      - source_field: age
        operation: cast
      - source_field: country
        operation: default
        default_value: US
      - source_field: legacy
        operation: exclude
"#
    }

    #[test]
    fn test_relationship_kind_ratio_boundaries() {
        assert_eq!(RelationshipKind::from_row_counts(500, 100), RelationshipKind::Array);
        assert_eq!(RelationshipKind::from_row_counts(100, 100), RelationshipKind::Single);
        assert_eq!(RelationshipKind::from_row_counts(25, 100), RelationshipKind::Single);
        assert_eq!(RelationshipKind::from_row_counts(80, 100), RelationshipKind::Single);
        assert_eq!(RelationshipKind::from_row_counts(0, 100), RelationshipKind::Array);
        assert_eq!(RelationshipKind::from_row_counts(100, 0), RelationshipKind::Array);
    }

    #[test]
    fn test_load_fills_default_names() {
        let mapping = Mapping::from_yaml_str(sample_yaml()).unwrap();
        let customers = mapping.collection("customers").unwrap();
        assert_eq!(customers.source_table, "customers");
        assert_eq!(customers.embedded[0].field_name, "orders");
        assert_eq!(customers.embedded[0].embedded[0].field_name, "items");
        assert_eq!(
            customers.embedded[0].embedded[0].relationship,
            RelationshipKind::Array
        );
        assert_eq!(
            customers.transformations[2].operation,
            Operation::Cast { target_type: None }
        );
    }

    #[test]
    fn test_yaml_and_json_round_trip() {
        let first = Mapping::from_yaml_str(sample_yaml()).unwrap();
        let again = Mapping::from_yaml_str(&first.to_yaml_string().unwrap()).unwrap();
        assert_eq!(first, again);

        let via_json = Mapping::from_json_str(&first.to_json_string().unwrap()).unwrap();
        assert_eq!(first, via_json);
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let yaml = r#"
collections:
  - source_table: customers
    transformations:
      - source_field: tags
        operation: explode
"#;
        let err = Mapping::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownOperation(ref op) if op == "explode"));

        let json = r#"{"collections":[{"source_table":"t","transformations":[{"source_field":"a","operation":"pivot"}]}]}"#;
        let err = Mapping::from_json_str(json).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownOperation(ref op) if op == "pivot"));
    }

    #[test]
    fn test_unknown_operation_keeps_its_exact_code() {
        let yaml = r#"
collections:
  - source_table: customers
    transformations:
      - source_field: name
        operation: rename
        target_field: full_name
      - source_field: tags
        operation: "split 'csv'"
"#;
        let err = Mapping::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, MigrationError::UnknownOperation(ref op) if op == "split 'csv'"));
    }

    #[test]
    fn test_missing_parameter_is_rejected() {
        let yaml = r#"
collections:
  - source_table: customers
    transformations:
      - source_field: fname
        operation: rename
"#;
        let err = Mapping::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("requires target_field"));
    }

    #[test]
    fn test_embedded_nodes_paths() {
        let mapping = Mapping::from_yaml_str(sample_yaml()).unwrap();
        let paths: Vec<String> = mapping.collections[0]
            .embedded_nodes()
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(paths, vec!["orders".to_string(), "orders.items".to_string()]);
    }
}

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

//! Bottom-up nesting.
//!
//! Children are folded into parents in post-order: a table is aggregated only
//! after all of its own children have been joined onto it, so the deepest
//! level is complete before it is collected into the level above.
//!
//! Each child is grouped by its join key, collected into an array of structs
//! (or the first struct for `single`), and left-joined onto its parent under a
//! temporary key name that is dropped right after the join.

use super::{py_str, ScriptContext};
use crate::domain::mapping::{Collection, Embedded, RelationshipKind};

pub(super) fn write_nesting(out: &mut String, ctx: &ScriptContext<'_>, collection: &Collection) {
    if collection.embedded.is_empty() {
        return;
    }
    out.push_str(&format!("\n# --- Nesting: {} ---\n", collection.name));
    let parent = ctx.var(&collection.source_table);
    for node in &collection.embedded {
        fold_into(out, ctx, parent, node);
    }
}

fn fold_into(out: &mut String, ctx: &ScriptContext<'_>, parent: &str, node: &Embedded) {
    let child = ctx.var(&node.source_table);
    for grandchild in &node.embedded {
        fold_into(out, ctx, child, grandchild);
    }

    let nested = format!("nested_{}", child.trim_start_matches("df_"));
    let field = py_str(&node.field_name);
    let pairs = node.key_pairs();
    let keys: Vec<String> = (0..pairs.len())
        .map(|i| match i {
            0 => format!("__{}_key", node.field_name),
            _ => format!("__{}_key_{}", node.field_name, i),
        })
        .collect();

    let group_by = pairs
        .iter()
        .map(|(join, _)| py_str(join))
        .collect::<Vec<_>>()
        .join(", ");
    let aggregate = match node.relationship {
        RelationshipKind::Array => format!("collect_list(struct(*{}.columns))", child),
        RelationshipKind::Single => {
            format!("first(struct(*{}.columns), ignorenulls=True)", child)
        }
    };

    out.push_str(&format!(
        "# {} -> {} ({})\n",
        node.source_table,
        node.field_name,
        match node.relationship {
            RelationshipKind::Array => "array",
            RelationshipKind::Single => "single",
        }
    ));
    out.push_str(&format!("{} = (\n", nested));
    out.push_str(&format!("    {}.groupBy({})\n", child, group_by));
    out.push_str(&format!("    .agg({}.alias({}))\n", aggregate, field));
    for ((join, _), key) in pairs.iter().zip(&keys) {
        out.push_str(&format!(
            "    .withColumnRenamed({}, {})\n",
            py_str(join),
            py_str(key)
        ));
    }
    out.push_str(")\n");

    let condition = pairs
        .iter()
        .zip(&keys)
        .map(|((_, parent_column), key)| {
            format!(
                "({}[{}] == {}[{}])",
                parent,
                py_str(parent_column),
                nested,
                py_str(key)
            )
        })
        .collect::<Vec<_>>()
        .join(" & ");
    let dropped = keys.iter().map(|k| py_str(k)).collect::<Vec<_>>().join(", ");

    out.push_str(&format!("{} = (\n", parent));
    out.push_str(&format!(
        "    {}.join({}, {}, \"left\")\n",
        parent, nested, condition
    ));
    out.push_str(&format!("    .drop({})\n", dropped));
    out.push_str(")\n");
}

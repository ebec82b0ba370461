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

//! Per-collection field transformations, applied in declared order to the
//! collection's own table before anything is nested into it.

use super::{py_str, py_value, ScriptContext};
use crate::domain::mapping::{Collection, Operation, Transformation};
use crate::domain::type_map::{spark_type_for, FALLBACK_TARGET_TYPE};

pub(super) fn write_transformations(
    out: &mut String,
    ctx: &ScriptContext<'_>,
    collection: &Collection,
) {
    if collection.transformations.is_empty() {
        return;
    }
    let df = ctx.var(&collection.source_table);
    out.push_str(&format!("\n# --- Transformations: {} ---\n", collection.name));
    for t in &collection.transformations {
        out.push_str(&format!(
            "{} = {}{}\n",
            df,
            df,
            transformation_call(ctx, collection, t)
        ));
    }
}

/// The DataFrame method chain for one transformation, starting with `.`.
fn transformation_call(ctx: &ScriptContext<'_>, collection: &Collection, t: &Transformation) -> String {
    let field = py_str(&t.source_field);
    match &t.operation {
        Operation::Rename { target_field } => {
            format!(".withColumnRenamed({}, {})", field, py_str(target_field))
        }
        Operation::Compute {
            target_field,
            expression,
        } => format!(
            ".withColumn({}, expr({}))",
            py_str(target_field),
            py_str(expression)
        ),
        Operation::Cast { target_type } => {
            let bson_type = match target_type {
                Some(explicit) => explicit.clone(),
                None => ctx
                    .table(&collection.source_table)
                    .and_then(|table| table.column(&t.source_field))
                    .map(|column| ctx.type_map.resolve_column(column))
                    .unwrap_or_else(|| FALLBACK_TARGET_TYPE.to_string()),
            };
            format!(
                ".withColumn({}, col({}).cast({}))",
                field,
                field,
                py_str(spark_type_for(&bson_type))
            )
        }
        Operation::Filter { condition } => format!(".filter(expr({}))", py_str(condition)),
        Operation::Default { value } => format!(
            ".withColumn({}, coalesce(col({}), lit({})))",
            field,
            field,
            py_value(value)
        ),
        Operation::Exclude => format!(".drop({})", field),
    }
}

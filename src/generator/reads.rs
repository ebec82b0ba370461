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

//! Partitioned JDBC reads.
//!
//! Each table is split across `NUM_PARTITIONS` parallel connections on a
//! range of one column. The range is probed with MIN/MAX when the script
//! runs, so the bounds are never stale.

use super::{py_str, ScriptContext};
use crate::domain::entities::Table;

const READ_HELPERS: &str = r#"

def jdbc_reader():
    return (
        spark.read.format("jdbc")
        .option("url", JDBC_URL)
        .option("driver", JDBC_DRIVER)
        .option("user", SOURCE_USER)
        .option("password", SOURCE_PASSWORD)
        .option("fetchsize", FETCH_SIZE)
    )


def partition_bounds(table, column):
    row = (
        jdbc_reader()
        .option("query", f"SELECT MIN({column}), MAX({column}) FROM {table}")
        .load()
        .collect()[0]
    )
    return row[0], row[1]


def read_table(table, partition_column=None):
    reader = jdbc_reader().option("dbtable", table)
    if partition_column is not None:
        lower, upper = partition_bounds(table, partition_column)
        if lower is not None and upper is not None and lower != upper:
            reader = (
                reader.option("partitionColumn", partition_column)
                .option("lowerBound", str(lower))
                .option("upperBound", str(upper))
                .option("numPartitions", NUM_PARTITIONS)
            )
    return reader.load()

"#;

/// Column used to split reads: a numeric primary key column, else the
/// first date/timestamp column, else none.
pub(super) fn partition_column(table: &Table) -> Option<&str> {
    table
        .pk_columns()
        .iter()
        .filter_map(|name| table.column(name))
        .find(|c| c.is_numeric())
        .or_else(|| table.columns.iter().find(|c| c.is_temporal()))
        .map(|c| c.name.as_str())
}

pub(super) fn write_reads(out: &mut String, ctx: &ScriptContext<'_>) {
    out.push_str(READ_HELPERS);
    out.push_str("\n# --- Reads ---\n");
    for table in &ctx.tables {
        let source = py_str(&ctx.qualified_name(&table.name));
        match partition_column(table) {
            Some(column) => out.push_str(&format!(
                "{} = read_table({}, {})\n",
                ctx.var(&table.name),
                source,
                py_str(column)
            )),
            None => out.push_str(&format!(
                "{} = read_table({})\n",
                ctx.var(&table.name),
                source
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Column, PrimaryKey};

    #[test]
    fn test_partition_column_preference() {
        let mut events = Table {
            name: "events".into(),
            columns: vec![
                Column::new("code", "varchar(20)"),
                Column::new("happened_at", "timestamp with time zone"),
                Column::new("seq", "bigint"),
            ],
            primary_key: Some(PrimaryKey {
                name: "events_pkey".into(),
                columns: vec!["code".into(), "seq".into()],
            }),
            ..Default::default()
        };
        assert_eq!(partition_column(&events), Some("seq"));

        events.primary_key = None;
        assert_eq!(partition_column(&events), Some("happened_at"));

        events.columns.remove(1);
        assert_eq!(partition_column(&events), None);
    }
}

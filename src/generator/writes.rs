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

//! Bulk writes and the closing summary.
//!
//! Writes are unordered with an unjournaled w=1 write concern. A failed
//! collection does not stop the others; its error is collected and printed at
//! the end, and the script exits non-zero.

use super::{py_str, ScriptContext};

const WRITE_HELPER: &str = r#"

errors = []
results = []


def write_collection(df, collection, source_rows):
    began = time.time()
    documents = 0
    try:
        df = df.persist()
        documents = df.count()
        (
            df.write.format("mongodb")
            .mode("append")
            .option("connection.uri", TARGET_URI)
            .option("database", TARGET_DATABASE)
            .option("collection", collection)
            .option("writeConcern.w", "1")
            .option("writeConcern.journal", "false")
            .option("ordered", "false")
            .option("maxBatchSize", MAX_BATCH_SIZE)
            .save()
        )
        df.unpersist()
    except Exception as exc:
        errors.append(f"{collection}: {exc}")
    results.append((collection, source_rows, documents, time.time() - began))

"#;

const SUMMARY: &str = r#"
# --- Summary ---
print(f"{'collection':<32} {'source rows':>12} {'documents':>12} {'seconds':>10}")
for name, source_rows, documents, seconds in results:
    print(f"{name:<32} {source_rows:>12} {documents:>12} {seconds:>10.1f}")
print(f"total elapsed: {time.time() - started:.1f}s")
if errors:
    print(f"{len(errors)} collection(s) failed:")
    for error in errors:
        print(f"  {error}")
spark.stop()
if errors:
    raise SystemExit(1)
"#;

pub(super) fn write_writes(out: &mut String, ctx: &ScriptContext<'_>) {
    out.push_str(WRITE_HELPER);
    out.push_str("\n# --- Writes ---\n");

    let targets = ctx
        .mapping
        .collections
        .iter()
        .map(|c| (c.name.as_str(), c.source_table.as_str()))
        .chain(
            ctx.referenced_only
                .iter()
                .map(|t| (t.name.as_str(), t.name.as_str())),
        );
    for (collection, source_table) in targets {
        let source_rows = ctx.table(source_table).map(|t| t.row_count).unwrap_or(0);
        out.push_str(&format!(
            "write_collection({}, {}, {})\n",
            ctx.var(source_table),
            py_str(collection),
            source_rows
        ));
    }
}

pub(super) fn write_summary(out: &mut String) {
    out.push_str(SUMMARY);
}

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

//! Script header: imports, connection constants and the Spark session.

use super::{py_str, ScriptContext};
use crate::config::SourceConfig;
use crate::domain::mapping::{Operation, RelationshipKind};
use crate::domain::type_map::SourceDialect;

const MONGO_CONNECTOR_PACKAGE: &str = "org.mongodb.spark:mongo-spark-connector_2.12:10.3.0";
const POSTGRES_DRIVER_PACKAGE: &str = "org.postgresql:postgresql:42.7.3";

/// Largest number of documents the connector sends in one bulk write.
const MAX_BATCH_SIZE: u32 = 100_000;

const URI_HELPER: &str = r#"

def with_uri_options(uri):
    separator = "&" if "?" in uri else "?"
    return uri + separator + "compressors=zstd,snappy,zlib&maxPoolSize=" + str(POOL_SIZE)

"#;

pub(super) fn jdbc_url(source: &SourceConfig) -> String {
    match source.dialect {
        SourceDialect::Postgresql => format!(
            "jdbc:postgresql://{}:{}/{}?ssl={}",
            source.host,
            source.port(),
            source.database,
            source.ssl
        ),
        SourceDialect::Oracle => format!(
            "jdbc:oracle:thin:@//{}:{}/{}",
            source.host,
            source.port(),
            source.database
        ),
    }
}

pub(super) fn jdbc_driver(dialect: SourceDialect) -> &'static str {
    match dialect {
        SourceDialect::Postgresql => "org.postgresql.Driver",
        SourceDialect::Oracle => "oracle.jdbc.OracleDriver",
    }
}

/// Names imported from `pyspark.sql.functions`, sorted.
fn used_functions(ctx: &ScriptContext<'_>) -> Vec<&'static str> {
    let arrays = ctx.has_embedding(RelationshipKind::Array);
    let singles = ctx.has_embedding(RelationshipKind::Single);
    let defaults = ctx.has_operation(|op| matches!(op, Operation::Default { .. }));
    let casts = ctx.has_operation(|op| matches!(op, Operation::Cast { .. }));
    let exprs = ctx.has_operation(|op| {
        matches!(op, Operation::Compute { .. } | Operation::Filter { .. })
    });

    let mut names = Vec::new();
    if defaults {
        names.push("coalesce");
    }
    if casts || defaults {
        names.push("col");
    }
    if arrays {
        names.push("collect_list");
    }
    if exprs {
        names.push("expr");
    }
    if singles {
        names.push("first");
    }
    if defaults {
        names.push("lit");
    }
    if arrays || singles {
        names.push("struct");
    }
    names
}

pub(super) fn write_header(out: &mut String, ctx: &ScriptContext<'_>) {
    let source = &ctx.config.source;
    let target = &ctx.config.target;

    out.push_str("#!/usr/bin/env python3\n");
    out.push_str(&format!(
        "# Bulk load of {} {} into MongoDB database {}.\n",
        source.dialect,
        py_str(&source.database),
        py_str(&target.database)
    ));
    out.push_str("#\n# Required environment variables:\n");
    out.push_str("#   SOURCE_PASSWORD  password of the source database user\n");
    out.push_str(&format!(
        "#   {:<16} connection string of the target cluster\n#\n",
        target.uri_env
    ));
    match source.dialect {
        SourceDialect::Postgresql => out.push_str(&format!(
            "# spark-submit --packages {},{} migrate.py\n",
            MONGO_CONNECTOR_PACKAGE, POSTGRES_DRIVER_PACKAGE
        )),
        SourceDialect::Oracle => {
            out.push_str(&format!(
                "# spark-submit --packages {} --jars ojdbc11.jar migrate.py\n",
                MONGO_CONNECTOR_PACKAGE
            ));
            out.push_str(
                "# The Oracle JDBC driver (ojdbc) is not bundled; supply the jar with --jars.\n",
            );
        }
    }

    out.push_str("import os\nimport time\n\nfrom pyspark.sql import SparkSession\n");
    let functions = used_functions(ctx);
    if !functions.is_empty() {
        out.push_str(&format!(
            "from pyspark.sql.functions import {}\n",
            functions.join(", ")
        ));
    }

    out.push_str("\n# --- Connections ---\n");
    out.push_str(&format!("JDBC_URL = {}\n", py_str(&jdbc_url(source))));
    out.push_str(&format!(
        "JDBC_DRIVER = {}\n",
        py_str(jdbc_driver(source.dialect))
    ));
    out.push_str(&format!("SOURCE_USER = {}\n", py_str(&source.username)));
    out.push_str("SOURCE_PASSWORD = os.environ[\"SOURCE_PASSWORD\"]\n");
    out.push_str(&format!(
        "NUM_PARTITIONS = {}\n",
        ctx.config.runtime.num_partitions()
    ));
    out.push_str(&format!("FETCH_SIZE = {}\n", ctx.config.runtime.fetch_size()));
    out.push_str("POOL_SIZE = NUM_PARTITIONS\n");
    out.push_str(&format!("MAX_BATCH_SIZE = {}\n", MAX_BATCH_SIZE));
    out.push_str(URI_HELPER);
    out.push_str(&format!(
        "TARGET_URI = with_uri_options(os.environ[{}])\n",
        py_str(&target.uri_env)
    ));
    out.push_str(&format!(
        "TARGET_DATABASE = {}\n\n",
        py_str(&target.database)
    ));
    out.push_str(&format!(
        "spark = SparkSession.builder.appName({}).getOrCreate()\n",
        py_str(&format!("migrate-{}", target.database))
    ));
    out.push_str("started = time.time()\n");
}

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

//! # Schema Port
//!
//! The planner needs an already-discovered schema: tables, keys and row
//! statistics. It does not care whether that came from a file, a live catalog
//! query or a test fixture. Anything implementing `SchemaPort` will do.

use crate::domain::entities::Schema;
use crate::domain::errors::Result;

pub trait SchemaPort: Send + Sync {
    /// Returns the full discovered schema.
    fn load_schema(&self) -> Result<Schema>;
}

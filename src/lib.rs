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

//! # MongoDB Migration Planner
//!
//! Plans the move of a relational schema (PostgreSQL or Oracle) into MongoDB:
//!
//! 1. suggests a document mapping (which tables become collections, which are
//!    embedded, which stay referenced),
//! 2. estimates the worst-case size of every document against the 16 MiB limit,
//! 3. generates a PySpark script that performs the bulk load.
//!
//! This crate follows the **Hexagonal Architecture** (Ports and Adapters): the
//! `domain` and `generator` modules are pure functions of their inputs, and all
//! file access happens behind the traits in `ports`.

pub mod application;
pub mod config;
pub mod domain;
pub mod generator;
pub mod infrastructure;
pub mod ports;

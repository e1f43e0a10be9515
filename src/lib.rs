// src/lib.rs

pub mod config;
pub mod constants;
pub mod executor;
pub mod keyspace;
pub mod progress;
pub mod report;
pub mod selector;
pub mod stats;
pub mod tsv_export; // Machine-readable results
pub mod worker;
pub mod workload;

pub use keyspace::generate_keys;
pub use selector::{select, OpKind, OpRatios};

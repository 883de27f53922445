pub mod aggregate;
pub mod batch;
pub mod config;
pub mod datasets;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod importer;
pub mod neo4j;
pub mod output;
pub mod proteins;

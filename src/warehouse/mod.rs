//! # Warehouse Module
//!
//! Connection handling and table definitions for the columnar warehouse.
//!
//! ## Components
//!
//! - `WarehouseClient`: the single connection the pipeline runs on.
//! - `Table` / `Column` / `ColumnType`: declarative table shapes that render
//!   their own `CREATE` and `DROP` statements.
//! - `schema`: the seven tables of the star schema.
//!
//! ## Usage
//!
//! Connection parameters come from the `[cluster]` section of the config
//! file. The password can be overridden with `DWH_DB_PASSWORD`, which may also
//! live in a `.env` file.
//!
//! The warehouse speaks the Postgres wire protocol, so the client is
//! `tokio_postgres`. Bulk loads use the warehouse's own `COPY ... FROM 's3://...'`
//! extension; this crate never reads the raw files itself.

mod client;
pub mod schema;
mod table;

pub use client::WarehouseClient;
pub use table::{Column, ColumnType, Table};

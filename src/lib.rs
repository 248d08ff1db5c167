//! People Data Labs Connector Library
//!
//! Exposes the People Data Labs person enrichment API as the queryable
//! table `pdl_person`. A query supplies one or more identity attributes
//! (email, phone, profile, name); the connector sends a single enrichment
//! request and returns the response as one row.
//!
//! # Modules
//!
//! - `config`: Connection configuration and API key resolution.
//! - `enrichment`: The `pdl_person` table and response decoding.
//! - `errors`: Error handling types.
//! - `models`: Query predicates, request body, columns and rows.
//! - `pdl_client`: People Data Labs HTTP client.
//! - `plugin`: Table registry, connections and query execution.

pub mod config;
pub mod enrichment;
pub mod errors;
pub mod models;
pub mod pdl_client;
pub mod plugin;

pub use crate::config::ConnectionConfig;
pub use crate::errors::{ConnectorError, Result};
pub use crate::models::{ColumnValue, Quals, Row};
pub use crate::plugin::{Connection, Plugin, QueryContext};

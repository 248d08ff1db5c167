//! Static plugin definition: connection handling, table registry and query execution.

use crate::config::{Attribute, ConnectionConfig};
use crate::enrichment::PersonTable;
use crate::errors::{ConnectorError, Result};
use crate::models::{Column, Quals, Row};
use crate::pdl_client::PdlClient;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Tracing target for query execution.
pub const TRACING_TARGET: &str = "pdl_connector::plugin";

/// Name the plugin registers under.
pub const PLUGIN_NAME: &str = "steampipe-plugin-pdl";

/// An opened connection: immutable config plus the shared HTTP client.
///
/// Safe to share across concurrent query executions.
#[derive(Debug, Clone)]
pub struct Connection {
    config: Arc<ConnectionConfig>,
    client: PdlClient,
}

impl Connection {
    /// Opens a connection against the public People Data Labs API.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::with_client(config, PdlClient::new()?))
    }

    pub fn with_client(config: ConnectionConfig, client: PdlClient) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn client(&self) -> &PdlClient {
        &self.client
    }
}

/// Per-execution input: predicates and the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub quals: Quals,
    pub cancel: CancellationToken,
}

impl QueryContext {
    pub fn new(quals: Quals) -> Self {
        Self {
            quals,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(quals: Quals, cancel: CancellationToken) -> Self {
        Self { quals, cancel }
    }
}

/// Which key columns a table needs in its predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumns {
    /// At least one of these, equality only.
    AnyOf(&'static [&'static str]),
}

impl KeyColumns {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            KeyColumns::AnyOf(names) => names,
        }
    }
}

/// List operation of a table.
#[async_trait]
pub trait ListHandler: Send + Sync {
    async fn list(&self, conn: &Connection, ctx: &QueryContext) -> Result<Vec<Row>>;
}

/// A registered table: schema bundled with its list operation.
#[derive(Clone)]
pub struct Table {
    pub name: &'static str,
    pub description: &'static str,
    pub key_columns: KeyColumns,
    pub columns: Vec<Column>,
    handler: Arc<dyn ListHandler>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("key_columns", &self.key_columns)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl Table {
    pub fn new(
        name: &'static str,
        description: &'static str,
        key_columns: KeyColumns,
        columns: Vec<Column>,
        handler: Arc<dyn ListHandler>,
    ) -> Self {
        Self {
            name,
            description,
            key_columns,
            columns,
            handler,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The plugin: config schema and table map.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: &'static str,
    tables: BTreeMap<&'static str, Table>,
}

impl Plugin {
    /// The People Data Labs plugin with its `pdl_person` table.
    pub fn pdl() -> Self {
        let mut tables = BTreeMap::new();
        let person = PersonTable::table();
        tables.insert(person.name, person);

        Self {
            name: PLUGIN_NAME,
            tables,
        }
    }

    pub fn config_schema(&self) -> &'static [Attribute] {
        ConnectionConfig::schema()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| ConnectorError::UnknownTable(name.to_string()))
    }

    /// Runs one query against `table`.
    pub async fn execute(
        &self,
        table: &str,
        conn: &Connection,
        ctx: &QueryContext,
    ) -> Result<Vec<Row>> {
        let table = self.table(table)?;
        let span = tracing::info_span!(target: TRACING_TARGET, "list", table = table.name);

        async {
            tracing::debug!(target: TRACING_TARGET, quals = ?ctx.quals, "Executing query");
            match table.handler.list(conn, ctx).await {
                Ok(rows) => {
                    tracing::info!(target: TRACING_TARGET, rows = rows.len(), "Query complete");
                    Ok(rows)
                }
                Err(e) => {
                    tracing::warn!(target: TRACING_TARGET, "Query failed: {}", e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

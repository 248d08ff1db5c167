use clap::{Args, Parser, Subcommand};
use pdl_connector::{Connection, ConnectionConfig, Plugin, QueryContext, Quals};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line host for the People Data Labs connector.
#[derive(Debug, Parser)]
#[command(name = "pdl-connector", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered tables and their columns.
    Tables,
    /// Run a query against a table and print each row as JSON.
    Query(QueryArgs),
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Table to query.
    #[arg(default_value = "pdl_person")]
    table: String,

    /// Connection config file (JSON, e.g. `{"api_key": "..."}`).
    #[arg(long, env = "PDL_CONNECTION_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    profile: Option<String>,

    #[arg(long)]
    name: Option<String>,
}

impl QueryArgs {
    fn quals(&self) -> Quals {
        [
            ("email", &self.email),
            ("phone", &self.phone),
            ("profile", &self.profile),
            ("name", &self.name),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_ref().map(|v| (column, v.clone())))
        .collect()
    }
}

/// Main entry point.
///
/// Initializes tracing, loads `.env`, then runs the requested command.
/// Ctrl-C cancels a running query.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdl_connector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let plugin = Plugin::pdl();

    match cli.command {
        Command::Tables => print_tables(&plugin),
        Command::Query(args) => run_query(&plugin, args).await,
    }
}

fn print_tables(plugin: &Plugin) -> anyhow::Result<()> {
    for table in plugin.tables() {
        println!("{} - {}", table.name, table.description);
        println!("  key columns (any of): {}", table.key_columns.names().join(", "));
        for column in &table.columns {
            println!(
                "  {:<14} {:<7} {}",
                column.name,
                column.ty.as_str(),
                column.description
            );
        }
    }
    Ok(())
}

async fn run_query(plugin: &Plugin, args: QueryArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ConnectionConfig::load(path)?,
        None => ConnectionConfig::default(),
    };
    let conn = Connection::open(config)?;

    let cancel = CancellationToken::new();
    let ctx = QueryContext::with_cancel(args.quals(), cancel.clone());

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling query");
            ctrl_c.cancel();
        }
    });

    let rows = plugin.execute(&args.table, &conn, &ctx).await?;
    for row in rows {
        println!("{}", serde_json::to_string(&row.to_json())?);
    }

    Ok(())
}

//! tabula — print the SQL for a schema file
//!
//! # Usage
//!
//! ```bash
//! # create statements for every table
//! tabula create shop.toml --comments
//!
//! # a filtered select
//! tabula select shop.toml users --columns id,email --where "id>=10" --order-by id:desc --limit 5
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use tabula::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula")]
#[command(version)]
#[command(about = "Generate MySQL statements from a schema file", long_about = None)]
#[command(after_help = "EXAMPLES:
    tabula create shop.toml
    tabula describe shop.toml
    tabula select shop.toml orders --where \"total>100 and user_id in (1, 2)\" --limit 10
    tabula drop shop.toml --if-exists")]
struct Cli {
    /// Config file (defaults to <config dir>/tabula/config.toml)
    #[arg(short, long, env = "TABULA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print create statements for every table
    Create {
        schema: PathBuf,
        /// Only this table
        #[arg(short, long)]
        table: Option<String>,
        /// Add summary comments
        #[arg(long)]
        comments: bool,
        #[arg(long)]
        if_not_exists: bool,
    },
    /// List tables, columns and foreign keys
    Describe { schema: PathBuf },
    /// Print a select statement
    Select {
        schema: PathBuf,
        table: String,
        /// Comma-separated column keys
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        /// Filter, e.g. "age>=21 and email is not null"
        #[arg(short, long = "where")]
        filter: Option<String>,
        /// column[:asc|:desc], repeatable
        #[arg(long)]
        order_by: Vec<String>,
        #[arg(long, default_value_t = 0)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long)]
        distinct: bool,
    },
    /// Print drop statements, dependents first
    Drop {
        schema: PathBuf,
        #[arg(long)]
        if_exists: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TABULA_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TabulaConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => TabulaConfig::load_default()?,
    };

    match &cli.command {
        Commands::Create {
            schema,
            table,
            comments,
            if_not_exists,
        } => {
            let options = CreateOptions {
                with_comments: *comments,
                if_not_exists: *if_not_exists,
            };
            let mut statements = Vec::new();
            for t in load_tables(schema, &config)? {
                if table.as_deref().is_some_and(|name| name != t.name()) {
                    continue;
                }
                let mut query = Query::new(t);
                query.create_table(&options);
                statements.push(query);
            }
            if statements.is_empty() {
                bail!("no matching tables in {}", schema.display());
            }
            print_statements(&statements, cli.format)
        }
        Commands::Describe { schema } => {
            let tables = load_tables(schema, &config)?;
            match cli.format {
                OutputFormat::Json => print_json_description(&tables),
                OutputFormat::Text => {
                    describe(&tables);
                    Ok(())
                }
            }
        }
        Commands::Select {
            schema,
            table,
            columns,
            filter,
            order_by,
            limit,
            offset,
            distinct,
        } => {
            let tables = load_tables(schema, &config)?;
            let Some(t) = tables.into_iter().find(|t| t.name() == table.as_str()) else {
                bail!("table '{}' not found in {}", table, schema.display());
            };

            let mut options = SelectOptions::new().limit(*limit).offset(*offset);
            for col in columns {
                options = options.column(col.as_str());
            }
            if let Some(filter) = filter {
                options = options.filter(parse_filter(filter)?);
            }
            for order in order_by {
                let (key, direction) = order.split_once(':').unwrap_or((order.as_str(), ""));
                options = options.order_by(key, direction);
            }
            if *distinct {
                options = options.distinct();
            }

            let mut query = Query::new(t);
            query.select(&options);
            print_statements(&[query], cli.format)
        }
        Commands::Drop { schema, if_exists } => {
            let mut statements = Vec::new();
            for t in load_tables(schema, &config)?.into_iter().rev() {
                let mut query = Query::new(t);
                query.drop_table(*if_exists);
                statements.push(query);
            }
            print_statements(&statements, cli.format)
        }
    }
}

fn load_tables(path: &Path, config: &TabulaConfig) -> Result<Vec<Table>> {
    let schema =
        SchemaFile::load(path).with_context(|| format!("loading schema {}", path.display()))?;
    Ok(schema.build(config)?)
}

fn print_statements(queries: &[Query], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let out: Vec<serde_json::Value> = queries
                .iter()
                .map(|q| {
                    serde_json::json!({
                        "table": q.table().name(),
                        "query_type": q.query_type(),
                        "sql": q.sql(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for query in queries {
                if query.sql().is_empty() {
                    eprintln!("{} nothing generated for {}", "⚠".yellow(), query.table().name());
                    continue;
                }
                println!("{}", query.sql().white());
                println!();
            }
        }
    }
    Ok(())
}

fn describe(tables: &[Table]) {
    for table in tables {
        println!(
            "{} {} {}",
            table.qualified_name().cyan().bold(),
            table.engine().dimmed(),
            format!("({} columns)", table.len()).dimmed()
        );
        for (key, col) in table.entries() {
            let mut flags = Vec::new();
            if col.is_primary() {
                flags.push("primary");
            }
            if col.is_auto_increment() {
                flags.push("auto");
            }
            if col.is_unique() && !col.is_primary() {
                flags.push("unique");
            }
            if col.is_nullable() {
                flags.push("null");
            }
            println!(
                "  {:20} {:24} {}",
                key.white(),
                col.to_string().split_once(' ').map(|(_, rest)| rest).unwrap_or_default().yellow(),
                flags.join(" ").dimmed()
            );
        }
        for fk in table.foreign_keys() {
            let refs: Vec<String> = fk
                .references()
                .map(|(owner, source)| format!("{} → {}", owner, source))
                .collect();
            println!(
                "  {} {} {}.{}",
                "fk".magenta(),
                fk.name().white(),
                fk.source_name().unwrap_or("?"),
                refs.join(", ")
            );
        }
        println!();
    }
}

fn print_json_description(tables: &[Table]) -> Result<()> {
    let out: Vec<serde_json::Value> = tables
        .iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name(),
                "engine": t.engine(),
                "columns": t.entries().iter().map(|(key, col)| serde_json::json!({
                    "key": key,
                    "name": col.name(),
                    "datatype": col.datatype(),
                    "definition": col.to_string(),
                })).collect::<Vec<_>>(),
                "foreign_keys": t.foreign_keys().iter().map(|fk| fk.name()).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

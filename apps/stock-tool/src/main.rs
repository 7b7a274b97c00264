//! Terminal access to the stockroom dashboard's tables.
//!
//! Provides commands for:
//! - Listing pages with filters, search and ordering
//! - Optimistic single-cell edits
//! - Creating and deleting records

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;

use stockroom_client::{Collaborator, LoadingCounter, RequestContext, RestClient};
use stockroom_core::config::ClientConfig;
use stockroom_core::schema::register_builtin_schemas;
use stockroom_core::{FieldKind, ListQuery, ResourceSchema, Row, SchemaRegistry, SortKey};
use stockroom_editor::{CellEditor, CreateOutcome, DeleteOutcome, EditOutcome, EditorConfig};

/// Environment variable holding the bearer token.
const TOKEN_ENV: &str = "STOCKROOM_TOKEN";

/// Command-line arguments for the stockroom tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the REST API
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Bearer token (defaults to $STOCKROOM_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// HTTP request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Time an edit waits for its response before rolling back
    #[arg(long, default_value_t = 10000)]
    response_timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the resources and their fields
    Schemas,

    /// Prints one page of a resource as JSON lines
    List {
        resource: String,

        #[arg(long, default_value_t = 25)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Equality filter as `field=value`; repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Case-insensitive search term
        #[arg(long)]
        search: Option<String>,

        /// Comma-separated fields, `-` prefix for descending
        #[arg(long, allow_hyphen_values = true)]
        ordering: Option<String>,
    },

    /// Edits one cell and reports whether the backend kept the value
    Edit {
        resource: String,
        pk: u64,
        /// Field path, e.g. `total_cost` or `room`
        field: String,
        /// New value; relation fields take the related record's name
        value: String,

        /// Create the related record if no record has that name
        #[arg(long)]
        create_missing: bool,
    },

    /// Creates a record from a JSON object
    Create { resource: String, json: String },

    /// Deletes a record after confirmation
    Delete {
        resource: String,
        pk: u64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let registry = SchemaRegistry::new();
    register_builtin_schemas(&registry).context("Failed to register resource schemas")?;

    let config = ClientConfig {
        base_url: args.base_url,
        request_timeout_ms: args.request_timeout_ms,
        response_timeout_ms: args.response_timeout_ms,
        ..Default::default()
    };
    let client = Arc::new(RestClient::new(&config)?);
    let counter = Arc::new(LoadingCounter::new());
    let ctx = match args.token.or_else(|| std::env::var(TOKEN_ENV).ok()) {
        Some(token) => RequestContext::with_token(token),
        None => RequestContext::anonymous(),
    }
    .with_loading(counter.clone());

    match args.command {
        Command::Schemas => print_schemas(&registry)?,
        Command::List {
            resource,
            limit,
            offset,
            filters,
            search,
            ordering,
        } => {
            registry.get(&resource)?;
            let mut query = ListQuery::new().page(limit, offset);
            for (field, value) in filters {
                query = query.filter(&field, value);
            }
            if let Some(term) = search {
                query = query.search(&term);
            }
            for key in ordering.iter().flat_map(|raw| raw.split(',')) {
                if let Some(key) = SortKey::parse(key) {
                    query = query.order_by(key);
                }
            }

            let page = client.list(&ctx, &resource, &query).await?;
            for row in &page.results {
                println!("{}", serde_json::to_string(row)?);
            }
            println!("# {} of {} records", page.results.len(), page.count);
        }
        Command::Edit {
            resource,
            pk,
            field,
            value,
            create_missing,
        } => {
            let schema = registry.get(&resource)?;
            let field = schema.field(&field)?;
            field.ensure_editable()?;
            let value = parse_cell(field.kind(), &value);

            let editor_config = EditorConfig {
                create_missing_references: create_missing,
                ..EditorConfig::from(&config)
            };
            let editor = load_record(schema, client, editor_config, &ctx, pk).await?;
            match editor.edit_cell(&ctx, 0, &field, value).await? {
                EditOutcome::Committed { pk } => {
                    let shown = editor.row(0)?.get(field.path()).cloned();
                    println!(
                        "{} {}: {} = {}",
                        resource,
                        pk,
                        field.path(),
                        shown.unwrap_or(Value::Null)
                    );
                }
                EditOutcome::RolledBack { pk, reason } => {
                    bail!("edit of {} {} rolled back: {:?}", resource, pk, reason)
                }
                EditOutcome::Discarded { pk } => {
                    bail!("edit of {} {} was discarded", resource, pk)
                }
            }
        }
        Command::Create { resource, json } => {
            let schema = registry.get(&resource)?;
            let values = match serde_json::from_str::<Value>(&json).context("Invalid JSON")? {
                Value::Object(values) => values,
                other => bail!("expected a JSON object, got {}", other),
            };

            let editor = CellEditor::new(schema, client, EditorConfig::from(&config))?;
            match editor.create_row(&ctx, values).await? {
                CreateOutcome::Created(row) => println!("{}", serde_json::to_string(&row)?),
                CreateOutcome::Rejected { response } => {
                    bail!("backend did not create the record: {}", response)
                }
            }
        }
        Command::Delete { resource, pk, yes } => {
            let schema = registry.get(&resource)?;
            let editor = load_record(schema, client, EditorConfig::from(&config), &ctx, pk).await?;
            let confirm = |row: &Row| yes || prompt(&format!("Delete {} {}?", resource, row.pk()));

            match editor.delete_row(&ctx, 0, &confirm).await? {
                DeleteOutcome::Deleted { pk } => println!("deleted {} {}", resource, pk),
                DeleteOutcome::Cancelled => println!("cancelled"),
                DeleteOutcome::Rejected { pk, status } => {
                    bail!("delete of {} {} answered {}", resource, pk, status)
                }
            }
        }
    }

    tracing::debug!(requests = counter.completed(), "done");
    Ok(())
}

/// Loads the single record `pk` of a resource into a fresh editor.
async fn load_record(
    schema: Arc<ResourceSchema>,
    client: Arc<RestClient>,
    config: EditorConfig,
    ctx: &RequestContext,
    pk: u64,
) -> anyhow::Result<CellEditor> {
    let resource = schema.name.clone();
    let editor = CellEditor::new(schema, client, config)?;
    editor
        .refresh(ctx, &ListQuery::new().filter("pk", pk.to_string()))
        .await?;
    if editor.is_empty() {
        bail!("{} {} not found", resource, pk);
    }
    Ok(editor)
}

fn print_schemas(registry: &SchemaRegistry) -> anyhow::Result<()> {
    for name in registry.names() {
        let schema = registry.get(&name)?;
        println!("{}", name);
        for def in &schema.fields {
            let kind = match &def.kind {
                FieldKind::Relation { resource, display } => format!("-> {}.{}", resource, display),
                other => other.name().to_string(),
            };
            let access = if def.editable { "" } else { " (read-only)" };
            println!("  {:<16} {:<24} {}{}", def.path.to_string(), kind, def.label, access);
        }
    }
    Ok(())
}

/// Parses a `field=value` filter argument.
fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))
}

/// Interprets a command-line value for a field kind.
///
/// Text-like fields keep the raw string (`null` clears the cell); other
/// kinds are parsed as JSON.
fn parse_cell(kind: &FieldKind, raw: &str) -> Value {
    if raw == "null" {
        return Value::Null;
    }
    match kind {
        FieldKind::Text | FieldKind::Date | FieldKind::Relation { .. } => Value::from(raw),
        _ => serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw)),
    }
}

/// Asks a yes/no question on the terminal; anything but `y` declines.
fn prompt(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

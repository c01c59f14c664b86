//! CLI entry point for the vector search adapter.
//!
//! Provides operator commands for importing records, searching, flushing
//! collections, and managing the remote index and its metadata indexes.
//! Main components: Cli parser, Commands enum, and interactive confirmation
//! prompts for the destructive operations.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use console::style;
use scoutvec::io::ExitCode;
use scoutvec::record::{FieldMap, FieldValue, RecordKey, Searchable};
use scoutvec::store::{HttpVectorClient, IndexAdmin, METADATA_KEY, MetadataValue};
use scoutvec::{SearchEngine, SearchQuery, Settings, admin};
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Remote vector index adapter
#[derive(Parser)]
#[command(
    name = "scoutvec",
    version = env!("CARGO_PKG_VERSION"),
    about = "Index searchable records in a remote vector store",
    long_about = "Convert records to embeddings, upsert them into a remote vector index, and search them by similarity.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .scoutvec directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Import records from a JSON file into the index
    #[command(about = "Embed and upsert records from a JSON array file")]
    Import {
        /// Path to a JSON file holding an array of records
        file: PathBuf,
    },

    /// Search one collection by similarity
    Search {
        /// Logical collection to search
        collection: String,

        /// Query text
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Equality constraints as field=value pairs
        #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE")]
        wheres: Vec<String>,
    },

    /// Delete every vector belonging to one collection
    Flush {
        /// Logical collection to flush
        collection: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Manage the physical vector index
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },

    /// Manage metadata filter indexes
    Meta {
        #[command(subcommand)]
        command: MetaCommands,
    },
}

#[derive(Subcommand)]
enum IndexCommands {
    /// Create the index with the configured dimensions and metric
    Create,

    /// Show vector count, dimension, and similarity metric
    Info,

    /// Delete the index and every vector in it
    Drop {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum MetaCommands {
    /// Create a metadata index on one property
    Create {
        /// Metadata property to index
        property: String,

        /// Index type for the property
        #[arg(long, default_value = "string")]
        index_type: String,
    },

    /// List existing metadata indexes
    List,

    /// Delete the metadata index for one property
    Drop {
        /// Metadata property whose index to delete
        property: String,
    },
}

/// One record read from an import file.
///
/// `key` accepts integers and strings; `text` overrides the flattened
/// fields when present.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    collection: String,
    key: serde_json::Value,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

/// Import record with its key already validated.
struct LoadedRecord {
    collection: String,
    key: RecordKey,
    text: Option<String>,
    fields: FieldMap,
}

impl Searchable for LoadedRecord {
    fn key(&self) -> RecordKey {
        self.key.clone()
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn field_map(&self) -> FieldMap {
        self.fields.clone()
    }

    fn searchable_text(&self) -> Option<String> {
        self.text.clone()
    }
}

fn field_value(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::String(s) => Some(FieldValue::Str(s.clone())),
        serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Int(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        serde_json::Value::Array(items) => Some(FieldValue::List(
            items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )),
        serde_json::Value::Null | serde_json::Value::Object(_) => None,
    }
}

fn load_records(path: &PathBuf) -> Result<Vec<LoadedRecord>, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    let raw: Vec<ImportRecord> =
        serde_json::from_str(&content).map_err(|e| format!("Invalid import file: {e}"))?;

    let mut records = Vec::new();
    for entry in raw {
        let Some(key) = RecordKey::from_json(&entry.key) else {
            eprintln!(
                "Warning: skipping record in '{}' with non-scalar key {}",
                entry.collection, entry.key
            );
            continue;
        };
        let fields: FieldMap = entry
            .fields
            .iter()
            .filter_map(|(name, value)| field_value(value).map(|v| (name.clone(), v)))
            .collect();
        records.push(LoadedRecord {
            collection: entry.collection,
            key,
            text: entry.text,
            fields,
        });
    }
    Ok(records)
}

/// Ask a yes/no question on stderr and read the answer from stdin.
fn confirm(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

/// Ask the operator to re-type a value exactly.
fn prompt_exact(prompt: &str) -> String {
    eprint!("{prompt}: ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    let _ = std::io::stdin().lock().read_line(&mut answer);
    answer.trim().to_string()
}

fn metadata_display(value: &MetadataValue) -> String {
    match value {
        MetadataValue::Str(s) => s.clone(),
        MetadataValue::Int(n) => n.to_string(),
        MetadataValue::Float(x) => x.to_string(),
        MetadataValue::Bool(b) => b.to_string(),
    }
}

fn parse_where(raw: &str) -> Result<(String, MetadataValue), String> {
    let Some((field, value)) = raw.split_once('=') else {
        return Err(format!("Invalid --where '{raw}': expected FIELD=VALUE"));
    };
    // Equality on strings, integers, and booleans; everything else stays a
    // string and is matched verbatim by the store
    let value = if let Ok(n) = value.parse::<i64>() {
        MetadataValue::Int(n)
    } else if let Ok(b) = value.parse::<bool>() {
        MetadataValue::Bool(b)
    } else {
        MetadataValue::Str(value.to_string())
    };
    Ok((field.to_string(), value))
}

fn build_client(settings: &Settings) -> HttpVectorClient {
    if let Err(e) = settings.require_store() {
        eprintln!("Error: {e}");
        std::process::exit(ExitCode::ConfigError.into());
    }
    HttpVectorClient::new(settings).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(ExitCode::from_store_error(&e).into());
    })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Using default configuration for now.");
        }
    }

    let settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    match &cli.command {
        Commands::Init { force } => {
            let config_path = PathBuf::from(".scoutvec/settings.toml");

            if config_path.exists() && !force {
                eprintln!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                eprintln!("Use --force to overwrite");
                std::process::exit(ExitCode::GeneralError.into());
            }

            match Settings::init_config_file(*force) {
                Ok(path) => {
                    println!("Created configuration file at: {}", path.display());
                    println!("Edit this file to customize your settings.");
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(ExitCode::GeneralError.into());
                }
            }
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            match toml::to_string_pretty(&settings) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
        }

        Commands::Import { file } => {
            let client = build_client(&settings);
            let engine = SearchEngine::new(client, settings.embedding_model())
                .with_default_limit(settings.search.default_limit);

            let records = load_records(file).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(ExitCode::GeneralError.into());
            });
            let total = records.len();

            match engine.update(&records) {
                Ok(()) => {
                    println!(
                        "{} Imported {total} records",
                        style("✓").green().bold()
                    );
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(ExitCode::from_engine_error(&e).into());
                }
            }
        }

        Commands::Search {
            collection,
            query,
            limit,
            wheres,
        } => {
            let client = build_client(&settings);
            let engine = SearchEngine::new(client, settings.embedding_model())
                .with_default_limit(settings.search.default_limit);

            let mut search = SearchQuery::new(collection.clone(), query.clone());
            if let Some(limit) = limit {
                search = search.limit(*limit);
            }
            for raw in wheres {
                match parse_where(raw) {
                    Ok((field, value)) => search = search.where_eq(field, value),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(ExitCode::GeneralError.into());
                    }
                }
            }

            match engine.search(&search) {
                Ok(results) => {
                    println!(
                        "Found {} matches in '{collection}':",
                        engine.get_total_count(&results)
                    );
                    for (rank, m) in results.results.iter().enumerate() {
                        let key = m
                            .metadata
                            .get(METADATA_KEY)
                            .map(metadata_display)
                            .unwrap_or_else(|| "?".to_string());
                        println!(
                            "  {}. {} (key {}, score {:.4})",
                            rank + 1,
                            m.id,
                            key,
                            m.score
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(ExitCode::from_engine_error(&e).into());
                }
            }
        }

        Commands::Flush { collection, yes } => {
            if !yes
                && !confirm(&format!(
                    "Delete every vector in collection '{collection}'?"
                ))
            {
                eprintln!("Aborted.");
                std::process::exit(ExitCode::GeneralError.into());
            }

            let client = build_client(&settings);
            let engine = SearchEngine::new(client, settings.embedding_model());

            match engine.flush(collection) {
                Ok(()) => println!(
                    "{} Flushed collection '{collection}'",
                    style("✓").green().bold()
                ),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(ExitCode::from_engine_error(&e).into());
                }
            }
        }

        Commands::Index { command } => {
            let client = build_client(&settings);
            match command {
                IndexCommands::Create => match admin::create_index(&client, &settings) {
                    Ok(()) => println!(
                        "{} Created index '{}' ({} dimensions)",
                        style("✓").green().bold(),
                        client.index_name(),
                        settings.embedding_model().dimensions()
                    ),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(ExitCode::from_admin_error(&e).into());
                    }
                },
                IndexCommands::Info => match client.get_index_info() {
                    Ok(info) => {
                        println!("Index '{}':", client.index_name());
                        println!("  vectors:   {}", info.vector_count);
                        println!("  dimension: {}", info.dimension);
                        println!(
                            "  metric:    {}",
                            info.similarity_function.as_deref().unwrap_or("unknown")
                        );
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(ExitCode::from_store_error(&e).into());
                    }
                },
                IndexCommands::Drop { yes } => {
                    if !yes
                        && !confirm(&format!(
                            "Delete index '{}' and ALL vectors in it?",
                            client.index_name()
                        ))
                    {
                        eprintln!("Aborted.");
                        std::process::exit(ExitCode::GeneralError.into());
                    }
                    match admin::delete_index(&client) {
                        Ok(()) => println!(
                            "{} Dropped index '{}'",
                            style("✓").green().bold(),
                            client.index_name()
                        ),
                        Err(e) => {
                            eprintln!("Error: {e}");
                            std::process::exit(ExitCode::from_admin_error(&e).into());
                        }
                    }
                }
            }
        }

        Commands::Meta { command } => {
            let client = build_client(&settings);
            match command {
                MetaCommands::Create {
                    property,
                    index_type,
                } => match admin::create_metadata_index(&client, property, index_type) {
                    Ok(()) => println!(
                        "{} Created metadata index on '{property}'",
                        style("✓").green().bold()
                    ),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(ExitCode::from_admin_error(&e).into());
                    }
                },
                MetaCommands::List => match client.list_metadata_indexes() {
                    Ok(entries) => {
                        if entries.is_empty() {
                            println!("No metadata indexes.");
                        } else {
                            println!(
                                "Metadata indexes ({} of {}):",
                                entries.len(),
                                admin::METADATA_INDEX_LIMIT
                            );
                            for entry in entries {
                                println!(
                                    "  {} ({})",
                                    entry.property_name,
                                    entry.index_type.as_deref().unwrap_or("string")
                                );
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        std::process::exit(ExitCode::from_store_error(&e).into());
                    }
                },
                MetaCommands::Drop { property } => {
                    if !confirm(&format!(
                        "Delete the metadata index for '{property}'? This cannot be undone."
                    )) {
                        eprintln!("Aborted.");
                        std::process::exit(ExitCode::GeneralError.into());
                    }
                    // Destructive and irreversible: the operator re-types
                    // the property name as a second confirmation
                    let typed = prompt_exact(&format!("Type '{property}' to confirm"));
                    match admin::delete_metadata_index(&client, property, &typed) {
                        Ok(()) => println!(
                            "{} Dropped metadata index on '{property}'",
                            style("✓").green().bold()
                        ),
                        Err(e) => {
                            eprintln!("Error: {e}");
                            std::process::exit(ExitCode::from_admin_error(&e).into());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verifies CLI structure is valid at compile time.
    ///
    /// Uses clap's debug_assert to catch configuration errors.
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn where_parsing_coerces_scalars() {
        let (field, value) = parse_where("status=published").unwrap();
        assert_eq!(field, "status");
        assert_eq!(value, MetadataValue::Str("published".to_string()));

        let (_, value) = parse_where("stock=42").unwrap();
        assert_eq!(value, MetadataValue::Int(42));

        let (_, value) = parse_where("active=true").unwrap();
        assert_eq!(value, MetadataValue::Bool(true));

        assert!(parse_where("no-equals-sign").is_err());
    }

    #[test]
    fn field_values_skip_nulls_and_objects() {
        assert_eq!(
            field_value(&serde_json::json!("x")),
            Some(FieldValue::Str("x".to_string()))
        );
        assert_eq!(field_value(&serde_json::json!(3)), Some(FieldValue::Int(3)));
        assert_eq!(field_value(&serde_json::json!(null)), None);
        assert_eq!(field_value(&serde_json::json!({"a": 1})), None);
        assert_eq!(
            field_value(&serde_json::json!(["a", "b"])),
            Some(FieldValue::List(vec!["a".to_string(), "b".to_string()]))
        );
    }
}

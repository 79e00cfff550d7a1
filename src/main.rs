//! Maintenance CLI for the translation store.
//!
//! Usage:
//!   polyglot import              # Import <model>_translations tables into the store
//!   polyglot stats               # Print row count as JSON
//!   polyglot get <locale> <key>  # Resolve one key as JSON, with resolution metrics
//!
//! Required environment variables:
//! - POLYGLOT_DATABASE_PATH
//!
//! Optional:
//! - POLYGLOT_DEFAULT_LOCALE (defaults to en)
//! - POLYGLOT_FALLBACKS (e.g. ca=es;pt=es,en)
//! - POLYGLOT_FALLBACKS_ENABLED (defaults to true)
//! - POLYGLOT_KEY_NAMESPACE (defaults to polyglot)
//! - POLYGLOT_LEGACY_TABLES (e.g. person=people;category=groups)

use anyhow::{anyhow, bail, Context, Result};
use polyglot_store::config::Config;
use polyglot_store::{
    KeyCodec, LegacyImporter, Locale, LocaleContext, Record, SqliteStore, TranslationStore,
    Translator,
};
use rusqlite::Connection;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn print_usage() {
    println!(
        r#"
Usage: polyglot <command>

Commands:
  import              Import legacy <model>_translations tables into the store
  stats               Show store statistics
  get <locale> <key>  Resolve one key through the fallback chain
  help                Show this message
"#
    );
}

fn import_command(config: &Config, store: &SqliteStore) -> Result<()> {
    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path))?;
    let importer =
        LegacyImporter::new(config.key_codec()?).with_overrides(config.legacy_overrides.clone());

    let tables = importer.discover(&conn).context("Failed to list legacy tables")?;
    if tables.is_empty() {
        info!("No legacy translation tables found");
    }
    for table in &tables {
        info!("Importing {} as {}", table.table, table.entity_type);
    }

    let report = importer
        .import_tables(&conn, &tables, store)
        .context("Legacy import failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn stats_command(config: &Config, store: &SqliteStore) -> Result<()> {
    let stats = json!({
        "database": config.database_path,
        "namespace": config.key_namespace,
        "default_locale": config.default_locale,
        "rows": store.count()?,
    });
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Resolve `key` under `locale` the way its entity's accessor would.
fn resolve_key(
    store: &SqliteStore,
    codec: KeyCodec,
    mut ctx: LocaleContext,
    locale: Locale,
    key: &str,
) -> Result<serde_json::Value> {
    let decoded = codec
        .decode(key)
        .ok_or_else(|| anyhow!("'{}' is not a {} translation key", key, codec.namespace()))?;

    let mut translator = Translator::with_codec(Arc::new(store.clone()), codec);
    translator.declare(&decoded.entity_type, [decoded.attribute.as_str()])?;

    let mut entity = Record::new(decoded.entity_type.as_str());
    entity.set_id(decoded.id);

    let stored = store.find_one(&locale, key)?;
    let resolved = translator.read_in(&entity, &decoded.attribute, locale.clone(), &mut ctx)?;

    Ok(json!({
        "locale": locale,
        "key": key,
        "stored": stored,
        "resolved": resolved,
        "metrics": translator.metrics().report(),
    }))
}

fn get_command(config: &Config, store: &SqliteStore, args: &[String]) -> Result<()> {
    let [locale, key] = args else {
        bail!("Usage: polyglot get <locale> <key>");
    };
    let locale = Locale::new(locale.as_str()).context("Invalid locale")?;

    let found = resolve_key(store, config.key_codec()?, config.locale_context(), locale, key)?;
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polyglot_store=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    if matches!(command.as_str(), "--help" | "-h" | "help") {
        print_usage();
        return Ok(());
    }

    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open store at {}", config.database_path))?;

    match command.as_str() {
        "import" => import_command(&config, &store),
        "stats" => stats_command(&config, &store),
        "get" => get_command(&config, &store, &args[2..]),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

//! Command-line front end for product assembly catalogs.
//!
//! Lists the products of a catalog, renders the instructions of one product,
//! checks a catalog document for errors and warnings, and re-encodes a
//! catalog in canonical form.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use buildwell::serial::{encode_with_options, SerializeOptions};
use buildwell::{bundle, decode_with_options, Catalog, CatalogError, ParseOptions, Product};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// buildwell -- browse product assembly instructions.
#[derive(Parser, Debug)]
#[command(name = "buildwell", version, about, long_about = None)]
struct Cli {
    /// Catalog document to read (use `-` for stdin). Defaults to the
    /// bundled catalog.
    #[arg(long, global = true, value_name = "FILE")]
    catalog: Option<String>,

    /// Log verbosity. `RUST_LOG` takes precedence when set.
    #[arg(long, value_enum, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Maximum element nesting depth accepted while decoding.
    #[arg(long, global = true, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum document size in bytes accepted while decoding.
    #[arg(long, global = true, value_name = "BYTES")]
    max_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List product ids and names.
    List,

    /// Show the assembly instructions of one product.
    Show {
        /// Product id to look up.
        id: String,
    },

    /// Decode the catalog and report warnings.
    Check,

    /// Re-encode the catalog.
    Fmt {
        /// Pretty-print (indent) the output.
        #[arg(long)]
        indent: bool,

        /// Write to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Log levels
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn initialize_tracing(log_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Command::List => {
            let catalog = load_catalog(cli).context("failed to decode catalog")?;
            let mut out = io::stdout().lock();
            for product in &catalog {
                writeln!(out, "{}\t{}", product.id(), product.name())?;
            }
            Ok(EXIT_SUCCESS)
        }
        Command::Show { id } => show(cli, id),
        Command::Check => check(cli),
        Command::Fmt { indent, output } => {
            let catalog = load_catalog(cli).context("failed to decode catalog")?;
            let xml = encode_with_options(&catalog, &SerializeOptions::default().indent(*indent))
                .context("failed to encode catalog")?;
            match output {
                Some(path) => fs::write(path, xml)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => io::stdout().lock().write_all(xml.as_bytes())?,
            }
            Ok(EXIT_SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn show(cli: &Cli, id: &str) -> Result<u8> {
    debug!(product_id = %id, "looking up product");

    let mut out = io::stdout().lock();
    match find_product(cli, id) {
        Some(product) => {
            info!(name = %product.name(), "product found");
            writeln!(out, "{}", product.name())?;
            writeln!(out, "{}", "=".repeat(product.name().chars().count()))?;
            for step in product.steps() {
                writeln!(out, "{step}")?;
            }
            Ok(EXIT_SUCCESS)
        }
        None => {
            warn!(product_id = %id, "product not found");
            writeln!(out, "Product Not Found")?;
            writeln!(out, "Product instructions not found for ID: {id}.")?;
            Ok(EXIT_NOT_FOUND)
        }
    }
}

/// Decodes the catalog and looks `id` up in it. Decode failures are logged
/// and treated as a miss.
fn find_product(cli: &Cli, id: &str) -> Option<Product> {
    let catalog = match load_catalog(cli) {
        Ok(catalog) => catalog,
        Err(e) => {
            log_decode_failure(&e);
            return None;
        }
    };
    debug!(count = catalog.len(), "finished decoding catalog");

    let found = catalog.find_by_id(id).cloned();
    if found.is_none() {
        warn!(product_id = %id, "no product with this id in the decoded catalog");
        debug!(ids = ?catalog.ids().collect::<Vec<_>>(), "available product ids");
    }
    found
}

fn check(cli: &Cli) -> Result<u8> {
    let label = source_label(cli);
    let mut out = io::stdout().lock();
    match load_catalog(cli) {
        Ok(catalog) => {
            for diagnostic in catalog.diagnostics() {
                writeln!(out, "{label}: {diagnostic}")?;
            }
            writeln!(
                out,
                "{label}: ok, {} products, {} warnings",
                catalog.len(),
                catalog.diagnostics().len()
            )?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            log_decode_failure(&e);
            writeln!(out, "{label}: {e}")?;
            Ok(EXIT_FAILURE)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_options(cli: &Cli) -> ParseOptions {
    let mut options = ParseOptions::default();
    if let Some(depth) = cli.max_depth {
        options = options.max_depth(depth);
    }
    if let Some(size) = cli.max_size {
        options = options.max_document_size(size);
    }
    options
}

fn load_catalog(cli: &Cli) -> Result<Catalog, CatalogError> {
    let options = parse_options(cli);
    match cli.catalog.as_deref() {
        None => {
            debug!("opened bundled products.xml");
            decode_with_options(bundle::open(), &options)
        }
        Some("-") => {
            debug!("reading catalog from stdin");
            decode_with_options(io::stdin().lock(), &options)
        }
        Some(path) => {
            let file = File::open(path)?;
            debug!(path = %path, "opened catalog file");
            decode_with_options(file, &options)
        }
    }
}

fn source_label(cli: &Cli) -> &str {
    match cli.catalog.as_deref() {
        None => "products.xml (bundled)",
        Some("-") => "<stdin>",
        Some(path) => path,
    }
}

fn log_decode_failure(e: &CatalogError) {
    match e {
        CatalogError::Malformed { message, location } => {
            error!(%location, %message, "catalog parsing error");
        }
        CatalogError::Io(err) => error!(error = %err, "I/O error reading catalog"),
        CatalogError::Unexpected(message) => {
            error!(%message, "unexpected error while decoding catalog");
        }
    }
}

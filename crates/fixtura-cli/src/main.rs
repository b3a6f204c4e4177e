mod logging;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fixtura_catalog::{
    CatalogError, ValidationReport, catalog_json_schema, load_catalog, load_document,
    validate_catalog_document,
};
use fixtura_core::TypeRef;
use fixtura_generate::{CircularPolicy, ConfigurationBuilder, Fixture, FixtureError};
use logging::{LogFormat, init_logging};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Fixture(#[from] FixtureError),
    #[error("type error: {0}")]
    Type(#[from] fixtura_core::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("catalog has {0} error(s)")]
    InvalidCatalog(usize),
}

#[derive(Parser, Debug)]
#[command(name = "fixtura", version, about = "Random test fixtures from declared types")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate values of a type, one JSON document per line.
    Generate(GenerateArgs),
    /// Validate a catalog file.
    Validate(ValidateArgs),
    /// Print the catalog JSON Schema.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Catalog declaring the types to generate (.json or .toml).
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Type expression to generate, e.g. 'List<Order>'.
    #[arg(long = "type", value_name = "TYPE")]
    ty: String,
    /// Number of values to generate.
    #[arg(long, default_value_t = 1)]
    count: usize,
    /// Pretty-print each value.
    #[arg(long, default_value_t = false)]
    pretty: bool,
    #[arg(long)]
    collection_min: Option<usize>,
    #[arg(long)]
    collection_max: Option<usize>,
    #[arg(long)]
    null_probability: Option<f64>,
    #[arg(long)]
    recursion_limit: Option<usize>,
    /// Deepest nesting of requests before the circular policy applies.
    #[arg(long)]
    max_depth: Option<usize>,
    /// What to do when a type recursively requires itself.
    #[arg(long, value_enum)]
    circular: Option<CircularArg>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long)]
    catalog: PathBuf,
    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CircularArg {
    Unresolved,
    Null,
}

impl From<CircularArg> for CircularPolicy {
    fn from(arg: CircularArg) -> Self {
        match arg {
            CircularArg::Unresolved => CircularPolicy::Unresolved,
            CircularArg::Null => CircularPolicy::Null,
        }
    }
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_file.as_deref())?;

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Validate(args) => run_validate(args),
        Command::Schema => run_schema(),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let request = TypeRef::parse(&args.ty)?;

    let mut builder = match &args.catalog {
        Some(path) => {
            let validated = load_catalog(path)?;
            for warning in &validated.warnings {
                tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
            }
            validated.catalog.configuration_builder()?
        }
        None => ConfigurationBuilder::new(),
    };
    builder = apply_overrides(builder, &args);
    let fixture = Fixture::new(builder.build()?);

    let sequence = fixture.create_many(&request).limit(args.count);
    tracing::info!(
        event = "generation_started",
        request = %sequence.request(),
        count = args.count
    );
    let timer = Instant::now();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for value in sequence.iter() {
        let json = value?.to_json();
        if args.pretty {
            serde_json::to_writer_pretty(&mut out, &json)?;
        } else {
            serde_json::to_writer(&mut out, &json)?;
        }
        writeln!(out)?;
    }
    out.flush()?;

    tracing::info!(
        event = "generation_finished",
        count = args.count,
        duration_ms = timer.elapsed().as_millis()
    );
    Ok(())
}

fn apply_overrides(builder: ConfigurationBuilder, args: &GenerateArgs) -> ConfigurationBuilder {
    let mut options = builder.current_options().clone();
    if let Some(min) = args.collection_min {
        options.collection_min = min;
    }
    if let Some(max) = args.collection_max {
        options.collection_max = max;
    }
    if let Some(probability) = args.null_probability {
        options.null_probability = probability;
    }
    if let Some(limit) = args.recursion_limit {
        options.recursion_limit = limit;
    }
    if let Some(depth) = args.max_depth {
        options.max_depth = depth;
    }
    if let Some(circular) = args.circular {
        options.circular_policy = circular.into();
    }
    builder.options(options)
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let document = load_document(&args.catalog)?;
    let report = match validate_catalog_document(&document) {
        Ok(validated) => ValidationReport {
            errors: Vec::new(),
            warnings: validated.warnings,
        },
        Err(report) => report,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_ok() && report.warnings.is_empty() {
        println!("catalog validated successfully");
    } else {
        print_report(&report);
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(CliError::InvalidCatalog(report.errors.len()))
    }
}

fn run_schema() -> Result<(), CliError> {
    let schema = catalog_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
    for issue in &report.warnings {
        eprintln!("warning {} {}: {}", issue.code, issue.path, issue.message);
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_arguments_parse() {
        let cli = Cli::try_parse_from([
            "fixtura",
            "--log-format",
            "json",
            "generate",
            "--type",
            "List<Order>",
            "--count",
            "3",
            "--circular",
            "null",
        ])
        .expect("parse arguments");
        assert_eq!(cli.log_format, LogFormat::Json);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.ty, "List<Order>");
        assert_eq!(args.count, 3);
        assert!(matches!(args.circular, Some(CircularArg::Null)));
    }

    #[test]
    fn flags_override_catalog_options() {
        let cli = Cli::try_parse_from([
            "fixtura",
            "generate",
            "--type",
            "u8",
            "--collection-max",
            "2",
            "--recursion-limit",
            "1",
            "--max-depth",
            "8",
        ])
        .expect("parse arguments");
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let builder = apply_overrides(ConfigurationBuilder::new().collection_size(1, 9), &args);
        let configuration = builder.build().expect("build configuration");
        assert_eq!(configuration.options().collection_min, 1);
        assert_eq!(configuration.options().collection_max, 2);
        assert_eq!(configuration.options().recursion_limit, 1);
        assert_eq!(configuration.options().max_depth, 8);
    }
}

//! csvq CLI: run YAML pipelines or one-off queries over a CSV file.

use clap::{Parser, Subcommand};
use csvq_core::compare::Comparator;
use csvq_core::condition::Query;
use csvq_core::config::{parse_delimiter, EngineConfig};
use csvq_core::diagnostics::Policy;
use csvq_exec::{Engine, RunReport};
use csvq_planner::{
    explain, parse_yaml_pipeline, ParsedPipeline, PipelineConfig, PlanStep, SinkFormat, SinkSpec,
    SourceSpec,
};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvq")]
#[command(about = "csvq: MongoDB-style queries over CSV tables", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// strict or lenient (overrides config)
        #[arg(long)]
        policy: Option<String>,
    },

    /// Validate a pipeline YAML file (syntax check)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the steps of a pipeline and which queries use the index
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Query a CSV file directly
    Query {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Condition tree as JSON, e.g. '{"age": {"gte": 30}}'
        #[arg(short = 'w', long = "where")]
        condition: Option<String>,

        /// Index the table on this field before querying
        #[arg(long)]
        index: Option<String>,

        /// Comparator for the index (integer, float, string, date:<fmt>)
        #[arg(long)]
        comparison: Option<String>,

        /// Comma-separated fields to keep
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Return at most one row
        #[arg(long)]
        one: bool,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// csv, jsonl or table
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Field delimiter for input and CSV output
        #[arg(short, long)]
        delimiter: Option<String>,

        /// strict or lenient
        #[arg(long)]
        policy: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { pipeline, policy } => {
            if let Err(e) = run_pipeline(&pipeline, policy.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Query {
            input,
            condition,
            index,
            comparison,
            select,
            one,
            output,
            format,
            delimiter,
            policy,
        } => {
            let args = QueryArgs {
                input,
                condition,
                index,
                comparison,
                select,
                one,
                output,
                format,
                delimiter,
                policy,
            };
            if let Err(e) = run_query(args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so console sinks keep stdout to themselves.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Env defaults, then the pipeline's `config:` section.
fn resolve_config(doc: &PipelineConfig) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = EngineConfig::from_env();
    doc.apply_to(&mut config)?;
    tracing::debug!(
        policy = %config.policy,
        delimiter = ?config.delimiter,
        default_comparison = %config.default_comparison,
        "resolved config"
    );
    Ok(config)
}

fn run_pipeline(
    pipeline_path: &PathBuf,
    policy: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;

    let mut config = resolve_config(&parsed.config)?;
    if let Some(p) = policy {
        config.policy = p.parse::<Policy>()?;
    }

    let engine = Engine::new(config)?;
    let report = engine.run(&parsed)?;
    print_summary(&report);
    Ok(())
}

fn validate_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    resolve_config(&parsed.config)?;
    Ok(())
}

fn explain_pipeline(pipeline_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let config = resolve_config(&parsed.config)?;
    let default = config.default_comparator()?;

    println!("Pipeline Plan");
    println!("=============");
    println!();
    println!("Source: {}", parsed.source.path);
    println!("Policy: {}", config.policy);
    println!("Default comparison: {}", default.name());
    println!();
    for step in explain(&parsed, &default) {
        println!("  {}", step);
    }
    Ok(())
}

struct QueryArgs {
    input: PathBuf,
    condition: Option<String>,
    index: Option<String>,
    comparison: Option<String>,
    select: Vec<String>,
    one: bool,
    output: Option<String>,
    format: String,
    delimiter: Option<String>,
    policy: Option<String>,
}

fn run_query(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = EngineConfig::from_env();
    if let Some(p) = &args.policy {
        config.policy = p.parse::<Policy>()?;
    }
    if let Some(d) = &args.delimiter {
        config.delimiter = parse_delimiter(d)?;
    }

    let pipeline = query_pipeline(&args)?;
    let engine = Engine::new(config)?;
    let report = engine.run(&pipeline)?;
    if args.output.is_some() {
        print_summary(&report);
    } else {
        print_warnings(&report);
    }
    Ok(())
}

/// Lower the `query` flags to the same pipeline a YAML file would give.
fn query_pipeline(args: &QueryArgs) -> Result<ParsedPipeline, Box<dyn std::error::Error>> {
    let mut steps = Vec::new();

    if let Some(field) = &args.index {
        let comparator = args
            .comparison
            .as_deref()
            .map(str::parse::<Comparator>)
            .transpose()?;
        steps.push(PlanStep::Index {
            field: field.clone(),
            comparator,
        });
    }

    let query = args
        .condition
        .as_deref()
        .map(Query::from_json_str)
        .transpose()?;
    if query.is_some() || args.one {
        steps.push(PlanStep::Query {
            query,
            limit_one: args.one,
        });
    }

    if !args.select.is_empty() {
        steps.push(PlanStep::Select {
            fields: args.select.clone(),
        });
    }

    steps.push(PlanStep::Sink(SinkSpec {
        destination: args.output.clone().filter(|d| d != "-"),
        format: args.format.parse::<SinkFormat>()?,
        delimiter: None,
        fields: None,
    }));

    Ok(ParsedPipeline {
        config: PipelineConfig::default(),
        source: SourceSpec {
            path: args.input.to_string_lossy().into_owned(),
            delimiter: None,
        },
        steps,
    })
}

fn print_summary(report: &RunReport) {
    eprintln!("✓ Pipeline executed successfully");
    eprintln!("  Duration: {}ms", report.elapsed_ms);
    eprintln!("  Rows: {} in, {} out", report.source_rows, report.rows_out());
    for step in &report.steps {
        eprintln!(
            "  [{}] {:<15} {} -> {} rows",
            step.position, step.op, step.rows_in, step.rows_out
        );
    }
    print_warnings(report);
}

fn print_warnings(report: &RunReport) {
    if report.warnings.is_empty() {
        return;
    }
    eprintln!("  Warnings: {}", report.warnings.len());
    for w in &report.warnings {
        eprintln!("    - {}", w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str) -> QueryArgs {
        QueryArgs {
            input: PathBuf::from(input),
            condition: None,
            index: None,
            comparison: None,
            select: Vec::new(),
            one: false,
            output: None,
            format: "csv".into(),
            delimiter: None,
            policy: None,
        }
    }

    #[test]
    fn pipeline_config_overrides_env_defaults() {
        let mut config = EngineConfig::default();
        let pipeline = PipelineConfig {
            policy: Some(Policy::Strict),
            default_comparison: Some("integer".into()),
            ..Default::default()
        };
        pipeline.apply_to(&mut config).unwrap();
        assert_eq!(config.policy, Policy::Strict);
        assert_eq!(config.default_comparison, "integer");
        assert_eq!(config.delimiter, ',');
    }

    #[test]
    fn cli_overrides_higher_priority_than_config() {
        let mut config = EngineConfig::default();
        let pipeline = PipelineConfig {
            policy: Some(Policy::Strict),
            ..Default::default()
        };
        pipeline.apply_to(&mut config).unwrap();
        assert_eq!(config.policy, Policy::Strict);

        // Simulate CLI override after config
        config.policy = "lenient".parse().unwrap();
        assert_eq!(config.policy, Policy::Lenient);
    }

    #[test]
    fn query_flags_lower_to_steps() {
        let mut a = args("people.csv");
        a.index = Some("age".into());
        a.comparison = Some("integer".into());
        a.condition = Some(r#"{"age": {"gte": 30}}"#.into());
        a.select = vec!["name".into()];
        a.one = true;
        a.output = Some("-".into());

        let p = query_pipeline(&a).unwrap();
        let names: Vec<_> = p.steps.iter().map(PlanStep::name).collect();
        assert_eq!(names, ["index", "query_one", "select", "sink"]);
        assert_eq!(
            p.steps[0],
            PlanStep::Index {
                field: "age".into(),
                comparator: Some(Comparator::Integer)
            }
        );
        match &p.steps[3] {
            PlanStep::Sink(s) => {
                assert_eq!(s.destination, None);
                assert_eq!(s.format, SinkFormat::Csv);
            }
            other => panic!("expected sink, got {:?}", other),
        }
    }

    #[test]
    fn bare_query_is_just_a_sink() {
        let p = query_pipeline(&args("a.csv")).unwrap();
        assert_eq!(p.steps.len(), 1);
        assert_eq!(p.source.path, "a.csv");
    }

    #[test]
    fn bad_query_flags_are_rejected() {
        let mut a = args("a.csv");
        a.condition = Some("[1, 2]".into());
        assert!(query_pipeline(&a).is_err());

        let mut a = args("a.csv");
        a.format = "parquet".into();
        assert!(query_pipeline(&a).is_err());

        let mut a = args("a.csv");
        a.index = Some("n".into());
        a.comparison = Some("roman".into());
        assert!(query_pipeline(&a).is_err());
    }

    #[test]
    fn cli_parses_query_subcommand() {
        let cli = Cli::try_parse_from([
            "csvq", "query", "--input", "a.csv", "--where", "{\"n\": 1}", "--select", "a,b",
            "--one",
        ])
        .unwrap();
        match cli.command {
            Commands::Query {
                select, one, format, ..
            } => {
                assert_eq!(select, ["a", "b"]);
                assert!(one);
                assert_eq!(format, "table");
            }
            _ => panic!("expected query"),
        }
    }
}

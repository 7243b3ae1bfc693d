//! Adjust CLI — query apps, KPI reports, and app settings from the terminal.

mod output;

use adjust_lib::helpers::parse_date_arg;
use adjust_lib::{
    flatten_result_set, infer_grouping, infer_meta_paths, ArgumentError, Client, Config,
    KpiQuery, Report,
};
use clap::{Args, Parser, Subcommand};
use output::OutputFormat;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adjust")]
#[command(about = "Adjust CLI — query apps, KPIs, events, and cohorts", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable), json (structured).
    #[arg(short, long, env = "ADJUST_OUTPUT", default_value = "plain", value_enum, global = true)]
    output: OutputFormat,

    /// Log requests and parse summaries to stderr. RUST_LOG takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List applications
    Apps,
    /// Show one application
    App { app_token: String },
    /// Show raw export settings of an app
    RawExportSettings { app_token: String },
    /// Update raw export settings from a JSON file (as printed by `raw-export-settings -o json`)
    UpdateRawExportSettings { app_token: String, file: PathBuf },
    /// List callbacks of an app
    Callbacks { app_token: String },
    /// KPI report (deliverables)
    Kpis(ReportArgs),
    /// Event report
    Events(ReportArgs),
    /// Cohort report
    Cohorts(ReportArgs),
    /// Print grouping and meta paths of a saved KPI response (offline)
    Shape { file: PathBuf },
    /// Show version
    Version,
}

#[derive(Args)]
struct ReportArgs {
    /// App token; repeat or comma-separate for several apps
    #[arg(long = "app-token", required = true, value_delimiter = ',')]
    app_tokens: Vec<String>,
    /// Tracker token; repeat or comma-separate
    #[arg(long = "tracker", value_delimiter = ',')]
    trackers: Vec<String>,
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
    /// KPIs, e.g. installs,sessions
    #[arg(long, value_delimiter = ',')]
    kpis: Vec<String>,
    /// Grouping dimensions, e.g. apps,trackers
    #[arg(long, value_delimiter = ',')]
    grouping: Vec<String>,
    /// Extra query parameter KEY=VALUE (repeatable), e.g. countries=de,gb
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,
    /// Fetch the CSV rendition instead of JSON
    #[arg(long, conflicts_with = "flat")]
    csv: bool,
    /// Flatten the result set into one row per leaf
    #[arg(long)]
    flat: bool,
}

impl ReportArgs {
    fn to_query(&self) -> Result<KpiQuery, ArgumentError> {
        let mut q = KpiQuery::new(self.app_tokens.iter().cloned())
            .kpis(self.kpis.iter().cloned())
            .grouping(self.grouping.iter().cloned());
        if !self.trackers.is_empty() {
            q = q.trackers(self.trackers.iter().cloned());
        }
        if let Some(ref d) = self.start_date {
            q = q.start_date(parse_date_arg("start_date", d)?);
        }
        if let Some(ref d) = self.end_date {
            q = q.end_date(parse_date_arg("end_date", d)?);
        }
        for (k, v) in &self.params {
            q = q.param(k.as_str(), v.as_str());
        }
        Ok(q)
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    if k.trim().is_empty() {
        return Err(format!("empty parameter name in `{}`", s));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command, cli.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "adjust_lib=debug,adjust=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cmd: Commands, format: OutputFormat) -> Result<(), String> {
    // Offline commands need no token.
    match cmd {
        Commands::Version => {
            println!("adjust {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Shape { ref file } => {
            let data = read_json(file)?;
            return output::print(&describe_shape(&data), format);
        }
        _ => {}
    }

    let config = Config::from_env().map_err(|e| e.to_string())?;
    tracing::debug!(source = ?config.token_source, api_base = %config.api_base, "resolved configuration");
    let client = Client::from_config(config).map_err(|e| e.to_string())?;

    match cmd {
        Commands::Apps => {
            let apps = client.list_apps().map_err(|e| e.to_string())?;
            output::print(&to_value(&apps)?, format)?;
        }
        Commands::App { app_token } => {
            let app = client.get_app(&app_token).map_err(|e| e.to_string())?;
            output::print(&app, format)?;
        }
        Commands::RawExportSettings { app_token } => {
            let settings = client
                .get_raw_export_settings(&app_token)
                .map_err(|e| e.to_string())?;
            output::print(&settings, format)?;
        }
        Commands::UpdateRawExportSettings { app_token, file } => {
            let settings = read_json(&file)?;
            let res = client
                .update_raw_export_settings(&app_token, settings)
                .map_err(|e| e.to_string())?;
            output::print(&res, format)?;
        }
        Commands::Callbacks { app_token } => {
            let callbacks = client.list_callbacks(&app_token).map_err(|e| e.to_string())?;
            output::print(&callbacks, format)?;
        }
        Commands::Kpis(args) => report(&client, Report::Kpis, &args, format)?,
        Commands::Events(args) => report(&client, Report::Events, &args, format)?,
        Commands::Cohorts(args) => report(&client, Report::Cohorts, &args, format)?,
        Commands::Shape { .. } | Commands::Version => {}
    }
    Ok(())
}

fn report(
    client: &Client,
    report: Report,
    args: &ReportArgs,
    format: OutputFormat,
) -> Result<(), String> {
    let query = args.to_query().map_err(|e| e.to_string())?;
    let service = client.kpi_service(query);
    if args.csv {
        let csv = service.fetch_csv(report).map_err(|e| e.to_string())?;
        print!("{}", csv);
        return Ok(());
    }
    let result = service.fetch(report).map_err(|e| e.to_string())?;
    if args.flat {
        let rows = flatten_result_set(
            &Value::Object(result.result_set),
            &result.result_parameters.kpis,
        );
        let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
        return output::print(&rows, format);
    }
    output::print(&to_value(&result)?, format)
}

/// Grouping and meta paths of a KPI response or of a bare result set.
fn describe_shape(data: &Value) -> Value {
    let result_set = data.get("result_set").unwrap_or(data);
    json!({
        "grouping": infer_grouping(result_set),
        "meta_paths": infer_meta_paths(result_set)
            .into_iter()
            .map(|p| p.join("."))
            .collect::<Vec<_>>(),
    })
}

fn read_json(path: &Path) -> Result<Value, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("{} is not valid JSON: {}", path.display(), e))
}

fn to_value<T: serde::Serialize>(v: &T) -> Result<Value, String> {
    serde_json::to_value(v).map_err(|e| e.to_string())
}

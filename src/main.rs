use clap::{Parser, Subcommand};
use saferoad_guardian::pipeline::services::reporting::{authority_email, sign_notice};
use saferoad_guardian::{
    AppError, Configuration, GeoPoint, ImageReference, MemoryBank, MemoryRecord, PipelineFactory,
    RunOutcome, WorkflowState,
};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn, Level};

const DEFAULT_GPS: &str = "6.9271,79.8612";

/// SafeRoad Guardian - road hazard detection and deduplicated authority reporting
#[derive(Parser, Debug)]
#[command(name = "saferoad-guardian")]
#[command(version)]
#[command(about = "Turns road photos into hazard alerts and authority reports")]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace-level logging
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one road photo and report any new hazard
    Analyze {
        image: PathBuf,
        /// GPS fix as "lat,lon"
        #[arg(long, default_value = DEFAULT_GPS)]
        gps: GeoPoint,
    },
    /// Show past reports near a location
    History {
        #[arg(long)]
        gps: GeoPoint,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List every stored report, newest first
    Reports {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn init_logging(args: &Args, configuration: &Configuration) {
    let level = if args.trace {
        Level::TRACE
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::from_str(&configuration.logging.level).unwrap_or(Level::INFO)
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let configuration = Configuration::load(args.config.as_deref())?;
    init_logging(&args, &configuration);

    if configuration.advisory.enabled {
        warn!("advisory.enabled only applies to library callers that supply a text generator");
    }

    let factory = PipelineFactory::new(configuration);
    match args.command {
        Command::Analyze { image, gps } => analyze(&factory, image, gps).await,
        Command::History { gps, limit } => {
            let limit = limit.unwrap_or(factory.configuration().memory.history_limit);
            let records = factory.open_memory()?.location_history(gps, limit).await?;
            let radius_m = factory.configuration().memory.proximity_radius_m;
            println!("Reports within {}m of {}:", radius_m, gps);
            print_records(&records);
            Ok(())
        }
        Command::Reports { limit } => {
            let records = factory.open_memory()?.all_reports(limit).await?;
            print_records(&records);
            Ok(())
        }
    }
}

async fn analyze(factory: &PipelineFactory, image: PathBuf, gps: GeoPoint) -> Result<(), AppError> {
    let engine = factory.build()?;
    info!("Analyzing {} at {}", image.display(), gps);
    let state = engine.run(ImageReference::from_path(image), gps).await;

    match state.outcome() {
        RunOutcome::Reported => print_report(&state),
        RunOutcome::ReportedWithError(kind) => {
            print_report(&state);
            if let Some(error) = state.error() {
                eprintln!("Reported with {:?}: {}", kind, error);
            }
        }
        RunOutcome::Suppressed | RunOutcome::NotReportable => {
            let window_days = factory.configuration().memory.dedup_window_days;
            for line in quiet_outcome_lines(&state, window_days) {
                println!("{}", line);
            }
        }
        RunOutcome::Failed(kind) => {
            let message = state
                .error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("{:?}", kind));
            return Err(AppError::Pipeline(message));
        }
    }
    Ok(())
}

/// What to tell the driver when no authority report goes out
fn quiet_outcome_lines(state: &WorkflowState, window_days: i64) -> Vec<String> {
    let mut lines = Vec::new();
    if state.outcome() == RunOutcome::Suppressed {
        lines.push(format!(
            "{} hazard at {} was already reported in the last {} days. No new report.",
            state.severity(),
            state.location(),
            window_days
        ));
    }
    match sign_notice(state.detections()) {
        Some(notice) => {
            lines.push(format!("ROAD SIGN ALERT: {}", notice));
            lines.push("Informational only, no authority report needed.".to_string());
        }
        None if lines.is_empty() => {
            lines.push(format!("No reportable hazard detected ({}).", state.severity()));
        }
        None => {}
    }
    lines
}

fn print_report(state: &WorkflowState) {
    let Some(report) = state.report() else {
        println!("Hazard recorded but no report could be rendered.");
        return;
    };
    println!("{}", report.text);
    println!();
    println!("VOICE ALERT: {}", report.voice_text);
    println!();
    println!("{}", authority_email(&report.payload));
}

fn print_records(records: &[MemoryRecord]) {
    if records.is_empty() {
        println!("  (none)");
        return;
    }
    for record in records {
        println!(
            "  {} | {} | {} | {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.location,
            record.summary,
            record.image_reference
        );
    }
}

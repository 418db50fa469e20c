use clap::{Parser, Subcommand, ValueEnum};
use sf_app::{
    AppError, AppResult, RunRequest, WorkflowOptions, WorkflowProgressEvent, WorkflowStage,
    workflow,
};
use sf_core::Centering;
use sf_results::{RunParameters, StageTimings};
use sf_series::{PipelineConfig, ProgressEvent, RunSummary};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(about = "snapflow CLI - structured-grid snapshot post-processing", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-field statistics of a snapshot directory
    Ingest {
        /// Directory holding the snapshot files
        snapshot_dir: PathBuf,
        /// Solver log to parse for the energy table
        #[arg(long)]
        log: Option<PathBuf>,
        /// Pipeline configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the summary as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Pack every snapshot into a per-timestep bundle file
    Pack {
        /// Directory holding the snapshot files
        snapshot_dir: PathBuf,
        /// Directory to write bundles into
        out_dir: PathBuf,
        /// Pipeline configuration (YAML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Process a solver run: bundles, statistics, archives and run record
    Process(ProcessArgs),
    /// List processed runs
    Runs {
        /// Output directory given to `process`
        output_dir: PathBuf,
    },
    /// Show details of a processed run
    ShowRun {
        /// Output directory given to `process`
        output_dir: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one field's max/mean/min series from a run as CSV
    ExportSeries {
        /// Output directory given to `process`
        output_dir: PathBuf,
        /// Run ID
        run_id: String,
        /// Field name (e.g., velocity_magnitude, density)
        field: String,
        #[arg(long, value_enum, default_value_t = CenteringArg::Point)]
        centering: CenteringArg,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Directory holding the snapshot files
    snapshot_dir: PathBuf,
    /// Directory that receives `runs/<run_id>/`
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Solver log to parse and archive
    #[arg(long)]
    log: Option<PathBuf>,
    /// Pipeline configuration (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    x_cells: Option<u64>,
    #[arg(long)]
    y_cells: Option<u64>,
    #[arg(long)]
    end_step: Option<u64>,
    #[arg(long)]
    visit_frequency: Option<u64>,
    /// Solver parameter as name=value, repeatable
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,
    /// Solver wall time in seconds, recorded with the run
    #[arg(long)]
    simulation_s: Option<f64>,
    /// Skip cache and force re-processing
    #[arg(long)]
    no_cache: bool,
    /// Do not archive snapshots and bundles
    #[arg(long)]
    no_archive: bool,
    /// Keep snapshots and bundles after archiving
    #[arg(long)]
    keep_originals: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CenteringArg {
    Point,
    Cell,
}

impl From<CenteringArg> for Centering {
    fn from(arg: CenteringArg) -> Self {
        match arg {
            CenteringArg::Point => Centering::Point,
            CenteringArg::Cell => Centering::Cell,
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Ok((name.trim().to_string(), value))
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Ingest {
            snapshot_dir,
            log,
            config,
            output,
        } => cmd_ingest(&snapshot_dir, log.as_deref(), config.as_deref(), output.as_deref()),
        Commands::Pack {
            snapshot_dir,
            out_dir,
            config,
        } => cmd_pack(&snapshot_dir, &out_dir, config.as_deref()),
        Commands::Process(args) => cmd_process(args),
        Commands::Runs { output_dir } => cmd_runs(&output_dir),
        Commands::ShowRun { output_dir, run_id } => cmd_show_run(&output_dir, &run_id),
        Commands::ExportSeries {
            output_dir,
            run_id,
            field,
            centering,
            output,
        } => cmd_export_series(
            &output_dir,
            &run_id,
            &field,
            centering.into(),
            output.as_deref(),
        ),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::load(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_ingest(
    snapshot_dir: &Path,
    log: Option<&Path>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    let summary = workflow::ingest(snapshot_dir, log, load_config(config)?)?;
    print_summary(&summary);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        std::fs::write(path, json)?;
        println!("\n✓ Summary written to {}", path.display());
    }
    Ok(())
}

fn cmd_pack(snapshot_dir: &Path, out_dir: &Path, config: Option<&Path>) -> AppResult<()> {
    let paths = workflow::pack_to(snapshot_dir, out_dir, load_config(config)?)?;
    println!("✓ Wrote {} bundles to {}", paths.len(), out_dir.display());
    Ok(())
}

fn cmd_process(args: ProcessArgs) -> AppResult<()> {
    println!("Processing snapshots in: {}", args.snapshot_dir.display());

    let request = RunRequest {
        snapshot_dir: &args.snapshot_dir,
        log_path: args.log.as_deref(),
        output_dir: &args.output_dir,
        config: load_config(args.config.as_deref())?,
        parameters: RunParameters {
            x_cells: args.x_cells,
            y_cells: args.y_cells,
            end_step: args.end_step,
            visit_frequency: args.visit_frequency,
            solver: args.params.into_iter().collect(),
        },
        simulation_s: args.simulation_s,
        options: WorkflowOptions {
            use_cache: !args.no_cache,
            archive: !args.no_archive,
            remove_originals: !args.keep_originals,
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = workflow::process_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run processed: {}", response.run_id);
    }
    println!("  Run directory: {}", response.run_dir.display());
    for name in &response.record.archives {
        println!("  Archive: {}", name);
    }
    print_summary(&response.summary);
    print_timing_summary(&response.timing);
    Ok(())
}

fn cmd_runs(output_dir: &Path) -> AppResult<()> {
    let runs = workflow::list_runs(output_dir)?;
    if runs.is_empty() {
        println!("No processed runs in: {}", output_dir.display());
    } else {
        println!("Processed runs:");
        for record in runs {
            println!(
                "  {} ({}, {} snapshots)",
                record.run_id, record.timestamp, record.snapshot_count
            );
        }
    }
    Ok(())
}

fn cmd_show_run(output_dir: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (record, summary) = workflow::load_run(output_dir, run_id)?;

    println!("\nRun record:");
    println!("  Timestamp: {}", record.timestamp);
    let p = &record.parameters;
    if let (Some(x), Some(y)) = (p.x_cells, p.y_cells) {
        println!("  Grid: {} x {} cells", x, y);
    }
    if let Some(end_step) = p.end_step {
        println!("  End step: {}", end_step);
    }
    if let Some(freq) = p.visit_frequency {
        println!("  Visit frequency: {}", freq);
    }
    for (name, value) in &p.solver {
        println!("  {}: {}", name, value);
    }
    println!(
        "  Snapshots: {} processed, {} skipped",
        record.snapshot_count, record.skipped_count
    );
    for name in &record.archives {
        println!("  Archive: {}", name);
    }

    print_summary(&summary);
    print_timing_summary(&record.timings);
    Ok(())
}

fn cmd_export_series(
    output_dir: &Path,
    run_id: &str,
    field: &str,
    centering: Centering,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_record, summary) = workflow::load_run(output_dir, run_id)?;
    let series = summary.field(centering, field).ok_or_else(|| {
        AppError::InvalidInput(format!("run has no {} field '{}'", centering, field))
    })?;

    let mut csv = String::from("timestep,max,mean,min\n");
    for sample in &series.samples {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            sample.timestep, sample.max, sample.mean, sample.min
        ));
    }

    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!(
            "✓ Exported {} data points to {}",
            series.samples.len(),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    match (summary.timesteps.first(), summary.timesteps.last()) {
        (Some(first), Some(last)) => println!(
            "  Timesteps: {} ({} - {})",
            summary.timesteps.len(),
            first,
            last
        ),
        _ => println!("  Timesteps: 0"),
    }
    for series in &summary.fields {
        if let Some((max, mean, min)) = series.overall() {
            println!(
                "  {:<24} {:<5}  max={:.6e}  mean={:.6e}  min={:.6e}",
                series.name, series.centering, max, mean, min
            );
        }
    }
    if let Some(energy) = &summary.energy {
        println!("  Energy records: {}", energy.len());
    }
    for skipped in &summary.skipped {
        println!(
            "  Skipped {} (timestep {}): {}",
            skipped.path.display(),
            skipped.timestep,
            skipped.reason
        );
    }
}

fn print_timing_summary(timing: &StageTimings) {
    println!("\nTiming summary:");
    if let Some(simulation_s) = timing.simulation_s {
        println!("  Simulation: {:.3}s", simulation_s);
    }
    let total = timing.total_s.max(1.0e-12);
    for (label, seconds) in [
        ("Ingestion", timing.ingestion_s),
        ("Packaging", timing.packaging_s),
        ("Archival", timing.archival_s),
    ] {
        println!(
            "  {:<10} {:.3}s ({:.1}%)",
            format!("{}:", label),
            seconds,
            100.0 * seconds / total
        );
    }
    println!("  Total:     {:.3}s", timing.total_s);
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &WorkflowProgressEvent) {
    match (&event.stage, &event.series) {
        (
            WorkflowStage::Ingesting,
            Some(ProgressEvent::SnapshotProcessed {
                timestep,
                completed,
                total,
            }),
        ) => {
            let width = 28usize;
            let fraction = *completed as f64 / (*total).max(1) as f64;
            let filled = ((fraction * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] {:>6.2}%  timestep={}  {}/{}  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled)),
                fraction * 100.0,
                timestep,
                completed,
                total,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        (_, Some(ProgressEvent::SnapshotSkipped { path, reason, .. })) => {
            clear_progress_line();
            println!("  ! skipped {}: {}", path.display(), reason);
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

mod error;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod trainer;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use crate::error::Result;
use crate::input::{TelemetryOptions, load_telemetry};
use crate::model::features::FeatureSchema;
use crate::pipeline::stage1_train::{Stage1Params, run_stage1};
use crate::pipeline::stage2_label::run_stage2;
use crate::pipeline::stage3_context::{CONTEXT_FILE_NAME, load_context, save_context};
use crate::pipeline::stage4_classify::{
    Classification, ClassifyError, category_counts, run_stage4,
};
use crate::pipeline::stage5_report::{
    ASSIGNMENTS_FILE_NAME, Stage5Input, format_session_line, write_assignments_tsv,
    write_reports,
};
use crate::trainer::ClusterModel;
use crate::trainer::kmeans::{
    DEFAULT_MAX_ITER, DEFAULT_TOLERANCE, Kmeans, KmeansModel, MODEL_FILE_NAME,
};

const TOOL_NAME: &str = "kira-playerskill";

#[derive(Debug, Parser)]
#[command(
    name = "kira-playerskill",
    version,
    about = "Player skill clustering and labeling"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a cluster model and resolve the good/bad clusters.
    Train(TrainArgs),
    /// Classify sessions against a saved model and label context.
    Classify(ClassifyArgs),
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// Telemetry CSV (optionally gzipped).
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value_t = 3)]
    clusters: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_ITER)]
    max_iter: usize,
    #[arg(long)]
    has_header: bool,
    /// Only write the model and label context.
    #[arg(long)]
    no_reports: bool,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    #[arg(long)]
    model: PathBuf,
    #[arg(long)]
    context: PathBuf,
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    has_header: bool,
    /// Also write assignments.tsv into this directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
struct TrainConfig {
    input: PathBuf,
    out_dir: PathBuf,
    clusters: usize,
    seed: u64,
    max_iter: usize,
    tolerance: f32,
    options: TelemetryOptions,
    write_reports: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct ClassifyConfig {
    model: PathBuf,
    context: PathBuf,
    input: PathBuf,
    options: TelemetryOptions,
    out_dir: Option<PathBuf>,
}

impl From<TrainArgs> for TrainConfig {
    fn from(args: TrainArgs) -> Self {
        Self {
            input: args.input,
            out_dir: args.out,
            clusters: args.clusters,
            seed: args.seed,
            max_iter: args.max_iter,
            tolerance: DEFAULT_TOLERANCE,
            options: TelemetryOptions {
                has_header: args.has_header,
            },
            write_reports: !args.no_reports,
        }
    }
}

impl From<ClassifyArgs> for ClassifyConfig {
    fn from(args: ClassifyArgs) -> Self {
        Self {
            model: args.model,
            context: args.context,
            input: args.input,
            options: TelemetryOptions {
                has_header: args.has_header,
            },
            out_dir: args.out,
        }
    }
}

fn main() {
    logging::init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train(args) => run_train(&args.into()),
        Command::Classify(args) => run_classify(&args.into()),
    }
}

fn run_train(config: &TrainConfig) -> Result<()> {
    let schema = FeatureSchema::player_telemetry_v1()?;
    let trainer = Kmeans::new(config.clusters)
        .with_seed(config.seed)
        .with_max_iter(config.max_iter)
        .with_tolerance(config.tolerance);

    let stage1 = run_stage1(
        &Stage1Params {
            input: &config.input,
            schema: &schema,
            options: config.options,
        },
        &trainer,
    )?;
    let model = &stage1.trained.model;

    let resolution = run_stage2(model.centroids(), &schema)?;
    let ctx = resolution.context();

    fs::create_dir_all(&config.out_dir)?;
    let model_path = config.out_dir.join(MODEL_FILE_NAME);
    model.save(&model_path)?;
    info!(path = %model_path.display(), "wrote model");
    save_context(&ctx, &config.out_dir.join(CONTEXT_FILE_NAME))?;

    if !config.write_reports {
        return Ok(());
    }

    let mut predictor = model.predictor();
    let classifications = run_stage4(predictor.as_mut(), &stage1.telemetry.sessions, &ctx)?;
    log_category_counts(&classifications);

    write_reports(
        &Stage5Input {
            telemetry: &stage1.telemetry,
            schema: &schema,
            centroids: model.centroids(),
            resolution: &resolution,
            assignments: &stage1.trained.assignments,
            classifications: &classifications,
            seed: config.seed,
            max_iter: config.max_iter,
            inertia: stage1.trained.inertia,
            tool_name: TOOL_NAME.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        &config.out_dir,
    )?;

    Ok(())
}

fn run_classify(config: &ClassifyConfig) -> Result<()> {
    let schema = FeatureSchema::player_telemetry_v1()?;
    let model = KmeansModel::load(&config.model)?;
    model.check_schema(&schema)?;
    let ctx = load_context(&config.context)?;
    ctx.validate(model.n_clusters()).map_err(ClassifyError::from)?;

    let telemetry = load_telemetry(&config.input, &schema, config.options)?;
    let mut predictor = model.predictor();
    let classifications = run_stage4(predictor.as_mut(), &telemetry.sessions, &ctx)?;
    log_category_counts(&classifications);

    let stdout = std::io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    for (session, c) in classifications.iter().enumerate() {
        writeln!(w, "{}", format_session_line(session, c))?;
    }
    w.flush()?;

    if let Some(out_dir) = &config.out_dir {
        fs::create_dir_all(out_dir)?;
        let path = out_dir.join(ASSIGNMENTS_FILE_NAME);
        write_assignments_tsv(&path, &telemetry.lines, &classifications)?;
        info!(path = %path.display(), "wrote assignments");
    }

    Ok(())
}

fn log_category_counts(classifications: &[Classification]) {
    for (category, count) in category_counts(classifications) {
        info!(category = category.as_str(), sessions = count, "classified");
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;

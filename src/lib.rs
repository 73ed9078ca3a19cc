//! Cocosplit: COCO annotations to a split YOLO dataset.
//!
//! Cocosplit converts COCO-style detection annotations into Ultralytics YOLO
//! label files and lays images out in deterministic train/val/test splits.
//! An existing split can later be halved into a new one, with the matching
//! COCO document partitioned alongside it.
//!
//! # Modules
//!
//! - [`ir`]: typed COCO records, the box codec and the class map
//! - [`split`]: split planning (seeded ratio split, even directory split)
//! - [`materialize`]: writing images, labels and descriptors to disk
//! - [`pipeline`]: the end-to-end `convert` run and its report
//! - [`inspect`]: read-only summary of a COCO document
//! - [`config`]: run configuration
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod inspect;
pub mod ir;
pub mod materialize;
pub mod pipeline;
pub mod split;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use config::{BoxPolicy, ConvertConfig, ResplitConfig, TransferMode};
pub use error::CocosplitError;

/// The cocosplit CLI application.
#[derive(Parser)]
#[command(name = "cocosplit")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert COCO annotations into a YOLO dataset with train/val(/test) splits.
    Convert(ConvertArgs),
    /// Move half of an existing split into a new split.
    Resplit(ResplitArgs),
    /// Summarize a COCO annotation file.
    Inspect(InspectArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// COCO annotation file for the training pool.
    #[arg(long, env = "COCOSPLIT_TRAIN_JSON")]
    train_json: PathBuf,

    /// Directory the training pool's file names are relative to.
    #[arg(long, env = "COCOSPLIT_TRAIN_IMAGES")]
    train_images: PathBuf,

    /// COCO annotation file for a separate test set.
    #[arg(long, requires = "test_images")]
    test_json: Option<PathBuf>,

    /// Directory the test set's file names are relative to.
    #[arg(long, requires = "test_json")]
    test_images: Option<PathBuf>,

    /// Dataset root to write splits and the descriptor into.
    #[arg(short, long, env = "COCOSPLIT_OUTPUT")]
    output: PathBuf,

    /// Fraction of the training pool held out for validation.
    #[arg(long, default_value_t = config::DEFAULT_VAL_RATIO)]
    val_ratio: f64,

    /// Seed for the validation split.
    #[arg(long, default_value_t = config::DEFAULT_SEED)]
    seed: u64,

    /// Copy images or move them out of the source directories.
    #[arg(long, value_enum, default_value_t = TransferArg::Copy)]
    transfer: TransferArg,

    /// Treatment of boxes that reach past the image border.
    #[arg(long, value_enum, default_value_t = BoxPolicyArg::Clamp)]
    box_policy: BoxPolicyArg,

    /// Fixed class vocabulary (YAML list of {id, name}, or a COCO JSON file).
    #[arg(long)]
    classes: Option<PathBuf>,

    /// File name of the dataset descriptor written into the output root.
    #[arg(long, default_value = config::DEFAULT_DESCRIPTOR_NAME)]
    descriptor_name: String,

    /// Check declared image sizes against the image files.
    #[arg(long)]
    verify_dimensions: bool,

    /// Output format for the report.
    #[arg(long = "report", value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct ResplitArgs {
    /// Dataset root containing the split directories.
    #[arg(long)]
    root: PathBuf,

    /// Split to take images from.
    #[arg(long, default_value = config::VAL_SPLIT)]
    from: String,

    /// Split to create.
    #[arg(long, default_value = config::TEST_SPLIT)]
    to: String,

    /// COCO annotation file covering the source split.
    #[arg(long, requires_all = ["moved_annotations", "kept_annotations"])]
    annotations: Option<PathBuf>,

    /// Where the moved images' annotations are written.
    #[arg(long, requires = "annotations")]
    moved_annotations: Option<PathBuf>,

    /// Where the remaining images' annotations are written.
    #[arg(long, requires = "annotations")]
    kept_annotations: Option<PathBuf>,

    /// Seed for choosing the moved half (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Descriptor whose split paths are refreshed.
    #[arg(long)]
    descriptor: Option<PathBuf>,

    /// Output format for the report.
    #[arg(long = "report", value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct InspectArgs {
    /// COCO annotation file to inspect.
    input: PathBuf,

    /// Box policy used to count encodable boxes.
    #[arg(long, value_enum, default_value_t = BoxPolicyArg::Clamp)]
    box_policy: BoxPolicyArg,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TransferArg {
    Copy,
    Move,
}

impl From<TransferArg> for TransferMode {
    fn from(value: TransferArg) -> Self {
        match value {
            TransferArg::Copy => TransferMode::Copy,
            TransferArg::Move => TransferMode::Move,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BoxPolicyArg {
    Clamp,
    Clip,
    Drop,
}

impl From<BoxPolicyArg> for BoxPolicy {
    fn from(value: BoxPolicyArg) -> Self {
        match value {
            BoxPolicyArg::Clamp => BoxPolicy::Clamp,
            BoxPolicyArg::Clip => BoxPolicy::Clip,
            BoxPolicyArg::Drop => BoxPolicy::Drop,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the cocosplit CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocosplitError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Resplit(args) => run_resplit(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), CocosplitError> {
    let mut config = ConvertConfig::new(args.train_json, args.train_images, args.output);
    config.test_json = args.test_json;
    config.test_images = args.test_images;
    config.val_ratio = args.val_ratio;
    config.seed = args.seed;
    config.transfer = args.transfer.into();
    config.box_policy = args.box_policy.into();
    config.vocabulary = args.classes;
    config.descriptor_name = args.descriptor_name;
    config.verify_dimensions = args.verify_dimensions;

    let report = pipeline::run_convert(&config)?;

    match args.report {
        ReportFormat::Json => print_json(&report)?,
        ReportFormat::Text => {
            println!(
                "Converted {} -> {}",
                config.train_json.display(),
                config.output_root.display()
            );
            print!("{}", report);
        }
    }
    Ok(())
}

fn run_resplit(args: ResplitArgs) -> Result<(), CocosplitError> {
    let mut config = ResplitConfig::new(args.root);
    config.from = args.from;
    config.to = args.to;
    config.seed = args.seed;
    config.descriptor = args.descriptor;
    config.annotations = match (args.annotations, args.moved_annotations, args.kept_annotations) {
        (Some(source), Some(moved_output), Some(kept_output)) => {
            Some(config::AnnotationResplit {
                source,
                moved_output,
                kept_output,
            })
        }
        (None, None, None) => None,
        _ => {
            return Err(CocosplitError::InvalidConfig {
                message: "--annotations, --moved-annotations and --kept-annotations go together"
                    .to_string(),
            })
        }
    };

    let outcome = materialize::resplit_directory(&config)?;

    match (args.report, outcome) {
        (ReportFormat::Json, materialize::ResplitOutcome::Moved(report)) => print_json(&report)?,
        (ReportFormat::Text, materialize::ResplitOutcome::Moved(report)) => print!("{}", report),
        (_, materialize::ResplitOutcome::AlreadySplit { destination }) => {
            println!(
                "Skipped: {} is already populated, nothing was moved",
                destination.display()
            );
        }
        (_, materialize::ResplitOutcome::InsufficientData { available }) => {
            println!(
                "Skipped: '{}' holds {} image(s), not enough to split",
                config.from, available
            );
        }
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), CocosplitError> {
    let doc = ir::io_coco_json::read_coco_json(&args.input)?;
    let opts = inspect::InspectOptions {
        box_policy: args.box_policy.into(),
        ..Default::default()
    };
    let report = inspect::inspect_document(&doc, &opts);

    match args.output {
        ReportFormat::Json => print_json(&report)?,
        ReportFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CocosplitError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| CocosplitError::ReportSerialize { source })?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn unserializable_report_is_a_report_error() {
        // JSON object keys must be strings
        let report: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);
        let err = print_json(&report).unwrap_err();
        assert!(matches!(err, CocosplitError::ReportSerialize { .. }));
    }
}

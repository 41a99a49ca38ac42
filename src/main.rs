use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use glyph_perceptron::data::loader::{LoadOptions, WriteBack};
use glyph_perceptron::driver::{self, DriverConfig, ErrorPolicy};
use glyph_perceptron::{AccumulatorMode, ModelRecord};

#[derive(Parser)]
#[command(name = "glyph-perceptron")]
#[command(about = "Train and query single-character glyph perceptrons")]
#[command(version)]
struct Cli {
    /// Keep image files untouched instead of overwriting them with the
    /// normalized version
    #[arg(long, global = true)]
    no_write_back: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the feature vector of one image
    Extract {
        image: PathBuf,
    },

    /// Build a training set, train a classifier and optionally classify a query
    Train {
        /// JSON config file; flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target character
        #[arg(short, long)]
        letter: Option<char>,

        /// Directory of positive example images
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Image to classify after training
        #[arg(short, long)]
        query: Option<PathBuf>,

        #[arg(long)]
        bias: Option<f64>,

        /// Value every weight is seeded with
        #[arg(long)]
        initial_weight: Option<f64>,

        /// Skip unreadable training images instead of aborting
        #[arg(long)]
        skip_errors: bool,

        #[arg(long, value_enum)]
        accumulator: Option<Accumulator>,

        /// Save the trained model (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump the training set feature vectors (CSV)
        #[arg(long)]
        features: Option<PathBuf>,

        /// Train from a feature CSV instead of the image directory
        #[arg(long, conflicts_with = "dir")]
        from_features: Option<PathBuf>,
    },

    /// Classify one image with a saved model
    Predict {
        image: PathBuf,

        #[arg(short, long)]
        model: PathBuf,
    },

    /// Read image paths from stdin, one per line, and classify each
    Query {
        #[arg(short, long)]
        model: PathBuf,

        #[arg(long, value_enum, default_value = "carried")]
        accumulator: Accumulator,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Accumulator {
    Carried,
    Reset,
}

impl From<Accumulator> for AccumulatorMode {
    fn from(a: Accumulator) -> Self {
        match a {
            Accumulator::Carried => AccumulatorMode::Carried,
            Accumulator::Reset => AccumulatorMode::ResetBeforePredict,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = dispatch(Cli::parse()) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let load = LoadOptions {
        write_back: if cli.no_write_back {
            WriteBack::Skip
        } else {
            WriteBack::InPlace
        },
        ..Default::default()
    };

    match cli.command {
        Commands::Extract { image } => {
            let features = driver::image_features(&image, &load)?;
            println!("{features:?}");
        }
        Commands::Train {
            config,
            letter,
            dir,
            query,
            bias,
            initial_weight,
            skip_errors,
            accumulator,
            output,
            features,
            from_features,
        } => {
            let mut cfg = match config {
                Some(path) => DriverConfig::from_json_file(&path)?,
                None => DriverConfig::default(),
            };
            if cli.no_write_back {
                cfg.load.write_back = WriteBack::Skip;
            }
            if let Some(letter) = letter {
                cfg.letter = letter;
                if dir.is_none() && config_is_default_dir(&cfg) {
                    cfg.training_dir = PathBuf::from("letters").join(letter.to_string());
                }
            }
            if let Some(dir) = dir {
                cfg.training_dir = dir;
            }
            cfg.query = query.or(cfg.query);
            cfg.bias = bias.unwrap_or(cfg.bias);
            cfg.initial_weight = initial_weight.unwrap_or(cfg.initial_weight);
            if skip_errors {
                cfg.on_error = ErrorPolicy::Skip;
            }
            if let Some(acc) = accumulator {
                cfg.accumulator = acc.into();
            }
            cfg.model_out = output.or(cfg.model_out);
            cfg.features_out = features.or(cfg.features_out);
            cfg.features_in = from_features.or(cfg.features_in);

            let report = driver::run(&cfg)?;
            println!(
                "trained '{}' on {} images ({} skipped), {} weights",
                report.classifier.letter(),
                report.examples,
                report.skipped.len(),
                report.classifier.weights().len()
            );
            if let Some(label) = report.prediction {
                println!("{label}");
            }
        }
        Commands::Predict { image, model } => {
            let mut clf = load_model(&model, AccumulatorMode::Carried)?;
            let features = driver::image_features(&image, &load)?;
            println!("{}", clf.predict(&features));
        }
        Commands::Query { model, accumulator } => {
            let mut clf = load_model(&model, accumulator.into())?;
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = line.context("reading stdin")?;
                let path = line.trim();
                if path.is_empty() {
                    continue;
                }
                match driver::image_features(Path::new(path), &load) {
                    Ok(features) => println!("{path}\t{}", clf.predict(&features)),
                    Err(e) => log::error!("{path}: {e}"),
                }
            }
        }
    }

    Ok(())
}

fn config_is_default_dir(cfg: &DriverConfig) -> bool {
    cfg.training_dir == DriverConfig::default().training_dir
}

fn load_model(path: &Path, mode: AccumulatorMode) -> Result<glyph_perceptron::Classifier> {
    let record = ModelRecord::load(path)
        .with_context(|| format!("loading model {}", path.display()))?;
    log::info!(
        "Loaded model for '{}' with {} weights",
        record.letter,
        record.weights.len()
    );
    Ok(record.into_classifier(mode))
}

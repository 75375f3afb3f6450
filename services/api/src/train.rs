use chrono::Utc;
use clap::Args;
use stat_selector::error::AppError;
use stat_selector::workflows::selection::{
    train_bundle, ForestParams, HandleUnknown, ModelParams, TrainingCorpus, TrainingOptions,
    TreeParams,
};
use std::path::PathBuf;

pub(crate) const MODEL_FILE: &str = "stat_test_model.json";
pub(crate) const ENCODER_FILE: &str = "encoder.json";

#[derive(Args, Debug)]
pub(crate) struct TrainArgs {
    /// Labelled CSV corpus with the six model columns plus `Test`
    #[arg(long)]
    pub(crate) corpus: PathBuf,
    /// Directory receiving stat_test_model.json and encoder.json
    #[arg(long, default_value = "artifacts")]
    pub(crate) out_dir: PathBuf,
    /// Version stamped on both artifacts (defaults to today's UTC date)
    #[arg(long)]
    pub(crate) version: Option<String>,
    /// Maximum tree depth; unlimited when omitted
    #[arg(long)]
    pub(crate) max_depth: Option<usize>,
    /// Fit a random forest of this many trees instead of a single tree
    #[arg(long)]
    pub(crate) trees: Option<usize>,
    /// Bootstrap seed for --trees
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u64,
    /// Reject unseen categories at prediction time instead of zeroing them
    #[arg(long)]
    pub(crate) reject_unknown: bool,
}

pub(crate) fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let (model_path, encoder_path) = train_to_dir(&args)?;
    println!("Classifier written to {}", model_path.display());
    println!("Encoder written to {}", encoder_path.display());
    Ok(())
}

pub(crate) fn train_to_dir(args: &TrainArgs) -> Result<(PathBuf, PathBuf), AppError> {
    let corpus = TrainingCorpus::from_path(&args.corpus)?;

    let now = Utc::now();
    let version = args
        .version
        .clone()
        .unwrap_or_else(|| now.format("%Y.%m.%d").to_string());
    let mut options = TrainingOptions::new(version);
    options.trained_at = Some(now);
    options.model = match args.trees {
        Some(n_trees) => ModelParams::RandomForest(ForestParams {
            n_trees,
            max_depth: args.max_depth,
            seed: args.seed,
        }),
        None => ModelParams::DecisionTree(TreeParams {
            max_depth: args.max_depth,
        }),
    };
    if args.reject_unknown {
        options.handle_unknown = HandleUnknown::Error;
    }

    let (classifier, encoder) = train_bundle(&corpus, &options)?;

    std::fs::create_dir_all(&args.out_dir)?;
    let model_path = args.out_dir.join(MODEL_FILE);
    let encoder_path = args.out_dir.join(ENCODER_FILE);
    classifier.save(&model_path)?;
    encoder.save(&encoder_path)?;

    Ok((model_path, encoder_path))
}

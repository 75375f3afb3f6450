use clap::Args;
use stat_selector::config::AppConfig;
use stat_selector::error::AppError;
use stat_selector::workflows::selection::{
    CaseSubmission, ModelBundle, RecommendationResult, TestSelectionService,
};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const UNSUPPORTED_NOTICE: &str =
    "Sorry, this model supports only basic classical statistical tests.";

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Free-text variable names, e.g. "Cholesterol; Group"
    #[arg(long, default_value = "")]
    pub(crate) variables: String,
    /// continuous | categorical | continuous + categorical | categorical + categorical | time-to-event | mixed
    #[arg(long)]
    pub(crate) variable_types: String,
    /// Number of groups compared (1-20)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) num_groups: i64,
    /// independent | paired | unknown
    #[arg(long)]
    pub(crate) paired: String,
    /// yes | no | unknown
    #[arg(long)]
    pub(crate) normality: String,
    /// continuous | categorical | time-to-event | other
    #[arg(long)]
    pub(crate) outcome_type: String,
    /// Research question; echoed back but never used for prediction
    #[arg(long, default_value = "")]
    pub(crate) description: String,
    /// Override the configured classifier artifact
    #[arg(long)]
    pub(crate) model_path: Option<PathBuf>,
    /// Override the configured encoder artifact
    #[arg(long)]
    pub(crate) encoder_path: Option<PathBuf>,
}

impl RecommendArgs {
    pub(crate) fn submission(&self) -> CaseSubmission {
        CaseSubmission {
            variables: self.variables.clone(),
            variable_types: self.variable_types.clone(),
            num_groups: self.num_groups,
            paired: self.paired.clone(),
            normality: self.normality.clone(),
            outcome_type: self.outcome_type.clone(),
            description: self.description.clone(),
        }
    }
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.model_path.clone() {
        config.artifacts.model_path = path;
    }
    if let Some(path) = args.encoder_path.clone() {
        config.artifacts.encoder_path = path;
    }

    let bundle = ModelBundle::load_configured(&config.artifacts)?;
    let service = TestSelectionService::new(Arc::new(bundle));
    let result = service.submit(args.submission())?;

    let rendered = render_recommendation(&result).map_err(std::io::Error::from)?;
    print!("{rendered}");
    Ok(())
}

/// Terminal rendering of a recommendation result.
pub(crate) fn render_recommendation(
    result: &RecommendationResult,
) -> Result<String, serde_json::Error> {
    let mut out = String::new();

    if !result.eligible {
        out.push_str(UNSUPPORTED_NOTICE);
        out.push('\n');
        if let Some(reason) = &result.reason {
            out.push_str(&format!("Reason: {reason}\n"));
        }
        return Ok(out);
    }

    if let Some(test_name) = &result.test_name {
        out.push_str(&format!("Recommended test: {test_name}\n"));
    }
    if let Some(description) = &result.description {
        out.push_str(&format!("Research question: {description}\n"));
    }
    for unknown in &result.warnings {
        out.push_str(&format!(
            "Note: '{}' was not seen for {} during training\n",
            unknown.value, unknown.feature
        ));
    }

    out.push_str("---\nInput summary:\n");
    out.push_str(&serde_json::to_string_pretty(&result.input_summary)?);
    out.push('\n');
    Ok(out)
}

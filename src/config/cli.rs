use crate::config::toml_config::AppConfig;
use crate::domain::model::Phase;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rehab-eval")]
#[command(about = "Patient evaluations and arm volume screening for the rehabilitation backend")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "rehab-eval.toml")]
    pub config: String,

    /// Override api.base_url from config
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override arm_volume.segment_length_cm from config
    #[arg(long, global = true)]
    pub segment_length: Option<f64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute arm volumes and the lymphedema risk band locally
    Volume(ArmInput),
    /// Sign in and store the session token
    Login {
        #[arg(long, requires = "password", conflicts_with = "token")]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Store an existing access token instead of signing in
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// List the evaluations of the current patient
    List {
        #[arg(long, default_value = "pre")]
        phase: Phase,
        #[arg(long)]
        search: Option<String>,
        /// Column to sort by; repeat to cycle asc, desc and unsorted
        #[arg(long)]
        sort: Vec<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show the stored results of a completed evaluation
    Show {
        #[arg(long)]
        evaluation_id: String,
        #[arg(long, default_value = "pre")]
        phase: Phase,
    },
    /// Complete one evaluation
    Submit {
        #[arg(long)]
        evaluation_id: String,
        #[arg(long, default_value = "pre")]
        phase: Phase,
        #[command(flatten)]
        arms: OptionalArmInput,
        /// Numeric result for timed evaluations, as key=value
        #[arg(long = "result", value_parser = parse_key_value)]
        results: Vec<(String, String)>,
        /// Chosen option for range of motion evaluations
        #[arg(long = "select")]
        selections: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct ArmInput {
    /// Six left arm circumferences in cm, proximal to distal. Either
    /// decimal separator is accepted.
    #[arg(long, num_args = 6, required = true)]
    pub left: Vec<String>,
    /// Six right arm circumferences in cm, proximal to distal
    #[arg(long, num_args = 6, required = true)]
    pub right: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OptionalArmInput {
    #[arg(long, num_args = 6)]
    pub left: Vec<String>,
    #[arg(long, num_args = 6)]
    pub right: Vec<String>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err("key must not be empty".to_string());
    }
    Ok((key.trim().to_string(), value.trim().to_string()))
}

impl CliArgs {
    /// Command line values win over the file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.base_url {
            config.api.base_url = url.clone();
            tracing::info!("api.base_url overridden to: {}", url);
        }
        if let Some(h) = self.segment_length {
            config.arm_volume.segment_length_cm = Some(h);
            tracing::info!("arm_volume.segment_length_cm overridden to: {}", h);
        }
    }
}

use std::env;
use std::path::PathBuf;

use recert_application::ReviewEngineConfig;
use recert_core::{AppError, AppResult};
use tracing_subscriber::EnvFilter;

/// Runtime settings of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub policy_path: PathBuf,
    pub snapshot_path: PathBuf,
    pub campaign_name: String,
    pub campaign_due_days: u16,
    pub policy_gate_enabled: bool,
    pub engine: ReviewEngineConfig,
}

impl EvaluatorConfig {
    pub fn load() -> AppResult<Self> {
        let policy_path = PathBuf::from(required_env("RECERT_POLICY_PATH")?);
        let snapshot_path = PathBuf::from(required_env("RECERT_SNAPSHOT_PATH")?);
        let campaign_name = env::var("RECERT_CAMPAIGN_NAME")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "Quarterly access review".to_owned());
        let campaign_due_days = parse_env_u16("RECERT_CAMPAIGN_DUE_DAYS", 14)?;
        let policy_gate_enabled = parse_env_bool("RECERT_POLICY_GATE", true)?;

        if campaign_due_days == 0 {
            return Err(AppError::Validation(
                "RECERT_CAMPAIGN_DUE_DAYS must be greater than zero".to_owned(),
            ));
        }

        let mut engine = ReviewEngineConfig::default();
        engine.recommendation.low_usage_threshold = parse_env_f64(
            "RECERT_LOW_USAGE_THRESHOLD",
            engine.recommendation.low_usage_threshold,
        )?;
        engine.recommendation.time_bound_window_days = parse_env_u16(
            "RECERT_TIME_BOUND_WINDOW_DAYS",
            engine.recommendation.time_bound_window_days,
        )?;
        engine.risk_weights.dormancy_window_days = parse_env_u16(
            "RECERT_DORMANCY_WINDOW_DAYS",
            engine.risk_weights.dormancy_window_days,
        )?;
        engine.validate()?;

        Ok(Self {
            policy_path,
            snapshot_path,
            campaign_name,
            campaign_due_days,
            policy_gate_enabled,
            engine,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u16(name: &str, default: u16) -> AppResult<u16> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<u16>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_f64(name: &str, default: f64) -> AppResult<f64> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<f64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> AppResult<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(name, value.as_str()),
        Err(_) => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} value '{value}': expected true or false"
        ))),
    }
}

use std::time::Duration;

use clap::{Args as ClapArgs, Parser, ValueEnum};
use mealwise_core::domain::common::{LLMConfig, MealwiseConfig, OcrServiceConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "mealwise-api")]
#[command(about = "Meal recognition and recommendation API")]
#[command(version)]
pub struct Args {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub ocr: OcrArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LogArgs {
    /// `RUST_LOG` style filter, used when `RUST_LOG` itself is unset
    #[arg(long = "log-filter", env = "LOG_FILTER", default_value = "info,mealwise_core=debug")]
    pub filter: String,

    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ServerArgs {
    #[arg(long = "server-host", env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "server-port", env = "SERVER_PORT", default_value_t = 3333)]
    pub port: u16,

    #[arg(long = "server-root-path", env = "SERVER_ROOT_PATH", default_value = "")]
    pub root_path: String,

    #[arg(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LlmArgs {
    #[arg(long = "gemini-api-key", env = "GEMINI_API_KEY", default_value = "")]
    pub gemini_api_key: String,

    #[arg(long = "gemini-model", env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub gemini_model: String,

    #[arg(
        long = "gemini-base-url",
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_base_url: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct OcrArgs {
    /// HTTP OCR server; the OCR backend is only registered when set
    #[arg(long = "ocr-endpoint", env = "OCR_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long = "ocr-backend-id", env = "OCR_BACKEND_ID", default_value = "ocr-service")]
    pub backend_id: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct PipelineArgs {
    #[arg(long = "backend-timeout-secs", env = "BACKEND_TIMEOUT_SECS", default_value_t = 10)]
    pub backend_timeout_secs: u64,

    #[arg(long = "high-threshold", env = "VALIDATION_HIGH_THRESHOLD", default_value_t = 0.85)]
    pub high_threshold: f64,

    #[arg(long = "low-threshold", env = "VALIDATION_LOW_THRESHOLD", default_value_t = 0.3)]
    pub low_threshold: f64,

    #[arg(long = "awaiting-ttl-secs", env = "AWAITING_TTL_SECS", default_value_t = 86_400)]
    pub awaiting_ttl_secs: u64,

    #[arg(long = "learning-rate", env = "LEARNING_RATE", default_value_t = 0.2)]
    pub learning_rate: f64,

    #[arg(long = "recency-half-life-days", env = "RECENCY_HALF_LIFE_DAYS", default_value_t = 14.0)]
    pub recency_half_life_days: f64,

    #[arg(long = "full-retrain-threshold", env = "FULL_RETRAIN_THRESHOLD", default_value_t = 50)]
    pub full_retrain_threshold: u64,

    #[arg(long = "cold-start-days", env = "COLD_START_DAYS", default_value_t = 6)]
    pub cold_start_days: usize,

    #[arg(long = "max-recommendations", env = "MAX_RECOMMENDATIONS", default_value_t = 5)]
    pub max_recommendations: usize,
}

impl From<Args> for MealwiseConfig {
    fn from(args: Args) -> Self {
        let mut config = MealwiseConfig::default();

        config.recognition.backend_timeout = Duration::from_secs(args.pipeline.backend_timeout_secs);
        config.validation.high_threshold = args.pipeline.high_threshold;
        config.validation.low_threshold = args.pipeline.low_threshold;
        config.validation.awaiting_ttl = Duration::from_secs(args.pipeline.awaiting_ttl_secs);
        config.learning.dedup_retention = config
            .learning
            .dedup_retention
            .max(config.validation.awaiting_ttl * 2);
        config.learning.alpha = args.pipeline.learning_rate;
        config.preference.recency_half_life_days = args.pipeline.recency_half_life_days;
        config.preference.full_retrain_threshold = args.pipeline.full_retrain_threshold;
        config.recommendation.cold_start_days = args.pipeline.cold_start_days;
        config.recommendation.max_recommendations = args.pipeline.max_recommendations;

        config.llm = LLMConfig {
            gemini_api_key: args.llm.gemini_api_key,
            gemini_model: args.llm.gemini_model,
            gemini_base_url: args.llm.gemini_base_url,
        };
        config.ocr_service = args.ocr.endpoint.map(|endpoint| OcrServiceConfig {
            backend_id: args.ocr.backend_id,
            endpoint,
        });

        config
    }
}

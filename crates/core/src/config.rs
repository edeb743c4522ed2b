use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COLOR_MODIFIER_CODE: &str = "black_light_colors";
pub const DEFAULT_SPECIAL_OVERRIDE_CODE: &str = "leather_coloring_after_other_cleaning";
pub const DEFAULT_NON_EXPEDITABLE_CATEGORIES: &[&str] = &["LAUNDRY", "IRONING", "DYEING"];
const MAX_PRICE_SCALE: u32 = 4;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Knobs of the price calculation pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingConfig {
    /// No intermediate or final unit price may fall below this floor.
    pub min_price: Decimal,
    /// Fractional digits of final unit prices (rounded half-up).
    pub scale: u32,
    /// Reserved code applied at the color step for black or white items.
    pub color_modifier_code: String,
    /// Reserved code applied at the special override step.
    pub special_override_code: String,
    pub non_expeditable_categories: Vec<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min_price: Decimal::new(100, 2),
            scale: 2,
            color_modifier_code: DEFAULT_COLOR_MODIFIER_CODE.to_string(),
            special_override_code: DEFAULT_SPECIAL_OVERRIDE_CODE.to_string(),
            non_expeditable_categories: DEFAULT_NON_EXPEDITABLE_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub min_price: Option<Decimal>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://launderly.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("launderly.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(min_price) = pricing.min_price {
                self.pricing.min_price = parse_decimal_setting("pricing.min_price", &min_price)?;
            }
            if let Some(scale) = pricing.scale {
                self.pricing.scale = scale;
            }
            if let Some(color_modifier_code) = pricing.color_modifier_code {
                self.pricing.color_modifier_code = color_modifier_code;
            }
            if let Some(special_override_code) = pricing.special_override_code {
                self.pricing.special_override_code = special_override_code;
            }
            if let Some(categories) = pricing.non_expeditable_categories {
                self.pricing.non_expeditable_categories = categories;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LAUNDERLY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LAUNDERLY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("LAUNDERLY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LAUNDERLY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LAUNDERLY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LAUNDERLY_PRICING_MIN_PRICE") {
            self.pricing.min_price = parse_decimal_env("LAUNDERLY_PRICING_MIN_PRICE", &value)?;
        }
        if let Some(value) = read_env("LAUNDERLY_PRICING_SCALE") {
            self.pricing.scale = parse_u32("LAUNDERLY_PRICING_SCALE", &value)?;
        }
        if let Some(value) = read_env("LAUNDERLY_PRICING_COLOR_MODIFIER_CODE") {
            self.pricing.color_modifier_code = value;
        }
        if let Some(value) = read_env("LAUNDERLY_PRICING_SPECIAL_OVERRIDE_CODE") {
            self.pricing.special_override_code = value;
        }
        if let Some(value) = read_env("LAUNDERLY_PRICING_NON_EXPEDITABLE_CATEGORIES") {
            self.pricing.non_expeditable_categories = value
                .split(',')
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .map(str::to_string)
                .collect();
        }

        let log_level =
            read_env("LAUNDERLY_LOGGING_LEVEL").or_else(|| read_env("LAUNDERLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LAUNDERLY_LOGGING_FORMAT").or_else(|| read_env("LAUNDERLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(min_price) = overrides.min_price {
            self.pricing.min_price = min_price;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("launderly.toml"), PathBuf::from("config/launderly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.min_price <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.min_price must be greater than zero".to_string(),
        ));
    }

    if pricing.scale > MAX_PRICE_SCALE {
        return Err(ConfigError::Validation(format!(
            "pricing.scale must be in range 0..={MAX_PRICE_SCALE}"
        )));
    }

    let color_code = pricing.color_modifier_code.trim();
    let special_code = pricing.special_override_code.trim();
    if color_code.is_empty() || special_code.is_empty() {
        return Err(ConfigError::Validation(
            "pricing.color_modifier_code and pricing.special_override_code must not be empty"
                .to_string(),
        ));
    }
    if color_code == special_code {
        return Err(ConfigError::Validation(
            "pricing.color_modifier_code and pricing.special_override_code must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal_env(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal_setting(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim())
        .map_err(|_| ConfigError::Validation(format!("{key} must be a decimal, got `{value}`")))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

// min_price is read as a string so `"0.50"` keeps its exact decimal value.
#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    min_price: Option<String>,
    scale: Option<u32>,
    color_modifier_code: Option<String>,
    special_override_code: Option<String>,
    non_expeditable_categories: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use toml::Value;

use launderly_core::config::{AppConfig, LoadOptions};

use crate::commands::CommandResult;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ConfigLine {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let lines = effective_lines(&config, config_file_doc.as_ref(), config_file_path.as_deref());

    let mut rendered =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    rendered.extend(lines.iter().map(render_line));

    match serde_json::to_value(&lines) {
        Ok(data) => CommandResult::success_with_data("config", rendered.join("\n"), Some(data)),
        Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 1),
    }
}

fn effective_lines(
    config: &AppConfig,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> Vec<ConfigLine> {
    let pricing = &config.pricing;
    let fields: [(&'static str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["LAUNDERLY_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["LAUNDERLY_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["LAUNDERLY_DATABASE_TIMEOUT_SECS"],
        ),
        ("pricing.min_price", pricing.min_price.to_string(), &["LAUNDERLY_PRICING_MIN_PRICE"]),
        ("pricing.scale", pricing.scale.to_string(), &["LAUNDERLY_PRICING_SCALE"]),
        (
            "pricing.color_modifier_code",
            pricing.color_modifier_code.clone(),
            &["LAUNDERLY_PRICING_COLOR_MODIFIER_CODE"],
        ),
        (
            "pricing.special_override_code",
            pricing.special_override_code.clone(),
            &["LAUNDERLY_PRICING_SPECIAL_OVERRIDE_CODE"],
        ),
        (
            "pricing.non_expeditable_categories",
            pricing.non_expeditable_categories.join(","),
            &["LAUNDERLY_PRICING_NON_EXPEDITABLE_CATEGORIES"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["LAUNDERLY_LOGGING_LEVEL", "LAUNDERLY_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["LAUNDERLY_LOGGING_FORMAT", "LAUNDERLY_LOG_FORMAT"],
        ),
    ];

    fields
        .into_iter()
        .map(|(key, value, env_keys)| ConfigLine {
            key,
            value,
            source: field_source(key, env_keys, config_file_doc, config_file_path),
        })
        .collect()
}

fn detect_config_path() -> Option<PathBuf> {
    ["launderly.toml", "config/launderly.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|env_key| env::var_os(env_key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(line: &ConfigLine) -> String {
    format!("- {} = {} (source: {})", line.key, line.value, line.source)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use launderly_core::config::AppConfig;
    use toml::Value;

    use super::{contains_path, effective_lines, field_source};

    #[test]
    fn nested_keys_are_found_in_config_document() {
        let doc: Value = "[pricing]\nmin_price = \"2.00\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.min_price"));
        assert!(!contains_path(&doc, "pricing.scale"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn file_source_names_the_config_path() {
        let doc: Value = "[database]\nurl = \"sqlite://other.db\"\n".parse().expect("toml");

        let source = field_source(
            "database.url",
            &["LAUNDERLY_TEST_UNSET_DATABASE_URL"],
            Some(&doc),
            Some(Path::new("config/launderly.toml")),
        );

        assert_eq!(source, "file (config/launderly.toml)");
    }

    #[test]
    fn every_config_field_is_listed() {
        let lines = effective_lines(&AppConfig::default(), None, None);

        assert_eq!(lines.len(), 10);
        assert!(lines.iter().any(|line| line.key == "pricing.min_price" && line.value == "1.00"));
    }
}

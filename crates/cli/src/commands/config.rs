use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ordercopilot_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigSources {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    render(&config, &ConfigSources::detect())
}

fn render(config: &AppConfig, sources: &ConfigSources) -> String {
    let api_key = match config.llm.api_key.as_ref() {
        Some(key) if key.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
        None => "<unset>",
    };

    let fields = vec![
        field(
            "llm.provider",
            &["ORDERCOPILOT_LLM_PROVIDER"],
            config.llm.provider.as_str().to_string(),
        ),
        field("llm.api_key", &["ORDERCOPILOT_LLM_API_KEY"], api_key.to_string()),
        field(
            "llm.base_url",
            &["ORDERCOPILOT_LLM_BASE_URL"],
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        ),
        field("llm.model", &["ORDERCOPILOT_LLM_MODEL"], config.llm.model.clone()),
        field("llm.api_version", &["ORDERCOPILOT_LLM_API_VERSION"], config.llm.api_version.clone()),
        field(
            "llm.temperature",
            &["ORDERCOPILOT_LLM_TEMPERATURE"],
            config.llm.temperature.to_string(),
        ),
        field(
            "llm.timeout_secs",
            &["ORDERCOPILOT_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        field("orders.base_url", &["ORDERCOPILOT_ORDERS_BASE_URL"], config.orders.base_url.clone()),
        field(
            "orders.timeout_secs",
            &["ORDERCOPILOT_ORDERS_TIMEOUT_SECS"],
            config.orders.timeout_secs.to_string(),
        ),
        field(
            "server.bind_address",
            &["ORDERCOPILOT_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        field("server.port", &["ORDERCOPILOT_SERVER_PORT"], config.server.port.to_string()),
        field(
            "server.graceful_shutdown_secs",
            &["ORDERCOPILOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        field(
            "logging.level",
            &["ORDERCOPILOT_LOGGING_LEVEL", "ORDERCOPILOT_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        field(
            "logging.format",
            &["ORDERCOPILOT_LOGGING_FORMAT", "ORDERCOPILOT_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in fields {
        let source = sources.describe(key_path, env_keys);
        lines.push(format!("- {key_path} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn field(
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
) -> (&'static str, &'static [&'static str], String) {
    (key_path, env_keys, value)
}

impl ConfigSources {
    fn detect() -> Self {
        let path =
            CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|candidate| candidate.exists());
        let doc = path.as_deref().and_then(load_doc);
        Self { path, doc }
    }

    fn describe(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_doc(path: &Path) -> Option<Value> {
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
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

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pricelist: PriceListConfig,
    pub sheets: SheetsConfig,
    pub notify: NotifyConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PriceListConfig {
    pub path: PathBuf,
    pub sheet: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub api_token: SecretString,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct NotifyConfig {
    pub channel: NotifyChannel,
    pub whatsapp: WhatsAppConfig,
    pub email: EmailConfig,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub access_token: SecretString,
    pub phone_number_id: String,
    pub template: String,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub relay_url: String,
    pub api_key: SecretString,
    pub from: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyChannel {
    Whatsapp,
    Email,
    Noop,
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
    pub pricelist_path: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub sheets_api_token: Option<String>,
    pub notify_channel: Option<NotifyChannel>,
    pub log_level: Option<String>,
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
            pricelist: PriceListConfig { path: PathBuf::from("pricelist.xlsx"), sheet: None },
            sheets: SheetsConfig {
                spreadsheet_id: String::new(),
                worksheet: "Appointments".to_string(),
                api_token: String::new().into(),
                base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            },
            notify: NotifyConfig {
                channel: NotifyChannel::Noop,
                whatsapp: WhatsAppConfig {
                    access_token: String::new().into(),
                    phone_number_id: String::new(),
                    template: "appointment_confirmation".to_string(),
                },
                email: EmailConfig {
                    relay_url: String::new(),
                    api_key: String::new().into(),
                    from: String::new(),
                },
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for NotifyChannel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Self::Whatsapp),
            "email" => Ok(Self::Email),
            "noop" => Ok(Self::Noop),
            other => Err(ConfigError::Validation(format!(
                "unsupported notify channel `{other}` (expected whatsapp|email|noop)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
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
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("treadline.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricelist) = patch.pricelist {
            if let Some(path) = pricelist.path {
                self.pricelist.path = PathBuf::from(path);
            }
            if let Some(sheet) = pricelist.sheet {
                self.pricelist.sheet = Some(sheet);
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(spreadsheet_id) = sheets.spreadsheet_id {
                self.sheets.spreadsheet_id = spreadsheet_id;
            }
            if let Some(worksheet) = sheets.worksheet {
                self.sheets.worksheet = worksheet;
            }
            if let Some(api_token_value) = sheets.api_token {
                self.sheets.api_token = secret_value(api_token_value);
            }
            if let Some(base_url) = sheets.base_url {
                self.sheets.base_url = base_url;
            }
        }

        if let Some(notify) = patch.notify {
            if let Some(channel) = notify.channel {
                self.notify.channel = channel;
            }
            if let Some(whatsapp) = notify.whatsapp {
                if let Some(access_token_value) = whatsapp.access_token {
                    self.notify.whatsapp.access_token = secret_value(access_token_value);
                }
                if let Some(phone_number_id) = whatsapp.phone_number_id {
                    self.notify.whatsapp.phone_number_id = phone_number_id;
                }
                if let Some(template) = whatsapp.template {
                    self.notify.whatsapp.template = template;
                }
            }
            if let Some(email) = notify.email {
                if let Some(relay_url) = email.relay_url {
                    self.notify.email.relay_url = relay_url;
                }
                if let Some(api_key_value) = email.api_key {
                    self.notify.email.api_key = secret_value(api_key_value);
                }
                if let Some(from) = email.from {
                    self.notify.email.from = from;
                }
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TREADLINE_PRICELIST_PATH") {
            self.pricelist.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("TREADLINE_PRICELIST_SHEET") {
            self.pricelist.sheet = Some(value);
        }

        if let Some(value) = read_env("TREADLINE_SHEETS_SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = value;
        }
        if let Some(value) = read_env("TREADLINE_SHEETS_WORKSHEET") {
            self.sheets.worksheet = value;
        }
        if let Some(value) = read_env("TREADLINE_SHEETS_API_TOKEN") {
            self.sheets.api_token = secret_value(value);
        }
        if let Some(value) = read_env("TREADLINE_SHEETS_BASE_URL") {
            self.sheets.base_url = value;
        }

        if let Some(value) = read_env("TREADLINE_NOTIFY_CHANNEL") {
            self.notify.channel = value.parse()?;
        }
        if let Some(value) = read_env("TREADLINE_WHATSAPP_ACCESS_TOKEN") {
            self.notify.whatsapp.access_token = secret_value(value);
        }
        if let Some(value) = read_env("TREADLINE_WHATSAPP_PHONE_NUMBER_ID") {
            self.notify.whatsapp.phone_number_id = value;
        }
        if let Some(value) = read_env("TREADLINE_WHATSAPP_TEMPLATE") {
            self.notify.whatsapp.template = value;
        }
        if let Some(value) = read_env("TREADLINE_EMAIL_RELAY_URL") {
            self.notify.email.relay_url = value;
        }
        if let Some(value) = read_env("TREADLINE_EMAIL_API_KEY") {
            self.notify.email.api_key = secret_value(value);
        }
        if let Some(value) = read_env("TREADLINE_EMAIL_FROM") {
            self.notify.email.from = value;
        }

        if let Some(value) = read_env("TREADLINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TREADLINE_SERVER_PORT") {
            self.server.port = parse_u16("TREADLINE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TREADLINE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("TREADLINE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("TREADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TREADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("TREADLINE_LOGGING_LEVEL").or_else(|| read_env("TREADLINE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TREADLINE_LOGGING_FORMAT").or_else(|| read_env("TREADLINE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(pricelist_path) = overrides.pricelist_path {
            self.pricelist.path = pricelist_path;
        }
        if let Some(spreadsheet_id) = overrides.spreadsheet_id {
            self.sheets.spreadsheet_id = spreadsheet_id;
        }
        if let Some(sheets_api_token) = overrides.sheets_api_token {
            self.sheets.api_token = secret_value(sheets_api_token);
        }
        if let Some(notify_channel) = overrides.notify_channel {
            self.notify.channel = notify_channel;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricelist(&self.pricelist)?;
        validate_sheets(&self.sheets)?;
        validate_notify(&self.notify)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("treadline.toml"), PathBuf::from("config/treadline.toml")]
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

fn validate_pricelist(pricelist: &PriceListConfig) -> Result<(), ConfigError> {
    if pricelist.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("pricelist.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if sheets.spreadsheet_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.spreadsheet_id is required. It is the id segment of the spreadsheet URL"
                .to_string(),
        ));
    }
    if sheets.api_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.api_token is required to read and append booking rows".to_string(),
        ));
    }
    if sheets.worksheet.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.worksheet must not be empty".to_string()));
    }
    if !sheets.base_url.starts_with("http://") && !sheets.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "sheets.base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_notify(notify: &NotifyConfig) -> Result<(), ConfigError> {
    match notify.channel {
        NotifyChannel::Whatsapp => {
            if notify.whatsapp.access_token.expose_secret().trim().is_empty() {
                return Err(ConfigError::Validation(
                    "notify.whatsapp.access_token is required for the whatsapp channel"
                        .to_string(),
                ));
            }
            if notify.whatsapp.phone_number_id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "notify.whatsapp.phone_number_id is required for the whatsapp channel"
                        .to_string(),
                ));
            }
            if notify.whatsapp.template.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "notify.whatsapp.template must not be empty".to_string(),
                ));
            }
        }
        NotifyChannel::Email => {
            if !notify.email.relay_url.starts_with("http://")
                && !notify.email.relay_url.starts_with("https://")
            {
                return Err(ConfigError::Validation(
                    "notify.email.relay_url must start with http:// or https://".to_string(),
                ));
            }
            if notify.email.api_key.expose_secret().trim().is_empty() {
                return Err(ConfigError::Validation(
                    "notify.email.api_key is required for the email channel".to_string(),
                ));
            }
            if !notify.email.from.contains('@') {
                return Err(ConfigError::Validation(
                    "notify.email.from must be an email address".to_string(),
                ));
            }
        }
        NotifyChannel::Noop => {}
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
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

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricelist: Option<PriceListPatch>,
    sheets: Option<SheetsPatch>,
    notify: Option<NotifyPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceListPatch {
    path: Option<String>,
    sheet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    spreadsheet_id: Option<String>,
    worksheet: Option<String>,
    api_token: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifyPatch {
    channel: Option<NotifyChannel>,
    whatsapp: Option<WhatsAppPatch>,
    email: Option<EmailPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    access_token: Option<String>,
    phone_number_id: Option<String>,
    template: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    relay_url: Option<String>,
    api_key: Option<String>,
    from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, NotifyChannel};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SHEETS_API_TOKEN", "ya29.from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("treadline.toml");
            fs::write(
                &path,
                r#"
[sheets]
spreadsheet_id = "1AbCdEf"
api_token = "${TEST_SHEETS_API_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.sheets.api_token.expose_secret() == "ya29.from-env",
                "sheets token should be loaded from environment",
            )?;
            ensure(config.sheets.spreadsheet_id == "1AbCdEf", "spreadsheet id should come from file")
        })();

        clear_vars(&["TEST_SHEETS_API_TOKEN"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TREADLINE_SHEETS_SPREADSHEET_ID", "1AbCdEf");
        env::set_var("TREADLINE_SHEETS_API_TOKEN", "ya29.test");
        env::set_var("TREADLINE_LOG_LEVEL", "warn");
        env::set_var("TREADLINE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&[
            "TREADLINE_SHEETS_SPREADSHEET_ID",
            "TREADLINE_SHEETS_API_TOKEN",
            "TREADLINE_LOG_LEVEL",
            "TREADLINE_LOG_FORMAT",
        ]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TREADLINE_SHEETS_SPREADSHEET_ID", "sheet-from-env");
        env::set_var("TREADLINE_SHEETS_API_TOKEN", "ya29.from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("treadline.toml");
            fs::write(
                &path,
                r#"
[pricelist]
path = "prices-from-file.xlsx"

[sheets]
spreadsheet_id = "sheet-from-file"
api_token = "ya29.from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    pricelist_path: Some("prices-from-override.xlsx".into()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.pricelist.path.to_string_lossy() == "prices-from-override.xlsx",
                "override pricelist path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.sheets.spreadsheet_id == "sheet-from-env",
                "env spreadsheet id should win over file and defaults",
            )?;
            ensure(
                config.sheets.api_token.expose_secret() == "ya29.from-env",
                "env sheets token should win over file and defaults",
            )
        })();

        clear_vars(&["TREADLINE_SHEETS_SPREADSHEET_ID", "TREADLINE_SHEETS_API_TOKEN"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    sheets_api_token: Some("ya29.valid".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            }) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sheets.spreadsheet_id")
            );
            ensure(has_message, "validation failure should mention sheets.spreadsheet_id")
        })();

        result
    }

    #[test]
    fn whatsapp_channel_requires_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    spreadsheet_id: Some("1AbCdEf".to_string()),
                    sheets_api_token: Some("ya29.valid".to_string()),
                    notify_channel: Some(NotifyChannel::Whatsapp),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            }) {
                Ok(_) => return Err("whatsapp channel without token should fail".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("notify.whatsapp.access_token")
            );
            ensure(has_message, "validation failure should mention the whatsapp token")
        })();

        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TREADLINE_SHEETS_SPREADSHEET_ID", "1AbCdEf");
        env::set_var("TREADLINE_SHEETS_API_TOKEN", "ya29.secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("ya29.secret-value"),
                "debug output should not contain the sheets token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&["TREADLINE_SHEETS_SPREADSHEET_ID", "TREADLINE_SHEETS_API_TOKEN"]);
        result
    }
}

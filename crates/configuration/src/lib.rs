use crate::error::ConfigError;
use std::collections::HashMap;
use std::env;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    DEFAULT_DATABASE_URL, DatabaseSettings, LogFormat, LoggingSettings, ReadinessPolicy,
    ReadinessSettings, ServerSettings, Settings,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "TALLY_CONFIG";
/// The bare connection-string variable every deployment of the service sets.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

const DEFAULT_CONFIG_FILE: &str = "tally.toml";

/// Loads the service configuration from the process environment.
///
/// Sources, later ones winning: built-in defaults, the TOML file
/// (`tally.toml`, or the path in `TALLY_CONFIG`), `TALLY__SECTION__KEY`
/// variables, and finally `DATABASE_URL`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let vars: HashMap<String, String> = env::vars().collect();
    let explicit = vars.get(CONFIG_PATH_VAR).cloned();
    match explicit {
        Some(path) => load_settings_from(Some(Path::new(&path)), &vars),
        None => load_settings_from(None, &vars),
    }
}

/// Same as [`load_settings`] but against an explicit file and variable set.
///
/// When `file` is `None` the default `tally.toml` is read if it exists; an
/// explicit file must exist.
pub fn load_settings_from(
    file: Option<&Path>,
    vars: &HashMap<String, String>,
) -> Result<Settings, ConfigError> {
    let file_source = match file {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix("TALLY")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        )
        .set_override_option(
            "database.url",
            vars.get(DATABASE_URL_VAR).filter(|v| !v.is_empty()).cloned(),
        )?
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    tracing::debug!(
        listen_addr = %settings.server.listen_addr,
        max_attempts = settings.readiness.max_attempts,
        "Configuration loaded."
    );
    Ok(settings)
}

//! `sonargate config`: inspect and edit the effective configuration.

use crate::cli::ui::{print_error, print_success};
use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{field_validator, Config};
use crate::error::SonarGateError;

/// Execute `sonargate config`.
pub async fn execute(args: ConfigArgs, config: &Config) -> crate::Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(config).map_err(|e| SonarGateError::config(e.to_string()))?);
        }
        ConfigAction::Validate => match config.validate() {
            Ok(()) => print_success("configuration is valid"),
            Err(e) => {
                print_error(&e.user_friendly_message());
                return Err(e);
            }
        },
        ConfigAction::Set { key, value } => set_field(&key, &value)?,
    }
    Ok(())
}

/// Validate `key=value` and persist it into the config file, creating one
/// from the currently-loaded defaults if none exists yet.
fn set_field(key: &str, value: &str) -> crate::Result<()> {
    field_validator::validate_field(key, value)?;

    let path = Config::default_config_path().ok_or_else(|| SonarGateError::config("no writable config path (no XDG config dir)"))?;
    let mut doc: toml::Value = if path.exists() {
        toml::from_str(&std::fs::read_to_string(&path)?).map_err(|e| SonarGateError::config(e.to_string()))?
    } else {
        toml::Value::Table(toml::Table::new())
    };

    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| SonarGateError::config(format!("key must be `section.field`, got `{key}`")))?;
    let table = doc.as_table_mut().ok_or_else(|| SonarGateError::config("config file root must be a table"))?;
    let section_table = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| SonarGateError::config(format!("`{section}` is not a table in the config file")))?;
    section_table.insert(field.to_string(), toml::Value::String(value.to_string()));

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(&doc).map_err(|e| SonarGateError::config(e.to_string()))?)?;

    print_success(&format!("set {key} = {value} in {}", path.display()));
    Ok(())
}

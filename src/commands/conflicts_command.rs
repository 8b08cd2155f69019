//! `sonargate conflicts`: ad-hoc parameter-conflict validation.

use crate::cli::ui::{print_error, print_success, print_warning};
use crate::cli::{ConflictsAction, ConflictsArgs};
use crate::config::Config;
use crate::core::conflict::{self, Params};
use crate::error::SonarGateError;

/// Execute `sonargate conflicts`.
pub async fn execute(args: ConflictsArgs, _config: &Config) -> crate::Result<()> {
    match args.action {
        ConflictsAction::Check { file } => check(file).await,
    }
}

async fn check(file: std::path::PathBuf) -> crate::Result<()> {
    let text = std::fs::read_to_string(&file)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let object = value
        .as_object()
        .ok_or_else(|| SonarGateError::config("parameter file must contain a JSON object"))?;
    let params: Params = object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    let result = conflict::validate_parameters(&params);

    if result.conflicts.is_empty() {
        print_success("no conflicts detected");
        return Ok(());
    }

    for conflict in &result.conflicts {
        let line = format!("{} [{:?}] {}", conflict.rule_id, conflict.severity, conflict.name);
        if result.is_valid {
            print_warning(&line);
        } else {
            print_error(&line);
        }
    }
    for recommendation in &result.recommendations {
        println!("  - {recommendation}");
    }

    if !result.is_valid {
        let resolutions = conflict::suggest_resolutions(&params, &result.conflicts);
        if resolutions.resolved_conflict_count > 0 {
            println!("suggested parameters: {}", serde_json::to_string_pretty(&resolutions.suggestions)?);
        }
        return Err(SonarGateError::conflict(
            result.conflicts[0].rule_id.clone(),
            "blocking conflict present",
        ));
    }

    Ok(())
}

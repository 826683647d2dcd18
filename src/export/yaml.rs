//! YAML Export functionality

use std::io::Write;

use crate::error::{FintrackError, FintrackResult};
use crate::export::json::UserExport;
use crate::models::UserId;
use crate::storage::Storage;

use super::write_error;

/// Export one user's data as YAML, preceded by a comment header
pub fn export_user_yaml<W: Write>(
    storage: &Storage,
    user_id: UserId,
    writer: &mut W,
) -> FintrackResult<()> {
    let export = UserExport::from_storage(storage, user_id)?;

    writeln!(writer, "# fintrack data export for {}", export.user.username).map_err(write_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(write_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(write_error)?;
    writeln!(writer, "# Contains personal financial data; store it securely.")
        .map_err(write_error)?;
    writeln!(writer).map_err(write_error)?;

    serde_yaml::to_writer(writer, &export).map_err(write_error)?;
    Ok(())
}

/// Read back and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> FintrackResult<UserExport> {
    let export: UserExport =
        serde_yaml::from_str(yaml_str).map_err(|e| FintrackError::Import(e.to_string()))?;
    export.validate().map_err(FintrackError::Import)?;
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Goal, GoalKind, Money};
    use crate::services::testing::{create_test_storage, register};

    #[test]
    fn test_yaml_roundtrip() {
        let (_temp_dir, storage) = create_test_storage();
        let alice = register(&storage, "alice");
        storage
            .goals
            .upsert(Goal::new(
                alice.id,
                "Emergency fund",
                GoalKind::EmergencyFund,
                Money::from_cents(500_000),
                None,
            ))
            .unwrap();

        let mut output = Vec::new();
        export_user_yaml(&storage, alice.id, &mut output).unwrap();
        let yaml = String::from_utf8(output).unwrap();

        assert!(yaml.starts_with("# fintrack data export for alice"));
        assert!(yaml.contains("Emergency fund"));

        // comment lines are ignored by the YAML parser
        let imported = import_from_yaml(&yaml).unwrap();
        assert_eq!(imported.goals.len(), 1);
        assert_eq!(imported.user.username, "alice");
    }
}

//! First-run setup

use crate::config::paths::FintrackPaths;
use crate::config::settings::Settings;
use crate::error::FintrackResult;
use crate::models::Category;

use super::repository::{read_records, write_records};

/// Create the directory layout, write default settings and seed the built-in
/// categories
///
/// Safe to run repeatedly: existing settings are kept and a built-in is only
/// added when no built-in of the same name and kind exists yet. Returns the
/// number of categories seeded.
pub fn initialize_storage(paths: &FintrackPaths) -> FintrackResult<usize> {
    paths.ensure_directories()?;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
    }

    let mut categories: Vec<Category> = read_records(&paths.categories_file())?;
    let missing: Vec<Category> = Category::builtins()
        .into_iter()
        .filter(|b| {
            !categories
                .iter()
                .any(|c| c.is_builtin() && c.kind == b.kind && c.name_matches(&b.name))
        })
        .collect();

    let seeded = missing.len();
    if seeded > 0 || !paths.categories_file().exists() {
        categories.extend(missing);
        write_records(&paths.categories_file(), categories)?;
        tracing::info!(seeded, "seeded built-in categories");
    }

    Ok(seeded)
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &FintrackPaths) -> bool {
    !paths.settings_file().exists() || !paths.categories_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        assert!(needs_initialization(&paths));

        let seeded = initialize_storage(&paths).unwrap();

        assert_eq!(seeded, Category::builtins().len());
        assert!(!needs_initialization(&paths));
        assert!(paths.data_dir().exists());
        assert!(paths.is_initialized());
    }

    #[test]
    fn test_builtins_seeded_exactly_once() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());

        initialize_storage(&paths).unwrap();
        assert_eq!(initialize_storage(&paths).unwrap(), 0);

        let categories: Vec<Category> = read_records(&paths.categories_file()).unwrap();
        assert_eq!(categories.len(), Category::builtins().len());
    }

    #[test]
    fn test_existing_settings_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let paths = FintrackPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut settings = Settings::default();
        settings.currency_symbol = "€".into();
        settings.save(&paths).unwrap();

        initialize_storage(&paths).unwrap();
        assert_eq!(Settings::load_or_create(&paths).unwrap().currency_symbol, "€");
    }
}

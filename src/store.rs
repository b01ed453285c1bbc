//! Record files on disk.
//!
//! Each record is one TOML file. The file is the record's only persistence,
//! so it must be saved after every pass that bound or changed it.

use anyhow::{Context, Result};
use argocd::Project;
use declarative::Record;
use std::fs;
use std::path::Path;

/// Load a record file
pub fn load(path: &Path) -> Result<Record<Project>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file: {}", path.display()))?;

    let record: Record<Project> = toml::from_str(&content)
        .with_context(|| format!("Failed to parse record file: {}", path.display()))?;

    log::debug!("Loaded record {} from {}", record.name, path.display());
    Ok(record)
}

/// Load several record files, failing on the first bad one
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Record<Project>>> {
    paths.iter().map(|p| load(p.as_ref())).collect()
}

/// Save a record file
pub fn save(path: &Path, record: &Record<Project>) -> Result<()> {
    let content = toml::to_string_pretty(record).context("Failed to serialize record to TOML")?;

    fs::write(path, &content)
        .with_context(|| format!("Failed to write record file: {}", path.display()))?;

    log::debug!("Saved record {} to {}", record.name, path.display());
    Ok(())
}

/// Remove a record file
pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .with_context(|| format!("Failed to remove record file: {}", path.display()))?;
    log::debug!("Removed record file {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argocd::{ApplicationDestination, ProjectParameters};
    use declarative::{Condition, DeletionPolicy};

    #[test]
    fn test_load_minimal_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team-a.toml");
        fs::write(
            &path,
            r#"
            kind = "Project"
            name = "team-a"

            [spec]
            description = "apps"
            sourceRepos = ["https://github.com/example/apps"]
            "#,
        )
        .unwrap();

        let record = load(&path).unwrap();
        assert_eq!(record.name, "team-a");
        assert!(!record.is_bound());
        assert_eq!(record.deletion_policy, DeletionPolicy::Delete);
        assert_eq!(record.spec.description.as_deref(), Some("apps"));
        assert_eq!(record.spec.source_repos.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_save_and_reload_keeps_binding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team-a.toml");

        let mut record = Record::<Project>::new(
            "team-a",
            ProjectParameters {
                destinations: Some(vec![ApplicationDestination {
                    server: "https://kubernetes.default.svc".into(),
                    namespace: "team-a".into(),
                    name: String::new(),
                }]),
                ..Default::default()
            },
        );
        record.set_external_name("team-a").unwrap();
        record.set_condition(Condition::available());
        record.status.at_provider.resource_version = "3".into();

        save(&path, &record).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.external_name(), Some("team-a"));
        assert_eq!(loaded.spec, record.spec);
        assert_eq!(loaded.status.at_provider.resource_version, "3");
        assert_eq!(loaded.status.conditions.len(), 1);
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "name = ").unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
        assert!(load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team-a.toml");
        fs::write(&path, "").unwrap();

        remove(&path).unwrap();
        assert!(!path.exists());
        assert!(remove(&path).is_err());
    }
}

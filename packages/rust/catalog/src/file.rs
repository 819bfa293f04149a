//! Reading and writing `catalog.json`, plus a plain-text tree rendering.

use std::fmt::Write as _;
use std::path::Path;

use benchtree_shared::{BenchTreeError, CURRENT_SCHEMA_VERSION, Catalog, Result};
use tracing::{debug, instrument};

/// Write `catalog` as pretty JSON (temp file, then rename).
#[instrument(skip_all, fields(path = %path.display(), runs = catalog.run_count()))]
pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BenchTreeError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(catalog)
        .map_err(|e| BenchTreeError::Serialization(e.to_string()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| BenchTreeError::validation(format!("{} is not a file path", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, json).map_err(|e| BenchTreeError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| BenchTreeError::io(path, e))?;

    debug!("catalog written");
    Ok(())
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path).map_err(|e| BenchTreeError::io(path, e))?;
    let catalog: Catalog = serde_json::from_str(&content).map_err(|e| {
        BenchTreeError::validation(format!("invalid catalog {}: {e}", path.display()))
    })?;

    if catalog.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(BenchTreeError::validation(format!(
            "schema_version {} not supported (max {CURRENT_SCHEMA_VERSION})",
            catalog.schema_version
        )));
    }
    Ok(catalog)
}

/// Render the experiment → instance → run tree, one entry per line.
pub fn render_tree(catalog: &Catalog) -> String {
    let mut out = String::new();
    for experiment in &catalog.experiments {
        let _ = writeln!(out, "{} ({} runs)", experiment.name, experiment.run_count());
        for instance in &experiment.instances {
            let _ = writeln!(out, "  {} ({} runs)", instance.instance, instance.runs.len());
            for run in &instance.runs {
                let _ = writeln!(out, "    {}  {}", run.id, run.source);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use benchtree_shared::{CatalogId, ExperimentRecord, InstanceRecord, RunRecord};
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bt-catalog-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> Catalog {
        Catalog {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: CatalogId::new(),
            root: "/data".into(),
            created_at: Utc::now(),
            experiments: vec![ExperimentRecord {
                name: "expA".into(),
                instances: vec![InstanceRecord {
                    instance: "berlin52".into(),
                    runs: vec![RunRecord {
                        id: "00aa11bb22cc33dd".into(),
                        source: "expA/berlin52/run1.txt".into(),
                        file_name: Some("run1.txt".into()),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn write_then_load() {
        let tmp = temp_dir();
        let path = tmp.join("out").join("catalog.json");
        let catalog = sample();

        write_catalog(&path, &catalog).unwrap();
        let loaded = load_catalog(&path).unwrap();
        assert_eq!(loaded.id, catalog.id);
        assert_eq!(loaded.experiments, catalog.experiments);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn future_schema_rejected() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        let mut catalog = sample();
        catalog.schema_version = 99;
        write_catalog(&path, &catalog).unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert!(err.to_string().contains("schema_version 99"));
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn malformed_catalog_rejected() {
        let tmp = temp_dir();
        let path = tmp.join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_catalog(&path).is_err());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn tree_lists_every_level() {
        let tree = render_tree(&sample());
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(lines[0], "expA (1 runs)");
        assert_eq!(lines[1], "  berlin52 (1 runs)");
        assert_eq!(lines[2], "    00aa11bb22cc33dd  expA/berlin52/run1.txt");
    }
}

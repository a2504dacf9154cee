use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL_DIR: &str = "model";
pub const DEFAULT_MIGRATION_DIR: &str = "migration";
pub const DEFAULT_REGISTRY_FILE: &str = "migration.go";
pub const DEFAULT_MODULE: &str = "your/module/path";
const LOCK_FILE: &str = ".miggen.lock";

/// Where generated files live and how they are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub model_dir: PathBuf,
    pub migration_dir: PathBuf,
    pub registry_file: String,
    /// Go import path prefix; the registry imports `<module>/model`.
    pub module: String,
    /// Prefix model file names with the creation timestamp.
    pub timestamp_prefix: bool,
}

impl ProjectLayout {
    /// Default layout rooted at `root`: `model/` and `migration/migration.go`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            model_dir: root.join(DEFAULT_MODEL_DIR),
            migration_dir: root.join(DEFAULT_MIGRATION_DIR),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
            module: DEFAULT_MODULE.to_string(),
            timestamp_prefix: false,
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.migration_dir.join(&self.registry_file)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.migration_dir.join(LOCK_FILE)
    }

    /// Go package of the model files: the last component of `model_dir`.
    pub fn model_package(&self) -> String {
        self.model_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_MODEL_DIR)
            .to_string()
    }

    pub fn model_import(&self) -> String {
        format!(
            "{}/{}",
            self.module.trim_end_matches('/'),
            self.model_package()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        let layout = ProjectLayout::new("/work/app");
        assert_eq!(layout.model_dir, PathBuf::from("/work/app/model"));
        assert_eq!(
            layout.registry_path(),
            PathBuf::from("/work/app/migration/migration.go")
        );
        assert_eq!(
            layout.lock_path(),
            PathBuf::from("/work/app/migration/.miggen.lock")
        );
        assert_eq!(layout.model_import(), "your/module/path/model");
    }

    #[test]
    fn model_import_follows_module_and_dir() {
        let mut layout = ProjectLayout::new(".");
        layout.module = "github.com/acme/shop/".to_string();
        layout.model_dir = PathBuf::from("internal/entity");
        assert_eq!(layout.model_package(), "entity");
        assert_eq!(layout.model_import(), "github.com/acme/shop/entity");
    }
}

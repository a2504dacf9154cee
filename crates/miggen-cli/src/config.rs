use miggen::ProjectLayout;
use miggen::layout::{DEFAULT_MIGRATION_DIR, DEFAULT_MODEL_DIR, DEFAULT_MODULE, DEFAULT_REGISTRY_FILE};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "miggen.toml";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    /// Read, expand and validate `config_path`. Relative paths in the file
    /// are taken from the file's directory.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let shown = config_path.display();
        let raw = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file {shown}"))?;
        let mut file: ConfigFile =
            toml::from_str(&raw).with_context(|| format!("failed to parse config file {shown}"))?;

        file.expand_env()
            .and_then(|()| file.validate())
            .with_context(|| format!("invalid config file {shown}"))?;

        let config_dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self { config_dir, file })
    }

    /// `dir` from the config file, anchored at the config file's directory.
    pub fn resolve_path(&self, dir: &str) -> PathBuf {
        let dir = Path::new(dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.config_dir.join(dir)
        }
    }

    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout {
            model_dir: self.resolve_path(&self.file.paths.model_dir),
            migration_dir: self.resolve_path(&self.file.paths.migration_dir),
            registry_file: self.file.paths.registry_file.clone(),
            module: self.file.module.clone(),
            timestamp_prefix: self.file.model.timestamp_prefix,
        }
    }
}

/// Layout for a run: from the config file when present, defaults otherwise.
///
/// A missing file is only an error when it was named with `--config`.
pub fn resolve_layout(config_path: &Path, explicit: bool) -> anyhow::Result<ProjectLayout> {
    if config_path.exists() || explicit {
        let project = ProjectConfig::load(config_path)?;
        tracing::debug!(config = %config_path.display(), "loaded config");
        return Ok(project.layout());
    }
    let root = config_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(ProjectLayout::new(root))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default = "default_module")]
    pub module: String,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub model_dir: String,
    pub migration_dir: String,
    pub registry_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            model_dir: DEFAULT_MODEL_DIR.to_string(),
            migration_dir: DEFAULT_MIGRATION_DIR.to_string(),
            registry_file: DEFAULT_REGISTRY_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub timestamp_prefix: bool,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.module = expand_env_vars("module", &self.module)?;
        self.paths.model_dir = expand_env_vars("paths.model_dir", &self.paths.model_dir)?;
        self.paths.migration_dir =
            expand_env_vars("paths.migration_dir", &self.paths.migration_dir)?;
        self.paths.registry_file =
            expand_env_vars("paths.registry_file", &self.paths.registry_file)?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.module.trim().is_empty() {
            anyhow::bail!("module must not be empty");
        }
        if self.paths.model_dir.trim().is_empty() {
            anyhow::bail!("paths.model_dir must not be empty");
        }
        if self.paths.migration_dir.trim().is_empty() {
            anyhow::bail!("paths.migration_dir must not be empty");
        }

        let registry = self.paths.registry_file.trim();
        if registry.is_empty() {
            anyhow::bail!("paths.registry_file must not be empty");
        }
        if registry.contains(['/', '\\']) {
            anyhow::bail!("paths.registry_file must be a file name, not a path: {registry}");
        }

        Ok(())
    }
}

/// Replace every `${VAR}` in `value` with the environment variable. `key`
/// names the config entry in error messages.
fn expand_env_vars(key: &str, value: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("{key}: unterminated env var reference `${{{after}`");
        };

        let var = &after[..end];
        if var.is_empty() {
            anyhow::bail!("{key}: empty env var reference `${{}}`");
        }
        let expanded = std::env::var(var)
            .with_context(|| format!("{key}: env var {var} is not set"))?;
        out.push_str(&expanded);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

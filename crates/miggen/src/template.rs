//! Migration entry templates.
//!
//! Each template renders one `*gormigrate.Migration` literal, indented to sit
//! inside the registry's migration list. Placeholders are written `{{Name}}`
//! and substituted verbatim: values are trusted developer input and are not
//! escaped.

use crate::error::{MiggenError, MiggenResult};
use std::collections::BTreeMap;

const CREATE_TABLE: &str = r#"		{
			ID: "{{ID}}",
			Migrate: func(tx *gorm.DB) error {
				return tx.Migrator().CreateTable(&{{Package}}.{{Model}}{})
			},
			Rollback: func(tx *gorm.DB) error {
				return tx.Migrator().DropTable("{{Table}}")
			},
		},"#;

const ADD_COLUMN: &str = r#"		{
			ID: "{{ID}}",
			Migrate: func(tx *gorm.DB) error {
				type {{Model}} struct {
					{{Column}} {{Type}}{{Tag}}
				}
				return tx.Migrator().AddColumn(&{{Model}}{}, "{{Column}}")
			},
			Rollback: func(tx *gorm.DB) error {
				return tx.Migrator().DropColumn(&{{Package}}.{{Model}}{}, "{{Column}}")
			},
		},"#;

const DROP_COLUMN: &str = r#"		{
			ID: "{{ID}}",
			Migrate: func(tx *gorm.DB) error {
				return tx.Migrator().DropColumn(&{{Package}}.{{Model}}{}, "{{Column}}")
			},
			Rollback: func(tx *gorm.DB) error {
				// {{Column}} has to be re-added by hand to roll this back
				return nil
			},
		},"#;

const CREATE_INDEX: &str = r#"		{
			ID: "{{ID}}",
			Migrate: func(tx *gorm.DB) error {
				return tx.Exec("CREATE INDEX {{Index}} ON {{Table}} ({{Column}})").Error
			},
			Rollback: func(tx *gorm.DB) error {
				return tx.Exec("DROP INDEX {{Index}} ON {{Table}}").Error
			},
		},"#;

const DROP_INDEX: &str = r#"		{
			ID: "{{ID}}",
			Migrate: func(tx *gorm.DB) error {
				return tx.Exec("DROP INDEX {{Index}} ON {{Table}}").Error
			},
			Rollback: func(tx *gorm.DB) error {
				return tx.Exec("CREATE INDEX {{Index}} ON {{Table}} ({{Column}})").Error
			},
		},"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationTemplate {
    /// `CreateTable` forward, `DropTable` rollback.
    CreateTable,
    /// `AddColumn` through a shadow struct named after the model.
    AddColumn,
    /// `DropColumn` forward; the rollback is a no-op with a note.
    DropColumn,
    /// Raw `CREATE INDEX` / `DROP INDEX`.
    CreateIndex,
    DropIndex,
}

impl MigrationTemplate {
    pub fn source(self) -> &'static str {
        match self {
            Self::CreateTable => CREATE_TABLE,
            Self::AddColumn => ADD_COLUMN,
            Self::DropColumn => DROP_COLUMN,
            Self::CreateIndex => CREATE_INDEX,
            Self::DropIndex => DROP_INDEX,
        }
    }

    pub fn render(self, vars: &TemplateVars) -> MiggenResult<String> {
        render(self.source(), vars)
    }
}

/// Placeholder values keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<&'static str, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}

/// Substitute every `{{Name}}` in `template`.
///
/// Unknown names and unterminated `{{` are errors; single braces pass through.
pub fn render(template: &str, vars: &TemplateVars) -> MiggenResult<String> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(MiggenError::Template(format!(
                "unterminated placeholder: {{{{{}",
                after.lines().next().unwrap_or_default()
            )));
        };

        let key = after[..end].trim();
        if key.is_empty() {
            return Err(MiggenError::Template("empty placeholder: {{}}".to_string()));
        }
        let value = vars
            .get(key)
            .ok_or_else(|| MiggenError::Template(format!("no value for placeholder: {key}")))?;
        out.push_str(value);

        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

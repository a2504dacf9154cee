//! The migration registry: a single Go file holding the gormigrate list and
//! the auto-migrate model list.
//!
//! New text is spliced directly after an anchor marker. Both markers must
//! appear exactly once; anything else means the file was edited into a shape
//! we cannot safely patch, and nothing is written.
//!
//! Every splice lands at the front of its list, so the physical order is the
//! reverse of insertion order. IDs still increase in call order.

use crate::error::{MiggenError, MiggenResult};
use crate::fsutil::{read_to_string, write_atomic};
use crate::layout::ProjectLayout;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const LIST_OPEN: &str = "[]*gormigrate.Migration{";
pub const AUTO_MIGRATE_OPEN: &str = "return []interface{}{";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Opening of the ordered migration list.
    MigrationList,
    /// Opening of the slice returned by `getModels()`.
    AutoMigrate,
}

impl Anchor {
    pub fn marker(self) -> &'static str {
        match self {
            Anchor::MigrationList => LIST_OPEN,
            Anchor::AutoMigrate => AUTO_MIGRATE_OPEN,
        }
    }
}

/// Initial registry content.
pub fn skeleton(model_import: &str) -> String {
    format!(
        r#"package migration

import (
	"log"

	"{model_import}"

	"github.com/go-gormigrate/gormigrate/v2"
	"gorm.io/gorm"
)

func NewMigration(db *gorm.DB) {{
	m := gormigrate.New(db, gormigrate.DefaultOptions, {LIST_OPEN}
		// migrations inserted here
	}})

	m.InitSchema(func(tx *gorm.DB) error {{
		return tx.AutoMigrate(getModels()...)
	}})

	if err := m.Migrate(); err != nil {{
		log.Fatalf("Migration failed: %v", err)
	}}
	log.Println("Migration did run successfully")
}}

func getModels() []interface{{}} {{
	{AUTO_MIGRATE_OPEN}
		// models inserted here
	}}
}}
"#
    )
}

/// Insert `text` on its own line right after `anchor`.
pub fn splice_after(content: &str, anchor: Anchor, text: &str) -> Result<String, String> {
    let marker = anchor.marker();
    let mut found = content.match_indices(marker);
    let Some((idx, _)) = found.next() else {
        return Err(format!("anchor not found: {marker}"));
    };
    if found.next().is_some() {
        return Err(format!("anchor appears more than once: {marker}"));
    }

    let pos = idx + marker.len();
    let mut out = String::with_capacity(content.len() + text.len() + 1);
    out.push_str(&content[..pos]);
    out.push('\n');
    out.push_str(text);
    out.push_str(&content[pos..]);
    Ok(out)
}

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bID:\s*"([^"]*)""#).expect("valid regex"))
}

/// Migration IDs in physical (file) order.
pub fn parse_migration_ids(content: &str) -> Vec<String> {
    id_pattern()
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    model_import: String,
    model_package: String,
}

impl Registry {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            path: layout.registry_path(),
            model_import: layout.model_import(),
            model_package: layout.model_package(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the registry with its skeleton if it is missing.
    ///
    /// Returns `true` when the file was created.
    pub fn ensure(&self) -> MiggenResult<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        write_atomic(&self.path, &skeleton(&self.model_import))?;
        tracing::info!(path = %self.path.display(), "created migration registry");
        Ok(true)
    }

    /// Splice one rendered migration entry at the front of the list.
    pub fn insert_entry(&self, entry: &str) -> MiggenResult<()> {
        self.splice(Anchor::MigrationList, entry)
    }

    /// Register `&<package>.<Model>{}` for schema sync on first run.
    pub fn insert_auto_migrate_ref(&self, model: &str) -> MiggenResult<()> {
        let line = format!("\t\t&{}.{model}{{}},", self.model_package);
        self.splice(Anchor::AutoMigrate, &line)
    }

    pub fn migration_ids(&self) -> MiggenResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(parse_migration_ids(&read_to_string(&self.path)?))
    }

    pub fn used_ids(&self) -> MiggenResult<HashSet<String>> {
        Ok(self.migration_ids()?.into_iter().collect())
    }

    fn splice(&self, anchor: Anchor, text: &str) -> MiggenResult<()> {
        let content = read_to_string(&self.path)?;
        let updated = splice_after(&content, anchor, text)
            .map_err(|message| MiggenError::corrupt(&self.path, message))?;
        tracing::debug!(
            path = %self.path.display(),
            anchor = anchor.marker(),
            bytes = text.len(),
            "spliced registry"
        );
        write_atomic(&self.path, &updated)
    }
}

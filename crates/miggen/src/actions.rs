//! Action handlers: each combines the model writer, a template and the
//! registry into one command.

use crate::error::{MiggenError, MiggenResult};
use crate::fsutil::LockGuard;
use crate::layout::ProjectLayout;
use crate::model::{Field, ModelWriter, TagUpdate};
use crate::naming::{index_name, table_name, validate_ident};
use crate::registry::Registry;
use crate::template::{MigrationTemplate, TemplateVars};
use crate::timestamp::{Timestamp, next_free_id};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create { model: String },
    AddColumn { model: String, fields: Vec<Field> },
    DropColumn { model: String, columns: Vec<String> },
    AddIndex { model: String, column: String },
    DropIndex { model: String, column: String },
}

impl Action {
    pub fn keyword(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::AddColumn { .. } => "add-column",
            Action::DropColumn { .. } => "drop-column",
            Action::AddIndex { .. } => "add-index",
            Action::DropIndex { .. } => "drop-index",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Action::Create { model }
            | Action::AddColumn { model, .. }
            | Action::DropColumn { model, .. }
            | Action::AddIndex { model, .. }
            | Action::DropIndex { model, .. } => model,
        }
    }
}

/// What an action changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub model_file: Option<PathBuf>,
    pub registry_created: bool,
    /// IDs of the entries spliced into the registry, in call order.
    pub migration_ids: Vec<String>,
    pub auto_migrate_added: bool,
    pub tag_update: Option<TagUpdate>,
}

/// Runs actions against one project layout.
///
/// The per-action methods do not take the lock; [`Generator::run`] does.
#[derive(Debug, Clone)]
pub struct Generator {
    layout: ProjectLayout,
    fixed_time: Option<Timestamp>,
}

impl Generator {
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            fixed_time: None,
        }
    }

    /// Use `at` instead of the wall clock for IDs and field notes.
    pub fn with_time(mut self, at: Timestamp) -> Self {
        self.fixed_time = Some(at);
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Run one action under the project lock.
    pub fn run(&self, action: &Action) -> MiggenResult<Report> {
        validate_ident("model name", action.model())?;
        let _lock = LockGuard::acquire(self.layout.lock_path())?;
        tracing::debug!(action = action.keyword(), model = action.model(), "running action");

        match action {
            Action::Create { model } => self.create_model(model),
            Action::AddColumn { model, fields } => self.add_columns(model, fields),
            Action::DropColumn { model, columns } => self.drop_columns(model, columns),
            Action::AddIndex { model, column } => self.add_index(model, column),
            Action::DropIndex { model, column } => self.drop_index(model, column),
        }
    }

    fn now(&self) -> Timestamp {
        self.fixed_time.unwrap_or_else(Timestamp::now)
    }

    fn models(&self) -> ModelWriter<'_> {
        ModelWriter::new(&self.layout)
    }

    fn base_vars(&self, model: &str) -> TemplateVars {
        TemplateVars::new()
            .set("Package", self.layout.model_package())
            .set("Model", model)
            .set("Table", table_name(model))
    }

    /// Render `template` with a fresh unique ID and splice it in.
    fn insert(
        &self,
        registry: &Registry,
        template: MigrationTemplate,
        vars: TemplateVars,
        at: &Timestamp,
        report: &mut Report,
    ) -> MiggenResult<()> {
        let id = next_free_id(&at.id(), &registry.used_ids()?);
        let entry = template.render(&vars.set("ID", id.clone()))?;
        registry.insert_entry(&entry)?;
        tracing::info!(id = %id, ?template, "inserted migration entry");
        report.migration_ids.push(id);
        Ok(())
    }

    fn open_registry(&self, report: &mut Report) -> MiggenResult<Registry> {
        let registry = Registry::new(&self.layout);
        report.registry_created = registry.ensure()?;
        Ok(registry)
    }

    pub fn create_model(&self, model: &str) -> MiggenResult<Report> {
        let at = self.now();
        let mut report = Report {
            model_file: Some(self.models().create_model(model, &at)?),
            ..Report::default()
        };

        let registry = self.open_registry(&mut report)?;
        self.insert(
            &registry,
            MigrationTemplate::CreateTable,
            self.base_vars(model),
            &at,
            &mut report,
        )?;
        registry.insert_auto_migrate_ref(model)?;
        report.auto_migrate_added = true;
        Ok(report)
    }

    /// Add each field to the model struct and emit one entry per field.
    ///
    /// The model must exist; nothing is written otherwise.
    pub fn add_columns(&self, model: &str, fields: &[Field]) -> MiggenResult<Report> {
        validate_ident("model name", model)?;
        if fields.is_empty() {
            return Err(MiggenError::InvalidInput(
                "add-column needs at least one column".to_string(),
            ));
        }
        let models = self.models();
        if !models.model_exists(model)? {
            return Err(MiggenError::NotFound(format!("model {model}")));
        }

        let at = self.now();
        let mut report = Report {
            model_file: Some(models.append_fields(model, fields, &at)?),
            ..Report::default()
        };

        let registry = self.open_registry(&mut report)?;
        for field in fields {
            let tag = field
                .tag_block()
                .map(|t| format!(" {t}"))
                .unwrap_or_default();
            let vars = self
                .base_vars(model)
                .set("Column", field.name.as_str())
                .set("Type", field.ty.as_str())
                .set("Tag", tag);
            self.insert(&registry, MigrationTemplate::AddColumn, vars, &at, &mut report)?;
        }
        Ok(report)
    }

    /// Emit one drop entry per column. The struct is left as it is and the
    /// model is not required to exist.
    pub fn drop_columns(&self, model: &str, columns: &[String]) -> MiggenResult<Report> {
        validate_ident("model name", model)?;
        if columns.is_empty() {
            return Err(MiggenError::InvalidInput(
                "drop-column needs at least one column".to_string(),
            ));
        }
        for column in columns {
            validate_ident("column name", column)?;
        }

        let at = self.now();
        let mut report = Report::default();
        let registry = self.open_registry(&mut report)?;
        for column in columns {
            let vars = self.base_vars(model).set("Column", column.as_str());
            self.insert(&registry, MigrationTemplate::DropColumn, vars, &at, &mut report)?;
        }
        Ok(report)
    }

    pub fn add_index(&self, model: &str, column: &str) -> MiggenResult<Report> {
        validate_ident("model name", model)?;
        validate_ident("column name", column)?;
        let models = self.models();
        if !models.model_exists(model)? {
            return Err(MiggenError::NotFound(format!("model {model}")));
        }

        let (path, outcome) = models.add_index_tag(model, column)?;
        let mut report = Report {
            model_file: Some(path),
            tag_update: Some(outcome),
            ..Report::default()
        };

        let at = self.now();
        let registry = self.open_registry(&mut report)?;
        self.insert(
            &registry,
            MigrationTemplate::CreateIndex,
            self.index_vars(model, column),
            &at,
            &mut report,
        )?;
        Ok(report)
    }

    /// Emit a drop-index entry. Like `drop_columns`, no existence check.
    pub fn drop_index(&self, model: &str, column: &str) -> MiggenResult<Report> {
        validate_ident("model name", model)?;
        validate_ident("column name", column)?;

        let at = self.now();
        let mut report = Report::default();
        let registry = self.open_registry(&mut report)?;
        self.insert(
            &registry,
            MigrationTemplate::DropIndex,
            self.index_vars(model, column),
            &at,
            &mut report,
        )?;
        Ok(report)
    }

    fn index_vars(&self, model: &str, column: &str) -> TemplateVars {
        self.base_vars(model)
            .set("Column", column)
            .set("Index", index_name(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fsutil::test_support::make_temp_dir;
    use chrono::{TimeZone, Utc};

    fn generator(root: &std::path::Path) -> Generator {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap());
        Generator::new(ProjectLayout::new(root)).with_time(at)
    }

    #[test]
    fn create_writes_model_entry_and_auto_migrate_ref() {
        let root = make_temp_dir("actions-create");
        let g = generator(&root);

        let report = g
            .run(&Action::Create {
                model: "Order".into(),
            })
            .unwrap();
        assert!(report.registry_created);
        assert!(report.auto_migrate_added);
        assert_eq!(report.migration_ids, vec!["20260304050607"]);
        assert_eq!(report.model_file, Some(root.join("model").join("order.go")));

        let registry = std::fs::read_to_string(root.join("migration/migration.go")).unwrap();
        assert!(registry.contains("CreateTable(&model.Order{})"));
        assert!(registry.contains(r#"DropTable("orders")"#));
        assert!(registry.contains("\t\t&model.Order{},"));
        assert!(!root.join("migration/.miggen.lock").exists());

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn same_second_entries_get_distinct_ids() {
        let root = make_temp_dir("actions-ids");
        let g = generator(&root);

        g.create_model("Order").unwrap();
        let fields = vec![
            Field::parse("amount:float64").unwrap(),
            Field::parse("note:string").unwrap(),
        ];
        let report = g.add_columns("Order", &fields).unwrap();
        assert_eq!(
            report.migration_ids,
            vec!["20260304050608", "20260304050609"]
        );

        let ids = Registry::new(g.layout()).migration_ids().unwrap();
        assert_eq!(ids, vec!["20260304050609", "20260304050608", "20260304050607"]);

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn add_column_to_missing_model_changes_nothing() {
        let root = make_temp_dir("actions-missing");
        let g = generator(&root);

        let err = g
            .run(&Action::AddColumn {
                model: "Invoice".into(),
                fields: vec![Field::parse("total:int").unwrap()],
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!root.join("migration/migration.go").exists());

        assert!(!root.join("migration").exists());

        let err = g
            .run(&Action::AddIndex {
                model: "Invoice".into(),
                column: "total".into(),
            })
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(!root.join("migration").exists());
        assert!(!root.join("model").exists());

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn add_index_on_missing_field_leaves_registry_untouched() {
        let root = make_temp_dir("actions-missing-field");
        let g = generator(&root);
        g.run(&Action::Create {
            model: "Order".into(),
        })
        .unwrap();
        let registry_path = root.join("migration/migration.go");
        let before = std::fs::read_to_string(&registry_path).unwrap();

        let err = g
            .run(&Action::AddIndex {
                model: "Order".into(),
                column: "missing".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(std::fs::read_to_string(&registry_path).unwrap(), before);
        assert!(!root.join("migration/.miggen.lock").exists());

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn drops_do_not_require_the_model() {
        let root = make_temp_dir("actions-drop");
        let g = generator(&root);

        let report = g
            .run(&Action::DropColumn {
                model: "Ghost".into(),
                columns: vec!["a".into(), "b".into()],
            })
            .unwrap();
        assert_eq!(report.migration_ids.len(), 2);

        let report = g
            .run(&Action::DropIndex {
                model: "Ghost".into(),
                column: "a".into(),
            })
            .unwrap();
        assert_eq!(report.migration_ids.len(), 1);

        let registry = std::fs::read_to_string(root.join("migration/migration.go")).unwrap();
        assert!(registry.contains(r#"DropColumn(&model.Ghost{}, "b")"#));
        assert!(registry.contains("DROP INDEX idx_a ON ghosts"));
        assert!(!registry.contains("&model.Ghost{},"));

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn invalid_names_are_rejected_before_any_write() {
        let root = make_temp_dir("actions-invalid");
        let g = generator(&root);

        let err = g
            .run(&Action::Create {
                model: "Bad Name".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!root.join("model").exists());
        assert!(!root.join("migration").exists());

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn held_lock_blocks_actions() {
        let root = make_temp_dir("actions-lock");
        let g = generator(&root);
        let held = LockGuard::acquire(g.layout().lock_path()).unwrap();

        let err = g
            .run(&Action::Create {
                model: "Order".into(),
            })
            .unwrap_err();
        assert!(matches!(err, MiggenError::Locked { .. }));
        assert!(!root.join("model").exists());

        drop(held);
        std::fs::remove_dir_all(root).expect("cleanup");
    }
}

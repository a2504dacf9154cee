//! # miggen
//!
//! Scaffolds GORM model files and keeps a single gormigrate registry file
//! (`migration/migration.go`) up to date.
//!
//! ```ignore
//! use miggen::{Action, Field, Generator, ProjectLayout};
//!
//! let generator = Generator::new(ProjectLayout::new("."));
//! generator.run(&Action::Create { model: "Order".into() })?;
//! generator.run(&Action::AddColumn {
//!     model: "Order".into(),
//!     fields: vec![Field::parse("amount:float64:index")?],
//! })?;
//! # Ok::<(), miggen::MiggenError>(())
//! ```
//!
//! One invocation is expected at a time; [`Generator::run`] takes a lock file
//! next to the registry and fails fast if another run holds it.

pub mod actions;
pub mod error;
pub mod fsutil;
pub mod layout;
pub mod model;
pub mod naming;
pub mod registry;
pub mod template;
pub mod timestamp;

pub use actions::{Action, Generator, Report};
pub use error::{ErrorKind, MiggenError, MiggenResult};
pub use layout::ProjectLayout;
pub use model::{Field, ModelWriter, TagUpdate};
pub use registry::{Anchor, Registry};
pub use template::{MigrationTemplate, TemplateVars};
pub use timestamp::Timestamp;

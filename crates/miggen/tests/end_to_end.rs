use miggen::registry::{AUTO_MIGRATE_OPEN, LIST_OPEN};
use miggen::{Action, Field, Generator, ProjectLayout, Registry, TagUpdate};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir() -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("miggen-e2e-test-{nonce}"));
    std::fs::create_dir_all(&dir).expect("mkdir");
    dir
}

#[test]
fn create_add_column_add_index() {
    let root = make_temp_dir();
    let generator = Generator::new(ProjectLayout::new(&root));

    generator
        .run(&Action::Create {
            model: "Order".into(),
        })
        .expect("create");
    generator
        .run(&Action::AddColumn {
            model: "Order".into(),
            fields: vec![Field::parse("amount:float64:index").expect("field")],
        })
        .expect("add-column");
    let report = generator
        .run(&Action::AddIndex {
            model: "Order".into(),
            column: "amount".into(),
        })
        .expect("add-index");
    assert_eq!(report.tag_update, Some(TagUpdate::AlreadyIndexed));

    let model_files: Vec<_> = std::fs::read_dir(root.join("model"))
        .expect("model dir")
        .map(|e| e.expect("entry").path())
        .collect();
    assert_eq!(model_files, vec![root.join("model").join("order.go")]);

    let model = std::fs::read_to_string(&model_files[0]).expect("read model");
    let amount_lines: Vec<&str> = model
        .lines()
        .filter(|l| l.trim_start().starts_with("amount "))
        .collect();
    assert_eq!(amount_lines.len(), 1);
    assert!(amount_lines[0].starts_with("\tamount float64 `gorm:\"index\"` // Added "));
    assert_eq!(model.matches("gorm:\"index").count(), 1);

    let registry_path = root.join("migration").join("migration.go");
    let registry = std::fs::read_to_string(&registry_path).expect("read registry");
    assert_eq!(registry.matches(LIST_OPEN).count(), 1);
    assert_eq!(registry.matches(AUTO_MIGRATE_OPEN).count(), 1);

    let ids = Registry::new(generator.layout())
        .migration_ids()
        .expect("ids");
    assert_eq!(ids.len(), 3);
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 3);

    let create_at = registry.find("CreateTable(&model.Order{})").expect("create");
    let column_at = registry.find(r#"AddColumn(&Order{}, "amount")"#).expect("column");
    let index_at = registry
        .find("CREATE INDEX idx_amount ON orders (amount)")
        .expect("index");
    assert!(index_at < column_at && column_at < create_at);
    assert!(registry.contains("\t\t&model.Order{},"));

    std::fs::remove_dir_all(root).expect("cleanup");
}

#[test]
fn later_fields_stack_above_earlier_ones() {
    let root = make_temp_dir();
    let generator = Generator::new(ProjectLayout::new(&root));

    generator.create_model("Invoice").expect("create");
    generator
        .add_columns("Invoice", &[Field::parse("Total:float64").expect("field")])
        .expect("first");
    generator
        .add_columns("Invoice", &[Field::parse("Paid:bool").expect("field")])
        .expect("second");

    let model = std::fs::read_to_string(root.join("model").join("invoice.go")).expect("read");
    let lines: Vec<&str> = model.lines().collect();
    let header = lines
        .iter()
        .position(|l| *l == "type Invoice struct {")
        .expect("header");
    assert!(lines[header + 1].starts_with("\tPaid bool // Added "));
    assert!(lines[header + 2].starts_with("\tTotal float64 // Added "));

    std::fs::remove_dir_all(root).expect("cleanup");
}

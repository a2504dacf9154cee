use crate::cli::RunArgs;
use crate::config::resolve_layout;
use colored::Colorize;
use miggen::{Action, Generator, Report, TagUpdate};

/// Run one action. Recoverable failures (missing model or field, bad input)
/// are printed as warnings and leave the exit status at zero.
pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let layout = resolve_layout(&args.config, args.config_explicit)?;
    let generator = Generator::new(layout);

    match generator.run(&args.action) {
        Ok(report) => {
            print_report(&generator, &args.action, &report);
            Ok(())
        }
        Err(e) if e.is_recoverable() => {
            tracing::debug!(kind = ?e.kind(), "recoverable failure");
            eprintln!("{} {e}", "warning:".yellow().bold());
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!(
            "{} {} failed",
            args.action.keyword(),
            args.action.model()
        ))),
    }
}

fn print_report(generator: &Generator, action: &Action, report: &Report) {
    let ok = "✓".green();

    if let Some(path) = &report.model_file {
        let verb = match action {
            Action::Create { .. } => "created",
            _ => "updated",
        };
        match report.tag_update {
            Some(TagUpdate::AlreadyIndexed) => {
                println!(
                    "{} {} already indexed in {}",
                    "•".yellow(),
                    action_column(action),
                    path.display()
                );
            }
            _ => println!("{ok} {verb} {}", path.display()),
        }
    }

    if report.registry_created {
        println!(
            "{ok} created {}",
            generator.layout().registry_path().display()
        );
    }

    for id in &report.migration_ids {
        println!("{ok} inserted migration {}", id.cyan());
    }

    if report.auto_migrate_added {
        println!("{ok} added {} to AutoMigrate", action.model().cyan());
    }
}

fn action_column(action: &Action) -> &str {
    match action {
        Action::AddIndex { column, .. } | Action::DropIndex { column, .. } => column,
        _ => action.model(),
    }
}

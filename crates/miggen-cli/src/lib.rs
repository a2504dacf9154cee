mod cli;
mod config;
mod dispatch;
mod logging;

use colored::Colorize;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help => {
            cli::print_help();
            Ok(())
        }
        cli::Command::Usage(problem) => {
            // Bad or missing positionals are a no-op, not a failure.
            eprintln!("{}", problem.yellow());
            cli::print_help();
            Ok(())
        }
        cli::Command::Run(args) => {
            logging::init(args.verbose);
            dispatch::run(args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn usage_problems_exit_cleanly_without_writing() {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("miggen-usage-test-{nonce}"));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let config = format!("--config={}", dir.join("miggen.toml").display());

        for tokens in [
            vec!["frobnicate", "Order"],
            vec!["add-column", "Order"],
            vec!["add-index", "Order", "a", "b"],
            vec!["create"],
        ] {
            let mut args = vec!["miggen".to_string(), config.clone()];
            args.extend(tokens.iter().map(|t| t.to_string()));
            run(args).expect("usage problems are not failures");
        }
        assert_eq!(std::fs::read_dir(&dir).expect("read_dir").count(), 0);

        let args = vec!["miggen".to_string(), "--bogus".to_string()];
        assert!(run(args).is_err());

        std::fs::remove_dir_all(dir).expect("cleanup");
    }
}

use crate::config::DEFAULT_CONFIG;
use miggen::{Action, Field};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Command {
    Help,
    /// Unknown action or missing positionals: print the problem and usage,
    /// touch nothing.
    Usage(String),
    Run(RunArgs),
}

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub config: PathBuf,
    /// `--config` was given, so the file must exist.
    pub config_explicit: bool,
    pub verbose: bool,
    pub action: Action,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());

    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut config_explicit = false;
    let mut verbose = false;
    let mut positional: Vec<&str> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
                config_explicit = true;
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
                config_explicit = true;
            }
            "-v" | "--verbose" => verbose = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => positional.push(other),
        }
    }

    let Some((&keyword, rest)) = positional.split_first() else {
        return Ok(Command::Help);
    };

    let action = match parse_action(keyword, rest) {
        Ok(action) => action,
        Err(problem) => return Ok(Command::Usage(problem)),
    };

    Ok(Command::Run(RunArgs {
        config,
        config_explicit,
        verbose,
        action,
    }))
}

fn parse_action(keyword: &str, rest: &[&str]) -> Result<Action, String> {
    let model = || {
        rest.first()
            .map(|m| m.to_string())
            .ok_or_else(|| format!("missing model name for `{keyword}`"))
    };

    match keyword {
        "create" | "c" => {
            let model = model()?;
            if let Some(extra) = rest.get(1) {
                return Err(format!("unexpected argument for `create`: {extra}"));
            }
            Ok(Action::Create { model })
        }
        "add-column" => {
            let model = model()?;
            if rest.len() < 2 {
                return Err("missing column:type argument".to_string());
            }
            let fields = rest[1..]
                .iter()
                .map(|spec| Field::parse(spec).map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Action::AddColumn { model, fields })
        }
        "drop-column" => {
            let model = model()?;
            if rest.len() < 2 {
                return Err("missing column name".to_string());
            }
            let columns = rest[1..].iter().map(|c| c.to_string()).collect();
            Ok(Action::DropColumn { model, columns })
        }
        "add-index" | "drop-index" => {
            let model = model()?;
            let column = match rest {
                [_, column] => column.to_string(),
                [_] => return Err("missing column name".to_string()),
                _ => return Err(format!("`{keyword}` takes exactly one column")),
            };
            if keyword == "add-index" {
                Ok(Action::AddIndex { model, column })
            } else {
                Ok(Action::DropIndex { model, column })
            }
        }
        other => Err(format!("unknown action: {other}")),
    }
}

pub fn print_help() {
    println!(
        "\
miggen - scaffold GORM models and gormigrate migrations

USAGE:
  miggen create <ModelName>
  miggen add-column <ModelName> <column:type[:tag]>...
  miggen drop-column <ModelName> <column>...
  miggen add-index <ModelName> <column>
  miggen drop-index <ModelName> <column>

OPTIONS:
  --config <FILE>       Config file path (default: {DEFAULT_CONFIG})
  -v, --verbose         Debug logging (RUST_LOG overrides)
  -h, --help            Print help

FILES:
  model/<model_name>.go        one struct per model
  migration/migration.go       migration registry (created on first use)"
    );
}

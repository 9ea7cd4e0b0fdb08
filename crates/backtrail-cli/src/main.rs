// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use backtrail_app::{HistoryCommand, HistoryState, QuickRange};
use backtrail_db::Store;
use backtrail_tui::UiOptions;
use config::Config;
use runtime::DbRuntime;
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        CliAction::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        CliAction::Run | CliAction::Check | CliAction::PrintDbPath => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `backtrail --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.action == CliAction::PrintDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    logging::init(&config)?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or BACKTRAIL_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    let now = OffsetDateTime::now_utc();
    if options.demo {
        let seeded = store.seed_demo_data(now)?;
        log::info!("seeded {seeded} demo visits");
    }
    if options.action == CliAction::Check {
        return Ok(());
    }

    let mut state = HistoryState::new(now.date());
    state.dispatch(HistoryCommand::SetTheme(config.theme()));
    let range = options.range.unwrap_or_else(|| config.default_range());
    state.dispatch(HistoryCommand::SetRange(range));
    if let Some(query) = options.search {
        state.dispatch(HistoryCommand::Search(query));
    }

    let ui_options = UiOptions {
        accent: config.accent().to_owned(),
        clear_default_range: Some(config.clear_default_range()),
    };
    let mut runtime = DbRuntime::new(&store);
    backtrail_tui::run_app(&mut state, &mut runtime, &ui_options)
}

/// What the invocation does once arguments are parsed; at most one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliAction {
    Run,
    Check,
    PrintConfigPath,
    PrintDbPath,
    PrintExampleConfig,
    Help,
}

impl CliAction {
    const fn flag(self) -> &'static str {
        match self {
            Self::Run => "",
            Self::Check => "--check",
            Self::PrintConfigPath => "--print-config-path",
            Self::PrintDbPath => "--print-path",
            Self::PrintExampleConfig => "--print-example-config",
            Self::Help => "--help",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    action: CliAction,
    demo: bool,
    range: Option<QuickRange>,
    search: Option<String>,
}

impl CliOptions {
    fn set_action(&mut self, action: CliAction) -> Result<()> {
        if self.action != CliAction::Run && self.action != action {
            bail!(
                "{} cannot be combined with {}",
                action.flag(),
                self.action.flag()
            );
        }
        self.action = action;
        Ok(())
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        action: CliAction::Run,
        demo: false,
        range: None,
        search: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let arg = arg.as_ref();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_owned())),
            _ => (arg, None),
        };
        let mut value_for = |what: &str| -> Result<String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => iter
                    .next()
                    .map(|value| value.as_ref().to_owned())
                    .ok_or_else(|| anyhow!("{flag} requires {what}")),
            }
        };

        match flag {
            "--config" => options.config_path = PathBuf::from(value_for("a file path")?),
            "--range" => {
                let value = value_for("a time range")?;
                let range = QuickRange::parse(&value).ok_or_else(|| {
                    anyhow!(
                        "--range must be one of {}, got {value:?}",
                        config::quick_range_names()
                    )
                })?;
                options.range = Some(range);
            }
            "--search" => options.search = Some(value_for("a query")?),
            "--demo" => options.demo = true,
            "--check" => options.set_action(CliAction::Check)?,
            "--print-config-path" => options.set_action(CliAction::PrintConfigPath)?,
            "--print-path" => options.set_action(CliAction::PrintDbPath)?,
            "--print-example-config" => options.set_action(CliAction::PrintExampleConfig)?,
            "--help" | "-h" => options.set_action(CliAction::Help)?,
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("backtrail: browse and prune your browsing history");
    println!("  --config <path>          Use a specific config path");
    println!(
        "  --range <name>           Start on a time range ({})",
        config::quick_range_names()
    );
    println!("  --search <query>         Start with a search query");
    println!("  --demo                   Launch with seeded demo history (in-memory)");
    println!("  --check                  Validate config + DB, then exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --help                   Show this help");
    println!();
    println!(
        "Set {} to override [log].level (env_logger filter syntax).",
        logging::LOG_ENV
    );
}

//! path-labeler: label a session from its working directory.
//!
//! Default mode reads a JSON request from stdin and writes the merged labels
//! to stdout:
//!
//!   {"scope": "/ws", "workingDirectory": "/ws/repo", "labels": ["manual"]}
//!   → {"labels": ["manual", "repo"], "added": ["repo"], "changed": true}
//!
//! Subcommands manage the rule set of a scope.

use clap::{CommandFactory, Parser, Subcommand};
use clap::error::ErrorKind;
use serde::Deserialize;
use std::io::Read;

use path_labeler::config::Config;
use path_labeler::logging;
use path_labeler::rules::{MatchMode, Rule};
use path_labeler::session::{AutoLabeler, LabeledSession, SessionLabels};
use path_labeler::store::RuleStore;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelRequest {
    scope: Option<String>,
    working_directory: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
}

impl LabelRequest {
    /// An explicit `--scope` wins over the request's own `scope`.
    fn resolve_scope(&mut self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.scope.take())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "path-labeler",
    version,
    about = "Label a session from its working directory. With no subcommand, reads a JSON request on stdin."
)]
struct Cli {
    /// Scope root holding labels/path-rules.json.
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Log at debug level to stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<RuleCommand>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum RuleCommand {
    /// Print the scope's rules as JSON
    List,
    /// Add a rule and print its id
    Add {
        /// Directory the rule covers
        path: String,
        /// Label id to apply
        label_id: String,
        /// Apply `<label>::<value>` instead of the bare label
        #[arg(long)]
        value: Option<String>,
        /// Match only this directory, not its descendants
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a rule
    Remove { id: String },
    /// Re-enable a disabled rule
    Enable { id: String },
    /// Keep a rule but stop it from matching
    Disable { id: String },
}

fn run_label(cli_scope: Option<String>, config: &Config) -> i32 {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        return 1;
    }

    let mut request: LabelRequest = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            return 1;
        }
    };

    let Some(scope) = request.resolve_scope(cli_scope) else {
        eprintln!("no scope given (request `scope` or --scope)");
        return 1;
    };

    let labeler = AutoLabeler::from_config(&scope, config);
    let mut session = SessionLabels {
        working_directory: request.working_directory,
        labels: request.labels,
    };
    let added = labeler.on_session_created(&mut session);
    let changed = !added.is_empty();

    let output = serde_json::json!({
        "labels": session.labels(),
        "added": added,
        "changed": changed,
    });
    println!("{output}");
    0
}

fn run_rules(scope: &str, command: RuleCommand) -> i32 {
    let store = RuleStore::new(scope);
    let result = match command {
        RuleCommand::List => {
            match serde_json::to_string_pretty(&store.load()) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("cannot serialize rules: {e}");
                    return 1;
                }
            }
            return 0;
        }
        RuleCommand::Add {
            path,
            label_id,
            value,
            exact,
            description,
        } => {
            let match_mode = if exact {
                MatchMode::Exact
            } else {
                MatchMode::Prefix
            };
            let mut rule = Rule::new(RuleStore::generate_id(), path, match_mode, label_id);
            rule.value = value;
            rule.description = description;
            let id = rule.id.clone();
            store.modify(|set| set.add(rule)).map(|_| id)
        }
        RuleCommand::Remove { id } => store
            .modify(|set| set.remove(&id).map(|_| ()))
            .map(|_| id),
        RuleCommand::Enable { id } => store
            .modify(|set| set.set_enabled(&id, true))
            .map(|_| id),
        RuleCommand::Disable { id } => store
            .modify(|set| set.set_enabled(&id, false))
            .map(|_| id),
    };

    match result {
        Ok(id) => {
            println!("{id}");
            0
        }
        Err(e) => {
            eprintln!("path-labeler: {e}");
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = Config::load();
    logging::init(&config.logging, cli.verbose);

    let code = match cli.command {
        None => run_label(cli.scope, &config),
        Some(command) => {
            let Some(scope) = cli.scope else {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "rule commands need --scope <DIR>",
                    )
                    .exit();
            };
            run_rules(&scope, command)
        }
    };
    std::process::exit(code);
}

//! CLI argument parsing tests.

use clap::CommandFactory;
use clap::Parser;

use stratum_cli::cli::{Cli, Command};

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_subcommands_parse() {
    let cli = Cli::try_parse_from(["stratum", "new", "create users table"]).unwrap();
    match cli.command {
        Command::New { name } => assert_eq!(name, "create users table"),
        other => panic!("expected new, got {other:?}"),
    }

    assert!(matches!(
        Cli::try_parse_from(["stratum", "up"]).unwrap().command,
        Command::Up
    ));
    assert!(matches!(
        Cli::try_parse_from(["stratum", "migrate"]).unwrap().command,
        Command::Migrate
    ));
    assert!(matches!(
        Cli::try_parse_from(["stratum", "status"]).unwrap().command,
        Command::Status
    ));
}

#[test]
fn test_down_is_an_alias_for_rollback() {
    assert!(matches!(
        Cli::try_parse_from(["stratum", "down"]).unwrap().command,
        Command::Rollback
    ));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "stratum",
        "migrate",
        "--strict",
        "--url",
        "sqlite:app.db",
    ])
    .unwrap();
    assert!(cli.strict);
    assert_eq!(cli.url.as_deref(), Some("sqlite:app.db"));
}

#[test]
fn test_missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["stratum"]).is_err());
}

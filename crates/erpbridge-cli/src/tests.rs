use super::*;
use crate::erp::{CustomerCommands, OrderCommands, StockCommands};
use crate::sync::SyncCommands;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["erpbridge-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["erpbridge-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["erpbridge-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn sync_run_defaults() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "sync", "run"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            command: SyncCommands::Run {
                since: None,
                no_images: false
            }
        })
    ));
}

#[test]
fn sync_run_parses_since_timestamp() {
    let cli = Cli::try_parse_from([
        "erpbridge-cli",
        "sync",
        "run",
        "--since",
        "2026-03-01T00:00:00Z",
        "--no-images",
    ])
    .unwrap();
    let Some(Commands::Sync {
        command: SyncCommands::Run { since, no_images },
    }) = cli.command
    else {
        panic!("expected sync run");
    };
    assert_eq!(
        since.map(|t| t.to_rfc3339()).as_deref(),
        Some("2026-03-01T00:00:00+00:00")
    );
    assert!(no_images);
}

#[test]
fn sync_run_rejects_bad_timestamp() {
    let result = Cli::try_parse_from(["erpbridge-cli", "sync", "run", "--since", "yesterday"]);
    assert!(result.is_err());
}

#[test]
fn sync_preview_json_flag() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "sync", "preview", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            command: SyncCommands::Preview { json: true, .. }
        })
    ));
}

#[test]
fn sync_runs_default_limit() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "sync", "runs"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            command: SyncCommands::Runs { limit: 20, id: None }
        })
    ));
}

#[test]
fn sync_runs_rejects_non_uuid_id() {
    let result = Cli::try_parse_from(["erpbridge-cli", "sync", "runs", "--id", "42"]);
    assert!(result.is_err());
}

#[test]
fn stock_check_quantity_defaults_to_one() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "stock", "check", "UTP-6"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Stock {
            command: StockCommands::Check { ref sku, quantity: 1 }
        }) if sku == "UTP-6"
    ));
}

#[test]
fn order_submit_accepts_file() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "order", "submit", "--file", "order.json"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Order {
            command: OrderCommands::Submit { file: Some(_) }
        })
    ));
}

#[test]
fn customer_get_takes_tax_id() {
    let cli = Cli::try_parse_from(["erpbridge-cli", "customer", "get", "76.123.456-7"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Customer {
            command: CustomerCommands::Get { ref tax_id }
        }) if tax_id == "76.123.456-7"
    ));
}

use super::*;

use bazaar_core::{Category, CategoryTree};
use chrono::Utc;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["bazaar-cli", "db", "ping"]).expect("expected valid cli args");

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
        Cli::try_parse_from(["bazaar-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli = Cli::try_parse_from(["bazaar-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["bazaar-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_db_fake_with_defaults() {
    let cli = Cli::try_parse_from([
        "bazaar-cli",
        "db",
        "fake",
        "--seller-email",
        "seller@example.com",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Fake {
                products: 50,
                ref seller_email,
            }
        }) if seller_email == "seller@example.com"
    ));
}

#[test]
fn parses_db_fake_product_count() {
    let cli = Cli::try_parse_from([
        "bazaar-cli",
        "db",
        "fake",
        "--products",
        "7",
        "--seller-email",
        "s@example.com",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Fake { products: 7, .. }
        })
    ));
}

#[test]
fn db_fake_requires_seller_email() {
    let result = Cli::try_parse_from(["bazaar-cli", "db", "fake", "--products", "3"]);
    assert!(result.is_err());
}

#[test]
fn db_fake_rejects_non_numeric_count() {
    let result = Cli::try_parse_from([
        "bazaar-cli",
        "db",
        "fake",
        "--products",
        "many",
        "--seller-email",
        "s@example.com",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_catalog_tree_command() {
    let cli =
        Cli::try_parse_from(["bazaar-cli", "catalog", "tree"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Catalog {
            command: CatalogCommands::Tree
        })
    ));
}

fn category(id: i64, name: &str, parent_id: Option<i64>) -> Category {
    Category {
        id,
        name: name.to_string(),
        parent_id,
        description: None,
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn render_tree_prints_full_paths() {
    let tree = CategoryTree::from_categories([
        category(1, "Electronics", None),
        category(2, "Phones", Some(1)),
        category(3, "Smartphones", Some(2)),
        category(4, "Books", None),
    ]);

    let lines = catalog::render_tree(&tree).expect("acyclic tree");
    assert_eq!(
        lines,
        vec![
            "1\tElectronics",
            "2\tElectronics / Phones",
            "3\tElectronics / Phones / Smartphones",
            "4\tBooks",
        ]
    );
}

#[test]
fn render_tree_fails_on_cycle() {
    let tree = CategoryTree::from_categories([
        category(1, "A", Some(2)),
        category(2, "B", Some(1)),
    ]);

    assert!(catalog::render_tree(&tree).is_err());
}

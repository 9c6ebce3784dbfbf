mod catalog;
mod db;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bazaar-cli")]
#[command(about = "Bazaar catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Inspect the catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert sizes, colors and categories from the catalog file
    Seed,
    /// Generate fake products for a seller
    Fake {
        /// Number of products to create
        #[arg(long, default_value = "50")]
        products: usize,
        /// Email of the seller who will own the products
        #[arg(long)]
        seller_email: String,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogCommands {
    /// Print every category's full path
    Tree,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("bazaar-cli: no command given, see --help");
        return Ok(());
    };

    let config = bazaar_core::load_app_config()?;
    let pool_config = bazaar_db::PoolConfig::from_app_config(&config);
    let pool = bazaar_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_ping(&pool).await?,
            DbCommands::Migrate => db::run_migrate(&pool).await?,
            DbCommands::Seed => db::run_seed(&pool, &config).await?,
            DbCommands::Fake {
                products,
                seller_email,
            } => db::run_fake(&pool, products, &seller_email).await?,
        },
        Commands::Catalog {
            command: CatalogCommands::Tree,
        } => catalog::run_tree(&pool).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;

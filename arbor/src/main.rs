use clap::Parser;
use tracing::info;

use arbor::config::{Args, Command};
use arbor::db::handlers::FindOptions;
use arbor::pagination::PageOptions;
use arbor::service::{PostListOptions, Services};
use arbor::{Config, db, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args)?;

    // If --validate flag is set, exit successfully after config validation
    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry()?;

    tracing::debug!("{:?}", args);

    let url = config.database_url().ok_or_else(|| {
        anyhow::anyhow!("No database configured: set DATABASE_URL or database.url")
    })?;
    let pool = db::connect(url, &config.database.pool).await?;
    db::migrator().run(&pool).await?;
    info!("Migrations applied");

    let services = Services::new(pool, &config.content);

    match args.command {
        Some(Command::Categories { page, limit, trashed }) => {
            let page = services
                .categories
                .paginate(&PageOptions::new(page, limit), FindOptions::new().trashed(trashed))
                .await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Some(Command::Posts {
            page,
            limit,
            published,
            order,
            category,
        }) => {
            let options = PostListOptions {
                is_published: published,
                order,
                category,
                ..Default::default()
            };
            let page = services
                .posts
                .paginate_posts(&PageOptions::new(page, limit), &options)
                .await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        None => info!("Database is up to date"),
    }

    Ok(())
}

//! story-shelf server entry point.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use story_shelf::{
    catalog::{CatalogClient, find_chapter, get_chapter_list},
    config::{Cli, Command, Config, LibraryCommand, StoryCommand},
    library::{LibraryEntry, LibraryStateCache},
    models::timestamp_to_datetime,
    server,
    store::{DocumentStore, SqliteStore},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    // Handle command
    match cli.command {
        Some(Command::Init { force }) => cmd_init(force).await,
        Some(Command::Story { action }) => cmd_story(action, &config).await,
        Some(Command::Library { action }) => cmd_library(action, &config).await,
        Some(Command::Serve { bind }) => cmd_serve(config, bind).await,
        None => {
            // Default: start server
            cmd_serve(config, None).await
        }
    }
}

/// Initialize config and store.
async fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _store = SqliteStore::open(&config.store.path, config.store.indexes.clone())?;
    println!("Initialized store: {}", config.store.path.display());

    println!("\nEdit config.toml to configure your server.");
    println!("Then run: story-shelf serve");

    Ok(())
}

/// Catalog commands.
async fn cmd_story(action: StoryCommand, config: &Config) -> anyhow::Result<()> {
    let client = CatalogClient::from_config(&config.catalog)?;

    match action {
        StoryCommand::Show { slug } => {
            let story = client.fetch_story_details(&slug).await?;
            println!("{} ({})", story.name, story.slug);
            println!("Status:    {}", story.status);
            if !story.author.is_empty() {
                println!("Authors:   {}", story.author.join(", "));
            }
            let categories: Vec<&str> = story.category.iter().map(|c| c.name.as_str()).collect();
            println!("Genres:    {}", categories.join(", "));
            println!("Thumbnail: {}", story.thumb_url);
            for (i, server) in story.chapters.iter().enumerate() {
                println!(
                    "Server {}:  {} ({} chapters)",
                    i,
                    server.server_name,
                    server.server_data.len()
                );
            }
        }

        StoryCommand::Chapters { slug, server } => {
            let story = client.fetch_story_details(&slug).await?;
            let chapters = get_chapter_list(&story, Some(server));
            if chapters.is_empty() {
                println!("No chapters found.");
            } else {
                println!("{:<10} {:<40} FILENAME", "CHAPTER", "TITLE");
                println!("{}", "-".repeat(80));
                for chapter in chapters {
                    println!(
                        "{:<10} {:<40} {}",
                        chapter.chapter_name,
                        chapter.chapter_title.as_deref().unwrap_or(""),
                        chapter.filename
                    );
                }
            }
        }

        StoryCommand::Pages { slug, chapter } => {
            let story = client.fetch_story_details(&slug).await?;
            let Some(found) = find_chapter(&story, &chapter) else {
                anyhow::bail!("Chapter not found: {}", chapter);
            };

            for page in client.fetch_pages(&found.chapter_api_data).await? {
                println!("{}", page);
            }
        }

        StoryCommand::Search { keyword } => {
            let results = client.search(&keyword).await?;
            if results.items.is_empty() {
                println!("No stories found.");
            }
            for story in results.items {
                println!("{:<40} {:<12} {}", story.slug, story.status, story.name);
            }
        }
    }

    Ok(())
}

/// Library inspection commands.
async fn cmd_library(action: LibraryCommand, config: &Config) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(
        &config.store.path,
        config.store.indexes.clone(),
    )?);
    let cache = LibraryStateCache::new(store, config);

    match action {
        LibraryCommand::Show { user } => {
            cache.load(Some(&user)).await?;
            print_entries(&cache.library_view());
        }

        LibraryCommand::Favorites { user } => {
            cache.load(Some(&user)).await?;
            print_entries(&cache.favorites_view());
        }

        LibraryCommand::Stats { user } => {
            cache.load(Some(&user)).await?;
            let stats = cache.stats();
            println!("Stories read:      {}", stats.stories_read);
            println!("Completed:         {}", stats.completed_stories);
            println!("Favorites:         {}", stats.favorite_count);
            println!("Reading time (h):  {}", stats.reading_time_hours);
        }
    }

    Ok(())
}

fn print_entries(entries: &[LibraryEntry]) {
    if entries.is_empty() {
        println!("No stories found.");
        return;
    }

    println!(
        "{:<40} {:>8} {:>9} {:<4} LAST READ",
        "STORY", "PROGRESS", "CHAPTERS", "FAV"
    );
    println!("{}", "-".repeat(80));
    for entry in entries {
        println!(
            "{:<40} {:>7}% {:>4}/{:<4} {:<4} {}",
            entry.name,
            entry.progress,
            entry.read_chapters,
            entry.total_chapters,
            if entry.is_favorite { "yes" } else { "no" },
            timestamp_to_datetime(entry.last_read).format("%Y-%m-%d %H:%M")
        );
    }
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    // Override bind address if specified
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_shelf=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(
        &config.store.path,
        config.store.indexes.clone(),
    )?);
    let catalog = CatalogClient::from_config(&config.catalog)?;

    tracing::info!(
        bind = %config.server.bind,
        store = %config.store.path.display(),
        catalog = %config.catalog.base_url,
        indexes = config.store.indexes.len(),
        "Starting story-shelf server"
    );

    if config.store.indexes.is_empty() {
        tracing::warn!("No composite indexes configured, library queries will sort in memory");
    }

    let state = server::AppState::new(config.clone(), store, catalog);
    let app = server::create_router(state);

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

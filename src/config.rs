use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::CompositeIndex;

/// Reading progress and favorites for serialized illustrated stories.
#[derive(Parser, Debug, Clone)]
#[command(name = "story-shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "STORY_SHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Browse the story catalog.
    Story {
        /// Story subcommand action.
        #[command(subcommand)]
        action: StoryCommand,
    },

    /// Inspect a user's library.
    Library {
        /// Library subcommand action.
        #[command(subcommand)]
        action: LibraryCommand,
    },

    /// Create default config and an empty store.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Catalog subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StoryCommand {
    /// Show story details.
    Show {
        /// Story slug.
        slug: String,
    },

    /// List the chapters of one mirror server.
    Chapters {
        /// Story slug.
        slug: String,
        /// Mirror server index.
        #[arg(short, long, default_value_t = 0)]
        server: usize,
    },

    /// Print page image URLs of a chapter.
    Pages {
        /// Story slug.
        slug: String,
        /// Chapter filename, pointer or name.
        chapter: String,
    },

    /// Search stories by keyword.
    Search {
        /// Keyword.
        keyword: String,
    },
}

/// Library subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum LibraryCommand {
    /// Show reading history.
    Show {
        /// User id.
        #[arg(short, long)]
        user: String,
    },

    /// Show favorites.
    Favorites {
        /// User id.
        #[arg(short, long)]
        user: String,
    },

    /// Show statistics.
    Stats {
        /// User id.
        #[arg(short, long)]
        user: String,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Catalog API configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Library behavior.
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Per-user library caches kept in memory before idle ones are evicted.
    #[serde(default = "default_max_cached_libraries")]
    pub max_cached_libraries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_cached_libraries: default_max_cached_libraries(),
        }
    }
}

fn default_max_cached_libraries() -> usize {
    256
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to SQLite store file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Deadline for a single store call, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Declared composite indexes.
    #[serde(default)]
    pub indexes: Vec<CompositeIndex>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            timeout_seconds: default_timeout_seconds(),
            indexes: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/library.db")
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Catalog API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for a single API call, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl CatalogConfig {
    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

fn default_base_url() -> String {
    "https://otruyenapi.com/v1/api".to_string()
}

/// Library behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Estimated reading time of one chapter, in minutes.
    #[serde(default = "default_minutes_per_chapter")]
    pub minutes_per_chapter: u32,

    /// How long an error notice stays visible, in seconds.
    #[serde(default = "default_notice_seconds")]
    pub notice_seconds: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            minutes_per_chapter: default_minutes_per_chapter(),
            notice_seconds: default_notice_seconds(),
        }
    }
}

fn default_minutes_per_chapter() -> u32 {
    10
}

fn default_notice_seconds() -> u64 {
    5
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("story-shelf.toml"),
            dirs::config_dir()
                .map(|p| p.join("story-shelf").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/story-shelf/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# story-shelf configuration

[server]
bind = "0.0.0.0:8080"
# Library caches kept in memory; idle ones beyond this are evicted
max_cached_libraries = 256

[store]
# path = "/var/lib/story-shelf/library.db"
# Deadline for one store call, in seconds
timeout_seconds = 10

# Composite indexes let history and favorites be sorted by the store.
# Without them the library sorts in memory and logs a warning.
# [[store.indexes]]
# collection = "readingProgress"
# fields = ["userId", "lastRead"]
#
# [[store.indexes]]
# collection = "favorites"
# fields = ["userId", "addedAt"]

[catalog]
base_url = "https://otruyenapi.com/v1/api"
timeout_seconds = 10

[library]
# Estimated minutes spent on one chapter (drives reading time stats)
minutes_per_chapter = 10
# Seconds an error notice stays visible
notice_seconds = 5
"#
        .to_string()
    }
}

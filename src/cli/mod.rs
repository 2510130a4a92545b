use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::config::{self, Config};
use crate::domain::metadata::FolderMeta;
use crate::http::{cache::ResponseCache, server::HttpServer};
use crate::library::{Library, tags::LoftyTagReader};
use crate::public_endpoint::{FileRoute, PublicEndpoint, get_file_url};

#[derive(Parser)]
#[command(name = "audioshelf")]
#[command(version)]
#[command(about = "Browse a music folder tree over HTTP")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run http server hosting the library
    Serve,
    /// Print the browse response for a library folder
    Browse {
        /// Folder relative to the library root, empty for the root
        #[arg(default_value = "")]
        path: String,
    },
    /// Print the metadata of one audio file
    Meta {
        /// File relative to the library root
        path: String,
        /// Treat `path` as a folder and pick its first playable file
        #[arg(short, long)]
        folder: bool,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config.to_string_lossy())?;
    log::info!("Library path {}", cfg.library.root.display());

    let library = Library::new(cfg.library.root.clone(), Arc::new(LoftyTagReader));

    match cli.command {
        Commands::Serve => serve(cfg, library),

        Commands::Browse { path } => {
            let endpoint = local_endpoint(&cfg.http);
            let cover_url = |file: &str| get_file_url(&endpoint, FileRoute::Mp3, file);
            let result = library.browse(&path, &cover_url)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Meta { path, folder } => {
            let endpoint = local_endpoint(&cfg.http);
            let (file, meta) = if folder {
                match library.folder_meta(&path)? {
                    FolderMeta::Track { file, meta } => (file, meta),
                    FolderMeta::Cover { file } => {
                        println!("cover image: {}", get_file_url(&endpoint, FileRoute::Mp3, &file));
                        return Ok(());
                    }
                }
            } else {
                let meta = library.extract_metadata(&path, false)?;
                (path, meta)
            };
            println!("{}", serde_json::to_string_pretty(&meta)?);
            println!("mp3: {}", get_file_url(&endpoint, FileRoute::Mp3, &file));
            Ok(())
        }
    }
}

fn serve(cfg: Config, library: Library) -> anyhow::Result<()> {
    let cache = ResponseCache::new();
    let ttl = Duration::from_secs(cfg.cache.ttl_secs);
    let http_server =
        HttpServer::new(library, cache, cfg.http, ttl).with_cdg_root(cfg.library.cdg_root);

    log::info!(
        "Audio Server listening on {}:{}",
        http_server.config.bind_addr,
        http_server.config.port
    );
    http_server.run();
    Ok(())
}

fn local_endpoint(http: &config::HttpConfig) -> PublicEndpoint {
    PublicEndpoint::new("http", &format!("localhost:{}", http.port))
}

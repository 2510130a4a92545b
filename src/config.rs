use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Loads `path` and applies environment overrides. A missing file is fine
    /// as long as `MP3_PATH` names the library root.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config file at {path}, using environment only");
                None
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read config file {path}"));
            }
        };
        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Builds the config from optional TOML `contents` and the `var` lookup.
    pub fn from_sources<F>(contents: Option<&str>, var: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg: Config = match contents {
            Some(contents) => {
                toml::from_str(contents).with_context(|| "Failed to parse config TOML")?
            }
            None => {
                if var("MP3_PATH").is_none() {
                    anyhow::bail!("no config file and MP3_PATH is not set");
                }
                Config {
                    library: LibraryConfig {
                        root: PathBuf::new(),
                        cdg_root: None,
                    },
                    http: HttpConfig::default(),
                    cache: CacheConfig::default(),
                }
            }
        };
        cfg.apply_env(var)?;
        Ok(cfg)
    }

    /// Overrides file values with the environment variables the service reads at startup.
    pub fn apply_env<F>(&mut self, var: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = var("MP3_PATH") {
            self.library.root = PathBuf::from(root);
        }
        if let Some(root) = var("CDG_PATH") {
            self.library.cdg_root = Some(PathBuf::from(root));
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.http.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(protocol) = var("PROTOCOL") {
            self.http.protocol = protocol;
        }
        if let Some(port) = var("PORT") {
            self.http.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    /// Base directory holding artist/album/track folders
    pub root: PathBuf,
    /// Secondary asset library served under /api/cdg
    pub cdg_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Scheme used when building playback and image URLs
    pub protocol: String,
    /// Empty means any origin is allowed
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            protocol: "https".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

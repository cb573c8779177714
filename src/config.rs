use crate::image_store::ImageNaming;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub language: String,
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub image_naming: ImageNaming,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_api_key = get("TMDB_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: TMDB_API_KEY"))?;
        let language = get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let data_dir = match get("CINEFAV_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .context("Could not determine user data directory; set CINEFAV_DATA_DIR")?
                .join("cinefav"),
        };
        let bind = get("CINEFAV_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .context("CINEFAV_BIND must be a socket address like 0.0.0.0:3146")?;
        let image_naming = match get("CINEFAV_IMAGE_NAMING") {
            Some(v) => v.parse()?,
            None => ImageNaming::default(),
        };

        Ok(Self {
            tmdb_api_key,
            language,
            data_dir,
            bind,
            image_naming,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("favorites.db")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}

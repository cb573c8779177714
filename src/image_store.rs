use crate::error::{Error, Result};
use crate::models::MediaSummary;
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const IMAGE_EXTENSION: &str = "jpg";
/// Longest file stem kept; leaves room for `.jpg.part` under the usual 255-byte name limit.
pub const MAX_FILENAME_BYTES: usize = 200;

/// Downloads poster images and keeps them on local disk.
#[async_trait]
pub trait ImageFileStore: Send + Sync {
    /// Downloads `url` and stores it under `filename`, returning the local file identifier.
    async fn add_image(&self, url: &str, filename: &str) -> Result<String>;
    /// Bytes of a previously stored image, or `None` on a miss.
    fn load_image(&self, file: &str) -> Option<Vec<u8>>;
    async fn remove_image(&self, file: &str) -> Result<()>;
}

/// How a saved poster's filename is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageNaming {
    /// Named after the media title. Two items with the same title share a file.
    #[default]
    Title,
    /// SHA-256 over id and source URL.
    Hashed,
}

impl ImageNaming {
    pub fn filename_for(&self, media: &MediaSummary, url: &str) -> String {
        match self {
            ImageNaming::Title => encode_title(&media.title),
            ImageNaming::Hashed => {
                let mut hasher = Sha256::new();
                hasher.update(media.id.to_be_bytes());
                hasher.update(url.as_bytes());
                hex::encode(hasher.finalize())
            }
        }
    }
}

/// Percent-encoded title, cut at a whole character so the result stays within
/// [`MAX_FILENAME_BYTES`].
fn encode_title(title: &str) -> String {
    let mut name = String::new();
    for ch in title.chars() {
        let mut buf = [0u8; 4];
        let encoded = urlencoding::encode(ch.encode_utf8(&mut buf));
        if name.len() + encoded.len() > MAX_FILENAME_BYTES {
            break;
        }
        name.push_str(&encoded);
    }
    name
}

impl FromStr for ImageNaming {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(ImageNaming::Title),
            "hashed" | "hash" => Ok(ImageNaming::Hashed),
            other => Err(anyhow::anyhow!(
                "image naming must be 'title' or 'hashed', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FsImageStore {
    client: Client,
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            root: root.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file: &str) -> Option<PathBuf> {
        // Identifiers are bare file names; anything else could escape the root.
        if file.is_empty()
            || file.len() > MAX_FILENAME_BYTES + IMAGE_EXTENSION.len() + 1
            || Path::new(file).file_name().and_then(|n| n.to_str()) != Some(file)
        {
            return None;
        }
        Some(self.root.join(file))
    }
}

#[async_trait]
impl ImageFileStore for FsImageStore {
    async fn add_image(&self, url: &str, filename: &str) -> Result<String> {
        let file = format!("{filename}.{IMAGE_EXTENSION}");
        let path = self
            .path_for(&file)
            .ok_or_else(|| Error::InvalidImage(format!("invalid image filename '{}'", filename)))?;

        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        let bytes = res.bytes().await?;
        if bytes.is_empty() {
            return Err(Error::InvalidImage(format!("empty image body from {}", url)));
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let partial = self.root.join(format!("{file}.part"));
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        info!(file = %file, bytes = bytes.len(), "Stored poster image");
        Ok(file)
    }

    fn load_image(&self, file: &str) -> Option<Vec<u8>> {
        let path = self.path_for(file)?;
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(file = %file, "Poster image not loaded: {}", e);
                None
            }
        }
    }

    async fn remove_image(&self, file: &str) -> Result<()> {
        let Some(path) = self.path_for(file) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use crate::image_store::ImageFileStore;
use crate::image_url;

/// What a poster cell should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    Remote(String),
    Local(String),
    Placeholder,
}

impl Poster {
    /// Poster for a catalog item, from its relative backdrop path.
    pub fn remote(path: &str) -> Self {
        if path.is_empty() {
            Poster::Placeholder
        } else {
            Poster::Remote(image_url::tmdb(path))
        }
    }

    /// Poster for a saved item, from its local file identifier.
    pub fn local(file: &str) -> Self {
        if file.is_empty() {
            Poster::Placeholder
        } else {
            Poster::Local(file.to_string())
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Poster::Remote(url) => Some(url),
            _ => None,
        }
    }

    /// Locally stored bytes. Remote posters and misses give `None`.
    pub fn bytes(&self, store: &dyn ImageFileStore) -> Option<Vec<u8>> {
        match self {
            Poster::Local(file) => store.load_image(file),
            _ => None,
        }
    }
}

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use tracing::debug;

use crate::{
    api::Modality,
    error::{Result, VectoError},
};

/// Image content given either as a file on disk or as loaded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    /// Resolves the source to its bytes, reading the file if needed.
    pub async fn load(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Path(path) => {
                debug!(path = %path.display(), "reading image from disk");
                tokio::fs::read(&path).await.map_err(|source| VectoError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// A piece of content to embed: raw text or an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Image(ImageSource),
}

impl Content {
    pub fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Image(_) => Modality::Image,
        }
    }

    pub(crate) async fn load(self) -> Result<Vec<u8>> {
        match self {
            Self::Text(text) => Ok(text.into_bytes()),
            Self::Image(source) => source.load().await,
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ImageSource> for Content {
    fn from(source: ImageSource) -> Self {
        Self::Image(source)
    }
}

/// Loads every piece of content concurrently, keeping input order.
pub(crate) async fn load_all(contents: Vec<Content>) -> Result<Vec<Vec<u8>>> {
    try_join_all(contents.into_iter().map(Content::load)).await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempdir::TempDir;

    use super::*;

    #[tokio::test]
    async fn loads_path_and_bytes_in_order() {
        let dir = TempDir::new("vecto-source").unwrap();
        let path = dir.path().join("blue.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"\x89PNG fake")
            .unwrap();

        let loaded = load_all(vec![
            Content::Image(ImageSource::path(&path)),
            Content::from("lion"),
            Content::Image(ImageSource::Bytes(vec![1, 2, 3])),
        ])
        .await
        .unwrap();

        assert_eq!(loaded[0], b"\x89PNG fake".to_vec());
        assert_eq!(loaded[1], b"lion".to_vec());
        assert_eq!(loaded[2], vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error_naming_the_path() {
        let err = ImageSource::path("/definitely/not/here.png")
            .load()
            .await
            .unwrap_err();
        match err {
            VectoError::Io { path, .. } => assert!(path.contains("not/here.png")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn content_reports_modality() {
        assert_eq!(Content::from("x").modality(), Modality::Text);
        assert_eq!(
            Content::from(ImageSource::Bytes(vec![])).modality(),
            Modality::Image
        );
    }
}

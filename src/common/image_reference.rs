use image::{DynamicImage, ImageReader};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handle to the photograph under analysis. Cloning shares the byte buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageReference {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl ImageReference {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageReference::Path(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        ImageReference::Bytes(bytes.into())
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageReference::Path(path) => Some(path),
            ImageReference::Bytes(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ImageReference::Path(path) => path.as_os_str().is_empty(),
            ImageReference::Bytes(bytes) => bytes.is_empty(),
        }
    }

    /// Reads only the header, enough to prove the image is decodable in format
    pub fn read_dimensions(&self) -> Result<(u32, u32), String> {
        match self {
            ImageReference::Path(path) => ImageReader::open(path)
                .map_err(|e| format!("cannot open {}: {}", path.display(), e))?
                .with_guessed_format()
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?
                .into_dimensions()
                .map_err(|e| format!("cannot decode {}: {}", path.display(), e)),
            ImageReference::Bytes(bytes) => ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()
                .map_err(|e| format!("cannot read image bytes: {}", e))?
                .into_dimensions()
                .map_err(|e| format!("cannot decode image bytes: {}", e)),
        }
    }

    pub fn load(&self) -> Result<DynamicImage, String> {
        match self {
            ImageReference::Path(path) => {
                image::open(path).map_err(|e| format!("cannot decode {}: {}", path.display(), e))
            }
            ImageReference::Bytes(bytes) => image::load_from_memory(bytes)
                .map_err(|e| format!("cannot decode image bytes: {}", e)),
        }
    }

    /// Reads the encoded bytes without blocking the runtime
    pub async fn read_bytes(&self) -> Result<Vec<u8>, String> {
        match self {
            ImageReference::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| format!("cannot read {}: {}", path.display(), e)),
            ImageReference::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageReference::Path(path) => write!(f, "{}", path.display()),
            ImageReference::Bytes(bytes) => write!(f, "<in-memory image, {} bytes>", bytes.len()),
        }
    }
}

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Image host backend types
///
/// Defined in core because configuration selects the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageHostBackend {
    Cloudinary,
    Local,
}

impl FromStr for ImageHostBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloudinary" => Ok(ImageHostBackend::Cloudinary),
            "local" => Ok(ImageHostBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid image host backend: {}", s)),
        }
    }
}

impl Display for ImageHostBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImageHostBackend::Cloudinary => write!(f, "cloudinary"),
            ImageHostBackend::Local => write!(f, "local"),
        }
    }
}

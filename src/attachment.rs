use anyhow::{Context, Result, bail};
use std::path::Path;

/// A pending image attachment, held in memory until the composition it
/// belongs to is submitted or the attachment is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: String,
}

impl Attachment {
    /// Read an image file into a pending attachment.
    ///
    /// Only `image/*` files are accepted; the backend rejects everything
    /// else anyway, so the check happens before any bytes are read.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            bail!("{} is not an image file", path.display());
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        Ok(Self {
            bytes,
            filename,
            mime: mime.essence_str().to_string(),
        })
    }

    /// One-line preview shown in the composer, e.g. `sunset.png (42.3 KB)`.
    pub fn preview(&self) -> String {
        format!("{} ({})", self.filename, human_size(self.bytes.len()))
    }
}

fn human_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

// src/controllers/export.rs
// Saving images shown in the preview or comparison views to disk.
use log::info;
use std::path::{Path, PathBuf};

use crate::errors::ClientError;
use crate::models::Image;
use crate::services::TransformerApi;

/// File name for `image` inside a target directory. Only the final path
/// component of the backend's filename is used.
pub fn export_name(image: &Image) -> String {
    image
        .filename
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("image-{}", image.id))
}

/// Writes `image` into `dir`. An inlined base64 payload is decoded in place;
/// otherwise the raw bytes are fetched from the backend.
pub async fn save_image(api: &dyn TransformerApi, image: &Image, dir: &Path) -> Result<PathBuf, ClientError> {
    let bytes = match image.decode_payload()? {
        Some(bytes) => bytes,
        None => api.fetch_raw_image(image.id).await?.to_vec(),
    };
    let path = dir.join(export_name(image));
    tokio::fs::write(&path, &bytes).await?;
    info!("saved image {} to {}", image.id, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageType;

    fn image(filename: Option<&str>) -> Image {
        Image {
            id: 9,
            transformer_id: Some(1),
            inspection_id: None,
            image_type: ImageType::Baseline,
            env_condition: None,
            uploader: None,
            filename: filename.map(str::to_string),
            content_type: None,
            size_bytes: None,
            created_at: None,
            base64_data: None,
        }
    }

    #[test]
    fn export_name_strips_directories() {
        assert_eq!(export_name(&image(Some("../../etc/thermal.jpg"))), "thermal.jpg");
        assert_eq!(export_name(&image(Some("scan.png"))), "scan.png");
        assert_eq!(export_name(&image(None)), "image-9");
        assert_eq!(export_name(&image(Some(".."))), "image-9");
    }
}

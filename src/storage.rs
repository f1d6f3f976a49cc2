use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

use crate::{
    config::Config,
    database::error::{Error, HtmlError},
};

/// Where recipe images end up.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Takes the image as sent by the client and returns the reference
    /// stored on the recipe row.
    async fn save(&self, image: &str) -> Result<String, Error>;

    /// Drops an image previously returned by `save`. Already missing images
    /// are not an error.
    async fn remove(&self, reference: &str) -> Result<(), Error>;
}

/// Writes images under `MEDIA_ROOT/recipes` and hands out `MEDIA_URL` paths.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: PathBuf, url: &str) -> Self {
        let url = if url.ends_with('/') {
            url.to_owned()
        } else {
            format!("{url}/")
        };

        Self { root, url }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.media_root.clone(), &config.media_url)
    }

    /// File behind a `MEDIA_URL/recipes/<file>` reference. Anything else,
    /// including paths leaving the media root, is rejected.
    fn image_path(&self, reference: &str) -> Result<PathBuf, Error> {
        let filename = reference
            .strip_prefix(&self.url)
            .and_then(|rest| rest.strip_prefix("recipes/"))
            .filter(|name| {
                !name.is_empty()
                    && !name.starts_with('.')
                    && !name.contains(['/', '\\'])
            })
            .ok_or_else(|| {
                HtmlError::InvalidRequest
                    .new("Not a stored recipe image.")
                    .on("image")
            })?;

        Ok(self.root.join("recipes").join(filename))
    }
}

fn invalid_image() -> Error {
    HtmlError::InvalidRequest
        .new("Upload a valid image as a base64 data URI.")
        .on("image")
}

/// `data:image/png;base64,iVBOR...` -> (`png`, bytes)
pub fn decode_data_uri(image: &str) -> Result<(&'static str, Vec<u8>), Error> {
    let (header, payload) = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(invalid_image)?;

    let extension = match header {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return Err(invalid_image()),
    };

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid_image())?;
    if bytes.is_empty() {
        return Err(invalid_image());
    }

    Ok((extension, bytes))
}

#[async_trait]
impl ImageStore for MediaStorage {
    async fn save(&self, image: &str) -> Result<String, Error> {
        let (extension, bytes) = decode_data_uri(image)?;
        let directory = self.root.join("recipes");
        let filename = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            log::error!("Failed to create media directory {}: {e}", directory.display());
            HtmlError::InternalServerError.default()
        })?;
        tokio::fs::write(directory.join(&filename), bytes)
            .await
            .map_err(|e| {
                log::error!("Failed to store image {filename}: {e}");
                HtmlError::InternalServerError.default()
            })?;

        log::trace!("Stored image {filename}");
        Ok(format!("{}recipes/{filename}", self.url))
    }

    async fn remove(&self, reference: &str) -> Result<(), Error> {
        let path = self.image_path(reference)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::trace!("Removed image {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                log::error!("Failed to remove image {}: {e}", path.display());
                Err(HtmlError::InternalServerError.default())
            }
        }
    }
}

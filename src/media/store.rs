//! Local filesystem store for recipe images. Filenames are generated,
//! never taken from the caller, so uploads cannot collide or escape root.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tokio::fs;
use uuid::Uuid;

use crate::database::error::StoreError;

pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Validates the payload as a raster image and persists it under a
    /// fresh `{uuid}.{ext}` name, with the extension taken from the
    /// sniffed format.
    pub async fn save_image(&self, data: &[u8]) -> Result<String, StoreError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|_| StoreError::InvalidImage)?;

        let format = reader.format().ok_or(StoreError::InvalidImage)?;
        reader.decode().map_err(|_| StoreError::InvalidImage)?;

        let extension = format
            .extensions_str()
            .first()
            .ok_or(StoreError::InvalidImage)?;
        let filename = format!("{}.{}", Uuid::new_v4(), extension);

        fs::create_dir_all(&self.root).await?;
        fs::write(self.path_for(&filename), data).await?;

        log::debug!("stored image {filename} ({} bytes)", data.len());
        Ok(filename)
    }

    /// Removes a stored file. Missing files are not an error; a filename
    /// containing a path separator is refused outright.
    pub async fn delete(&self, filename: &str) -> Result<(), StoreError> {
        if filename.contains(['/', '\\']) || Path::new(filename).components().count() != 1 {
            return Err(StoreError::InvalidImage);
        }

        match fs::remove_file(self.path_for(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

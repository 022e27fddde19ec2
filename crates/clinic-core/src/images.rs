//! Storage for uploaded patient images (x-rays, intra-oral photos).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

/// Accepted upload extensions.
pub const IMAGE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Numbered variants tried before giving up on a taken file name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Image storage errors.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Writes uploaded images under a single directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Save image bytes for a patient, stamped with the current local time.
    pub fn save(&self, patient_name: &str, extension: &str, bytes: &[u8]) -> ImageResult<PathBuf> {
        self.save_at(
            patient_name,
            extension,
            bytes,
            chrono::Local::now().naive_local(),
        )
    }

    /// Save image bytes as `<root>/<name>_<YYYYmmddHHMMSS>.<ext>`.
    ///
    /// The directory is created on demand. Existing files are never
    /// overwritten: a taken name gets a `_1`, `_2`, ... suffix.
    pub fn save_at(
        &self,
        patient_name: &str,
        extension: &str,
        bytes: &[u8],
        uploaded_at: NaiveDateTime,
    ) -> ImageResult<PathBuf> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ImageError::UnsupportedFormat(extension));
        }

        fs::create_dir_all(&self.root)?;

        let stem = format!(
            "{}_{}",
            sanitize_name(patient_name),
            uploaded_at.format("%Y%m%d%H%M%S")
        );
        let (path, mut file) = self.create_unique(&stem, &extension)?;

        if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), size = bytes.len(), "patient image stored");
        Ok(path)
    }

    /// Remove a stored image, e.g. when the patient record it belonged to
    /// could not be written. A file that is already gone is not an error.
    pub fn discard(&self, path: &Path) -> ImageResult<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "patient image discarded");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn create_unique(&self, stem: &str, extension: &str) -> ImageResult<(PathBuf, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{}.{}", stem, extension)
            } else {
                format!("{}_{}.{}", stem, attempt, extension)
            };
            let path = self.root.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}.{}", stem, extension),
        )
        .into())
    }
}

/// Replace characters that would escape the image directory or break the
/// file name.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "patient".to_string()
    } else {
        cleaned
    }
}

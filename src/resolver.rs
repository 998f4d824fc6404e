//! Turns a requested [`FileFormat`] into the bytes that end up on disk.

use crate::client::ActivitySession;
use crate::error::DownloaderError;
use crate::types::{ActivityId, FileFormat};
use log::{debug, warn};
use std::io::{Cursor, Read};

const ZIP_SIGNATURE: &[u8] = b"PK";

#[derive(Debug, PartialEq)]
pub enum Payload {
    /// Service bytes written as received.
    Raw(Vec<u8>),
    /// Entry pulled out of a ZIP wrapper.
    Extracted { entry: String, bytes: Vec<u8> },
    /// A ZIP wrapper with no entry of the wanted kind; saved whole.
    ArchiveFallback(Vec<u8>),
}

impl Payload {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Payload::Raw(bytes)
            | Payload::Extracted { bytes, .. }
            | Payload::ArchiveFallback(bytes) => bytes,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Payload::ArchiveFallback(_))
    }
}

pub async fn resolve<S: ActivitySession + ?Sized>(
    session: &S,
    activity_id: &ActivityId,
    format: FileFormat,
) -> Result<Payload, DownloaderError> {
    let data = session
        .download_activity(activity_id, format.export_format())
        .await?;

    match format {
        FileFormat::Fit => unwrap_native(data, format.extension()),
        FileFormat::Gpx | FileFormat::Tcx | FileFormat::Original => Ok(Payload::Raw(data)),
    }
}

/// Pulls the first entry ending in `.{extension}` out of a ZIP payload.
/// Payloads without the ZIP signature are already in native form.
pub fn unwrap_native(data: Vec<u8>, extension: &str) -> Result<Payload, DownloaderError> {
    if !data.starts_with(ZIP_SIGNATURE) {
        return Ok(Payload::Raw(data));
    }

    let suffix = format!(".{}", extension.to_ascii_lowercase());
    let extracted = {
        let mut archive = zip::ZipArchive::new(Cursor::new(data.as_slice()))?;
        let found = archive
            .file_names()
            .find(|name| name.to_ascii_lowercase().ends_with(&suffix))
            .map(str::to_string);

        match found {
            Some(name) => {
                let mut entry = archive.by_name(&name)?;
                // Declared sizes come from the archive and are not trusted.
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes)?;
                Some((name, bytes))
            }
            None => None,
        }
    };

    match extracted {
        Some((entry, bytes)) => {
            debug!("Extracted {} ({} bytes) from archive", entry, bytes.len());
            Ok(Payload::Extracted { entry, bytes })
        }
        None => {
            warn!("No .{} entry in archive, keeping archive bytes", extension);
            Ok(Payload::ArchiveFallback(data))
        }
    }
}

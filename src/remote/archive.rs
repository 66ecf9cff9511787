use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;
use zywrap_schema::BundleDocument;

use crate::error::FetchError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Decodes a bundle held in memory.
///
/// Zip archives are opened in place and `entry` is parsed out of them; when
/// the archive has no such entry the first `.json` member is used. Anything
/// that does not start with the zip signature is parsed as the JSON
/// document itself.
pub fn decode_bundle(bytes: &[u8], entry: &str) -> Result<BundleDocument, FetchError> {
    if !bytes.starts_with(ZIP_MAGIC) {
        return Ok(serde_json::from_slice(bytes)?);
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_error)?;
    let name = match archive.index_for_name(entry) {
        Some(_) => entry.to_string(),
        None => archive
            .file_names()
            .find(|n| n.ends_with(".json"))
            .map(str::to_string)
            .ok_or_else(|| FetchError::Archive(format!("`{entry}` not found in bundle")))?,
    };

    let mut file = archive.by_name(&name).map_err(archive_error)?;
    let mut raw = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
    file.read_to_end(&mut raw)
        .map_err(|e| FetchError::Archive(format!("failed to read `{name}`: {e}")))?;

    tracing::debug!(entry = %name, bytes = raw.len(), "bundle entry extracted");
    Ok(serde_json::from_slice(&raw)?)
}

fn archive_error(e: ZipError) -> FetchError {
    FetchError::Archive(e.to_string())
}

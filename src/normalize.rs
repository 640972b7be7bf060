// Metadata normalizer - maps raw provider payloads into the canonical shape

use crate::errors::Error;
use crate::models::{
    InfoEnvelope, MediaDescription, Rendition, DEFAULT_SOURCE_LABEL, DEFAULT_TITLE,
};

/// Fallback when the provider reports failure without an error message.
pub const GENERIC_METADATA_ERROR: &str = "Invalid response";

/// Build a [`MediaDescription`] from a metadata-lookup envelope.
///
/// A provider-reported failure becomes `Error::Metadata` carrying the
/// provider's text when present. Missing title and source labels get fixed
/// substitutes; a missing or empty rendition list gets the single synthetic
/// "best" entry so the canonical list is never empty.
pub fn normalize(envelope: InfoEnvelope) -> Result<MediaDescription, Error> {
    if !envelope.success {
        return Err(Error::Metadata(
            envelope
                .error
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| GENERIC_METADATA_ERROR.to_string()),
        ));
    }

    let raw = envelope
        .data
        .ok_or_else(|| Error::Metadata(GENERIC_METADATA_ERROR.to_string()))?;

    let mut renditions: Vec<Rendition> = raw
        .formats
        .unwrap_or_default()
        .into_iter()
        .map(Rendition::from_raw)
        .collect();
    if renditions.is_empty() {
        renditions.push(Rendition::synthetic_best());
    }

    Ok(MediaDescription {
        title: raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        duration_seconds: raw.duration,
        thumbnail_url: raw.thumbnail,
        source_label: raw
            .extractor
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_LABEL.to_string()),
        renditions,
    })
}

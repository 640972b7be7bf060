// Common data models: session aggregate, canonical metadata, wire payloads

use serde::{Deserialize, Serialize};

pub const DEFAULT_RENDITION: &str = "best";
pub const DEFAULT_TITLE: &str = "Untitled Video";
pub const DEFAULT_SOURCE_LABEL: &str = "Unknown Platform";

/// The single client-side state aggregate. Owned by the coordinator and
/// mutated only through [`Session::merge`]; observers receive snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// User-entered text, unvalidated.
    pub url: String,
    /// True while exactly one of {metadata fetch, download preparation} is outstanding.
    pub is_loading: bool,
    /// Last surfaced failure message; cleared at the start of any new attempt.
    pub error: Option<String>,
    /// Transient informational status.
    pub message: Option<String>,
    /// Canonical metadata for the current `url`.
    pub media_info: Option<MediaDescription>,
    /// Identifier of the chosen download variant.
    pub selected_rendition: String,
    /// Resolved download locator, set only after a successful preparation.
    pub download_handle: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            url: String::new(),
            is_loading: false,
            error: None,
            message: None,
            media_info: None,
            selected_rendition: DEFAULT_RENDITION.to_string(),
            download_handle: None,
        }
    }
}

/// Partial session update, shallow-merged by [`Session::merge`].
///
/// Clearable fields are double-optional: `None` leaves the field alone,
/// `Some(None)` clears it, `Some(Some(v))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub(crate) url: Option<String>,
    pub(crate) is_loading: Option<bool>,
    pub(crate) error: Option<Option<String>>,
    pub(crate) message: Option<Option<String>>,
    pub(crate) media_info: Option<Option<MediaDescription>>,
    pub(crate) selected_rendition: Option<String>,
    pub(crate) download_handle: Option<Option<String>>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.is_loading = Some(loading);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(Some(message.into()));
        self
    }

    pub fn clear_message(mut self) -> Self {
        self.message = Some(None);
        self
    }

    pub fn media_info(mut self, info: MediaDescription) -> Self {
        self.media_info = Some(Some(info));
        self
    }

    pub fn clear_media_info(mut self) -> Self {
        self.media_info = Some(None);
        self
    }

    pub fn selected_rendition(mut self, id: impl Into<String>) -> Self {
        self.selected_rendition = Some(id.into());
        self
    }

    pub fn download_handle(mut self, locator: impl Into<String>) -> Self {
        self.download_handle = Some(Some(locator.into()));
        self
    }

    pub fn clear_download_handle(mut self) -> Self {
        self.download_handle = Some(None);
        self
    }
}

/// Canonical, provider-agnostic description of a media item.
/// Immutable once constructed by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescription {
    pub title: String,
    pub duration_seconds: Option<f64>,
    pub thumbnail_url: Option<String>,
    /// Provider name, e.g. "youtube".
    pub source_label: String,
    /// Never empty; a synthetic "best" entry stands in when the provider
    /// supplies no renditions.
    pub renditions: Vec<Rendition>,
}

impl MediaDescription {
    /// Renditions for a "pick by quality" affordance: entries with a numeric
    /// height first, in descending-height order. The canonical list order is
    /// left untouched; this is a presentation concern.
    pub fn renditions_by_quality(&self) -> Vec<&Rendition> {
        let mut ordered: Vec<&Rendition> = self.renditions.iter().collect();
        ordered.sort_by_key(|r| std::cmp::Reverse(r.height.unwrap_or(0)));
        ordered
    }
}

/// One selectable quality/format variant of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    /// Unique within a MediaDescription.
    pub id: String,
    /// File container, e.g. "mp4".
    pub container: String,
    pub height: Option<u32>,
    pub label: Option<String>,
}

impl Rendition {
    pub fn from_raw(raw: RawFormat) -> Self {
        Self {
            id: raw.format_id,
            container: raw.ext.unwrap_or_else(|| "mp4".to_string()),
            height: raw.height,
            label: raw.format_note,
        }
    }

    /// Stand-in entry for providers that supply no explicit renditions.
    pub fn synthetic_best() -> Self {
        Self {
            id: DEFAULT_RENDITION.to_string(),
            container: "mp4".to_string(),
            height: Some(1080),
            label: Some("MP4".to_string()),
        }
    }

    /// UI label in the "1080p - mp4" style of the quality menu.
    pub fn display_label(&self) -> String {
        let head = self
            .height
            .map(|h| format!("{}p", h))
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| self.id.clone());
        format!("{} - {}", head, self.container)
    }
}

/// Raw metadata-lookup response envelope from the extraction service.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<RawMediaInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Provider metadata as returned by the extraction service, before
/// normalization. Every field is optional on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format_note: Option<String>,
}

/// Download-preparation response envelope. Newer service versions return a
/// full locator; older ones return a bare filename to be resolved against
/// the service's downloads path.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadEnvelope {
    pub success: bool,
    #[serde(default, alias = "downloadUrl")]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommunityLinksEnvelope {
    pub success: bool,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

/// Community locators shown beside the downloader. Defaults are hard-coded
/// and survive any failure to refresh them from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunityLinks {
    pub channel: String,
    pub group: String,
}

impl Default for CommunityLinks {
    fn default() -> Self {
        Self {
            channel: "https://whatsapp.com/channel/0029VayK4ty7DAWr0jeCZx0i".to_string(),
            group: "https://chat.whatsapp.com/FAJjIZY3a09Ck73ydqMs4E".to_string(),
        }
    }
}

/// Render a duration in seconds as "m:ss" or "h:mm:ss" for display.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

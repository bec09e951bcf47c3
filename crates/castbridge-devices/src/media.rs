/*!
 * Media descriptors and the vendor metadata envelope.
 *
 * [`MediaInfo`] is the protocol-neutral description of a playable asset.
 * [`build_metadata_envelope`] serializes it into the JSON object shipped to
 * the vendor `set_media_source` primitive. The envelope's omission rules are
 * part of the wire contract: absent or empty optional fields are left out of
 * the object entirely, except inside a subtitle track where optional fields
 * serialize as empty strings once a subtitle is present at all.
 */
use std::fmt;
use std::sync::Arc;

use castbridge_core::types::{Id, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::adapter::{VendorError, VendorMediaInfo};
use crate::service::MediaControl;

/// Artwork attached to a media descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// The artwork URL
    pub url: String,
}

impl ImageInfo {
    /// Create an image descriptor for the given URL
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { url: url.into() }
    }
}

/// Subtitle track attached to a media descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleInfo {
    /// The subtitle source URL
    pub url: String,
    /// The subtitle MIME type
    pub mime_type: Option<String>,
    /// Human-readable track label
    pub label: Option<String>,
    /// Track language code
    pub language: Option<String>,
}

impl SubtitleInfo {
    /// Start building a subtitle descriptor for the given URL
    pub fn builder<S: Into<String>>(url: S) -> SubtitleInfoBuilder {
        SubtitleInfoBuilder {
            info: SubtitleInfo {
                url: url.into(),
                ..Default::default()
            },
        }
    }
}

/// Builder for [`SubtitleInfo`]
pub struct SubtitleInfoBuilder {
    info: SubtitleInfo,
}

impl SubtitleInfoBuilder {
    /// Set the subtitle MIME type
    pub fn mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.info.mime_type = Some(mime_type.into());
        self
    }

    /// Set the track label
    pub fn label<S: Into<String>>(mut self, label: S) -> Self {
        self.info.label = Some(label.into());
        self
    }

    /// Set the track language
    pub fn language<S: Into<String>>(mut self, language: S) -> Self {
        self.info.language = Some(language.into());
        self
    }

    /// Finish building
    pub fn build(self) -> SubtitleInfo {
        self.info
    }
}

/// Protocol-neutral description of a playable media asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// The media source URL
    pub url: Option<String>,
    /// The media MIME type
    pub mime_type: Option<String>,
    /// Display title
    pub title: Option<String>,
    /// Display description
    pub description: Option<String>,
    /// Artwork list; the first entry is used as the envelope poster
    pub images: Option<Vec<ImageInfo>>,
    /// Optional subtitle track
    pub subtitle: Option<SubtitleInfo>,
}

impl MediaInfo {
    /// Start building a media descriptor
    pub fn builder() -> MediaInfoBuilder {
        MediaInfoBuilder {
            info: MediaInfo::default(),
        }
    }
}

/// Builder for [`MediaInfo`]
pub struct MediaInfoBuilder {
    info: MediaInfo,
}

impl MediaInfoBuilder {
    /// Set the media source URL
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.info.url = Some(url.into());
        self
    }

    /// Set the media MIME type
    pub fn mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.info.mime_type = Some(mime_type.into());
        self
    }

    /// Set the display title
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.info.title = Some(title.into());
        self
    }

    /// Set the display description
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.info.description = Some(description.into());
        self
    }

    /// Set the artwork list
    pub fn images(mut self, images: Vec<ImageInfo>) -> Self {
        self.info.images = Some(images);
        self
    }

    /// Add a single piece of artwork
    pub fn image(mut self, image: ImageInfo) -> Self {
        self.info.images.get_or_insert_with(Vec::new).push(image);
        self
    }

    /// Set the subtitle track
    pub fn subtitle(mut self, subtitle: SubtitleInfo) -> Self {
        self.info.subtitle = Some(subtitle);
        self
    }

    /// Finish building
    pub fn build(self) -> MediaInfo {
        self.info
    }
}

/// Kind of session created by a launch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchSessionType {
    /// An application session
    App,
    /// A media playback session
    Media,
}

/// Handle to a launched session on a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSession {
    /// Session identifier
    pub id: Id,
    /// Identifier of the service that created the session
    pub service_id: String,
    /// The session kind
    pub session_type: LaunchSessionType,
}

impl LaunchSession {
    /// Create a media playback session for the given service
    pub fn media<S: Into<String>>(service_id: S) -> Self {
        Self {
            id: Id::new(),
            service_id: service_id.into(),
            session_type: LaunchSessionType::Media,
        }
    }
}

/// Success payload of a media launch operation
#[derive(Clone)]
pub struct MediaLaunchObject {
    /// The created session
    pub launch_session: LaunchSession,
    /// Media control surface of the launching service, when still alive
    pub media_control: Option<Arc<dyn MediaControl>>,
}

impl fmt::Debug for MediaLaunchObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaLaunchObject")
            .field("launch_session", &self.launch_session)
            .field("media_control", &self.media_control.is_some())
            .finish()
    }
}

fn insert_if_present(object: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            object.insert(key.to_string(), Value::String(value.clone()));
        }
    }
}

/// Build the vendor metadata envelope for a media descriptor.
///
/// Wire contract: `title`, `description`, `type` and `poster` are omitted
/// when absent or empty; `poster` comes from the first artwork entry; a
/// present subtitle always yields a one-entry `tracks` array whose optional
/// fields are empty strings when unset; `noreplay` is always `true`.
pub fn build_metadata_envelope(media: &MediaInfo) -> Value {
    let mut object = Map::new();

    insert_if_present(&mut object, "title", &media.title);
    insert_if_present(&mut object, "description", &media.description);
    insert_if_present(&mut object, "type", &media.mime_type);

    let poster = media
        .images
        .as_ref()
        .and_then(|images| images.first())
        .map(|image| image.url.clone());
    insert_if_present(&mut object, "poster", &poster);

    if let Some(subtitle) = &media.subtitle {
        object.insert(
            "tracks".to_string(),
            json!([{
                "srclang": subtitle.language.clone().unwrap_or_default(),
                "label": subtitle.label.clone().unwrap_or_default(),
                "src": subtitle.url,
                "kind": "subtitles",
            }]),
        );
    }

    object.insert("noreplay".to_string(), Value::Bool(true));
    Value::Object(object)
}

/// Parse a vendor media-info payload into a [`MediaInfo`].
///
/// The vendor metadata must be a JSON object; anything else is rejected.
pub(crate) fn parse_vendor_media_info(info: &VendorMediaInfo) -> Result<MediaInfo, VendorError> {
    let metadata: Metadata = serde_json::from_str(&info.metadata)
        .map_err(|e| VendorError::new(format!("Invalid media metadata: {}", e)))?;

    let field = |key: &str| {
        metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(MediaInfo {
        url: Some(info.source.clone()),
        mime_type: field("type"),
        title: field("title"),
        description: field("description"),
        images: field("poster").map(|url| vec![ImageInfo::new(url)]),
        subtitle: None,
    })
}

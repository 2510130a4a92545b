use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalized tags of one audio file.
///
/// `image` holds the first embedded picture as a `data:` URI. Tag fields
/// outside the album summary subset live in `extra` and are flattened
/// into the JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TrackMetadata {
    /// Keeps only artist, album, year, genre and image.
    pub fn into_summary(self) -> Self {
        Self {
            extra: BTreeMap::new(),
            ..self
        }
    }
}

/// Card for one album folder in an artist level listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_folder_cover: bool,
}

impl AlbumSummary {
    pub fn from_cover(path: String, image_url: String) -> Self {
        Self {
            path,
            image: Some(image_url),
            is_folder_cover: true,
            ..Default::default()
        }
    }

    pub fn from_tags(path: String, meta: TrackMetadata) -> Self {
        Self {
            path,
            artist: meta.artist,
            album: meta.album,
            year: meta.year,
            genre: meta.genre,
            image: meta.image,
            is_folder_cover: false,
        }
    }
}

/// Response body of a browse request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowseResult {
    pub path: String,
    pub folders: Vec<String>,
    pub albums: Vec<AlbumSummary>,
    pub files: Vec<String>,
    pub unsupported: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<TrackMetadata>,
}

/// Outcome of looking for something to show for a whole folder.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderMeta {
    /// Full tags of the first audio file that decoded, with its library relative path
    Track { file: String, meta: TrackMetadata },
    /// Relative path of a standalone cover image
    Cover { file: String },
}

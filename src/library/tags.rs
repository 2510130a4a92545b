//! Reading embedded tags out of audio files

use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use lofty::file::TaggedFileExt;
use lofty::picture::MimeType;
use lofty::tag::{Accessor, ItemKey, Tag};
use serde_json::{Value, json};

/// Embedded picture as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Normalized tag fields of one file, before the picture is encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTags {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u32>,
    pub genre: Option<String>,
    pub picture: Option<RawPicture>,
    pub extra: BTreeMap<String, Value>,
}

/// Capability to decode tags from an audio file on disk.
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> anyhow::Result<RawTags>;
}

/// [`TagReader`] backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> anyhow::Result<RawTags> {
        let tagged = lofty::read_from_path(path)
            .with_context(|| format!("failed to parse audio file {}", path.display()))?;

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            log::debug!("no tags in {}", path.display());
            return Ok(RawTags::default());
        };

        Ok(tags_from_lofty(tag))
    }
}

fn tags_from_lofty(tag: &Tag) -> RawTags {
    let mut extra = BTreeMap::new();

    if let Some(title) = tag.title().and_then(|s| normalize_text(&s)) {
        extra.insert("title".to_string(), json!(title));
    }
    if let Some(v) = tag.get_string(&ItemKey::AlbumArtist).and_then(normalize_text) {
        extra.insert("albumartist".to_string(), json!(v));
    }
    if let Some(v) = tag.get_string(&ItemKey::Composer).and_then(normalize_text) {
        extra.insert("composer".to_string(), json!(v));
    }
    if let Some(v) = tag.comment().and_then(|s| normalize_text(&s)) {
        extra.insert("comment".to_string(), json!(v));
    }
    if tag.track().is_some() || tag.track_total().is_some() {
        extra.insert(
            "track".to_string(),
            json!({ "no": tag.track(), "of": tag.track_total() }),
        );
    }
    if tag.disk().is_some() || tag.disk_total().is_some() {
        extra.insert(
            "disk".to_string(),
            json!({ "no": tag.disk(), "of": tag.disk_total() }),
        );
    }

    RawTags {
        artist: tag.artist().and_then(|s| normalize_text(&s)),
        album: tag.album().and_then(|s| normalize_text(&s)),
        year: tag.year(),
        genre: tag.genre().and_then(|s| normalize_text(&s)),
        picture: tag.pictures().iter().find(|p| !p.data().is_empty()).map(|p| {
            RawPicture {
                mime_type: p
                    .mime_type()
                    .map(mime_type_to_string)
                    .unwrap_or_else(|| "image/jpeg".to_string()),
                data: p.data().to_vec(),
            }
        }),
        extra,
    }
}

/// Trims the value, empty strings count as missing
fn normalize_text(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn mime_type_to_string(mime_type: &MimeType) -> String {
    match mime_type {
        MimeType::Png => "image/png".to_string(),
        MimeType::Jpeg => "image/jpeg".to_string(),
        MimeType::Tiff => "image/tiff".to_string(),
        MimeType::Bmp => "image/bmp".to_string(),
        MimeType::Gif => "image/gif".to_string(),
        MimeType::Unknown(s) => s.clone(),
        _ => "application/octet-stream".to_string(),
    }
}

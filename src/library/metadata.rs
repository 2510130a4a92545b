//! Turning raw tags into the metadata the API returns

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    domain::metadata::TrackMetadata,
    library::{Library, error::LibraryError, fs, tags::RawPicture},
};

impl Library {
    /// Reads tags of the file at library relative `path`.
    ///
    /// The first embedded picture becomes a `data:` URI in `image`. With
    /// `summary_only` everything except artist, album, year, genre and image
    /// is dropped.
    pub fn extract_metadata(
        &self,
        path: &str,
        summary_only: bool,
    ) -> Result<TrackMetadata, LibraryError> {
        let abs = fs::resolve(self.root(), path)?;

        let raw = self
            .reader
            .read(&abs)
            .map_err(|source| {
                log::warn!("cannot read tags of {}: {source:#}", abs.display());
                LibraryError::Metadata {
                    path: path.to_string(),
                    source,
                }
            })?;

        let meta = TrackMetadata {
            artist: raw.artist,
            album: raw.album,
            year: raw.year,
            genre: raw.genre,
            image: raw.picture.as_ref().map(to_data_uri),
            extra: raw.extra,
        };

        Ok(if summary_only { meta.into_summary() } else { meta })
    }
}

fn to_data_uri(picture: &RawPicture) -> String {
    format!(
        "data:{};base64,{}",
        picture.mime_type,
        STANDARD.encode(&picture.data)
    )
}

//! Building browse responses out of directory listings

use std::thread;

use crate::{
    domain::{
        entry::EntryKind,
        metadata::{AlbumSummary, BrowseResult, FolderMeta},
    },
    library::{
        Library,
        error::LibraryError,
        fs::{self, is_audio_file, is_folder_cover, join_relative},
    },
};

/// Builds the public URL of a library relative file, used for folder covers.
pub type FileUrl<'a> = dyn Fn(&str) -> String + Sync + 'a;

impl Library {
    /// Lists `path` and attaches what the UI needs to render it.
    ///
    /// Album level folders (containing audio files) get `meta` from the first
    /// file; artist level folders get one album card per sub-folder. The library
    /// root only gets a plain listing.
    pub fn browse(&self, path: &str, cover_url: &FileUrl<'_>) -> Result<BrowseResult, LibraryError> {
        let path = path.trim_matches('/');
        let dir = fs::resolve(self.root(), path)?;

        let entries = fs::list_classified(&dir).map_err(|source| {
            log::warn!("cannot list {}: {source}", dir.display());
            LibraryError::NotFound {
                path: path.to_string(),
                source,
            }
        })?;

        let mut result = BrowseResult {
            path: path.to_string(),
            ..Default::default()
        };
        for entry in entries {
            match entry.kind {
                EntryKind::Folder => result.folders.push(entry.name),
                EntryKind::AudioFile => result.files.push(entry.name),
                EntryKind::Unsupported => result.unsupported.push(entry.name),
            }
        }

        let first_file = result.files.first().map(|f| join_relative(path, f));
        let album_folders = (!path.is_empty() && !result.folders.is_empty()).then_some(&result.folders);

        let (meta, albums) = thread::scope(|s| {
            let albums = album_folders.map(|folders| {
                s.spawn(move || self.aggregate_albums(path, folders, cover_url))
            });

            let meta = first_file.and_then(|file| match self.extract_metadata(&file, true) {
                Ok(meta) => Some(meta),
                Err(err) => {
                    log::warn!("no album metadata for {path:?}: {err}");
                    None
                }
            });

            let albums = albums
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .unwrap_or_default();

            (meta, albums)
        });

        result.meta = meta;
        result.albums = albums;
        Ok(result)
    }

    /// One summary per album folder of `artist`, in the given order.
    ///
    /// A `cover.jpg`/`folder.jpg` anywhere in the folder wins over audio tags.
    /// Otherwise the first audio file in listing order is read. Folders with
    /// neither, or whose candidate file fails to decode, are left out.
    pub fn aggregate_albums(
        &self,
        artist: &str,
        albums: &[String],
        cover_url: &FileUrl<'_>,
    ) -> Vec<AlbumSummary> {
        albums
            .iter()
            .filter_map(|album| self.summarize_album(&join_relative(artist, album), cover_url))
            .collect()
    }

    fn summarize_album(&self, album_path: &str, cover_url: &FileUrl<'_>) -> Option<AlbumSummary> {
        let dir = match fs::resolve(self.root(), album_path) {
            Ok(dir) => dir,
            Err(err) => {
                log::warn!("skipping album {album_path:?}: {err}");
                return None;
            }
        };

        let names = match fs::list_names(&dir) {
            Ok(names) => names,
            Err(err) => {
                log::warn!("cannot list album {album_path:?}, skipping: {err}");
                return None;
            }
        };

        let mut first_audio = None;
        for name in names {
            if is_folder_cover(&name) {
                match fs::classify(&name, &dir.join(&name)) {
                    Ok(entry) if entry.kind != EntryKind::Folder => {
                        let url = cover_url(&join_relative(album_path, &name));
                        return Some(AlbumSummary::from_cover(album_path.to_string(), url));
                    }
                    Ok(_) => {}
                    Err(err) => log::debug!("skipping {name:?} in {album_path:?}: {err}"),
                }
                continue;
            }
            if first_audio.is_none() && is_audio_file(&name) {
                match fs::classify(&name, &dir.join(&name)) {
                    Ok(entry) if entry.kind == EntryKind::AudioFile => first_audio = Some(name),
                    Ok(_) => {}
                    Err(err) => log::debug!("skipping {name:?} in {album_path:?}: {err}"),
                }
            }
        }

        let file = join_relative(album_path, &first_audio?);
        match self.extract_metadata(&file, true) {
            Ok(meta) => Some(AlbumSummary::from_tags(album_path.to_string(), meta)),
            Err(err) => {
                log::warn!("album {album_path:?} yields no summary: {err}");
                None
            }
        }
    }

    /// Finds something to show for a whole folder: the full tags of the first
    /// audio file that decodes, or else a standalone cover image.
    pub fn folder_meta(&self, path: &str) -> Result<FolderMeta, LibraryError> {
        let path = path.trim_matches('/');
        let dir = fs::resolve(self.root(), path)?;

        let entries = fs::list_classified(&dir).map_err(|source| {
            log::warn!("cannot list {}: {source}", dir.display());
            LibraryError::NotFound {
                path: path.to_string(),
                source,
            }
        })?;

        for entry in entries.iter().filter(|e| e.kind == EntryKind::AudioFile) {
            let file = join_relative(path, &entry.name);
            match self.extract_metadata(&file, false) {
                Ok(meta) => return Ok(FolderMeta::Track { file, meta }),
                Err(err) => log::warn!("trying next file in {path:?}: {err}"),
            }
        }

        entries
            .iter()
            .find(|e| e.kind != EntryKind::Folder && is_folder_cover(&e.name))
            .map(|cover| FolderMeta::Cover {
                file: join_relative(path, &cover.name),
            })
            .ok_or_else(|| LibraryError::NoPlayableFile(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::tags::stub::StubTagReader;
    use std::{path::Path, sync::Arc};
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        library: Library,
        reader: Arc<StubTagReader>,
    }

    impl Fixture {
        fn new() -> anyhow::Result<Self> {
            let tmp = TempDir::new()?;
            let reader = Arc::new(StubTagReader::default());
            let library = Library::new(tmp.path(), reader.clone());
            Ok(Self {
                _tmp: tmp,
                library,
                reader,
            })
        }

        fn root(&self) -> &Path {
            self.library.root()
        }

        fn file(&self, path: &str, contents: &str) -> anyhow::Result<()> {
            let abs = self.root().join(path);
            if let Some(parent) = abs.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(abs, contents)?;
            Ok(())
        }

        fn dir(&self, path: &str) -> anyhow::Result<()> {
            std::fs::create_dir_all(self.root().join(path))?;
            Ok(())
        }
    }

    fn url(path: &str) -> String {
        format!("http://test/api/mp3/{path}")
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn only_unsupported_files() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/notes.txt", "x")?;
        fx.file("Low/scan.pdf", "x")?;
        fx.file("Low/LOUD.MP3", "x")?;

        let result = fx.library.browse("Low", &url)?;

        assert!(result.folders.is_empty());
        assert!(result.albums.is_empty());
        assert!(result.files.is_empty());
        assert!(result.meta.is_none());
        assert_eq!(
            sorted(result.unsupported),
            vec!["LOUD.MP3", "notes.txt", "scan.pdf"]
        );
        assert_eq!(fx.reader.calls(), 0);
        Ok(())
    }

    #[test]
    fn album_level_gets_meta_from_first_file() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Secret Name/01 Starfire.mp3", "Slowcore")?;
        fx.file("Low/Secret Name/02 Weight of Water.mp3", "Slowcore")?;
        fx.file("Low/Secret Name/booklet.pdf", "x")?;

        let result = fx.library.browse("Low/Secret Name", &url)?;

        assert_eq!(result.files.len(), 2);
        assert_eq!(result.unsupported, vec!["booklet.pdf"]);
        let meta = result.meta.expect("meta should be attached");
        assert_eq!(meta.artist.as_deref(), Some("Low"));
        assert_eq!(meta.album.as_deref(), Some("Secret Name"));
        assert!(meta.extra.is_empty());
        assert_eq!(fx.reader.calls(), 1);
        Ok(())
    }

    #[test]
    fn undecodable_first_file_leaves_meta_unset() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Secret Name/01.mp3", "broken")?;

        let result = fx.library.browse("Low/Secret Name", &url)?;

        assert_eq!(result.files, vec!["01.mp3"]);
        assert!(result.meta.is_none());
        Ok(())
    }

    #[test]
    fn artist_level_aggregates_albums() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Secret Name/01 Starfire.mp3", "Slowcore")?;
        fx.file("Low/Secret Name/notes.txt", "x")?;
        fx.file("Low/Curtain Hits the Cast/cover.jpg", "jpg")?;
        fx.file("Low/Curtain Hits the Cast/01 Anon.mp3", "Slowcore")?;
        fx.dir("Low/Empty")?;
        fx.file("Low/Scans/back.png", "png")?;

        let result = fx.library.browse("Low", &url)?;

        assert_eq!(result.folders.len(), 4);
        assert_eq!(result.albums.len(), 2);

        let tagged = result
            .albums
            .iter()
            .find(|a| a.path == "Low/Secret Name")
            .expect("tagged album");
        assert!(!tagged.is_folder_cover);
        assert_eq!(tagged.album.as_deref(), Some("Secret Name"));
        assert_eq!(tagged.year, Some(1999));

        let cover = result
            .albums
            .iter()
            .find(|a| a.path == "Low/Curtain Hits the Cast")
            .expect("cover album");
        assert!(cover.is_folder_cover);
        assert_eq!(
            cover.image.as_deref(),
            Some("http://test/api/mp3/Low/Curtain Hits the Cast/cover.jpg")
        );
        assert_eq!(cover.artist, None);
        assert_eq!(cover.album, None);
        assert_eq!(cover.year, None);
        Ok(())
    }

    #[test]
    fn album_order_follows_input_order() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/B/1.mp3", "x")?;
        fx.file("Low/A/1.mp3", "x")?;
        fx.file("Low/C/folder.jpg", "x")?;

        let folders = vec!["C".to_string(), "A".to_string(), "B".to_string()];
        let albums = fx.library.aggregate_albums("Low", &folders, &url);

        let paths: Vec<_> = albums.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["Low/C", "Low/A", "Low/B"]);
        Ok(())
    }

    #[test]
    fn cover_wins_over_audio_without_decoding() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Album/01.mp3", "x")?;
        fx.file("Low/Album/02.mp3", "x")?;
        fx.file("Low/Album/cover.jpg", "x")?;

        let albums = fx.library.aggregate_albums("Low", &["Album".to_string()], &url);

        assert_eq!(albums.len(), 1);
        assert!(albums[0].is_folder_cover);
        assert_eq!(albums[0].genre, None);
        assert_eq!(fx.reader.calls(), 0);
        Ok(())
    }

    #[test]
    fn cover_named_directory_is_not_a_cover() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.dir("Low/Album/cover.jpg")?;
        fx.dir("Low/Album/folder.jpg")?;
        fx.file("Low/Album/01.mp3", "Slowcore")?;

        let albums = fx.library.aggregate_albums("Low", &["Album".to_string()], &url);

        assert_eq!(albums.len(), 1);
        assert!(!albums[0].is_folder_cover);
        assert_eq!(albums[0].album.as_deref(), Some("Album"));
        assert_eq!(albums[0].genre.as_deref(), Some("Slowcore"));
        assert_eq!(fx.reader.calls(), 1);
        Ok(())
    }

    #[test]
    fn cover_named_directory_alone_yields_no_album() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.dir("Low/Album/cover.jpg")?;

        let albums = fx.library.aggregate_albums("Low", &["Album".to_string()], &url);

        assert!(albums.is_empty());
        Ok(())
    }

    #[test]
    fn not_found_message_is_library_relative() -> anyhow::Result<()> {
        let fx = Fixture::new()?;

        let message = fx.library.browse("Nobody/Here", &url).unwrap_err().to_string();

        assert!(message.contains("\"Nobody/Here\""), "{message}");
        assert!(!message.contains(&*fx.root().to_string_lossy()), "{message}");
        Ok(())
    }

    #[test]
    fn broken_and_missing_albums_are_skipped() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Broken/01.mp3", "broken")?;
        fx.file("Low/Good/01.mp3", "x")?;
        // a folder holding only a sub-folder is not an album
        fx.dir("Low/Nested/Disc 1")?;

        let folders: Vec<String> = ["Broken", "Missing", "Nested", "Good"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let albums = fx.library.aggregate_albums("Low", &folders, &url);

        assert!(albums.len() <= folders.len());
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].path, "Low/Good");
        Ok(())
    }

    #[test]
    fn root_listing_never_aggregates() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Secret Name/01.mp3", "x")?;
        fx.file("Yo La Tengo/Painful/cover.jpg", "x")?;

        let result = fx.library.browse("", &url)?;

        assert_eq!(sorted(result.folders), vec!["Low", "Yo La Tengo"]);
        assert!(result.albums.is_empty());
        assert_eq!(fx.reader.calls(), 0);
        Ok(())
    }

    #[test]
    fn folder_with_files_and_subfolders_gets_both() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Box Set/intro.mp3", "x")?;
        fx.file("Low/Box Set/Disc 1/01.mp3", "x")?;

        let result = fx.library.browse("Low/Box Set", &url)?;

        assert!(result.meta.is_some());
        assert_eq!(result.albums.len(), 1);
        assert_eq!(result.albums[0].path, "Low/Box Set/Disc 1");
        Ok(())
    }

    #[test]
    fn unicode_paths_resolve() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Björk/Homogenic/01 Hunter.m4a", "x")?;

        let result = fx.library.browse("Björk/Homogenic", &url)?;

        assert_eq!(result.path, "Björk/Homogenic");
        assert_eq!(result.files, vec!["01 Hunter.m4a"]);
        assert_eq!(result.meta.and_then(|m| m.artist).as_deref(), Some("Björk"));
        Ok(())
    }

    #[test]
    fn missing_directory_is_not_found() -> anyhow::Result<()> {
        let fx = Fixture::new()?;

        let err = fx.library.browse("Nobody", &url).unwrap_err();

        assert!(matches!(err, LibraryError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn browsing_a_file_is_not_found() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/01.mp3", "x")?;

        let err = fx.library.browse("Low/01.mp3", &url).unwrap_err();

        assert!(matches!(err, LibraryError::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn folder_meta_skips_broken_files() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Album/a.mp3", "broken")?;
        fx.file("Low/Album/b.mp3", "Slowcore")?;

        let found = fx.library.folder_meta("Low/Album")?;

        match found {
            FolderMeta::Track { file, meta } => {
                assert_eq!(file, "Low/Album/b.mp3");
                assert_eq!(meta.extra["title"], "b");
            }
            other => panic!("expected track metadata, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn folder_meta_falls_back_to_cover() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Album/folder.jpg", "x")?;
        fx.file("Low/Album/a.mp3", "broken")?;

        let found = fx.library.folder_meta("Low/Album")?;

        assert_eq!(
            found,
            FolderMeta::Cover {
                file: "Low/Album/folder.jpg".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn folder_meta_without_candidates_fails() -> anyhow::Result<()> {
        let fx = Fixture::new()?;
        fx.file("Low/Album/notes.txt", "x")?;

        let err = fx.library.folder_meta("Low/Album").unwrap_err();

        assert!(matches!(err, LibraryError::NoPlayableFile(_)));
        Ok(())
    }
}

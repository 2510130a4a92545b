//! Listing and classifying library directories

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use crate::{
    domain::entry::{DirectoryEntry, EntryKind},
    library::error::LibraryError,
};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a"];
const FOLDER_COVER_NAMES: &[&str] = &["cover.jpg", "folder.jpg"];

/// Extension match is case-sensitive: `Song.MP3` is not playable.
pub fn is_audio_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

pub fn is_folder_cover(name: &str) -> bool {
    FOLDER_COVER_NAMES.contains(&name)
}

/// Decides what `name` is. Folders are detected with a real stat of `path`,
/// following symlinks, so `Live.2003` is still a folder.
pub fn classify(name: &str, path: &Path) -> io::Result<DirectoryEntry> {
    let meta = std::fs::metadata(path)?;

    let kind = if meta.is_dir() {
        EntryKind::Folder
    } else if is_audio_file(name) {
        EntryKind::AudioFile
    } else {
        EntryKind::Unsupported
    };

    Ok(DirectoryEntry::new(name, kind))
}

/// Lists entry names of `dir` in the order the platform returns them.
///
/// Fails only when `dir` itself cannot be read. Entries with undecodable
/// names are skipped.
pub fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        match entry {
            Ok(entry) => match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::warn!("skipping non UTF-8 entry {raw:?} in {}", dir.display()),
            },
            Err(err) => log::warn!("error while listing {}, skipping an entry: {err}", dir.display()),
        }
    }
    Ok(names)
}

/// Lists and classifies `dir`. Entries that cannot be stat'ed are skipped.
pub fn list_classified(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let entries = list_names(dir)?
        .into_iter()
        .filter_map(|name| match classify(&name, &dir.join(&name)) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("cannot stat {name:?} in {}, skipping: {err}", dir.display());
                None
            }
        })
        .collect();
    Ok(entries)
}

/// Joins a request path onto `root`, refusing anything that could leave it.
///
/// Leading and trailing slashes are ignored and an empty path is the root itself.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, LibraryError> {
    let trimmed = relative.trim_matches('/');
    let mut resolved = root.to_path_buf();

    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(LibraryError::InvalidPath(relative.to_string()));
            }
        }
    }

    Ok(resolved)
}

/// Library relative path of `name` inside `dir`, `/` separated.
pub fn join_relative(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

//! Streaming raw library files

use std::path::Path;

use rouille::Response;

use crate::library::fs;

/// Streams the file at library relative `path` under `root`.
///
/// Anything that is not a readable regular file inside `root` is a plain 404.
pub fn serve_file(root: &Path, path: &str) -> Response {
    let abs = match fs::resolve(root, path) {
        Ok(abs) => abs,
        Err(err) => {
            log::warn!("refusing to serve {path:?}: {err}");
            return Response::empty_404();
        }
    };

    let is_file = std::fs::metadata(&abs).map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Response::empty_404();
    }

    match std::fs::File::open(&abs) {
        Ok(file) => {
            let mime = mime_for_file(&abs);
            log::debug!("STREAM {} -> 200 OK, MIME type: {}", abs.display(), mime);
            Response::from_file(mime, file)
        }
        Err(err) => {
            log::warn!("cannot open {}: {err}", abs.display());
            Response::empty_404()
        }
    }
}

fn mime_for_file(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy())
        .map(|s| s.to_lowercase());
    let default = || {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
    };
    ext.and_then(|ext| mime_from_ext(ext.as_str()))
        .unwrap_or_else(default)
}

/// Map file extension (without dot) to the MIME type browsers expect for playback.
pub fn mime_from_ext(ext: &str) -> Option<String> {
    match ext {
        "m4a" => Some("audio/x-m4a".to_string()), // Safari iOS compatible
        "mp3" => Some("audio/mpeg".to_string()),
        "cdg" => Some("application/octet-stream".to_string()),
        _ => None,
    }
}

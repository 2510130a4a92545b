use rouille::{Request, Response};
use serde::Serialize;
use std::{borrow::Cow, path::PathBuf, time::Duration};

use crate::{
    config::HttpConfig,
    domain::metadata::{FolderMeta, TrackMetadata},
    http::{assets, cache::ResponseCache, error::ApiError},
    library::{Library, error::LibraryError},
    public_endpoint::{FileRoute, PublicEndpoint, get_file_url},
};

pub struct HttpServer {
    library: Library,
    cache: ResponseCache,
    ttl: Duration,
    cdg_root: Option<PathBuf>,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(library: Library, cache: ResponseCache, config: HttpConfig, ttl: Duration) -> Self {
        Self {
            library,
            cache,
            ttl,
            cdg_root: None,
            config,
        }
    }

    /// Serves `/api/cdg` from `root`. Without it that route is always 404.
    pub fn with_cdg_root(mut self, root: Option<PathBuf>) -> Self {
        self.cdg_root = root;
        self
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/) => {
                Response::text(format!("Audio Server v{}", env!("CARGO_PKG_VERSION")))
            },
            (GET) (/api/clearcache) => {
                self.handle_clear_cache(request)
            },
            _ => self.route_library(request)
        );
        let response = self.with_cors(request, response);

        log::info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        log::info!("{} {}", request.method(), request.raw_url());
    }

    /// Routes whose tail is a library path of any depth.
    fn route_library(&self, request: &Request) -> Response {
        if request.method() != "GET" {
            return Response::empty_404();
        }

        let raw = request.raw_url();
        let path = raw.split('?').next().unwrap_or(raw);

        let result = if let Some(rest) = strip_route(path, "/api/browse") {
            decode_path(rest).map(|p| self.handle_browse(request, &p))
        } else if let Some(rest) = strip_route(path, "/api/meta/folder") {
            decode_path(rest).map(|p| self.handle_folder_meta(request, &p))
        } else if let Some(rest) = strip_route(path, "/api/meta") {
            decode_path(rest).map(|p| self.handle_meta(request, &p))
        } else if let Some(rest) = strip_route(path, FileRoute::Mp3.prefix()) {
            decode_path(rest).map(|p| assets::serve_file(self.library.root(), &p))
        } else if let Some(rest) = strip_route(path, FileRoute::Cdg.prefix()) {
            match &self.cdg_root {
                Some(root) => decode_path(rest).map(|p| assets::serve_file(root, &p)),
                None => Ok(Response::empty_404()),
            }
        } else {
            Ok(Response::empty_404())
        };

        result.unwrap_or_else(ApiError::into_response)
    }

    fn handle_browse(&self, request: &Request, path: &str) -> Response {
        let endpoint = self.endpoint(request);
        self.cached(request, || {
            let cover_url = |file: &str| get_file_url(&endpoint, FileRoute::Mp3, file);
            let result = self.library.browse(path, &cover_url)?;
            Ok(serde_json::to_vec(&result)?)
        })
    }

    fn handle_meta(&self, request: &Request, path: &str) -> Response {
        let endpoint = self.endpoint(request);
        self.cached(request, || {
            let meta = self.library.extract_metadata(path, false)?;
            let mp3 = get_file_url(&endpoint, FileRoute::Mp3, path);
            Ok(serde_json::to_vec(&TrackResponse::new(meta, mp3))?)
        })
    }

    fn handle_folder_meta(&self, request: &Request, path: &str) -> Response {
        let endpoint = self.endpoint(request);
        self.cached(request, || match self.library.folder_meta(path) {
            Ok(FolderMeta::Track { file, meta }) => {
                let mp3 = get_file_url(&endpoint, FileRoute::Mp3, &file);
                Ok(serde_json::to_vec(&TrackResponse::new(meta, mp3))?)
            }
            Ok(FolderMeta::Cover { file }) => {
                let image = get_file_url(&endpoint, FileRoute::Mp3, &file);
                Ok(serde_json::to_vec(&CoverResponse::new(image))?)
            }
            Err(err @ LibraryError::NotFound { .. }) => {
                log::warn!("{err}");
                Err(ApiError::Internal(err.to_string()))
            }
            Err(err) => Err(err.into()),
        })
    }

    fn handle_clear_cache(&self, request: &Request) -> Response {
        if !request.remote_addr().ip().is_loopback() {
            log::warn!("clearcache refused for {}", request.remote_addr());
            return Response::empty_404();
        }
        self.cache.clear();
        Response::text("cache cleared")
    }

    /// Serves the JSON body stored for this request, computing it on a miss.
    fn cached<F>(&self, request: &Request, compute: F) -> Response
    where
        F: FnOnce() -> Result<Vec<u8>, ApiError>,
    {
        let key = format!("{} {}", request.method(), request.raw_url());
        match self.cache.get_or_compute(&key, self.ttl, compute) {
            Ok(body) => Response::from_data("application/json", body),
            Err(err) => err.into_response(),
        }
    }

    fn endpoint(&self, request: &Request) -> PublicEndpoint {
        let host = request
            .header("Host")
            .map(String::from)
            .unwrap_or_else(|| format!("localhost:{}", self.config.port));
        PublicEndpoint::new(&self.config.protocol, &host)
    }

    fn with_cors(&self, request: &Request, response: Response) -> Response {
        if self.config.allowed_origins.is_empty() {
            return response.with_additional_header("Access-Control-Allow-Origin", "*");
        }
        match request.header("Origin") {
            Some(origin) if self.config.allowed_origins.iter().any(|o| o == origin) => response
                .with_additional_header("Access-Control-Allow-Origin", origin.to_string())
                .with_additional_header("Vary", "Origin"),
            _ => response,
        }
    }
}

/// Tail of `path` after `prefix`, if `prefix` is a whole leading segment run.
fn strip_route<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn decode_path(raw: &str) -> Result<String, ApiError> {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|_| ApiError::BadRequest(format!("path {raw:?} is not valid UTF-8")))
}

#[derive(Serialize)]
pub(crate) struct TrackResponse {
    status: &'static str,
    #[serde(flatten)]
    meta: TrackMetadata,
    mp3: String,
}

impl TrackResponse {
    pub(crate) fn new(meta: TrackMetadata, mp3: String) -> Self {
        Self {
            status: "ok",
            meta,
            mp3,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoverResponse {
    status: &'static str,
    image: String,
    is_folder_cover: bool,
}

impl CoverResponse {
    pub(crate) fn new(image: String) -> Self {
        Self {
            status: "ok",
            image,
            is_folder_cover: true,
        }
    }
}

#[cfg(test)]
pub fn parse_json_response(response: rouille::Response) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

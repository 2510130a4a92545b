/// Where clients reach this server, e.g. `https://music.local:3000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicEndpoint {
    pub base_url: String,
}

impl PublicEndpoint {
    pub fn new(protocol: &str, host: &str) -> Self {
        Self {
            base_url: format!("{protocol}://{host}"),
        }
    }
}

/// Routes that stream raw library files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRoute {
    Mp3,
    Cdg,
}

impl FileRoute {
    pub fn prefix(self) -> &'static str {
        match self {
            FileRoute::Mp3 => "/api/mp3",
            FileRoute::Cdg => "/api/cdg",
        }
    }
}

/// returns absolute url of a library file, the whole relative path is one encoded segment
pub fn get_file_url(conf: &PublicEndpoint, route: FileRoute, path: &str) -> String {
    let url = conf.base_url.trim_end_matches('/');
    let prefix = route.prefix();
    let path = urlencoding::encode(path.trim_start_matches('/'));
    format!("{url}{prefix}/{path}")
}

#[cfg(test)]
mod tests {
    use crate::public_endpoint::{FileRoute, PublicEndpoint, get_file_url};

    fn endpoint() -> PublicEndpoint {
        PublicEndpoint::new("https", "music.local:3000")
    }

    #[test]
    fn test_mp3_url() {
        let url = get_file_url(&endpoint(), FileRoute::Mp3, "Low/Secret Name/01 Starfire.mp3");

        assert_eq!(
            url,
            "https://music.local:3000/api/mp3/Low%2FSecret%20Name%2F01%20Starfire.mp3"
        );
    }

    #[test]
    fn test_cdg_url() {
        let url = get_file_url(&endpoint(), FileRoute::Cdg, "Karaoke/track.cdg");

        assert_eq!(url, "https://music.local:3000/api/cdg/Karaoke%2Ftrack.cdg");
    }

    #[test]
    fn test_non_ascii_url() {
        let url = get_file_url(&endpoint(), FileRoute::Mp3, "Björk/cover.jpg");

        assert_eq!(url, "https://music.local:3000/api/mp3/Bj%C3%B6rk%2Fcover.jpg");
    }

    #[test]
    fn test_url_trailing_slash() {
        let conf = PublicEndpoint {
            base_url: "http://music.local/".to_string(),
        };

        let url = get_file_url(&conf, FileRoute::Mp3, "a.mp3");

        assert_eq!(url, "http://music.local/api/mp3/a.mp3");
    }
}

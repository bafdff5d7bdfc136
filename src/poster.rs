//! IMDb poster lookup and download.
//!
//! Resolution is best-effort by design: every network or parse failure is
//! logged and reported as "no poster", never as a batch-stopping error. The
//! page scraping deliberately sticks to local, case-insensitive tag scanning
//! rather than whole-document patterns so harmless markup noise (attribute
//! order, duplicate candidates) does not break extraction.

use std::io::Read;
use std::time::Duration;

use log::{info, warn};

use crate::config::FetchConfig;

const IMDB_FIND_URL: &str = "https://www.imdb.com/find";
const IMDB_TITLE_URL: &str = "https://www.imdb.com/title";
const POSTER_IMAGE_CLASS: &str = "ipc-image";
const POSTER_HOST_MARKER: &str = "amazon";
const RENDITION_TOKEN: &str = "_V1_";
const PREFERRED_RENDITION: &str = "_V1_SX300";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request for {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("request for {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to read response body from {url}: {source}")]
    Io {
        url: String,
        source: std::io::Error,
    },
    #[error("empty response body from {url}")]
    EmptyBody { url: String },
}

/// External capability: map a title to at most one poster URL, and fetch the
/// raw bytes behind it. [`PosterScraper`] is the production implementation;
/// tests substitute stubs.
pub trait PosterProvider {
    fn resolve(&self, title: &str) -> Option<String>;
    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// IMDb-backed poster source sharing one HTTP agent across all requests of a
/// run.
pub struct PosterScraper {
    agent: ureq::Agent,
    search_timeout: Duration,
    download_timeout: Duration,
}

impl PosterScraper {
    pub fn new(fetch: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(fetch.download_timeout())
            .timeout_write(Duration::from_secs(7))
            .build();
        Self {
            agent,
            search_timeout: fetch.search_timeout(),
            download_timeout: fetch.download_timeout(),
        }
    }

    fn search_url(title: &str) -> String {
        format!(
            "{IMDB_FIND_URL}?q={}&s=tt&ttype=ft",
            urlencoding::encode(title)
        )
    }

    fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", BROWSER_USER_AGENT)
            .timeout(timeout)
            .call()
            .map_err(|error| classify_request_failure(url, error))?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|source| FetchError::Io {
                url: url.to_string(),
                source,
            })?;
        Ok(body)
    }
}

impl PosterProvider for PosterScraper {
    fn resolve(&self, title: &str) -> Option<String> {
        info!("Searching IMDb for: {title}");
        let search_page = match self.get_text(&Self::search_url(title), self.search_timeout) {
            Ok(body) => body,
            Err(err) => {
                warn!("Search request failed for '{title}': {err}");
                return None;
            }
        };

        let Some(title_id) = first_title_id(&search_page) else {
            warn!("No movie found for: {title}");
            return None;
        };

        let title_url = format!("{IMDB_TITLE_URL}/{title_id}/");
        let title_page = match self.get_text(&title_url, self.search_timeout) {
            Ok(body) => body,
            Err(err) => {
                warn!("Title page request failed for '{title}': {err}");
                return None;
            }
        };

        let Some(poster_url) = poster_url_from_page(&title_page) else {
            warn!("No poster found for: {title}");
            return None;
        };

        let upgraded = prefer_larger_rendition(&poster_url);
        info!("Found poster for {title}: {upgraded}");
        Some(upgraded)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .agent
            .get(url)
            .set("User-Agent", BROWSER_USER_AGENT)
            .timeout(self.download_timeout)
            .call()
            .map_err(|error| classify_request_failure(url, error))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|source| FetchError::Io {
                url: url.to_string(),
                source,
            })?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(bytes)
    }
}

fn classify_request_failure(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => FetchError::Transport {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}

/// First `/title/tt<digits>/` identifier in a search response.
fn first_title_id(html: &str) -> Option<String> {
    const NEEDLE: &str = "/title/tt";
    let mut rest = html;
    while let Some(pos) = rest.find(NEEDLE) {
        let digits_start = pos + NEEDLE.len();
        let digits: String = rest[digits_start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let after = digits_start + digits.len();
        if !digits.is_empty() && rest[after..].starts_with('/') {
            return Some(format!("tt{digits}"));
        }
        rest = &rest[digits_start..];
    }
    None
}

/// Ordered extraction matchers over a title page: poster `<img>` tags with the
/// class attribute before `src`, then the reversed attribute order, then the
/// `og:image` metadata fallback. The first candidate from the expected image
/// host with a JPEG marker wins.
fn poster_url_from_page(html: &str) -> Option<String> {
    let tags = img_tags(html);
    let candidate_lists: [Vec<String>; 3] = [
        tags.iter()
            .filter_map(|tag| poster_img_src(tag, true))
            .collect(),
        tags.iter()
            .filter_map(|tag| poster_img_src(tag, false))
            .collect(),
        og_image_urls(html),
    ];

    for candidates in candidate_lists {
        for url in candidates {
            if is_acceptable_poster_url(&url) {
                return Some(url);
            }
        }
    }
    None
}

fn is_acceptable_poster_url(url: &str) -> bool {
    url.contains(POSTER_HOST_MARKER) && (url.contains("jpg") || url.contains("jpeg"))
}

/// Rewrites the rendition token so the CDN serves a larger image, e.g.
/// `.._V1_QL75_UX190_.jpg` becomes `.._V1_SX300.jpg`. URLs without the token
/// (or without a JPEG extension after it) pass through unchanged.
fn prefer_larger_rendition(url: &str) -> String {
    let Some(token) = url.find(RENDITION_TOKEN) else {
        return url.to_string();
    };
    let tail = &url[token + RENDITION_TOKEN.len()..];
    let jpg = tail.find(".jpg").map(|pos| (pos, ".jpg"));
    let jpeg = tail.find(".jpeg").map(|pos| (pos, ".jpeg"));
    let earliest = match (jpg, jpeg) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (first, second) => first.or(second),
    };
    match earliest {
        Some((pos, extension)) => format!(
            "{}{PREFERRED_RENDITION}{extension}{}",
            &url[..token],
            &tail[pos + extension.len()..]
        ),
        None => url.to_string(),
    }
}

/// Complete `<img ...>` tags, detected case-insensitively.
fn img_tags(html: &str) -> Vec<&str> {
    let lowered = html.to_ascii_lowercase();
    let mut tags = Vec::new();
    let mut offset = 0;
    while let Some(pos) = lowered[offset..].find("<img") {
        let start = offset + pos;
        let Some(end) = lowered[start..].find('>') else {
            break;
        };
        tags.push(&html[start..start + end + 1]);
        offset = start + end + 1;
    }
    tags
}

/// `src` of a poster-class image tag, honoring the requested attribute order.
fn poster_img_src(tag: &str, class_before_src: bool) -> Option<String> {
    let (class_pos, class_value) = attribute_span(tag, "class")?;
    if !class_value.to_ascii_lowercase().contains(POSTER_IMAGE_CLASS) {
        return None;
    }
    let (src_pos, src_value) = attribute_span(tag, "src")?;
    if (class_pos < src_pos) == class_before_src {
        Some(src_value)
    } else {
        None
    }
}

/// Position and double-quoted value of an attribute inside one tag. Attribute
/// names match case-insensitively; values keep their original case.
fn attribute_span(tag: &str, name: &str) -> Option<(usize, String)> {
    let needle = format!("{name}=\"");
    let lowered = tag.to_ascii_lowercase();
    let pos = lowered.find(&needle)?;
    let value_start = pos + needle.len();
    let value_len = tag[value_start..].find('"')?;
    Some((pos, tag[value_start..value_start + value_len].to_string()))
}

/// All `og:image` metadata URLs, in document order.
fn og_image_urls(html: &str) -> Vec<String> {
    const PROPERTY: &str = "property=\"og:image\"";
    const CONTENT: &str = "content=\"";
    let lowered = html.to_ascii_lowercase();
    let mut urls = Vec::new();
    let mut offset = 0;
    while let Some(pos) = lowered[offset..].find(PROPERTY) {
        let start = offset + pos;
        let tag_end = lowered[start..]
            .find('>')
            .map(|end| start + end)
            .unwrap_or(html.len());
        if let Some(content_pos) = lowered[start..tag_end].find(CONTENT) {
            let value_start = start + content_pos + CONTENT.len();
            if let Some(value_len) = html[value_start..tag_end].find('"') {
                urls.push(html[value_start..value_start + value_len].to_string());
            }
        }
        offset = start + PROPERTY.len();
    }
    urls
}

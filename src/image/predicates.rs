//! URL-shape heuristics for upstream CDN image candidates.
//!
//! The backend scrapes pages, so its candidate list mixes real images with
//! CSS fragments, bare hosts and the cover repeated under another query
//! string. Each heuristic below is a standalone predicate so it can be
//! tested on its own.

use std::ops::RangeInclusive;

use url::Url;

/// Host suffixes served by the xhs CDN family.
pub const XHS_HOST_SUFFIXES: [&str; 3] = ["xhscdn.com", "xhscdn.net", "xiaohongshu.com"];

/// Host prefix of the xhs web-picture CDN nodes (`sns-webpic-qc`, `sns-img-hw`, ...).
pub const XHS_HOST_PREFIX: &str = "sns-";

/// Marker left behind when a URL was scraped out of an inline `style` attribute.
pub const STYLE_FRAGMENT_MARKER: &str = ");background";

/// Recognized image file extensions (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "heic", "heif", "avif"];

/// CDN processing instructions appended to an asset URL.
pub const PROCESSING_SUFFIX_MARKERS: [&str; 4] = ["!nd_", "!h5_", "imageView2", "imageMogr2"];

/// Path segments that only appear on note image assets.
pub const PATH_SEGMENT_MARKERS: [&str; 4] = ["/spectrum/", "/notes_pre_post/", "/notes_uhdr/", "/1040g"];

/// Substring carried by Doubao watermarked image variants.
pub const WATERMARK_MARKER: &str = "watermark";

/// Length range of opaque asset identifiers.
pub const OPAQUE_ID_LENGTH: RangeInclusive<usize> = 20..=50;

/// Normalized bodies longer than this are trusted as unique identities.
pub const LONG_BODY_THRESHOLD: usize = 50;

/// True when the candidate starts with `http` (covers `https`).
#[must_use]
pub fn has_http_prefix(url: &str) -> bool {
    url.starts_with("http")
}

/// True when the candidate carries a scraped inline-style fragment.
#[must_use]
pub fn has_style_fragment(url: &str) -> bool {
    url.contains(STYLE_FRAGMENT_MARKER)
}

/// Lowercased host of `url`, if it parses.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
}

/// True when the host belongs to the xhs CDN/domain set.
#[must_use]
pub fn is_xhs_host(url: &str) -> bool {
    host_of(url).is_some_and(|host| {
        host.starts_with(XHS_HOST_PREFIX)
            || XHS_HOST_SUFFIXES
                .iter()
                .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
    })
}

/// True for a bare xhs CDN root such as `https://sns-webpic-qc.xhscdn.com/`.
#[must_use]
pub fn is_bare_cdn_root(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    is_xhs_host(url) && matches!(parsed.path(), "" | "/") && parsed.query().is_none()
}

/// True when the final path segment ends in a known image extension.
///
/// Query strings, style fragments and processing suffixes are ignored.
#[must_use]
pub fn has_image_extension(url: &str) -> bool {
    let segment = asset_identity(url).to_ascii_lowercase();
    segment
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext))
}

/// True when the URL carries a CDN processing instruction.
#[must_use]
pub fn has_processing_suffix(url: &str) -> bool {
    PROCESSING_SUFFIX_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
}

/// True when the path contains a note-asset segment marker.
#[must_use]
pub fn has_path_marker(url: &str) -> bool {
    PATH_SEGMENT_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
}

/// True when `id` looks like a platform asset id: ASCII alphanumeric, 20-50 chars.
#[must_use]
pub fn is_opaque_asset_id(id: &str) -> bool {
    OPAQUE_ID_LENGTH.contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// True when a Doubao candidate is the watermarked variant.
#[must_use]
pub fn is_watermarked_candidate(url: &str) -> bool {
    url.contains(WATERMARK_MARKER)
}

/// Cuts a URL at the first quote or closing parenthesis left over from CSS.
#[must_use]
pub fn strip_style_fragment(url: &str) -> &str {
    url.find(['"', '\'', ')'])
        .map_or(url, |end| &url[..end])
}

/// Cuts a URL at its query string or fragment.
#[must_use]
pub fn strip_query(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |end| &url[..end])
}

/// Cuts a `!style` processing suffix from the final path segment.
#[must_use]
pub fn strip_processing_suffix(url: &str) -> &str {
    let segment_start = url.rfind('/').map_or(0, |slash| slash + 1);
    url[segment_start..]
        .find('!')
        .map_or(url, |bang| &url[..segment_start + bang])
}

/// URL with style fragment, query and processing suffix removed.
#[must_use]
pub fn normalized_body(url: &str) -> &str {
    strip_processing_suffix(strip_query(strip_style_fragment(url.trim())))
}

/// Final path segment of the normalized body.
#[must_use]
pub fn asset_identity(url: &str) -> &str {
    let body = normalized_body(url);
    body.rsplit('/').next().unwrap_or(body)
}

/// True when two candidates refer to the same underlying image.
///
/// Matches when the strings are identical, when both trailing identifiers
/// are equal opaque asset ids, or when the normalized bodies are equal and
/// longer than [`LONG_BODY_THRESHOLD`].
#[must_use]
pub fn is_same_image(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let (id_a, id_b) = (asset_identity(a), asset_identity(b));
    if id_a == id_b && is_opaque_asset_id(id_a) && is_opaque_asset_id(id_b) {
        return true;
    }

    let (body_a, body_b) = (normalized_body(a), normalized_body(b));
    body_a == body_b && body_a.len() > LONG_BODY_THRESHOLD
}

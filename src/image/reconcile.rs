//! Candidate list filtering and cover de-duplication.
//!
//! The backend returns every URL it scraped from the target page, which
//! includes CSS fragments, unrelated assets and repeats of the cover under a
//! different query string or processing suffix. [`reconcile`] reduces that
//! to the list of images worth showing.

use tracing::debug;

use super::builder::ImageUrlBuilder;
use super::entry::ImageEntry;
use super::predicates::{
    has_http_prefix, has_image_extension, has_path_marker, has_processing_suffix,
    has_style_fragment, is_bare_cdn_root, is_same_image, is_watermarked_candidate, is_xhs_host,
};
use crate::api::Platform;

/// A raw candidate that survived filtering, before URL building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub is_cover: bool,
}

/// True when an xhs-family candidate passes every noise filter.
#[must_use]
pub fn is_xhs_candidate(url: &str) -> bool {
    if url.is_empty()
        || !has_http_prefix(url)
        || has_style_fragment(url)
        || is_bare_cdn_root(url)
        || !is_xhs_host(url)
    {
        return false;
    }
    has_image_extension(url) || has_processing_suffix(url) || has_path_marker(url)
}

/// Filters `raw_list` for `platform`, preserving order.
///
/// With an empty (or all-blank) list the cover alone is returned.
#[must_use]
pub fn filter_candidates(
    raw_list: &[String],
    cover_url: &str,
    platform: Platform,
    has_credential: bool,
) -> Vec<Candidate> {
    let cover = cover_url.trim();

    if raw_list.iter().all(|raw| raw.trim().is_empty()) {
        if cover.is_empty() {
            return Vec::new();
        }
        debug!("candidate list empty, falling back to cover image");
        return vec![Candidate {
            url: cover.to_string(),
            is_cover: true,
        }];
    }

    let survivors = match platform {
        Platform::Xhs => filter_xhs(raw_list, cover),
        Platform::Doubao => filter_doubao(raw_list, cover, has_credential),
    };
    debug!(
        platform = %platform,
        candidates = raw_list.len(),
        kept = survivors.len(),
        "filtered image candidates"
    );
    survivors
}

fn filter_xhs(raw_list: &[String], cover: &str) -> Vec<Candidate> {
    let mut cover_seen = false;
    let mut survivors = Vec::with_capacity(raw_list.len());

    for raw in raw_list {
        let url = raw.trim();
        if !is_xhs_candidate(url) {
            continue;
        }

        let matches_cover = !cover.is_empty() && is_same_image(url, cover);
        if matches_cover {
            if cover_seen {
                continue;
            }
            cover_seen = true;
        }

        survivors.push(Candidate {
            url: url.to_string(),
            is_cover: matches_cover,
        });
    }
    survivors
}

fn filter_doubao(raw_list: &[String], cover: &str, has_credential: bool) -> Vec<Candidate> {
    let mut cover_seen = false;
    raw_list
        .iter()
        .map(|raw| raw.trim())
        .filter(|url| !url.is_empty())
        .filter(|url| has_credential || is_watermarked_candidate(url))
        .map(|url| {
            let is_cover = !cover_seen && url == cover;
            cover_seen |= is_cover;
            Candidate {
                url: url.to_string(),
                is_cover,
            }
        })
        .collect()
}

/// Reconciles a backend candidate list into displayable entries.
///
/// Deterministic and order-preserving: each survivor goes through
/// `builder`, gets its post-filter index and starts unselected.
///
/// # Examples
///
/// ```
/// use linkgrab_core::api::Platform;
/// use linkgrab_core::image::{ImageUrlBuilder, reconcile};
///
/// let cover = "https://sns-webpic-qc.xhscdn.com/img1!nd_dft_wlteh_webp_3";
/// let list = vec![cover.to_string(), "https://sns-webpic-qc.xhscdn.com/img2.jpg".to_string()];
/// let builder = ImageUrlBuilder::new("http://127.0.0.1:5000");
///
/// let entries = reconcile(&list, cover, Platform::Xhs, false, &builder);
/// assert_eq!(entries.len(), 2);
/// assert!(entries[0].is_cover);
/// ```
#[must_use]
pub fn reconcile(
    raw_list: &[String],
    cover_url: &str,
    platform: Platform,
    has_credential: bool,
    builder: &ImageUrlBuilder,
) -> Vec<ImageEntry> {
    filter_candidates(raw_list, cover_url, platform, has_credential)
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| ImageEntry {
            display_url: builder.build(&candidate.url, platform),
            raw_url: candidate.url,
            selected: false,
            index,
            is_cover: candidate.is_cover,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN: &str = "https://sns-webpic-qc.xhscdn.com";
    const OPAQUE: &str = "1040g2sg31a8b9c0d1e2f3g4h5";

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn local_builder() -> ImageUrlBuilder {
        ImageUrlBuilder::new("http://127.0.0.1:5000")
    }

    #[test]
    fn test_reconcile_share_scenario_keeps_cover_and_second_image() {
        let cover = format!("{CDN}/img1!nd_dft_wlteh_webp_3");
        let second = format!("{CDN}/img2.jpg");
        let raw = vec![cover.clone(), second.clone()];

        let entries = reconcile(&raw, &cover, Platform::Xhs, false, &local_builder());

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_cover);
        assert_eq!(entries[0].raw_url, cover);
        assert!(!entries[1].is_cover);
        assert_eq!(entries[1].display_url, second);
        assert_eq!(entries[1].index, 1);
        assert!(entries.iter().all(|e| !e.selected));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let cover = format!("{CDN}/202410/{OPAQUE}!nd_dft_wlteh_webp_3");
        let raw = list(&[
            &cover,
            &format!("{CDN}/202410/{OPAQUE}!nd_dft_wgth_webp_3"),
            &format!("{CDN}/notes_pre_post/abc"),
            "https://example.com/x.jpg",
        ]);
        let builder = ImageUrlBuilder::new("http://api.example.com");

        let first = reconcile(&raw, &cover, Platform::Xhs, false, &builder);
        let second = reconcile(&raw, &cover, Platform::Xhs, false, &builder);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reconcile_collapses_identical_and_suffix_varied_cover_copies() {
        let cover = format!("{CDN}/202410/{OPAQUE}!nd_dft_wlteh_webp_3");
        let varied = format!("{CDN}/202410/{OPAQUE}!nd_dft_wgth_webp_3");
        let other = format!("{CDN}/202410/other.jpg");
        let raw = list(&[&cover, &varied, &other]);

        let entries = reconcile(&raw, &cover, Platform::Xhs, false, &local_builder());

        let urls: Vec<&str> = entries.iter().map(|e| e.raw_url.as_str()).collect();
        assert_eq!(urls, vec![cover.as_str(), other.as_str()]);
        assert_eq!(entries.iter().filter(|e| e.is_cover).count(), 1);
    }

    #[test]
    fn test_reconcile_keeps_first_cover_match_when_varied_copy_comes_first() {
        let cover = format!("{CDN}/202410/{OPAQUE}!nd_dft_wlteh_webp_3");
        let varied = format!("{CDN}/202410/{OPAQUE}?imageView2/2/w/1080");
        let raw = list(&[&varied, &cover]);

        let entries = reconcile(&raw, &cover, Platform::Xhs, false, &local_builder());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_url, varied);
        assert!(entries[0].is_cover);
    }

    #[test]
    fn test_xhs_filter_drops_noise() {
        let raw = list(&[
            "",
            "   ",
            "/relative/path.jpg",
            &format!("{CDN}/a.png\");background-size:cover"),
            CDN,
            &format!("{CDN}/"),
            "https://example.com/a.jpg",
            &format!("{CDN}/no-marker-here"),
            &format!("{CDN}/keep.webp"),
        ]);

        let kept = filter_candidates(&raw, "", Platform::Xhs, false);
        assert_eq!(
            kept,
            vec![Candidate {
                url: format!("{CDN}/keep.webp"),
                is_cover: false,
            }]
        );
    }

    #[test]
    fn test_xhs_filter_accepts_each_marker_kind() {
        assert!(is_xhs_candidate(&format!("{CDN}/a.jpeg")));
        assert!(is_xhs_candidate(&format!("{CDN}/abc!h5_1080jpg")));
        assert!(is_xhs_candidate(&format!("{CDN}/spectrum/abc")));
        assert!(is_xhs_candidate("https://ci.xiaohongshu.com/1040g2sg31abc"));
        assert!(!is_xhs_candidate("https://cdn.example.com/a.jpg"));
    }

    #[test]
    fn test_entries_are_trimmed() {
        let raw = list(&[&format!("  {CDN}/a.jpg  ")]);
        let kept = filter_candidates(&raw, "", Platform::Xhs, false);
        assert_eq!(kept[0].url, format!("{CDN}/a.jpg"));
    }

    #[test]
    fn test_empty_list_falls_back_to_cover() {
        let cover = format!("{CDN}/cover.jpg");
        let entries = reconcile(&[], &cover, Platform::Xhs, false, &local_builder());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_cover);
        assert_eq!(entries[0].raw_url, cover);
    }

    #[test]
    fn test_empty_list_and_empty_cover_yields_nothing() {
        assert!(filter_candidates(&list(&["", " "]), "  ", Platform::Xhs, false).is_empty());
    }

    #[test]
    fn test_doubao_without_credential_keeps_only_watermarked() {
        let raw = list(&[
            "https://p3-flow.example/a~tplv-watermark.png",
            "https://p3-flow.example/b~tplv-clean.png",
            "",
        ]);
        let kept = filter_candidates(&raw, "", Platform::Doubao, false);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].url.contains("watermark"));
    }

    #[test]
    fn test_doubao_with_credential_keeps_everything_non_blank() {
        let raw = list(&[
            "https://p3-flow.example/a~tplv-watermark.png",
            "https://p3-flow.example/b~tplv-clean.png",
            "  ",
        ]);
        let kept = filter_candidates(&raw, "", Platform::Doubao, true);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_doubao_entries_are_proxied_through_remote_backend() {
        let raw = list(&["https://p3-flow.example/a~tplv-watermark.png"]);
        let builder = ImageUrlBuilder::new("http://api.example.com")
            .with_session_id(Some("sid1".to_string()));

        let entries = reconcile(&raw, "", Platform::Doubao, false, &builder);
        assert!(entries[0].is_proxied());
        assert!(entries[0].display_url.ends_with("&sid=sid1"));
        assert_eq!(entries[0].direct_url(), raw[0]);
    }

    #[test]
    fn test_doubao_marks_identical_cover() {
        let cover = "https://p3-flow.example/a~tplv-watermark.png";
        let raw = list(&[cover, cover]);
        let kept = filter_candidates(&raw, cover, Platform::Doubao, false);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].is_cover);
        assert!(!kept[1].is_cover);
    }
}

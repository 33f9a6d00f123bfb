//! File naming for fetched images: extension detection, sanitization and
//! unique path resolution.

use std::path::{Component, Path, PathBuf};

use url::Url;

use super::constants::DEFAULT_IMAGE_EXTENSION;
use crate::image::predicates::{IMAGE_EXTENSIONS, asset_identity};

/// Builds the file stem for the `position`-th image of a batch.
///
/// With a note id: `{note_id}_{position:02}`, otherwise `linkgrab_{position:02}`.
#[must_use]
pub fn image_file_stem(note_id: Option<&str>, position: usize) -> String {
    let prefix = note_id
        .map(sanitize_filename_component)
        .filter(|cleaned| !cleaned.is_empty())
        .unwrap_or_else(|| "linkgrab".to_string());
    format!("{prefix}_{position:02}")
}

/// Image extension (without dot) from a Content-Type header.
pub(crate) fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        _ => None,
    }
}

/// Image extension (without dot) from the URL's final path segment.
///
/// Processing suffixes and query strings are ignored; `jpeg` becomes `jpg`.
pub(crate) fn extension_from_url(url: &str) -> Option<&'static str> {
    let identity = asset_identity(url).to_ascii_lowercase();
    let (_, ext) = identity.rsplit_once('.')?;
    match ext {
        "jpeg" => Some("jpg"),
        other => IMAGE_EXTENSIONS.iter().copied().find(|known| *known == other),
    }
}

/// Picks the file extension: Content-Type first, then URL, then `jpg`.
pub(crate) fn choose_extension(content_type: Option<&str>, url: &Url) -> &'static str {
    content_type
        .and_then(extension_from_content_type)
        .or_else(|| extension_from_url(url.as_str()))
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches(['_', '.']).to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Resolves a unique file path, adding `_2`, `_3`, ... if the file exists.
pub(crate) fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = {
        let sanitized = sanitize_filename(filename);
        if sanitized.contains('/')
            || sanitized.contains('\\')
            || sanitized.trim_matches('_').is_empty()
        {
            format!("image.{DEFAULT_IMAGE_EXTENSION}")
        } else {
            sanitized
        }
    };
    let base_path = dir.join(&filename);

    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos..]),
        None => (filename.as_str(), ""),
    };

    for i in 2..1000 {
        let new_path = dir.join(format!("{stem}_{i}{ext}"));
        if !new_path.exists() {
            return new_path;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

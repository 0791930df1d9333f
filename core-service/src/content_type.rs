//! Content-type detection for `load_media` URLs.

/// Fallback when neither the URL nor the caller says anything.
pub const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

pub const HLS_CONTENT_TYPE: &str = "application/x-mpegURL";

const BY_EXTENSION: &[(&str, &str)] = &[
    ("m3u8", HLS_CONTENT_TYPE),
    ("mpd", "application/dash+xml"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
];

/// Pick the content type for `url`.
///
/// A known extension on the URL path wins; query and fragment are ignored.
/// Otherwise `provided` is used when non-empty, else [`DEFAULT_CONTENT_TYPE`].
pub fn detect_content_type(url: &str, provided: Option<&str>) -> String {
    if let Some(detected) = extension(url).and_then(|ext| lookup(&ext)) {
        return detected.to_string();
    }

    provided
        .map(str::trim)
        .filter(|provided| !provided.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Whether `content_type` names an HLS playlist.
pub fn is_hls(content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case(HLS_CONTENT_TYPE)
        || content_type.eq_ignore_ascii_case("application/vnd.apple.mpegurl")
}

fn lookup(ext: &str) -> Option<&'static str> {
    BY_EXTENSION
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

fn extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    // Skip the scheme and authority so "example.com" is not an extension.
    let path = match path.find("://") {
        Some(scheme_end) => {
            let rest = &path[scheme_end + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("")
        }
        None => path,
    };
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

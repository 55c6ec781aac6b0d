//! URL normalization and crawl-scope validation

use url::Url;

/// Path extensions that never carry an HTML payload worth crawling
const BLOCKED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

/// Canonical form of a URL, used as the frontier's identity.
///
/// The `url` crate already lowercases scheme and host and resolves dot
/// segments at parse time; on top of that the fragment is stripped and the
/// trailing slash is trimmed from non-root paths so `/a` and `/a/` collapse
/// to one entry.
pub fn normalize(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        normalized.set_path(&path[..path.len() - 1]);
    }

    normalized.into()
}

/// Decide whether a URL is in crawl scope.
///
/// Rejects non-HTTP(S) schemes, hosts outside the allowed domain suffixes,
/// and paths whose extension is on the non-HTML blocklist.
pub fn is_valid(url: &Url, allowed_domains: &[String]) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    let Some(host) = url.host_str() else {
        return false;
    };
    if !allowed_domains.iter().any(|d| host.ends_with(d.as_str())) {
        return false;
    }

    let path = url.path().to_lowercase();
    if let Some((_, ext)) = path.rsplit_once('.') {
        // Only treat it as an extension if the dot falls inside the last segment
        if !ext.contains('/') && BLOCKED_EXTENSIONS.contains(&ext) {
            return false;
        }
    }

    true
}

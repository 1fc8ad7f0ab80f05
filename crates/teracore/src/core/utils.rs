/// Longest display name, in bytes, handed to the upload or written anywhere.
///
/// Well under the 255-byte component limit of common filesystems.
pub const MAX_FILE_NAME_BYTES: usize = 180;

/// Longest suffix kept as an extension when a name has to be shortened.
const MAX_EXTENSION_BYTES: usize = 16;

const FALLBACK_NAME: &str = "download";

/// Turns an upstream file name into a single safe path component.
///
/// Separators, characters reserved on Windows and control characters become
/// `_`, double quotes become `'`. Surrounding whitespace and dots are dropped.
/// Names longer than [`MAX_FILE_NAME_BYTES`] are cut on a char boundary,
/// keeping a short extension when there is one. An empty result is `"download"`.
///
/// # Example
///
/// ```
/// use teracore::core::utils::{escape_filename, MAX_FILE_NAME_BYTES};
///
/// assert_eq!(escape_filename("clip/name*.mp4"), "clip_name_.mp4");
///
/// let long = escape_filename(&format!("{}.mkv", "视".repeat(200)));
/// assert!(long.len() <= MAX_FILE_NAME_BYTES);
/// assert!(long.ends_with(".mkv"));
/// ```
pub fn escape_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            '"' => '\'',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = trim_name(&cleaned);
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if trimmed.len() <= MAX_FILE_NAME_BYTES {
        return trimmed.to_string();
    }

    let (stem, extension) = split_extension(trimmed);
    let stem = trim_name(truncate_at_char_boundary(stem, MAX_FILE_NAME_BYTES - extension.len()));
    let stem = if stem.is_empty() { FALLBACK_NAME } else { stem };
    format!("{}{}", stem, extension)
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c: char| c.is_whitespace() || c == '.')
}

/// Splits off a trailing `.ext` short enough to keep when shortening.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name, ""),
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Formats a byte count for user-facing messages ("1.50 MB").
///
/// `0` is reported as "unknown size" because the size gate uses it for
/// a missing content length.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let value = bytes as f64;
    if bytes == 0 {
        "unknown size".to_string()
    } else if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_filename() {
        assert_eq!(escape_filename("video.mp4"), "video.mp4");
        assert_eq!(escape_filename("a/b\\c:d.mp4"), "a_b_c_d.mp4");
        assert_eq!(escape_filename("say \"hi\".mp4"), "say 'hi'.mp4");
        assert_eq!(escape_filename("  ..  "), "download");
        assert_eq!(escape_filename("tab\there.mp4"), "tab_here.mp4");
    }

    #[test]
    fn test_escape_filename_applies_byte_budget() {
        // 3 bytes per char, 300 bytes before the extension
        let name = format!("{}.mp4", "视".repeat(100));
        let escaped = escape_filename(&name);
        assert!(escaped.len() <= MAX_FILE_NAME_BYTES);
        assert!(escaped.ends_with(".mp4"));
        assert!(escaped.starts_with("视视视"));

        let no_extension = "a".repeat(400);
        assert_eq!(escape_filename(&no_extension).len(), MAX_FILE_NAME_BYTES);

        let odd_extension = format!("{}.{}", "b".repeat(100), "c".repeat(100));
        let escaped = escape_filename(&odd_extension);
        assert_eq!(escaped.len(), MAX_FILE_NAME_BYTES);
        assert!(escaped.starts_with("bbb"));
    }

    #[test]
    fn test_escape_filename_budget_does_not_leave_trailing_dot() {
        let name = format!("{}.{}.mp4", "x".repeat(MAX_FILE_NAME_BYTES - 5), "y".repeat(50));
        let escaped = escape_filename(&name);
        assert!(escaped.len() <= MAX_FILE_NAME_BYTES);
        assert!(!escaped.contains("..mp4"));
        assert!(escaped.ends_with(".mp4"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "unknown size");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.00 GB");
    }
}

//! Partition identifiers.

/// Derive the partition identifier from a common prefix key.
///
/// The delimiter is stripped from both ends and the last segment is taken,
/// so `"root/2024/a/"` with `/` gives `"a"`. Keys are taken literally: a
/// delimiter character is always a hierarchy separator.
///
/// Returns `None` when the segment cannot safely name an output file
/// (empty, `.`, `..`, or containing a path separator).
pub fn partition_id(prefix_key: &str, delimiter: &str) -> Option<String> {
    let segment = if delimiter.is_empty() {
        prefix_key
    } else {
        prefix_key
            .trim_start_matches(delimiter)
            .trim_end_matches(delimiter)
            .rsplit(delimiter)
            .next()
            .unwrap_or_default()
    };

    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }

    if segment.contains('/') || segment.contains('\\') {
        return None;
    }

    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(partition_id("a/", "/"), Some("a".to_string()));
        assert_eq!(partition_id("root/2024/abc/", "/"), Some("abc".to_string()));
        assert_eq!(partition_id("/leading/", "/"), Some("leading".to_string()));
    }

    #[test]
    fn test_repeated_trailing_delimiter() {
        assert_eq!(partition_id("root/a//", "/"), Some("a".to_string()));
    }

    #[test]
    fn test_multi_char_delimiter() {
        assert_eq!(partition_id("root::a::", "::"), Some("a".to_string()));
    }

    #[test]
    fn test_unusable_segments() {
        assert_eq!(partition_id("/", "/"), None);
        assert_eq!(partition_id("", "/"), None);
        assert_eq!(partition_id("root/../", "/"), None);
        assert_eq!(partition_id("root/./", "/"), None);
    }

    #[test]
    fn test_path_separator_in_segment() {
        // With a non-slash delimiter a slash stays inside the segment
        assert_eq!(partition_id("root|a/b|", "|"), None);
        assert_eq!(partition_id("root|a\\b|", "|"), None);
        assert_eq!(partition_id("root|ab|", "|"), Some("ab".to_string()));
    }
}

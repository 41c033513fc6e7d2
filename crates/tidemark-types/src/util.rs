/// Split a remote path into (parent_dir, file_name).
///
/// Remote paths are always absolute and '/'-separated regardless of the
/// host platform, so this never goes through std::path.
pub fn split_path(path: &str) -> (String, &str) {
    match path.rfind('/') {
        Some(0) => ("/".to_string(), &path[1..]),
        Some(i) => (path[..i].to_string(), &path[i + 1..]),
        None => ("/".to_string(), path),
    }
}

/// Join a category path and a file name into a destination path.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Check whether `path` equals `dir` or lies underneath it.
pub fn is_under(path: &str, dir: &str) -> bool {
    path == dir || path.starts_with(&format!("{}/", dir.trim_end_matches('/')))
}

/// Directory depth of a path ("/" = 0, "/a" = 1, "/a/b" = 2).
pub fn path_depth(path: &str) -> usize {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
}

/// Human-readable byte size, matching the report formatting used across
/// all governance summaries.
pub fn format_size(size_bytes: i64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Truncate long paths from the left, keeping the informative tail.
pub fn truncate_path(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let tail: String = s
        .chars()
        .rev()
        .take(max_len.saturating_sub(3))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b/c.txt"), ("/a/b".to_string(), "c.txt"));
        assert_eq!(split_path("/c.txt"), ("/".to_string(), "c.txt"));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/a/b", "c.txt"), "/a/b/c.txt");
        assert_eq!(join_path("/", "c.txt"), "/c.txt");
        assert_eq!(join_path("/a/", "c.txt"), "/a/c.txt");
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("/Docs/Finance/x.pdf", "/Docs/Finance"));
        assert!(is_under("/Docs/Finance", "/Docs/Finance"));
        assert!(!is_under("/Docs/Finances/x.pdf", "/Docs/Finance"));
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth("/"), 0);
        assert_eq!(path_depth("/a"), 1);
        assert_eq!(path_depth("/a/b/c"), 3);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_truncate_path() {
        assert_eq!(truncate_path("/short", 10), "/short");
        let t = truncate_path("/a/very/long/path/name.txt", 12);
        assert!(t.starts_with("..."));
        assert_eq!(t.chars().count(), 12);
    }
}

//! Virtual path normalization and the source-file name sanitizer.

/// The alphabet a source file's virtual path is allowed to use, aside
/// from a leading `~`.
const GOOD_SRC_FILE_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789./";

/// Replace backslashes with `/` and collapse runs of `/`.
pub fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let mut out = String::with_capacity(slashed.len());
    let mut last_was_slash = false;
    for c in slashed.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(c);
    }
    out
}

/// Normalize `path`, then split at the last `/` into `(parent, leaf)`.
///
/// If there is no `/`, returns `(path, "")`.
pub fn split(path: &str) -> (String, String) {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(pos) => (normalized[..pos].to_string(), normalized[pos + 1..].to_string()),
        None => (normalized, String::new()),
    }
}

/// True for the three spellings of the virtual filesystem root: `""`,
/// `"/"`, and `"~"`.
pub fn is_root(path: &str) -> bool {
    let normalized = normalize(path);
    normalized.is_empty() || normalized == "/" || normalized == "~"
}

/// Every ancestor directory of `path`, root-most first, excluding both the
/// root itself and `path` itself.
///
/// `"/a/b/c"` yields `["/a", "/a/b"]`; `"~/a/b"` yields `["~/a"]`; `"~/a"`
/// and root spellings yield nothing.
pub fn ancestors(path: &str) -> Vec<String> {
    let normalized = normalize(path);
    let (marker, rest) = if let Some(r) = normalized.strip_prefix("~/") {
        ("~/", r)
    } else if let Some(r) = normalized.strip_prefix('/') {
        ("/", r)
    } else {
        ("", normalized.as_str())
    };

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let mut out = Vec::new();
    for i in 1..segments.len() {
        out.push(format!("{marker}{}", segments[..i].join("/")));
    }
    out
}

/// Sanitize a virtual path so it contains only characters allowed in the
/// source-file alphabet (`[A-Za-z0-9./]`), preserving a leading `~`
/// verbatim.
///
/// If any character had to be replaced, the result is relocated under
/// `~/.tmp/src/dirty<Xs>[<n>]/<cleaned-tail>`, where `<n>` is the smallest
/// non-negative integer that makes the path unique among
/// `existing_synthetic_paths`. Otherwise `path` is returned unchanged.
pub fn sanitize_source_name<'a>(
    path: &str,
    existing_synthetic_paths: impl Iterator<Item = &'a str>,
) -> String {
    if path.is_empty() {
        return String::new();
    }

    let (head, remainder) = if let Some(rest) = path.strip_prefix('~') {
        ("~", rest)
    } else {
        ("", path)
    };

    let mut cleaned = String::from(head);
    let mut removed = String::new();
    for c in remainder.chars() {
        if GOOD_SRC_FILE_CHARS.contains(c) {
            cleaned.push(c);
        } else {
            cleaned.push('X');
            removed.push('X');
        }
    }

    if removed.is_empty() {
        return path.to_string();
    }

    // Strip leading scratch-directory/scheme prefixes so the tail doesn't
    // double up when the dirty path itself already lived under ~/.tmp/src.
    let mut tail = cleaned.as_str();
    for prefix in ["~/.tmp/src/", "src/", "~/"] {
        if let Some(rest) = tail.strip_prefix(prefix) {
            tail = rest;
        }
    }
    if tail.is_empty() {
        tail = "X";
    }
    let tail = if tail.starts_with('/') {
        tail.to_string()
    } else {
        format!("/{tail}")
    };

    let existing: Vec<&str> = existing_synthetic_paths.collect();
    let mut n = 0usize;
    loop {
        let candidate = if n == 0 {
            format!("~/.tmp/src/dirty{removed}{tail}")
        } else {
            format!("~/.tmp/src/dirty{removed}{n}{tail}")
        };
        if !existing.contains(&candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

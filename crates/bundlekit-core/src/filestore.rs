//! Owns [`StoredFile`] records: loads local files, rewrites `import_code`
//! lines to synthetic paths, and deduplicates sources by absolute local
//! path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use std::sync::OnceLock;

use crate::error::BundleError;
use crate::paths::sanitize_source_name;

const TEMP_DIR: &str = "~/.tmp";
const REPLACED_WITH_HOME: &str = "<[HOME]>";

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*import_code\s*\(\s*"([^"]+)"\s*\)\s*$"#).unwrap())
}

/// One entry per logical file the bundle carries.
///
/// `ref_id` is the index of this file within its owning [`FileStore`]'s
/// arena — stable for the lifetime of the store, used to defer
/// resolution of build/test targets (see
/// [`crate::assembler::Assembler::add_build`]).
#[derive(Debug, Clone)]
struct StoredFile {
    ref_id: usize,
    local_path: Option<PathBuf>,
    contents: Option<String>,
    is_source: bool,
    is_home_replaced: bool,
    requested_game_path: Option<String>,
    synthetic_game_path: Option<String>,
}

/// A file resolved to its final location(s) in the artifact, emitted by
/// [`FileStore::process_file_map`].
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    /// Arena index of the [`StoredFile`] this was resolved from.
    pub ref_id: usize,
    /// The virtual path this content is published at.
    pub game_path: String,
    /// The file's final text, with imports already rewritten if it was a
    /// source file.
    pub contents: String,
    /// Whether `contents` (or `game_path`) contains the `<[HOME]>`
    /// placeholder and must be pooled in the home-rewritten table.
    pub is_home_replaced: bool,
}

/// Arena of [`StoredFile`]s plus the import-rewriting resolution pass.
#[derive(Debug, Default)]
pub struct FileStore {
    files: Vec<StoredFile>,
}

impl FileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored file's `ref_id` by its requested game path.
    pub fn ref_for_requested_path(&self, game_path: &str) -> Option<usize> {
        self.files
            .iter()
            .find(|f| f.requested_game_path.as_deref() == Some(game_path))
            .map(|f| f.ref_id)
    }

    fn has_requested_path(&self, game_path: &str) -> bool {
        self.ref_for_requested_path(game_path).is_some()
    }

    /// Inline text content at a requested game path.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::DuplicateTarget`] if `game_path` is already
    /// claimed by another entry.
    pub fn add_text_contents(&mut self, game_path: &str, contents: &str) -> Result<usize, BundleError> {
        if self.has_requested_path(game_path) {
            return Err(BundleError::DuplicateTarget(game_path.to_string()));
        }
        let ref_id = self.files.len();
        self.files.push(StoredFile {
            ref_id,
            local_path: None,
            contents: Some(contents.to_string()),
            is_source: false,
            is_home_replaced: false,
            requested_game_path: Some(game_path.to_string()),
            synthetic_game_path: None,
        });
        Ok(ref_id)
    }

    /// A lazily-read, binary-safe text file at a requested game path.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::DuplicateTarget`] if `game_path` is already
    /// claimed, or [`BundleError::SourceMissing`] if `local_path` does not
    /// exist on disk.
    pub fn add_local_text_file(
        &mut self,
        game_path: &str,
        local_path: &Path,
    ) -> Result<usize, BundleError> {
        if self.has_requested_path(game_path) {
            return Err(BundleError::DuplicateTarget(game_path.to_string()));
        }
        if !local_path.is_file() {
            return Err(BundleError::SourceMissing(local_path.to_path_buf()));
        }
        let ref_id = self.files.len();
        self.files.push(StoredFile {
            ref_id,
            local_path: Some(local_path.to_path_buf()),
            contents: None,
            is_source: false,
            is_home_replaced: false,
            requested_game_path: Some(game_path.to_string()),
            synthetic_game_path: None,
        });
        Ok(ref_id)
    }

    /// A source file that must undergo import rewriting before emission.
    ///
    /// `game_path` is optional: tests and implicitly-discovered imports
    /// register a source with no requested path.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::DuplicateTarget`] or
    /// [`BundleError::SourceMissing`] as for [`Self::add_local_text_file`].
    pub fn add_local_source_file(
        &mut self,
        game_path: Option<&str>,
        local_path: &Path,
    ) -> Result<usize, BundleError> {
        if let Some(gp) = game_path {
            if self.has_requested_path(gp) {
                return Err(BundleError::DuplicateTarget(gp.to_string()));
            }
        }
        if !local_path.is_file() {
            return Err(BundleError::SourceMissing(local_path.to_path_buf()));
        }
        let ref_id = self.files.len();
        self.files.push(StoredFile {
            ref_id,
            local_path: Some(local_path.to_path_buf()),
            contents: None,
            is_source: true,
            is_home_replaced: true,
            requested_game_path: game_path.map(str::to_string),
            synthetic_game_path: None,
        });
        Ok(ref_id)
    }

    fn find_by_local_path(&self, local_path: &Path) -> Option<usize> {
        let target = local_path.canonicalize().ok();
        self.files.iter().position(|f| {
            f.is_source
                && f.local_path
                    .as_ref()
                    .and_then(|p| p.canonicalize().ok())
                    .is_some()
                && f.local_path.as_ref().and_then(|p| p.canonicalize().ok()) == target
        })
    }

    fn existing_synthetic_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|f| f.synthetic_game_path.clone())
            .collect()
    }

    /// Run import rewriting to a fixed point, then publish [`ResolvedFile`]s
    /// for every stored file.
    ///
    /// Rewriting a source may discover further imports, growing the work
    /// queue as it drains; the pass is errored (but continues) on the
    /// first `SourceMissing`/`ImportUnresolved` encountered, so a single
    /// invocation can surface multiple diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the first recorded [`BundleError`] if any file could not be
    /// loaded or any import could not be resolved; the returned vector of
    /// problems (not just the artifact) is what the caller should surface.
    pub fn process_file_map(&mut self) -> (Vec<ResolvedFile>, Vec<BundleError>) {
        let mut problems = Vec::new();
        let mut resolved: HashMap<String, ResolvedFile> = HashMap::new();
        let mut queue: Vec<usize> = (0..self.files.len()).collect();

        while let Some(idx) = queue.pop() {
            if self.files[idx].contents.is_none() {
                let Some(local_path) = self.files[idx].local_path.clone() else {
                    continue;
                };
                match std::fs::read_to_string(&local_path) {
                    Ok(text) => self.files[idx].contents = Some(text),
                    Err(_) => {
                        problems.push(BundleError::SourceMissing(local_path));
                        self.files[idx].contents = Some(String::new());
                    }
                }
            }

            let is_source = self.files[idx].is_source;
            if is_source {
                if let Err(e) = self.rewrite_imports(idx, &mut queue) {
                    problems.push(e);
                }
                self.publish_source(idx, &mut resolved);
            } else {
                self.publish_plain(idx, &mut resolved);
            }
        }

        (resolved.into_values().collect(), problems)
    }

    fn publish_plain(&self, idx: usize, resolved: &mut HashMap<String, ResolvedFile>) {
        let f = &self.files[idx];
        let Some(contents) = &f.contents else { return };
        for path in [&f.requested_game_path, &f.synthetic_game_path]
            .into_iter()
            .flatten()
        {
            resolved.insert(
                path.clone(),
                ResolvedFile {
                    ref_id: f.ref_id,
                    game_path: path.clone(),
                    contents: contents.clone(),
                    is_home_replaced: f.is_home_replaced,
                },
            );
        }
    }

    fn publish_source(&mut self, idx: usize, resolved: &mut HashMap<String, ResolvedFile>) {
        if self.files[idx].synthetic_game_path.is_none()
            && self.files[idx].requested_game_path.is_none()
        {
            let basename = self.files[idx]
                .local_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| resolved.len().to_string());

            let mut k = 0usize;
            let synthetic = loop {
                let candidate = format!("{TEMP_DIR}/src/{k}/{basename}");
                if !resolved.contains_key(&candidate) {
                    break candidate;
                }
                k += 1;
            };
            let existing = self.existing_synthetic_paths();
            self.files[idx].synthetic_game_path =
                Some(sanitize_source_name(&synthetic, existing.iter().map(String::as_str)));
        }
        self.publish_plain(idx, resolved);
    }

    /// Run the import rewriter over one stored source file, appending any
    /// newly-discovered imports to `queue`.
    fn rewrite_imports(&mut self, idx: usize, queue: &mut Vec<usize>) -> Result<(), BundleError> {
        let local_path = self.files[idx]
            .local_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let contents = self.files[idx].contents.clone().unwrap_or_default();

        let mut out_lines = Vec::new();
        let mut home_replaced = self.files[idx].is_home_replaced;
        let mut first_error = None;

        for raw_line in contents.split('\n') {
            let trimmed = raw_line.trim();
            let stripped = strip_trailing_comment(trimmed);

            if let Some(captures) = import_re().captures(stripped) {
                let import_text = captures[1].to_string();
                match self.resolve_import(&local_path, &import_text, queue) {
                    Ok(synthetic) => {
                        let mut rewritten = synthetic.clone();
                        if let Some(rest) = rewritten.strip_prefix("~/") {
                            rewritten = format!("{REPLACED_WITH_HOME}/{rest}");
                            home_replaced = true;
                        }
                        out_lines.push(format!(r#"import_code("{rewritten}")"#));
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                        // Drop the line: the import could not be resolved.
                    }
                }
            } else {
                out_lines.push(stripped.to_string());
            }
        }

        self.files[idx].contents = Some(out_lines.join("\n"));
        self.files[idx].is_home_replaced = home_replaced;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn resolve_import(
        &mut self,
        referring_path: &Path,
        imported_path: &str,
        queue: &mut Vec<usize>,
    ) -> Result<String, BundleError> {
        let base_dir = referring_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let included_local = base_dir.join(imported_path);

        let found_idx = self.find_by_local_path(&included_local).or_else(|| {
            if !included_local.is_file() {
                return None;
            }
            let ref_id = self.files.len();
            self.files.push(StoredFile {
                ref_id,
                local_path: Some(included_local.clone()),
                contents: None,
                is_source: true,
                is_home_replaced: true,
                requested_game_path: None,
                synthetic_game_path: None,
            });
            queue.push(ref_id);
            Some(ref_id)
        });

        let Some(found_idx) = found_idx else {
            return Err(BundleError::ImportUnresolved(
                referring_path.to_path_buf(),
                imported_path.to_string(),
            ));
        };

        if self.files[found_idx].synthetic_game_path.is_none() {
            let existing = self.existing_synthetic_paths();
            let base = self.files[found_idx]
                .requested_game_path
                .clone()
                .unwrap_or_else(|| format!("{TEMP_DIR}/src/{imported_path}"));
            self.files[found_idx].synthetic_game_path =
                Some(sanitize_source_name(&base, existing.iter().map(String::as_str)));
        }

        Ok(self.files[found_idx].synthetic_game_path.clone().unwrap())
    }
}

/// Strip a trailing `//` line comment, unless the `//` occurs inside a
/// string. Blank lines and leading/trailing whitespace in the input are
/// assumed already trimmed by the caller so line counts are preserved.
fn strip_trailing_comment(line: &str) -> &str {
    if !line.contains("//") {
        return line;
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Plain,
        InString,
        SawSlash,
    }

    let mut state = State::Plain;
    let bytes = line.as_bytes();
    for (pos, &b) in bytes.iter().enumerate() {
        state = match (state, b) {
            (State::Plain, b'"') => State::InString,
            (State::Plain, b'/') => State::SawSlash,
            (State::Plain, _) => State::Plain,
            (State::InString, b'"') => State::Plain,
            (State::InString, _) => State::InString,
            (State::SawSlash, b'/') => return &line[..pos - 1],
            (State::SawSlash, b'"') => State::InString,
            (State::SawSlash, _) => State::Plain,
        };
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strip_trailing_comment_outside_string() {
        assert_eq!(strip_trailing_comment(r#"foo() // a comment"#), "foo() ");
    }

    #[test]
    fn strip_trailing_comment_inside_string_untouched() {
        assert_eq!(strip_trailing_comment(r#"say("a//b")"#), r#"say("a//b")"#);
    }

    #[test]
    fn strip_trailing_comment_no_slashes() {
        assert_eq!(strip_trailing_comment("plain line"), "plain line");
    }

    #[test]
    fn duplicate_requested_path_is_rejected() {
        let mut store = FileStore::new();
        store.add_text_contents("/a", "x").unwrap();
        let err = store.add_text_contents("/a", "y").unwrap_err();
        assert_eq!(err, BundleError::DuplicateTarget("/a".to_string()));
    }

    #[test]
    fn missing_local_file_is_rejected() {
        let mut store = FileStore::new();
        let err = store
            .add_local_text_file("/a", Path::new("/does/not/exist"))
            .unwrap_err();
        assert!(matches!(err, BundleError::SourceMissing(_)));
    }

    #[test]
    fn import_rewrite_preserves_line_count() {
        let dir = tempfile::tempdir().unwrap();
        let lib_path = dir.path().join("lib.src");
        std::fs::write(&lib_path, "x = 1\n").unwrap();
        let main_path = dir.path().join("main.src");
        let mut f = std::fs::File::create(&main_path).unwrap();
        writeln!(f, "a = 1\nimport_code(\"./lib.src\")\nb = 2").unwrap();

        let mut store = FileStore::new();
        store
            .add_local_source_file(Some("~/s/main.src"), &main_path)
            .unwrap();
        let (resolved, problems) = store.process_file_map();
        assert!(problems.is_empty());

        let main_resolved = resolved
            .iter()
            .find(|r| r.game_path == "~/s/main.src")
            .unwrap();
        let original_lines = std::fs::read_to_string(&main_path).unwrap();
        assert_eq!(
            main_resolved.contents.split('\n').count(),
            original_lines.split('\n').count()
        );
        assert!(main_resolved.contents.contains(r#"import_code("<[HOME]>"#));

        let lib_resolved = resolved
            .iter()
            .find(|r| r.contents.trim() == "x = 1")
            .unwrap();
        assert!(lib_resolved.game_path.starts_with("~/.tmp/src"));
    }

    #[test]
    fn self_referential_alias_collapses_to_one_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let target = sub.join("lib.src");
        std::fs::write(&target, "y = 2\n").unwrap();
        let main_path = dir.path().join("main.src");
        std::fs::write(&main_path, "import_code(\"sub/lib.src\")\n").unwrap();

        let mut store = FileStore::new();
        store
            .add_local_source_file(Some("~/m.src"), &main_path)
            .unwrap();
        // Adding the same file again under a differently-spelled path should
        // collapse to the same stored entry once canonicalized.
        store
            .add_local_source_file(None, &sub.join("../sub/lib.src"))
            .unwrap();

        let (resolved, problems) = store.process_file_map();
        assert!(problems.is_empty());
        let lib_paths: Vec<_> = resolved
            .iter()
            .filter(|r| r.contents.trim() == "y = 2")
            .collect();
        assert_eq!(lib_paths.len(), 1);
    }

    #[test]
    fn unresolved_import_is_reported_and_line_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("main.src");
        std::fs::write(&main_path, "a = 1\nimport_code(\"./missing.src\")\n").unwrap();

        let mut store = FileStore::new();
        store
            .add_local_source_file(Some("~/m.src"), &main_path)
            .unwrap();
        let (resolved, problems) = store.process_file_map();
        assert!(!problems.is_empty());
        let main_resolved = resolved.iter().find(|r| r.game_path == "~/m.src").unwrap();
        assert!(!main_resolved.contents.contains("import_code"));
    }
}

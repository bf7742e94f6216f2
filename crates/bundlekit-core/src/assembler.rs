//! The public entry point: accumulates manifest operations and emits the
//! canonical chunk stream.

use std::path::Path;

use crate::chunk::{
    emit_chunk, header_chunk, push_bool, push_ref, push_u16, push_u8, ChunkKind, StringRef,
    VERSION_UNCOMPRESSED,
};
use crate::error::BundleError;
use crate::filestore::{FileStore, ResolvedFile};
use crate::pool::StringPool;

/// A folder to create, recorded by its requested (not yet pool-resolved)
/// virtual path.
#[derive(Debug)]
struct PendingFolder {
    path: String,
}

/// Where a build's source content comes from: a file store entry resolved
/// later (once [`FileStore::process_file_map`] has assigned its final
/// game path), or a virtual path to intern as-is.
#[derive(Debug)]
enum BuildSource {
    Deferred(usize),
    Direct(String),
}

/// One entry of the action queue (`exec_blocks`): build, test, launch,
/// chmod, chown, chgroup, copy, move, delete, rm-user, rm-group. Kept as
/// a single ordered vector so manifest order survives into the emitted
/// chunk stream, rather than being regrouped by operation kind.
#[derive(Debug)]
enum ExecOp {
    Build {
        source: BuildSource,
        target_dir: String,
        target_name: String,
    },
    Test {
        ref_id: usize,
        name: String,
    },
    Launch {
        argv: Vec<String>,
    },
    Chmod {
        path: String,
        perms: String,
        recursive: bool,
    },
    Chown {
        path: String,
        owner: String,
        recursive: bool,
    },
    Chgroup {
        path: String,
        group: String,
        recursive: bool,
    },
    RmUser {
        user: String,
    },
    RmGroup {
        user: String,
        group: String,
    },
    Copy {
        source: String,
        target_dir: String,
        target_name: String,
    },
    Move {
        source: String,
        target_dir: String,
        target_name: String,
    },
    Delete {
        path: String,
    },
}

/// Encodes a string to the chunk pair appropriate for its content:
/// ASCII-only strings get the single-byte-per-character encoding, anything
/// else goes through UTF-16.
///
/// # Errors
///
/// Returns [`BundleError::EncodingUnsupported`] if `s` contains a
/// character outside the Basic Multilingual Plane.
fn encode_string_payload(s: &str) -> Result<(bool, Vec<u8>), BundleError> {
    if s.is_ascii() {
        return Ok((true, s.as_bytes().to_vec()));
    }
    let mut units = Vec::with_capacity(s.len());
    for c in s.chars() {
        let mut buf = [0u16; 2];
        let encoded = c.encode_utf16(&mut buf);
        if encoded.len() != 1 {
            return Err(BundleError::EncodingUnsupported(s.to_string()));
        }
        units.push(encoded[0]);
    }
    let mut bytes = Vec::with_capacity(units.len() * 2);
    for u in units {
        bytes.extend_from_slice(&u.to_be_bytes());
    }
    Ok((false, bytes))
}

/// Accumulates manifest operations and produces the artifact's chunk
/// stream via [`Self::assemble`].
///
/// Operations never fail fast: errors are pushed onto an internal problem
/// list so a single pass over the manifest can surface every issue.
#[derive(Debug)]
pub struct Assembler {
    pool: StringPool,
    files: FileStore,
    folders: Vec<PendingFolder>,
    users: Vec<(String, String)>,
    group_members: Vec<(String, String)>,
    execs: Vec<ExecOp>,
    next_test_index: u16,
    problems: Vec<BundleError>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self {
            pool: StringPool::new(),
            files: FileStore::new(),
            folders: Vec::new(),
            users: Vec::new(),
            group_members: Vec::new(),
            execs: Vec::new(),
            next_test_index: 0,
            problems: Vec::new(),
        }
    }

    /// Problems accumulated so far across every `add_*` call and the most
    /// recent [`Self::assemble`] invocation.
    pub fn problems(&self) -> &[BundleError] {
        &self.problems
    }

    fn push_problem(&mut self, err: BundleError) {
        self.problems.push(err);
    }

    /// Record a problem discovered outside the `add_*` helpers (e.g. by
    /// the manifest dispatcher while walking a block tree).
    pub fn record_problem(&mut self, err: BundleError) {
        self.problems.push(err);
    }

    /// Register a virtual folder, recursively ensuring every ancestor
    /// directory exists too. The root (`"/"`, `"~"`, `""`) is a no-op.
    pub fn add_folder(&mut self, path: &str) {
        if crate::paths::is_root(path) {
            return;
        }
        for ancestor in crate::paths::ancestors(path) {
            self.folders.push(PendingFolder { path: ancestor });
        }
        self.folders.push(PendingFolder {
            path: path.to_string(),
        });
    }

    /// Register inline text contents at a virtual path.
    pub fn add_contents_file(&mut self, game_path: &str, contents: &str) {
        if let Err(e) = self.files.add_text_contents(game_path, contents) {
            self.push_problem(e);
        }
    }

    /// Register a local file, copied verbatim (after UTF-8 decoding), at a
    /// virtual path.
    pub fn add_local_text_file(&mut self, game_path: &str, local_path: &Path) {
        if let Err(e) = self.files.add_local_text_file(game_path, local_path) {
            self.push_problem(e);
        }
    }

    /// Register a local source file requiring import rewriting.
    pub fn add_local_source_file(&mut self, game_path: Option<&str>, local_path: &Path) -> usize {
        match self.files.add_local_source_file(game_path, local_path) {
            Ok(ref_id) => ref_id,
            Err(e) => {
                self.push_problem(e);
                usize::MAX
            }
        }
    }

    /// Register a test pointing at a source file already added via
    /// [`Self::add_local_source_file`].
    pub fn add_test_file(&mut self, name: &str, ref_id: usize) {
        self.execs.push(ExecOp::Test {
            ref_id,
            name: name.to_string(),
        });
    }

    /// Register a build artifact: `source` is either the requested game
    /// path of a file already registered in the file store (in which case
    /// emission is deferred until that file's final, possibly synthetic,
    /// path is known) or an arbitrary virtual path interned directly.
    /// `target` is split into parent folder and leaf name; the parent
    /// folder (and its ancestors) are registered automatically.
    pub fn add_build(&mut self, source: &str, target: &str) {
        let (target_dir, target_name) = crate::paths::split(target);
        self.add_folder(&target_dir);
        let build_source = match self.files.ref_for_requested_path(source) {
            Some(ref_id) => BuildSource::Deferred(ref_id),
            None => BuildSource::Direct(source.to_string()),
        };
        self.execs.push(ExecOp::Build {
            source: build_source,
            target_dir,
            target_name,
        });
    }

    /// Register a new user with the given password.
    pub fn add_user(&mut self, user: &str, password: &str) {
        self.users.push((user.to_string(), password.to_string()));
    }

    /// Add `user` to `group`.
    pub fn add_group(&mut self, user: &str, group: &str) {
        self.group_members.push((user.to_string(), group.to_string()));
    }

    /// Remove a user.
    pub fn add_rm_user(&mut self, user: &str) {
        self.execs.push(ExecOp::RmUser { user: user.to_string() });
    }

    /// Remove `user` from `group`.
    pub fn add_rm_group(&mut self, user: &str, group: &str) {
        self.execs.push(ExecOp::RmGroup {
            user: user.to_string(),
            group: group.to_string(),
        });
    }

    /// Set permissions on `path`.
    pub fn add_chmod(&mut self, path: &str, perms: &str, recursive: bool) {
        self.execs.push(ExecOp::Chmod {
            path: path.to_string(),
            perms: perms.to_string(),
            recursive,
        });
    }

    /// Set ownership on `path`. An `owner` of the form `user:group` emits
    /// both a chown and a chgroup record.
    pub fn add_chown(&mut self, path: &str, owner: &str, recursive: bool) {
        match owner.split_once(':') {
            Some((user, group)) => {
                self.execs.push(ExecOp::Chown {
                    path: path.to_string(),
                    owner: user.to_string(),
                    recursive,
                });
                self.execs.push(ExecOp::Chgroup {
                    path: path.to_string(),
                    group: group.to_string(),
                    recursive,
                });
            }
            None => {
                self.execs.push(ExecOp::Chown {
                    path: path.to_string(),
                    owner: owner.to_string(),
                    recursive,
                });
            }
        }
    }

    /// Set the group on `path`.
    pub fn add_chgroup(&mut self, path: &str, group: &str, recursive: bool) {
        self.execs.push(ExecOp::Chgroup {
            path: path.to_string(),
            group: group.to_string(),
            recursive,
        });
    }

    /// Register a launch command. `argv` must have 1..=255 entries.
    pub fn add_launch(&mut self, argv: Vec<String>) {
        if argv.is_empty() || argv.len() > 255 {
            self.push_problem(BundleError::ArgvRange(argv.len()));
            return;
        }
        self.execs.push(ExecOp::Launch { argv });
    }

    /// Copy `source` to `target_dir`/`target_name`.
    pub fn add_copy(&mut self, source: &str, target_dir: &str, target_name: &str) {
        self.add_folder(target_dir);
        self.execs.push(ExecOp::Copy {
            source: source.to_string(),
            target_dir: target_dir.to_string(),
            target_name: target_name.to_string(),
        });
    }

    /// Move `source` to `target_dir`/`target_name`.
    pub fn add_move(&mut self, source: &str, target_dir: &str, target_name: &str) {
        self.add_folder(target_dir);
        self.execs.push(ExecOp::Move {
            source: source.to_string(),
            target_dir: target_dir.to_string(),
            target_name: target_name.to_string(),
        });
    }

    /// Delete `path`.
    pub fn add_delete(&mut self, path: &str) {
        self.execs.push(ExecOp::Delete { path: path.to_string() });
    }

    fn intern_content(&mut self, resolved: &ResolvedFile) -> Result<StringRef, BundleError> {
        encode_string_payload(&resolved.contents)?;
        let ref_id = if resolved.is_home_replaced {
            self.pool.intern_home_rewritten(&resolved.contents)
        } else {
            self.pool.intern_string(&resolved.contents)
        };
        Ok(ref_id)
    }

    /// Resolve every pending file, intern every string, and emit the
    /// artifact's chunk stream in canonical order: header, plain strings,
    /// home-rewritten strings, home-relative paths, folders, files, users,
    /// group memberships, then the deferred action queue in manifest
    /// order.
    ///
    /// # Errors
    ///
    /// Returns every recorded [`BundleError`] and produces no artifact if
    /// any problem was recorded, either by an earlier `add_*` call or
    /// during this resolution pass.
    pub fn assemble(&mut self) -> Result<Vec<u8>, Vec<BundleError>> {
        let (resolved, file_problems) = self.files.process_file_map();
        if !file_problems.is_empty() {
            tracing::warn!("file resolution produced {} problem(s)", file_problems.len());
        }
        self.problems.extend(file_problems);

        let mut file_chunks = Vec::new();
        for r in &resolved {
            let (parent, name) = crate::paths::split(&r.game_path);
            let parent_ref = self.pool.intern_path(if parent.is_empty() { "/" } else { &parent });
            let name_ref = self.pool.intern_string(&name);
            let content_ref = match self.intern_content(r) {
                Ok(cref) => cref,
                Err(e) => {
                    self.problems.push(e);
                    continue;
                }
            };
            let mut payload = Vec::with_capacity(6);
            push_ref(&mut payload, parent_ref);
            push_ref(&mut payload, name_ref);
            push_ref(&mut payload, content_ref);
            file_chunks.push((r.game_path.clone(), payload));
        }

        let ref_id_to_path: std::collections::HashMap<usize, String> = resolved
            .iter()
            .map(|r| (r.ref_id, r.game_path.clone()))
            .collect();

        let mut folder_paths: Vec<String> = self.folders.iter().map(|f| f.path.clone()).collect();
        folder_paths.sort();
        folder_paths.dedup();

        let mut folder_chunks = Vec::new();
        for path in &folder_paths {
            let (parent, name) = crate::paths::split(path);
            let parent_ref = self.pool.intern_path(if parent.is_empty() { "/" } else { &parent });
            let name_ref = self.pool.intern_string(&name);
            let mut payload = Vec::with_capacity(4);
            push_ref(&mut payload, parent_ref);
            push_ref(&mut payload, name_ref);
            folder_chunks.push(payload);
        }

        let mut user_chunks = Vec::new();
        for (user, password) in &self.users {
            let user_ref = self.pool.intern_string(user);
            let password_ref = self.pool.intern_string(password);
            let mut payload = Vec::with_capacity(4);
            push_ref(&mut payload, user_ref);
            push_ref(&mut payload, password_ref);
            user_chunks.push(payload);
        }

        let mut group_member_chunks = Vec::new();
        for (user, group) in &self.group_members {
            let user_ref = self.pool.intern_string(user);
            let group_ref = self.pool.intern_string(group);
            let mut payload = Vec::with_capacity(4);
            push_ref(&mut payload, user_ref);
            push_ref(&mut payload, group_ref);
            group_member_chunks.push(payload);
        }

        let mut exec_chunks: Vec<(ChunkKind, Vec<u8>)> = Vec::with_capacity(self.execs.len());
        for exec in &self.execs {
            match exec {
                ExecOp::Build {
                    source,
                    target_dir,
                    target_name,
                } => {
                    let source_path = match source {
                        BuildSource::Deferred(ref_id) => match ref_id_to_path.get(ref_id) {
                            Some(path) => path.clone(),
                            None => {
                                self.problems.push(BundleError::UnresolvedReference(format!(
                                    "build target ref_id {ref_id}"
                                )));
                                continue;
                            }
                        },
                        BuildSource::Direct(path) => path.clone(),
                    };
                    let source_ref = self.pool.intern_path(&source_path);
                    let dir_ref = self.pool.intern_path(target_dir);
                    let name_ref = self.pool.intern_string(target_name);
                    let mut payload = Vec::with_capacity(6);
                    push_ref(&mut payload, source_ref);
                    push_ref(&mut payload, dir_ref);
                    push_ref(&mut payload, name_ref);
                    exec_chunks.push((ChunkKind::Build, payload));
                }
                ExecOp::Test { ref_id, name } => match ref_id_to_path.get(ref_id) {
                    Some(path) => {
                        let name_ref = self.pool.intern_string(name);
                        let file_ref = self.pool.intern_path(path);
                        let test_index = self.next_test_index;
                        self.next_test_index += 1;
                        let mut payload = Vec::with_capacity(6);
                        push_u16(&mut payload, test_index);
                        push_ref(&mut payload, name_ref);
                        push_ref(&mut payload, file_ref);
                        exec_chunks.push((ChunkKind::Test, payload));
                    }
                    None => self.problems.push(BundleError::UnresolvedReference(format!(
                        "test target ref_id {ref_id}"
                    ))),
                },
                ExecOp::Launch { argv } => {
                    let mut payload = Vec::with_capacity(1 + argv.len() * 2);
                    push_u8(&mut payload, argv.len() as u8);
                    for arg in argv {
                        let arg_ref = self.pool.intern_string(arg);
                        push_ref(&mut payload, arg_ref);
                    }
                    exec_chunks.push((ChunkKind::Launch, payload));
                }
                ExecOp::Chmod { path, perms, recursive } => {
                    let path_ref = self.pool.intern_path(path);
                    let perms_ref = self.pool.intern_string(perms);
                    let mut payload = Vec::with_capacity(5);
                    push_ref(&mut payload, path_ref);
                    push_ref(&mut payload, perms_ref);
                    push_bool(&mut payload, *recursive);
                    exec_chunks.push((ChunkKind::Chmod, payload));
                }
                ExecOp::Chown { path, owner, recursive } => {
                    let path_ref = self.pool.intern_path(path);
                    let owner_ref = self.pool.intern_string(owner);
                    let mut payload = Vec::with_capacity(5);
                    push_ref(&mut payload, path_ref);
                    push_ref(&mut payload, owner_ref);
                    push_bool(&mut payload, *recursive);
                    exec_chunks.push((ChunkKind::Chown, payload));
                }
                ExecOp::Chgroup { path, group, recursive } => {
                    let path_ref = self.pool.intern_path(path);
                    let group_ref = self.pool.intern_string(group);
                    let mut payload = Vec::with_capacity(5);
                    push_ref(&mut payload, path_ref);
                    push_ref(&mut payload, group_ref);
                    push_bool(&mut payload, *recursive);
                    exec_chunks.push((ChunkKind::Chgroup, payload));
                }
                ExecOp::RmUser { user } => {
                    let user_ref = self.pool.intern_string(user);
                    let mut payload = Vec::with_capacity(2);
                    push_ref(&mut payload, user_ref);
                    exec_chunks.push((ChunkKind::RemoveUser, payload));
                }
                ExecOp::RmGroup { user, group } => {
                    let user_ref = self.pool.intern_string(user);
                    let group_ref = self.pool.intern_string(group);
                    let mut payload = Vec::with_capacity(4);
                    push_ref(&mut payload, user_ref);
                    push_ref(&mut payload, group_ref);
                    exec_chunks.push((ChunkKind::RemoveGroupMember, payload));
                }
                ExecOp::Copy {
                    source,
                    target_dir,
                    target_name,
                } => {
                    let source_ref = self.pool.intern_path(source);
                    let dir_ref = self.pool.intern_path(target_dir);
                    let name_ref = self.pool.intern_string(target_name);
                    let mut payload = Vec::with_capacity(6);
                    push_ref(&mut payload, source_ref);
                    push_ref(&mut payload, dir_ref);
                    push_ref(&mut payload, name_ref);
                    exec_chunks.push((ChunkKind::Copy, payload));
                }
                ExecOp::Move {
                    source,
                    target_dir,
                    target_name,
                } => {
                    let source_ref = self.pool.intern_path(source);
                    let dir_ref = self.pool.intern_path(target_dir);
                    let name_ref = self.pool.intern_string(target_name);
                    let mut payload = Vec::with_capacity(6);
                    push_ref(&mut payload, source_ref);
                    push_ref(&mut payload, dir_ref);
                    push_ref(&mut payload, name_ref);
                    exec_chunks.push((ChunkKind::Move, payload));
                }
                ExecOp::Delete { path } => {
                    let path_ref = self.pool.intern_path(path);
                    let mut payload = Vec::with_capacity(2);
                    push_ref(&mut payload, path_ref);
                    exec_chunks.push((ChunkKind::Delete, payload));
                }
            }
        }

        let mut out = header_chunk(VERSION_UNCOMPRESSED);
        for (idx, text) in self.pool.plain_entries() {
            let mut payload = Vec::new();
            push_ref(&mut payload, idx);
            let (is_ascii, bytes) = match encode_string_payload(text) {
                Ok(v) => v,
                Err(e) => {
                    self.problems.push(e);
                    continue;
                }
            };
            push_u16(&mut payload, text.chars().count() as u16);
            payload.extend_from_slice(&bytes);
            emit_chunk(&mut out, if is_ascii { ChunkKind::AsciiString } else { ChunkKind::Utf16String }, &payload);
        }
        for (idx, text) in self.pool.home_rewritten_entries() {
            let mut payload = Vec::new();
            push_ref(&mut payload, idx);
            let (is_ascii, bytes) = match encode_string_payload(text) {
                Ok(v) => v,
                Err(e) => {
                    self.problems.push(e);
                    continue;
                }
            };
            push_u16(&mut payload, text.chars().count() as u16);
            payload.extend_from_slice(&bytes);
            emit_chunk(
                &mut out,
                if is_ascii { ChunkKind::HomeRewrittenAscii } else { ChunkKind::HomeRewrittenUtf16 },
                &payload,
            );
        }
        for (idx, text) in self.pool.home_relative_path_entries() {
            let mut payload = Vec::new();
            push_ref(&mut payload, idx);
            push_u16(&mut payload, text.len() as u16);
            payload.extend_from_slice(text.as_bytes());
            emit_chunk(&mut out, ChunkKind::HomeRelativePath, &payload);
        }
        for payload in &folder_chunks {
            emit_chunk(&mut out, ChunkKind::Folder, payload);
        }
        for (_path, payload) in &file_chunks {
            emit_chunk(&mut out, ChunkKind::File, payload);
        }
        for payload in &user_chunks {
            emit_chunk(&mut out, ChunkKind::AddUser, payload);
        }
        for payload in &group_member_chunks {
            emit_chunk(&mut out, ChunkKind::AddGroupMember, payload);
        }
        for (kind, payload) in &exec_chunks {
            emit_chunk(&mut out, *kind, payload);
        }

        if self.problems.is_empty() {
            Ok(out)
        } else {
            Err(self.problems.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_emits_only_header() {
        let mut asm = Assembler::new();
        let bytes = asm.assemble().unwrap();
        assert_eq!(bytes, header_chunk(VERSION_UNCOMPRESSED));
    }

    #[test]
    fn duplicate_file_target_is_reported_and_yields_no_artifact() {
        let mut asm = Assembler::new();
        asm.add_contents_file("/a.src", "1");
        asm.add_contents_file("/a.src", "2");
        let problems = asm.assemble().unwrap_err();
        assert!(problems
            .iter()
            .any(|e| matches!(e, BundleError::DuplicateTarget(p) if p == "/a.src")));
    }

    #[test]
    fn launch_argv_out_of_range_is_reported() {
        let mut asm = Assembler::new();
        asm.add_launch(vec![]);
        let big: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        asm.add_launch(big);
        assert_eq!(asm.problems().len(), 2);
    }

    #[test]
    fn chown_with_group_emits_both_chown_and_chgroup() {
        let mut asm = Assembler::new();
        asm.add_chown("/a", "alice:staff", false);
        let bytes = asm.assemble().unwrap();
        assert!(bytes.contains(&(ChunkKind::Chown as u8)));
        assert!(bytes.contains(&(ChunkKind::Chgroup as u8)));
    }

    #[test]
    fn folders_are_emitted_sorted_and_deduped() {
        let mut asm = Assembler::new();
        asm.add_folder("/b");
        asm.add_folder("/a");
        asm.add_folder("/a");
        asm.assemble().unwrap();
        assert_eq!(
            asm.folders.iter().map(|f| f.path.clone()).collect::<Vec<_>>(),
            vec!["/b".to_string(), "/a".to_string(), "/a".to_string()]
        );
    }

    #[test]
    fn add_folder_synthesizes_missing_ancestors() {
        let mut asm = Assembler::new();
        asm.add_folder("/a/b/c");
        let mut paths: Vec<String> = asm.folders.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths, vec!["/a".to_string(), "/a/b".to_string(), "/a/b/c".to_string()]);
    }

    #[test]
    fn add_folder_on_root_is_a_no_op() {
        let mut asm = Assembler::new();
        asm.add_folder("/");
        asm.add_folder("~");
        asm.add_folder("");
        assert!(asm.folders.is_empty());
    }

    #[test]
    fn add_copy_ensures_target_parent_folder() {
        let mut asm = Assembler::new();
        asm.add_copy("/src.txt", "~/out/nested", "src.txt");
        let mut paths: Vec<String> = asm.folders.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths, vec!["~/out".to_string(), "~/out/nested".to_string()]);
    }

    #[test]
    fn build_target_resolves_via_ref_id() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("main.src");
        std::fs::write(&src_path, "x = 1\n").unwrap();

        let mut asm = Assembler::new();
        asm.add_local_source_file(Some("~/main.src"), &src_path);
        asm.add_build("~/main.src", "~/bin/main");
        let bytes = asm.assemble().unwrap();
        assert!(bytes.contains(&(ChunkKind::Build as u8)));
    }

    #[test]
    fn build_with_unknown_source_interns_it_directly() {
        let mut asm = Assembler::new();
        asm.add_build("~/already/placed.bin", "~/bin/main");
        let bytes = asm.assemble().unwrap();
        assert!(bytes.contains(&(ChunkKind::Build as u8)));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn exec_queue_preserves_manifest_interleaving_order() {
        let mut asm = Assembler::new();
        asm.add_chmod("/a", "755", false);
        asm.add_delete("/b");
        asm.add_chmod("/c", "644", false);
        let kinds: Vec<ChunkKind> = asm
            .execs
            .iter()
            .map(|e| match e {
                ExecOp::Chmod { .. } => ChunkKind::Chmod,
                ExecOp::Delete { .. } => ChunkKind::Delete,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(kinds, vec![ChunkKind::Chmod, ChunkKind::Delete, ChunkKind::Chmod]);
    }
}

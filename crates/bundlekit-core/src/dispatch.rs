//! Walks a parsed manifest and drives an [`Assembler`] from it.
//!
//! The manifest is a `serde_json::Value` tree: a top-level array of
//! blocks, each an object carrying a `type` tag. `bundle` blocks recurse
//! into another manifest file; cycles are broken by tracking canonicalized
//! paths already visited.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::glob;
use serde_json::Value;

use crate::assembler::Assembler;
use crate::error::BundleError;

fn as_str<'a>(obj: &'a Value, key: &str, block_type: &str) -> Result<&'a str, BundleError> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BundleError::ManifestInvalid(format!("{block_type} block missing string field `{key}`")))
}

fn as_bool_or(obj: &Value, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Dispatch every block in `manifest` against `asm`, resolving relative
/// local paths against `base_dir`.
///
/// Unknown or malformed blocks push a [`BundleError::ManifestInvalid`]
/// onto `asm`'s problem list rather than aborting the walk.
pub fn dispatch_manifest(asm: &mut Assembler, manifest: &Value, base_dir: &Path) {
    let mut visited = HashSet::new();
    if let Some(canon) = base_dir.canonicalize().ok() {
        visited.insert(canon);
    }
    dispatch_manifest_inner(asm, manifest, base_dir, &mut visited);
}

fn dispatch_manifest_inner(
    asm: &mut Assembler,
    manifest: &Value,
    base_dir: &Path,
    visited: &mut HashSet<PathBuf>,
) {
    let Some(blocks) = manifest.as_array() else {
        push_invalid(asm, "manifest root must be an array of blocks");
        return;
    };
    for block in blocks {
        dispatch_block(asm, block, base_dir, visited);
    }
}

fn push_invalid(asm: &mut Assembler, msg: &str) {
    asm.record_problem(BundleError::ManifestInvalid(msg.to_string()));
}

fn dispatch_block(
    asm: &mut Assembler,
    block: &Value,
    base_dir: &Path,
    visited: &mut HashSet<PathBuf>,
) {
    let Some(block_type) = block.get("type").and_then(Value::as_str) else {
        push_invalid(asm, "block missing `type` field");
        return;
    };

    match block_type {
        "folder" => match as_str(block, "path", "folder") {
            Ok(path) => asm.add_folder(path),
            Err(e) => asm.record_problem(e),
        },

        "file" => {
            let path = match as_str(block, "path", "file") {
                Ok(p) => p,
                Err(e) => return asm.record_problem(e),
            };
            if let Some(contents) = block.get("contents").and_then(Value::as_str) {
                asm.add_contents_file(path, contents);
            } else if let Some(local) = block.get("local").and_then(Value::as_str) {
                asm.add_local_text_file(path, &base_dir.join(local));
            } else {
                asm.record_problem(BundleError::ManifestInvalid(
                    "file block needs `contents` or `local`".to_string(),
                ));
            }
        }

        "source" => {
            let game_path = block.get("path").and_then(Value::as_str);
            match as_str(block, "local", "source") {
                Ok(local) => {
                    asm.add_local_source_file(game_path, &base_dir.join(local));
                }
                Err(e) => asm.record_problem(e),
            }
        }

        "test" => {
            let name = match as_str(block, "name", "test") {
                Ok(n) => n,
                Err(e) => return asm.record_problem(e),
            };
            let Some(local) = block.get("local") else {
                asm.record_problem(BundleError::ManifestInvalid(
                    "test block missing `local` glob pattern".to_string(),
                ));
                return;
            };
            let Some(patterns) = glob_patterns(local) else {
                asm.record_problem(BundleError::ManifestInvalid(
                    "test block's `local` must be a string or list of glob patterns".to_string(),
                ));
                return;
            };
            for pattern in &patterns {
                dispatch_test_glob(asm, name, pattern, base_dir);
            }
        }

        "build" => {
            let source = match as_str(block, "source", "build") {
                Ok(s) => s,
                Err(e) => return asm.record_problem(e),
            };
            let target = match as_str(block, "target", "build") {
                Ok(t) => t,
                Err(e) => return asm.record_problem(e),
            };
            asm.add_build(source, target);
        }

        "compile" => {
            let local = match as_str(block, "local", "compile") {
                Ok(l) => l,
                Err(e) => return asm.record_problem(e),
            };
            let target = match as_str(block, "target", "compile") {
                Ok(t) => t,
                Err(e) => return asm.record_problem(e),
            };
            let basename = Path::new(local)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(local);
            let synthetic_path = format!("~/.tmp/build.source/{basename}");
            asm.add_local_source_file(Some(&synthetic_path), &base_dir.join(local));

            if let Some(local_tests) = block.get("local-tests") {
                match glob_patterns(local_tests) {
                    Some(patterns) => {
                        for pattern in &patterns {
                            dispatch_test_glob(asm, local, pattern, base_dir);
                        }
                    }
                    None => asm.record_problem(BundleError::ManifestInvalid(
                        "compile block's `local-tests` must be a string or list of glob patterns".to_string(),
                    )),
                }
            }

            asm.add_build(&synthetic_path, target);
        }

        "user" => match (as_str(block, "user", "user"), as_str(block, "password", "user")) {
            (Ok(user), Ok(password)) => asm.add_user(user, password),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "group" => match (as_str(block, "user", "group"), as_str(block, "group", "group")) {
            (Ok(user), Ok(group)) => asm.add_group(user, group),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "rm-user" => match as_str(block, "user", "rm-user") {
            Ok(user) => asm.add_rm_user(user),
            Err(e) => asm.record_problem(e),
        },

        "rm-group" => match (as_str(block, "user", "rm-group"), as_str(block, "group", "rm-group")) {
            (Ok(user), Ok(group)) => asm.add_rm_group(user, group),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "chmod" => match (as_str(block, "path", "chmod"), as_str(block, "permissions", "chmod")) {
            (Ok(path), Ok(perms)) => asm.add_chmod(path, perms, as_bool_or(block, "recursive", false)),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "chown" => match (as_str(block, "path", "chown"), as_str(block, "owner", "chown")) {
            (Ok(path), Ok(owner)) => asm.add_chown(path, owner, as_bool_or(block, "recursive", false)),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "chgroup" => match (as_str(block, "path", "chgroup"), as_str(block, "group", "chgroup")) {
            (Ok(path), Ok(group)) => asm.add_chgroup(path, group, as_bool_or(block, "recursive", false)),
            (Err(e), _) | (_, Err(e)) => asm.record_problem(e),
        },

        "exec" | "run" => {
            let cmd = match as_str(block, "cmd", block_type) {
                Ok(c) => c,
                Err(e) => return asm.record_problem(e),
            };
            let mut argv = vec![cmd.to_string()];
            if let Some(arguments) = block.get("arguments") {
                match arguments.as_array() {
                    Some(arr) => argv.extend(arr.iter().filter_map(Value::as_str).map(str::to_string)),
                    None => {
                        asm.record_problem(BundleError::ManifestInvalid(format!(
                            "{block_type} block's `arguments` must be an array"
                        )));
                        return;
                    }
                }
            }
            asm.add_launch(argv);
        }

        "copy" | "cp" => dispatch_transfer(asm, block, block_type, true),
        "move" | "mv" | "rename" | "ren" => dispatch_transfer(asm, block, block_type, false),

        "delete" | "del" | "rm" => match as_str(block, "path", block_type) {
            Ok(path) => asm.add_delete(path),
            Err(e) => asm.record_problem(e),
        },

        "about" => {
            // Metadata-only block: documents the bundle, nothing to emit.
        }

        "bundle" => {
            let Ok(local) = as_str(block, "local", "bundle") else {
                asm.record_problem(BundleError::ManifestInvalid(
                    "bundle block missing `local` path".to_string(),
                ));
                return;
            };
            dispatch_nested_bundle(asm, local, base_dir, visited);
        }

        other => {
            asm.record_problem(BundleError::ManifestInvalid(format!("unrecognized block type `{other}`")));
        }
    }
}

fn dispatch_transfer(asm: &mut Assembler, block: &Value, block_type: &str, is_copy: bool) {
    let source = match as_str(block, "from", block_type) {
        Ok(s) => s,
        Err(e) => return asm.record_problem(e),
    };
    let to = match as_str(block, "to", block_type) {
        Ok(s) => s,
        Err(e) => return asm.record_problem(e),
    };
    let (target_dir, target_name) = crate::paths::split(to);
    if is_copy {
        asm.add_copy(source, &target_dir, &target_name);
    } else {
        asm.add_move(source, &target_dir, &target_name);
    }
}

/// Normalize a `local`/`local-tests`-style field into a list of glob
/// patterns: a bare string is a single pattern, an array of strings is
/// taken as-is.
fn glob_patterns(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(item.as_str()?.to_string());
            }
            Some(out)
        }
        _ => None,
    }
}

/// Expand a `test` block's glob pattern against `base_dir`, registering
/// one test per matched file named `<name>-<basename-without-extension>`.
fn dispatch_test_glob(asm: &mut Assembler, name: &str, pattern: &str, base_dir: &Path) {
    let full_pattern = base_dir.join(pattern);
    let Some(pattern_str) = full_pattern.to_str() else {
        asm.record_problem(BundleError::ManifestInvalid(format!(
            "test glob pattern is not valid UTF-8: {pattern}"
        )));
        return;
    };
    let entries = match glob(pattern_str) {
        Ok(entries) => entries,
        Err(e) => {
            asm.record_problem(BundleError::ManifestInvalid(format!("invalid glob pattern `{pattern}`: {e}")));
            return;
        }
    };
    for entry in entries {
        match entry {
            Ok(path) => {
                let basename = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("test")
                    .to_string();
                let test_name = format!("{name}-{basename}");
                let ref_id = asm.add_local_source_file(None, &path);
                asm.add_test_file(&test_name, ref_id);
            }
            Err(e) => asm.record_problem(BundleError::ManifestInvalid(format!("glob error: {e}"))),
        }
    }
}

fn dispatch_nested_bundle(
    asm: &mut Assembler,
    local: &str,
    base_dir: &Path,
    visited: &mut HashSet<PathBuf>,
) {
    let nested_path = base_dir.join(local);
    let Ok(canon) = nested_path.canonicalize() else {
        asm.record_problem(BundleError::SourceMissing(nested_path));
        return;
    };
    if !visited.insert(canon.clone()) {
        tracing::debug!("skipping already-visited bundle: {}", canon.display());
        return;
    }

    let text = match std::fs::read_to_string(&nested_path) {
        Ok(t) => t,
        Err(_) => {
            asm.record_problem(BundleError::SourceMissing(nested_path));
            return;
        }
    };
    let parsed: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            asm.record_problem(BundleError::ManifestInvalid(format!("nested bundle `{local}`: {e}")));
            return;
        }
    };
    let nested_base = nested_path.parent().unwrap_or(base_dir).to_path_buf();
    dispatch_manifest_inner(asm, &parsed, &nested_base, visited);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_block_type_is_reported() {
        let mut asm = Assembler::new();
        let manifest = json!([{ "type": "not-a-real-block" }]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(!asm.problems().is_empty());
    }

    #[test]
    fn folder_and_contents_file_round_trip() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "folder", "path": "~/s" },
            { "type": "file", "path": "~/s/a.txt", "contents": "hi" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn test_block_expands_glob_with_named_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.src"), "t = 1\n").unwrap();
        std::fs::write(dir.path().join("two.src"), "t = 2\n").unwrap();

        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "test", "name": "suite", "local": "*.src" }
        ]);
        dispatch_manifest(&mut asm, &manifest, dir.path());
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn chown_with_combined_owner_splits_to_chown_and_chgroup() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "chown", "path": "~/a", "owner": "alice:staff" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn test_block_accepts_a_list_of_glob_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.src"), "t = 1\n").unwrap();
        std::fs::write(dir.path().join("two.case"), "t = 2\n").unwrap();

        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "test", "name": "suite", "local": ["*.src", "*.case"] }
        ]);
        dispatch_manifest(&mut asm, &manifest, dir.path());
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn user_block_reads_user_field_not_name() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "user", "user": "alice", "password": "hunter2" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn rm_user_block_reads_user_field_not_name() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "rm-user", "user": "alice" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn chmod_block_reads_permissions_field() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "chmod", "path": "~/a", "permissions": "755" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn exec_block_builds_argv_from_cmd_and_arguments() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "exec", "cmd": "/bin/sh", "arguments": ["-c", "echo hi"] }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn run_block_without_arguments_launches_bare_cmd() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "run", "cmd": "/bin/true" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn copy_block_reads_from_and_to_and_splits_target() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "copy", "from": "~/src.txt", "to": "~/out/dest.txt" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn move_block_reads_from_and_to_and_splits_target() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "move", "from": "~/src.txt", "to": "~/out/dest.txt" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn build_block_reads_source_and_target_directly() {
        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "build", "source": "~/already/placed.bin", "target": "~/bin/main" }
        ]);
        dispatch_manifest(&mut asm, &manifest, Path::new("."));
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn compile_block_installs_synthetic_source_and_defers_build() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.src"), "x = 1\n").unwrap();

        let mut asm = Assembler::new();
        let manifest = json!([
            { "type": "compile", "local": "main.src", "target": "~/bin/main" }
        ]);
        dispatch_manifest(&mut asm, &manifest, dir.path());
        assert!(asm.problems().is_empty());
    }

    #[test]
    fn compile_block_expands_local_tests_string_or_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.src"), "x = 1\n").unwrap();
        std::fs::write(dir.path().join("a_test.src"), "t = 1\n").unwrap();

        let mut asm = Assembler::new();
        let manifest = json!([
            {
                "type": "compile",
                "local": "main.src",
                "target": "~/bin/main",
                "local-tests": ["*_test.src"]
            }
        ]);
        dispatch_manifest(&mut asm, &manifest, dir.path());
        assert!(asm.problems().is_empty());
    }
}

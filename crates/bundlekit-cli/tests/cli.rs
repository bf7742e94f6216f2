//! End-to-end tests driving the `bundlekit` binary against fixture
//! manifests.

use std::io::Write;
use std::process::Command;

fn bundlekit_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bundlekit"))
}

#[test]
fn happy_path_manifest_produces_nonempty_base85_output() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    let mut f = std::fs::File::create(&manifest_path).unwrap();
    write!(
        f,
        r#"[
            {{"type": "folder", "path": "~/s"}},
            {{"type": "file", "path": "~/s/hello.txt", "contents": "hi there"}}
        ]"#
    )
    .unwrap();

    let output = bundlekit_bin().arg(&manifest_path).output().unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}

#[test]
fn duplicate_target_path_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"[
            {"type": "file", "path": "~/a.txt", "contents": "one"},
            {"type": "file", "path": "~/a.txt", "contents": "two"}
        ]"#,
    )
    .unwrap();

    let output = bundlekit_bin().arg(&manifest_path).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn compress_flag_still_produces_decodable_output() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"[{"type": "file", "path": "~/a.txt", "contents": "repeat repeat repeat"}]"#,
    )
    .unwrap();

    let output = bundlekit_bin()
        .arg(&manifest_path)
        .arg("--compress")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}

#[test]
fn out_flag_writes_to_file_instead_of_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    std::fs::write(
        &manifest_path,
        r#"[{"type": "file", "path": "~/a.txt", "contents": "hi"}]"#,
    )
    .unwrap();
    let out_path = dir.path().join("out.b85");

    let output = bundlekit_bin()
        .arg(&manifest_path)
        .arg("--out")
        .arg(&out_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(out_path.is_file());
    assert!(!std::fs::read_to_string(&out_path).unwrap().is_empty());
}

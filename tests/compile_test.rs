//! End-to-end compile runs against a stand-in protoc
//!
//! The stand-in is a shell script that records its arguments, so these tests
//! only run on Unix.

#![cfg(unix)]

use protosweep::{CompileError, CompilerConfig, ExecError};
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Writes an executable script standing in for protoc
fn fake_protoc(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-protoc");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
#[serial]
async fn test_compile_passes_resolved_arguments() {
    let tools = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "svc.proto", "import \"common.proto\";\nservice S {}\n");
    write(root, "common.proto", "message C {}\n");

    let protoc = fake_protoc(
        tools.path(),
        "printf '%s\\n' \"$@\" > args.txt\necho generated",
    );

    let config = CompilerConfig::builder()
        .with_proto_dir(root)
        .with_output_dir(root.join("gen"))
        .with_plugins(["python"])
        .with_protoc(protoc.to_string_lossy())
        .build();

    let output = protosweep::compile_with(config).await.unwrap();
    assert_eq!(output.trim(), "generated");

    // The script runs with the primary root as its working directory
    let args = fs::read_to_string(root.join("args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let root_arg = root.to_string_lossy().to_string();
    let out_arg = format!("--python_out={}", root.join("gen").to_string_lossy());
    assert_eq!(args, vec!["-I", root_arg.as_str(), out_arg.as_str(), "svc.proto"]);

    assert!(root.join("gen").is_dir());
}

#[tokio::test]
#[serial]
async fn test_compiler_failure_carries_output() {
    let tools = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.proto", "message A {}\n");

    let protoc = fake_protoc(
        tools.path(),
        "echo 'a.proto:1:1: Expected top-level statement' 1>&2\nexit 1",
    );

    let config = CompilerConfig::builder()
        .with_proto_dir(dir.path())
        .with_output_dir(dir.path().join("gen"))
        .with_plugins(["cpp"])
        .with_protoc(protoc.to_string_lossy())
        .build();

    let err = protosweep::compile_with(config).await.unwrap_err();

    match &err {
        CompileError::CompilerFailed { exit_code, output } => {
            assert_eq!(*exit_code, Some(1));
            assert!(output.contains("Expected top-level statement"));
        }
        other => panic!("Expected CompilerFailed, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_timeout_stops_compiler() {
    let tools = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.proto", "message A {}\n");

    let protoc = fake_protoc(tools.path(), "sleep 30");

    let config = CompilerConfig::builder()
        .with_proto_dir(dir.path())
        .with_output_dir(dir.path().join("gen"))
        .with_plugins(["java"])
        .with_protoc(protoc.to_string_lossy())
        .with_timeout(Some(Duration::from_millis(200)))
        .build();

    let err = protosweep::compile_with(config).await.unwrap_err();
    assert!(matches!(err, CompileError::Exec(ExecError::TimedOut(_))));
}

#[tokio::test]
#[serial]
async fn test_must_compile_returns_output() {
    let tools = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.proto", "message A {}\n");

    let protoc = fake_protoc(tools.path(), "echo ok");

    let config = CompilerConfig::builder()
        .with_proto_dir(dir.path())
        .with_output_dir(dir.path().join("gen"))
        .with_plugins(["ruby"])
        .with_protoc(protoc.to_string_lossy())
        .build();

    let output = protosweep::must_compile_with(config).await;
    assert_eq!(output, "ok\n");
}

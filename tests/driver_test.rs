//! End-to-end driver tests against a fake protoc.
//!
//! Each test builds a throwaway project (config + proto tree + a shell-script
//! protoc that logs its argv and touches a marker in the output directory),
//! then runs the driver through its public entry point and asserts on the
//! resulting tree, the invocation log, and the persisted digest state.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::TempDir;
use protoc_herd::config::Overrides;
use protoc_herd::error::{HerdError, Result};

/// A fake protoc: records every invocation in `protoc.log` beside itself and
/// drops a marker file into whichever `--*_out=` directory it was given.
const FAKE_PROTOC: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --*_out=*)
      out="${arg#*=}"
      out="${out#plugins=grpc:}"
      ;;
  esac
done
echo "$@" >> "$(dirname "$0")/protoc.log"
touch "$out/generated.txt"
exit 0
"#;

const FAILING_PROTOC: &str = "#!/bin/sh\nexit 1\n";

struct Project {
    temp_dir: TempDir,
}

impl Project {
    fn new(config_body: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("protoc-herd.toml"), config_body).unwrap();
        fs::create_dir_all(root.join("proto/svc")).unwrap();
        fs::create_dir_all(root.join("tools")).unwrap();

        let project = Self { temp_dir };
        project.install_protoc(FAKE_PROTOC);
        project
    }

    fn with_defaults() -> Self {
        Self::new(
            r#"
languages = ["go"]
proto_root = "proto"
gen_root = "gen"
programs_root = "tools"
"#,
        )
    }

    fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    fn install_protoc(&self, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root().join("tools/protoc");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn write_proto(&self, relative: &str, content: &str) {
        let path = self.root().join("proto").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn run(&self) -> Result<()> {
        self.run_with(&Overrides::default())
    }

    fn run_with(&self, overrides: &Overrides) -> Result<()> {
        protoc_herd::driver::run(self.root(), None, overrides, 0, true)
    }

    fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(self.root().join("tools/protoc.log")) {
            Ok(log) => log.lines().map(|l| l.to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn clear_invocations(&self) {
        let _ = fs::remove_file(self.root().join("tools/protoc.log"));
    }

    fn gen_path(&self, relative: &str) -> PathBuf {
        self.root().join("gen").join(relative)
    }

    fn digest_bytes(&self) -> Option<Vec<u8>> {
        fs::read(self.root().join("proto/.dir.digest")).ok()
    }
}

#[test]
fn test_first_run_generates_every_pair() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();

    assert_eq!(project.invocations().len(), 2);
    assert!(project.gen_path("go/svc/a/generated.txt").exists());
    assert!(project.gen_path("go/svc/b/generated.txt").exists());
    assert!(project.digest_bytes().is_some());
}

#[test]
fn test_second_run_is_up_to_date() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    project.run().unwrap();

    assert!(project.invocations().is_empty());
    assert!(project.gen_path("go/svc/a/generated.txt").exists());
}

#[test]
fn test_modified_file_regenerates_exactly_one_task() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    project.write_proto("svc/a.proto", "message A { int32 id = 1; }");
    project.run().unwrap();

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].contains("svc/a.proto"));
}

#[test]
fn test_new_file_gets_exactly_one_task() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");

    project.run().unwrap();
    project.clear_invocations();

    project.write_proto("svc/c.proto", "message C {}");
    project.run().unwrap();

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].contains("svc/c.proto"));
}

#[test]
fn test_deleted_output_directory_overrides_digest() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    fs::remove_dir_all(project.gen_path("go/svc/b")).unwrap();
    project.run().unwrap();

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].contains("svc/b.proto"));
    assert!(project.gen_path("go/svc/b/generated.txt").exists());
}

#[test]
fn test_config_change_forces_full_rebuild() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    // Whitespace-only edit: same parsed config, different bytes.
    let config_path = project.root().join("protoc-herd.toml");
    let mut body = fs::read_to_string(&config_path).unwrap();
    body.push('\n');
    fs::write(&config_path, body).unwrap();

    project.run().unwrap();

    assert_eq!(project.invocations().len(), 2);
}

#[test]
fn test_force_override_regenerates_everything() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    project
        .run_with(&Overrides {
            force: Some(true),
            ..Overrides::default()
        })
        .unwrap();

    assert_eq!(project.invocations().len(), 2);
}

#[test]
fn test_fatal_task_failure_removes_output_root_and_keeps_digest() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    let good_digest = project.digest_bytes().unwrap();

    project.write_proto("svc/a.proto", "message A { int32 id = 1; }");
    project.install_protoc(FAILING_PROTOC);

    let result = project.run();
    assert!(matches!(result, Err(HerdError::GeneratorFailed { .. })));

    // The whole output root is gone, not just the failed task's subtree,
    // and the digest still reflects the last successful run.
    assert!(!project.root().join("gen").exists());
    assert_eq!(project.digest_bytes().unwrap(), good_digest);
}

#[test]
fn test_transport_override_changes_argv() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");

    project
        .run_with(&Overrides {
            transport: Some(true),
            ..Overrides::default()
        })
        .unwrap();

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].contains("--go_out=plugins=grpc:"));
}

#[test]
fn test_wipe_removes_unmanaged_language_folders() {
    let project = Project::new(
        r#"
languages = ["go"]
proto_root = "proto"
gen_root = "gen"
programs_root = "tools"
wipe = true
"#,
    );
    project.write_proto("svc/a.proto", "message A {}");

    fs::create_dir_all(project.gen_path("ruby/svc/a")).unwrap();
    project.run().unwrap();

    assert!(!project.gen_path("ruby").exists());
    assert!(project.gen_path("go/svc/a").exists());
}

#[test]
fn test_unknown_language_is_skipped_not_fatal() {
    let project = Project::new(
        r#"
languages = ["fortran", "go"]
proto_root = "proto"
gen_root = "gen"
programs_root = "tools"
"#,
    );
    project.write_proto("svc/a.proto", "message A {}");

    project.run().unwrap();

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].contains("--go_out="));
}

#[test]
fn test_corrupt_digest_forces_full_regeneration() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");
    project.write_proto("svc/b.proto", "message B {}");

    project.run().unwrap();
    project.clear_invocations();

    fs::write(project.root().join("proto/.dir.digest"), "{ corrupt").unwrap();
    project.run().unwrap();

    assert_eq!(project.invocations().len(), 2);
}

#[test]
fn test_invalid_proto_root_is_fatal_before_tasks() {
    let project = Project::new(
        r#"
languages = ["go"]
proto_root = "no-such-dir"
gen_root = "gen"
programs_root = "tools"
"#,
    );

    let result = project.run();
    assert!(matches!(result, Err(HerdError::ProtoRootInvalid(_))));
    assert!(project.invocations().is_empty());
}

#[test]
fn test_missing_programs_root_is_fatal() {
    let project = Project::new(
        r#"
languages = ["go"]
proto_root = "proto"
gen_root = "gen"
programs_root = "no-such-tools"
"#,
    );
    project.write_proto("svc/a.proto", "message A {}");

    let result = project.run();
    assert!(matches!(result, Err(HerdError::ProgramsRootInvalid(_))));
}

#[test]
fn test_missing_config_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let result = protoc_herd::driver::run(temp_dir.path(), None, &Overrides::default(), 0, true);
    assert!(matches!(result, Err(HerdError::ConfigNotFound(_))));
}

#[test]
fn test_stale_output_directory_is_emptied_before_generation() {
    let project = Project::with_defaults();
    project.write_proto("svc/a.proto", "message A {}");

    project.run().unwrap();
    let stale = project.gen_path("go/svc/a/stale-artifact.go");
    fs::write(&stale, "left over").unwrap();

    project.write_proto("svc/a.proto", "message A { int32 id = 1; }");
    project.run().unwrap();

    assert!(!stale.exists());
    assert!(project.gen_path("go/svc/a/generated.txt").exists());
}

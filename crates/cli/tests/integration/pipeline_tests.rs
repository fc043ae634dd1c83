//! End-to-end pipeline runs through the CLI.

use predicates::prelude::*;

use super::common::{TestEnv, archive_member, archive_members};

#[test]
fn full_run_packages_and_publishes() {
  let env = TestEnv::from_fixture("project.toml");

  env
    .cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("3 members"))
    .stdout(predicate::str::contains("releases"));

  assert_eq!(
    archive_members(&env.archive_path()),
    vec!["META-INF/MANIFEST.MF", "Foo.class", "icon.png"]
  );
  assert_eq!(
    archive_member(&env.archive_path(), "META-INF/MANIFEST.MF"),
    "Manifest-Version: 1.0\nMain-Class: com.acme.Foo\n"
  );
  assert!(env.root().join("releases").join("app.jar").exists());
}

#[test]
fn repeated_runs_are_byte_identical() {
  let env = TestEnv::from_fixture("project.toml");

  env.cmd().assert().success();
  let first = std::fs::read(env.archive_path()).unwrap();

  env.cmd().assert().success();
  let second = std::fs::read(env.archive_path()).unwrap();

  assert_eq!(first, second);
}

#[test]
fn compile_failure_stops_before_archive() {
  let env = TestEnv::from_fixture("failing_compiler.toml");

  env
    .cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("compile failed [CompilationError]"))
    .stderr(predicate::str::contains("cannot find symbol"));

  assert!(!env.archive_path().exists());
  assert!(!env.root().join("releases").exists());
  // Prepare already ran; its output stays for inspection.
  assert!(env.root().join("build").join("classes").is_dir());
}

#[test]
fn missing_manifest_is_a_packaging_error() {
  let env = TestEnv::from_fixture("project.toml");
  std::fs::remove_file(env.root().join("manifest.mf")).unwrap();

  env
    .cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("package failed [PackagingError]"));
}

#[test]
fn resource_collision_prefers_resource() {
  let env = TestEnv::from_fixture("project.toml");
  env.write_file("res/Foo.class", "resource wins");

  env
    .cmd()
    .assert()
    .success()
    .stderr(predicate::str::contains("resource Foo.class replaced a compiled file"));

  assert_eq!(archive_member(&env.archive_path(), "Foo.class"), "resource wins");
}

#[test]
fn pattern_flag_filters_members() {
  let env = TestEnv::from_fixture("project.toml");
  env.write_file("res/com/acme/Bar.class", "bar");

  env.cmd().arg("--pattern").arg(r".*\.class").assert().success();

  assert_eq!(
    archive_members(&env.archive_path()),
    vec!["META-INF/MANIFEST.MF", "Foo.class", "com/acme/Bar.class"]
  );
}

#[test]
fn nested_resources_are_included() {
  let env = TestEnv::from_fixture("project.toml");
  env.write_file("res/com/acme/images/logo.png", "logo");

  env.cmd().assert().success();

  assert!(
    archive_members(&env.archive_path())
      .iter()
      .any(|m| m == "com/acme/images/logo.png")
  );
}

#[test]
fn publish_command_failure_is_reported() {
  let env = TestEnv::from_fixture("project.toml");

  env
    .cmd()
    .arg("--publish-cmd")
    .arg("echo 'registry unreachable' >&2; exit 7")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("publish failed [PublishError]"))
    .stderr(predicate::str::contains("registry unreachable"));

  // No cleanup on failure: the archive is still there.
  assert!(env.archive_path().exists());
}

#[test]
fn json_output_reports_archive() {
  let env = TestEnv::from_fixture("project.toml");

  let output = env.cmd().arg("--output").arg("json").output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["state"]["state"], "published");
  assert_eq!(report["archive"]["members"].as_array().unwrap().len(), 3);
  assert_eq!(report["archive"]["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn json_output_reports_failure() {
  let env = TestEnv::from_fixture("failing_compiler.toml");

  let output = env.cmd().arg("--output").arg("json").output().unwrap();
  assert_eq!(output.status.code(), Some(1));

  let failure: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(failure["step"], "compile");
  assert_eq!(failure["kind"], "CompilationError");
  assert_eq!(failure["state"]["state"], "failed");
  assert_eq!(failure["state"]["step"], "compile");
}

#[test]
fn missing_publish_target_is_a_setup_error() {
  let env = TestEnv::from_fixture("project.toml");
  env.write_file("buildpipe.toml", "[compiler]\ncommand = 'true'\n");

  env
    .cmd()
    .assert()
    .code(2)
    .stderr(predicate::str::contains("no publish target configured"));

  assert!(!env.root().join("build").exists());
}

#[test]
fn archive_outside_dist_is_a_setup_error() {
  let env = TestEnv::from_fixture("project.toml");

  env
    .cmd()
    .arg("--archive")
    .arg("out/app.jar")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("outside the distribution directory"));

  assert!(!env.root().join("build").exists());
}

#[test]
fn archive_in_staging_is_a_setup_error() {
  let env = TestEnv::from_fixture("project.toml");

  env
    .cmd()
    .arg("--archive")
    .arg("build/classes/app.jar")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("inside the staging directory"));
}

#[test]
fn publish_dir_inside_dist_is_a_setup_error() {
  let env = TestEnv::from_fixture("project.toml");

  env
    .cmd()
    .arg("--publish-dir")
    .arg("dist/releases")
    .assert()
    .code(2)
    .stderr(predicate::str::contains("inside the distribution directory"));

  assert!(!env.archive_path().exists());
}

use assert_cmd::Command;
use rstest::rstest;

#[rstest]
#[case("--help")]
#[case("--version")]
fn info_flags_exit_zero(#[case] flag: &str) {
    Command::cargo_bin("hervor-vm").unwrap().arg(flag).assert().success();
}

#[test]
fn missing_main_class_is_a_usage_error() {
    Command::cargo_bin("hervor-vm").unwrap().assert().failure();
}

#[test]
fn missing_jre_fails_the_bootstrap() {
    let scratch = tempfile::tempdir().unwrap();
    Command::cargo_bin("hervor-vm")
        .unwrap()
        .current_dir(scratch.path())
        .env_remove("JAVA_HOME")
        .arg("com.example.Main")
        .assert()
        .failure();
}

#[test]
fn class_not_found_reports_and_exits_nonzero() {
    let scratch = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(scratch.path().join("jre/lib/ext")).unwrap();
    Command::cargo_bin("hervor-vm")
        .unwrap()
        .current_dir(scratch.path())
        .env_remove("JAVA_HOME")
        .args(["--jre", "jre", "com.example.Absent"])
        .assert()
        .failure();
}

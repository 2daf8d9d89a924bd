use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

// Point the settings lookup at an empty directory so user config cannot leak in.
fn cargo_bin(config_home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bf").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("BF_MAX_STEPS")
        .env_remove("BF_TIMEOUT_MS")
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(5));
    cmd
}

fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn positional_code_prints_output() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .arg("++++++++[>+++++++++<-]>.")
        .assert()
        .success()
        .stdout("H")
        .stderr(predicate::str::is_empty());
}

#[test]
fn program_flag_and_comments() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--program", "eight: ++++++++ [ times nine: >+++++++++< - ] print: >."])
        .assert()
        .success()
        .stdout("H");
}

#[test]
fn program_file_hello_world() {
    let home = tempfile::tempdir().unwrap();
    let tf = write_tempfile(
        "++++++++++[>+++++++>++++++++++>+++>+<<<<-]\n>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.\n",
    );
    cargo_bin(&home)
        .arg("--program-file")
        .arg(tf.path())
        .assert()
        .success()
        .stdout("Hello World!\n");
}

#[test]
fn missing_program_file_fails() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--program-file", "/definitely/not/here.bf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read program file"));
}

#[test]
fn no_program_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home).assert().code(2);
}

#[test]
fn literal_input_is_echoed() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--input", "héllo", ",[.,]"])
        .assert()
        .success()
        .stdout("héllo");
}

#[test]
fn input_file_is_read() {
    let home = tempfile::tempdir().unwrap();
    let tf = write_tempfile("Zz");
    cargo_bin(&home)
        .arg("--input-file")
        .arg(tf.path())
        .arg(",.,.")
        .assert()
        .success()
        .stdout("Zz");
}

#[test]
fn stdin_input_with_dash() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--input-file", "-", ",."])
        .write_stdin("Z")
        .assert()
        .success()
        .stdout("Z");
}

#[test]
fn eof_sentinel_is_configurable() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--eof", "65", ",."])
        .assert()
        .success()
        .stdout("A");
}

#[test]
fn dump_tape_prints_cells() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--dump-tape", "+[>+[>+<-]<-]"])
        .assert()
        .success()
        .stdout("\n[0, 0, 1]\n");
}

#[test]
fn unbounded_cells_by_default_and_wrap_on_request() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--dump-tape", "--program", "-"])
        .assert()
        .success()
        .stdout("\n[-1]\n");

    cargo_bin(&home)
        .args(["--dump-tape", "--wrap", "--program", "-"])
        .assert()
        .success()
        .stdout("\n[255]\n");
}

#[test]
fn naive_loops_mis_skip_nested_bodies() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--dump-tape", "[[+]+]>+"])
        .assert()
        .success()
        .stdout("\n[0, 1]\n");

    cargo_bin(&home)
        .args(["--nested-loops", "false", "[[+]+]>+"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unmatched ']'").and(predicate::str::contains("at instruction 5")));
}

#[test]
fn tape_underflow_reports_position() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .arg("+<")
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("tape underflow")
                .and(predicate::str::contains("at instruction 1"))
                .and(predicate::str::contains("  +<\n   ^")),
        );
}

#[test]
fn unterminated_loop_is_malformed() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .arg("[+")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no matching ']'"));
}

#[test]
fn debug_prints_trace_to_stderr_only() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--debug", "true", "+>."])
        .assert()
        .success()
        .stdout("\u{0}")
        .stderr(
            predicate::str::contains("STEP | IP")
                .and(predicate::str::contains("0    | 0   |  +"))
                .and(predicate::str::contains("1    | 1   |  >")),
        );
}

#[test]
fn short_debug_flag() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["-d", "+"])
        .assert()
        .success()
        .stderr(predicate::str::contains("STEP | IP"));
}

#[test]
fn step_limit_aborts_infinite_program() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--max-steps", "50", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"))
        .stdout(predicate::str::contains("Execution aborted").not());
}

#[test]
fn step_limit_from_env() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .env("BF_MAX_STEPS", "50")
        .arg("+[]")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("step limit exceeded (50)"));
}

#[test]
fn timeout_aborts_infinite_program() {
    let home = tempfile::tempdir().unwrap();
    cargo_bin(&home)
        .args(["--timeout", "100", "+[]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("wall-clock timeout exceeded (100 ms)"));
}

#[test]
fn settings_file_supplies_defaults() {
    let home = tempfile::tempdir().unwrap();
    let settings = "[engine]\neof = 66\ncell_mode = \"wrapping\"\n";
    // XDG_CONFIG_HOME and the ~/.config fallback
    std::fs::write(home.path().join("bf.toml"), settings).unwrap();
    std::fs::create_dir_all(home.path().join(".config")).unwrap();
    std::fs::write(home.path().join(".config").join("bf.toml"), settings).unwrap();

    cargo_bin(&home)
        .arg(",.")
        .assert()
        .success()
        .stdout("B");

    cargo_bin(&home)
        .args(["--dump-tape", "--program", "-"])
        .assert()
        .success()
        .stdout("\n[255]\n");

    // Flags win over the file
    cargo_bin(&home)
        .args(["--eof", "67", ",."])
        .assert()
        .success()
        .stdout("C");
}

#[test]
fn broken_settings_file_falls_back_to_defaults() {
    let home = tempfile::tempdir().unwrap();
    let settings = "[engine\neof = 66\n";
    std::fs::write(home.path().join("bf.toml"), settings).unwrap();
    std::fs::create_dir_all(home.path().join(".config")).unwrap();
    std::fs::write(home.path().join(".config").join("bf.toml"), settings).unwrap();

    cargo_bin(&home)
        .arg(",.")
        .assert()
        .success()
        .stdout("\u{0}")
        .stderr(predicate::str::contains("ignoring settings file"));
}

use std::process::{Command, Output};

fn lockstep(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lockstep"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch lockstep binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn random_prints_the_golden_draw() {
    let output = lockstep(&["random", "--min", "0", "--max", "10", "--seed", "12345"]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output).trim(), "5");
}

#[test]
fn random_accepts_negative_bounds() {
    let output = lockstep(&[
        "random", "--min", "-50", "--max", "50", "--seed", "42", "--frame", "7",
    ]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output).trim(), "48");
}

#[test]
fn trig_reports_raw_table_values() {
    let output = lockstep(&["trig", "--degrees", "90"]);
    assert!(output.status.success(), "{output:?}");

    let text = stdout(&output);
    let mut lines = text.lines();
    let sin = lines.next().expect("sine line");
    let cos = lines.next().expect("cosine line");
    assert!(sin.starts_with("sin("), "{sin}");
    assert!(sin.ends_with("(raw 65536)"), "{sin}");
    assert!(cos.ends_with("(raw 0)"), "{cos}");
}

#[test]
fn short_run_exits_cleanly() {
    let output = lockstep(&["run", "--seconds", "0.2", "--spawn-seed", "7"]);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn negative_run_duration_is_rejected() {
    let output = lockstep(&["run", "--seconds", "-1"]);
    assert!(!output.status.success());
}

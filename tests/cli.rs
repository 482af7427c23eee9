use assert_cmd::Command;

#[test]
fn help_lists_game_options() {
    let output = Command::cargo_bin("pointrush")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--points"));
    assert!(stdout.contains("--auto"));
    assert!(stdout.contains("--seed"));
}

#[test]
fn refuses_to_run_without_a_tty() {
    Command::cargo_bin("pointrush")
        .unwrap()
        .args(["--no-save", "-n", "3"])
        .write_stdin("")
        .assert()
        .failure();
}

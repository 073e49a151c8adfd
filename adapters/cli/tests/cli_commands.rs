use std::{fs, process::Command};

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_uptime-defence"));
    let _ = command.env("RUST_LOG", "off");
    command
}

fn stdout(command: &mut Command) -> String {
    let output = command.output().expect("failed to run uptime-defence");
    assert!(
        output.status.success(),
        "uptime-defence failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn share_code_round_trips_through_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let level_path = dir.path().join("tutorial.json");

    let code = stdout(cli().arg("share"));
    let code = code.trim();
    assert!(code.starts_with("uptime:v1:20x11:"));

    let _ = stdout(cli().args(["unshare", code, "--out"]).arg(&level_path));
    let validated = stdout(cli().arg("validate").arg(&level_path));
    assert!(validated.contains("20x11 grid, 1 path(s), 6 wave(s)"));

    let again = stdout(cli().arg("share").arg(&level_path));
    assert_eq!(again.trim(), code);
}

#[test]
fn invalid_levels_are_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let level_path = dir.path().join("broken.json");
    fs::write(
        &level_path,
        r#"{ "gridWidth": 4, "gridHeight": 4, "spawnPoints": [], "targetPoints": [],
             "paths": [], "waves": [], "startingMoney": 0, "startingErrorBudget": 10 }"#,
    )
    .expect("writes level");

    let output = cli()
        .arg("validate")
        .arg(&level_path)
        .output()
        .expect("failed to run uptime-defence");
    assert!(!output.status.success());
}

#[test]
fn headless_run_records_the_final_score() {
    let dir = tempfile::tempdir().expect("temp dir");
    let scores = dir.path().join("scores.jsonl");

    let summary = stdout(
        cli()
            .args(["run", "--seconds", "900", "--player", "p-1", "--name", "Pat"])
            .args(["--tower", "nginx@3,4", "--tower", "kafka@6,6"])
            .arg("--scores")
            .arg(&scores),
    );
    let summary: serde_json::Value = serde_json::from_str(&summary).expect("json summary");

    assert_eq!(summary["level"], "Tutorial");
    assert_eq!(summary["towers"], 2);
    let finished = summary["won"] == true || summary["over"] == true;
    assert!(finished, "tutorial did not finish: {summary}");

    let log = fs::read_to_string(&scores).expect("score log");
    let entry: serde_json::Value =
        serde_json::from_str(log.lines().next().expect("one entry")).expect("json line");
    assert_eq!(entry["playerId"], "p-1");
    assert_eq!(entry["score"], summary["score"]);
}

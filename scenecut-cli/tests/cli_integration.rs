use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn scenecut_cmd() -> Command {
    Command::cargo_bin("scenecut").expect("Failed to find scenecut binary")
}

/// 100 frames of low change with one strong cut at frame 50.
fn write_stats(dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join("talk.csv");
    let mut text = String::from("Frame Number,Timecode,content_val\n");
    for i in 0..100 {
        let value = if i == 50 { 80.0 } else { 2.0 };
        text.push_str(&format!("{},00:00:00.000,{}\n", i + 1, value));
    }
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn test_help_lists_commands() {
    scenecut_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("split"))
        .stdout(contains("refine"))
        .stdout(contains("threshold"));
}

#[test]
fn test_threshold_prints_a_number() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stats = write_stats(dir.path())?;

    scenecut_cmd()
        .arg("threshold")
        .arg("--stats")
        .arg(&stats)
        .arg("--frame-rate")
        .arg("10")
        .arg("--min-scene-ms")
        .arg("2000")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\d+\.\d{3}\n$")?);
    Ok(())
}

#[test]
fn test_split_writes_clip_plan() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stats = write_stats(dir.path())?;
    let output = dir.path().join("plan.json");

    scenecut_cmd()
        .arg("split")
        .arg("--stats")
        .arg(&stats)
        .arg("--frame-rate")
        .arg("10")
        .arg("--min-scene-ms")
        .arg("2000")
        .arg("--mode")
        .arg("precise")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let plan: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert!(plan["jobId"].is_string());
    assert_eq!(plan["sourceName"], "talk");
    assert_eq!(plan["exportMode"], "precise");
    let clips = plan["clips"].as_array().expect("clips array");
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0]["endMs"], 5000);
    assert_eq!(clips[1]["fileName"], "talk-scene-001.mp4");
    Ok(())
}

#[test]
fn test_refine_snaps_hint_from_stats() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stats = write_stats(dir.path())?;
    let hints = dir.path().join("hints.json");
    fs::write(&hints, r#"[5.2]"#)?;

    scenecut_cmd()
        .arg("refine")
        .arg("--stats")
        .arg(&stats)
        .arg("--frame-rate")
        .arg("10")
        .arg("--hints")
        .arg(&hints)
        .arg("--no-consensus")
        .arg("--mode")
        .arg("precise")
        .assert()
        .success()
        .stdout(contains("\"actualSeconds\": 5.0"))
        .stdout(contains("\"clips\""));
    Ok(())
}

#[test]
fn test_refine_consensus_runs_without_video() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stats = write_stats(dir.path())?;
    let hints = dir.path().join("hints.json");
    fs::write(&hints, r#"[{"approximateSeconds": 4.8, "rationale": "cut"}]"#)?;
    let output = dir.path().join("plan.json");

    scenecut_cmd()
        .arg("refine")
        .arg("--stats")
        .arg(&stats)
        .arg("--frame-rate")
        .arg("10")
        .arg("--hints")
        .arg(&hints)
        .arg("--mode")
        .arg("precise")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("skipping the consensus pass"));

    let plan: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    assert_eq!(plan["sourceName"], "talk");
    assert_eq!(plan["totalDurationSeconds"], 10.0);
    assert_eq!(plan["refinedBoundaries"][0]["actualSeconds"], 5.0);
    assert_eq!(plan["clips"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn test_invalid_mode_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let stats = write_stats(dir.path())?;

    scenecut_cmd()
        .arg("split")
        .arg("--stats")
        .arg(&stats)
        .arg("--mode")
        .arg("lossless")
        .assert()
        .failure()
        .stderr(contains("export mode"));
    Ok(())
}

#[test]
fn test_missing_input_fails() {
    scenecut_cmd()
        .arg("split")
        .arg("--stats")
        .arg("/nonexistent/stats.csv")
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn test_split_without_source_fails() {
    scenecut_cmd()
        .arg("split")
        .assert()
        .failure()
        .stderr(contains("--input or --stats"));
}

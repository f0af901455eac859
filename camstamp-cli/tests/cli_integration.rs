use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

const MISSING_FFMPEG: &str = "/nonexistent/camstamp-test/ffmpeg";
const MISSING_FFPROBE: &str = "/nonexistent/camstamp-test/ffprobe";

// Helper function to get the path to the compiled binary
fn camstamp_cmd() -> Command {
    let mut cmd = Command::cargo_bin("camstamp").expect("Failed to find camstamp binary");
    cmd.env_remove("CAMSTAMP_FFMPEG")
        .env_remove("CAMSTAMP_FFPROBE")
        .env_remove("RUST_LOG");
    cmd
}

fn marker_clip() -> Vec<u8> {
    let mut data = vec![0x47u8; 64];
    data.extend_from_slice(b"MDP");
    data.extend_from_slice(&[0x20, 0x18, 0x03, 0x00, 0x17, 0x12, 0x00, 0x30]);
    data.extend_from_slice(&[0u8; 32]);
    data
}

#[test]
fn help_lists_overlay_options() {
    camstamp_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--position"))
        .stdout(contains("--output-dir"));
}

#[test]
fn empty_directory_is_not_an_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    camstamp_cmd()
        .arg(dir.path())
        .arg("--ffmpeg")
        .arg(MISSING_FFMPEG)
        .assert()
        .success()
        .stdout(contains("No .MTS files found"));
    Ok(())
}

#[test]
fn inspect_shows_marker_and_decoded_date() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let clip = dir.path().join("00001.MTS");
    std::fs::write(&clip, marker_clip())?;

    camstamp_cmd()
        .arg("--inspect")
        .arg(&clip)
        .assert()
        .success()
        .stdout(contains("4d 44 50"))
        .stdout(contains("Decoded: 2018-03-17 12:00:30"));
    Ok(())
}

#[test]
fn inspect_reports_missing_marker() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let clip = dir.path().join("plain.MTS");
    std::fs::write(&clip, [0u8; 256])?;

    camstamp_cmd()
        .arg("--inspect")
        .arg(&clip)
        .assert()
        .success()
        .stdout(contains("not found"));
    Ok(())
}

#[test]
fn missing_tools_fail_the_run() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let clip = dir.path().join("a.MTS");
    std::fs::write(&clip, marker_clip())?;

    camstamp_cmd()
        .arg(&clip)
        .arg("--ffmpeg")
        .arg(MISSING_FFMPEG)
        .arg("--ffprobe")
        .arg(MISSING_FFPROBE)
        .assert()
        .failure()
        .stderr(contains("FFmpeg is not available"));
    Ok(())
}

#[test]
fn single_file_form_checks_tools() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let clip = dir.path().join("a.MTS");
    std::fs::write(&clip, marker_clip())?;

    camstamp_cmd()
        .arg(&clip)
        .arg(dir.path().join("out.mp4"))
        .arg("--ffmpeg")
        .arg(MISSING_FFMPEG)
        .arg("--ffprobe")
        .arg(MISSING_FFPROBE)
        .assert()
        .failure();
    assert!(!dir.path().join("out.mp4").exists());
    Ok(())
}

#[test]
fn rejects_unknown_position() {
    camstamp_cmd()
        .args(["-p", "center", "a.MTS"])
        .assert()
        .failure()
        .stderr(contains("Invalid position"));
}

#[test]
fn explicit_output_refuses_output_dir() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let clip = dir.path().join("a.MTS");
    std::fs::write(&clip, marker_clip())?;

    camstamp_cmd()
        .arg(&clip)
        .arg(dir.path().join("out.mp4"))
        .arg("-o")
        .arg(dir.path().join("converted"))
        .assert()
        .failure()
        .stderr(contains("--output-dir cannot be combined"));
    assert!(!dir.path().join("out.mp4").exists());
    Ok(())
}

/// Shell stand-ins for the encoder tools. The encoder touches its last
/// argument (the output path); the prober prints nothing, so clips without a
/// marker have no recording time.
#[cfg(unix)]
mod stub_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    const FAKE_FFMPEG: &str = r#"if [ "$1" = "-version" ]; then exit 0; fi
for last in "$@"; do :; done
touch "$last"
exit 0"#;

    const SILENT_FFPROBE: &str = "exit 0";

    fn script(dir: &Path, name: &str, body: &str) -> Result<PathBuf, Box<dyn Error>> {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    fn camstamp_with_stubs(tools: &Path) -> Result<Command, Box<dyn Error>> {
        let mut cmd = camstamp_cmd();
        cmd.arg("--ffmpeg")
            .arg(script(tools, "ffmpeg", FAKE_FFMPEG)?)
            .arg("--ffprobe")
            .arg(script(tools, "ffprobe", SILENT_FFPROBE)?);
        Ok(cmd)
    }

    #[test]
    fn clips_with_markers_convert_and_exit_zero() -> Result<(), Box<dyn Error>> {
        let tools = tempdir()?;
        let clips = tempdir()?;
        std::fs::write(clips.path().join("a.MTS"), marker_clip())?;
        std::fs::write(clips.path().join("b.MTS"), marker_clip())?;

        camstamp_with_stubs(tools.path())?
            .arg(clips.path())
            .assert()
            .success()
            .stdout(contains("Successful: 2"));
        assert!(clips.path().join("a.mp4").exists());
        assert!(clips.path().join("b.mp4").exists());
        Ok(())
    }

    #[test]
    fn clip_without_metadata_fails_the_run() -> Result<(), Box<dyn Error>> {
        let tools = tempdir()?;
        let clips = tempdir()?;
        std::fs::write(clips.path().join("a.MTS"), marker_clip())?;
        std::fs::write(clips.path().join("b.MTS"), [0u8; 512])?;

        camstamp_with_stubs(tools.path())?
            .arg(clips.path())
            .assert()
            .failure()
            .stdout(contains("b.MTS"))
            .stdout(contains("metadata"));
        assert!(clips.path().join("a.mp4").exists());
        assert!(!clips.path().join("b.mp4").exists());
        Ok(())
    }
}

//! A shell script standing in for the extraction tool.
//!
//! Behaviour is picked from the URL (the last argument):
//! - `*fail*`: two error lines on stderr, exit 3
//! - `*silent-exit*`: no output, exit 4
//! - `*hang*`: one progress line, then sleeps until killed
//! - `*tree*`: backgrounds a `sleep` child, writes its pid to `tree.pid`, waits
//! - `*args*`: writes its arguments to `args.txt` next to the script, exit 0
//! - anything else: progress, stage lines, exit 0

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

const SCRIPT: &str = r#"#!/bin/sh
for url; do :; done
case "$url" in
  *fail*)
    echo "[youtube] fetching page"
    echo "ERROR: first problem" >&2
    echo "ERROR: Video unavailable" >&2
    exit 3
    ;;
  *silent-exit*)
    exit 4
    ;;
  *hang*)
    echo "[download]   1.0% of 3.00MiB"
    sleep 30
    exit 0
    ;;
  *tree*)
    sleep 60 &
    echo $! > "$(dirname "$0")/tree.pid"
    echo "[download]   2.0% of 3.00MiB"
    wait
    exit 0
    ;;
  *args*)
    printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
    exit 0
    ;;
  *)
    echo "[download] Destination: track.webm"
    echo "[download]  10.0% of 3.00MiB"
    printf '[download]  55.5%% of 3.00MiB\r[download]  75.0%% of 3.00MiB\n'
    echo "[download] 100% of 3.00MiB"
    echo "[ExtractAudio] Destination: song.mp3"
    echo "WARNING: something odd" >&2
    exit 0
    ;;
esac
"#;

/// Path of the fake tool, created once per test binary.
///
/// Every test that spawns processes must call this first so nothing forks
/// while the script is still open for writing.
pub fn fake_tool() -> &'static Path {
    static TOOL: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    &TOOL
        .get_or_init(|| {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("fake-yt-dlp");
            fs::write(&path, SCRIPT).expect("write fake tool");
            let mut perms = fs::metadata(&path).expect("stat fake tool").permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).expect("chmod fake tool");
            (dir, path)
        })
        .1
}

pub fn script_dir() -> &'static Path {
    fake_tool().parent().expect("script has a parent dir")
}

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a configured `bmsync` command suitable for integration tests.
///
/// The command gets an empty config file inside `dir` so the developer's
/// own config and API keys never leak in.
#[allow(dead_code)]
pub fn bmsync_cmd(dir: &Path) -> Command {
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").expect("failed to write test config");
    }

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bmsync"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("BMSYNC_CONFIG", &config);
    cmd.env("BMSYNC_CACHE_DIR", dir.join("cache"));
    cmd.env_remove("GEMINI_API_KEY");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Bookmark JSON with `toolbar/docs/page1`, `toolbar/Archive/old` and a
/// video link at the top of the toolbar.
#[allow(dead_code)]
pub fn write_bookmarks(dir: &Path) -> PathBuf {
    let file = dir.join("bookmarks.json");
    let json = serde_json::json!({
        "bookmarks": {
            "menu": {"id": "menu", "title": "menu", "type": "folder", "children": []},
            "toolbar": {"id": "toolbar", "title": "toolbar", "type": "folder", "children": [
                {"id": "f1", "title": "docs", "type": "folder", "children": [
                    {"id": "b1", "title": "page1", "type": "bookmark",
                     "uri": "https://example.com/a", "added_unix": 1_700_000_000_i64}
                ]},
                {"id": "f2", "title": "Archive", "type": "folder", "children": [
                    {"id": "b2", "title": "old", "type": "bookmark",
                     "uri": "https://example.com/old", "added_unix": 1_600_000_000_i64}
                ]},
                {"id": "v1", "title": "talk", "type": "bookmark",
                 "uri": "https://youtu.be/abc", "added_unix": 1_710_000_000_i64}
            ]}
        }
    });
    fs::write(&file, serde_json::to_vec_pretty(&json).unwrap()).unwrap();
    file
}

// Update check against a slow stand-in for `brew`, on the real clock.

use boldbrew::application::use_cases::CheckForUpdates;
use boldbrew::infrastructure::brew::{ApiClient, BrewCommand, BrewPackageManager};
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn timed_out_check_kills_brew() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("finished");
    let brew = dir.path().join("brew");
    std::fs::write(
        &brew,
        format!("#!/bin/sh\nsleep 1\ntouch '{}'\necho '[]'\n", marker.display()),
    )
    .unwrap();
    std::fs::set_permissions(&brew, std::fs::Permissions::from_mode(0o755)).unwrap();

    let api = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let port = BrewPackageManager::new(BrewCommand::new(brew.to_string_lossy()), api);
    let check = CheckForUpdates::new(Arc::new(port), Duration::from_millis(200));

    assert_eq!(check.execute("1.0.0").await, None);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists(), "brew kept running after the check gave up");
}

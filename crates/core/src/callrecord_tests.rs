// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, SystemTime};

use super::*;

fn sample_record() -> anyhow::Result<CallRecord> {
    Ok(CallRecord {
        node_slot: 3,
        remote_addr: "198.51.100.9:51000".parse()?,
        username: Some("sysop".to_owned()),
        invisible: false,
        connected_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        duration: Duration::from_secs(90),
    })
}

#[test]
fn line_format_includes_all_fields() -> anyhow::Result<()> {
    let line = sample_record()?.to_line();
    assert!(line.contains("node=3"));
    assert!(line.contains("ip=198.51.100.9"));
    assert!(line.contains("user=sysop"));
    assert!(line.contains("invisible=false"));
    assert!(line.contains("duration=90s"));
    Ok(())
}

#[test]
fn anonymous_record_uses_dash_for_user() -> anyhow::Result<()> {
    let mut record = sample_record()?;
    record.username = None;
    assert!(record.to_line().contains("user=-"));
    Ok(())
}

#[tokio::test]
async fn append_creates_missing_parent_directory_and_appends() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("callers.log");
    let log = CallRecordLog::new(&path);

    log.append(&sample_record()?).await;
    log.append(&sample_record()?).await;

    let contents = std::fs::read_to_string(&path)?;
    assert_eq!(contents.lines().count(), 2);
    Ok(())
}

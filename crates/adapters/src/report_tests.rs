// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[tokio::test]
async fn jsonl_sink_appends_rows() {
    let dir = tempdir().unwrap();
    let sink = JsonlReportSink::new(dir.path());
    let row = vec!["PROMOTE".to_string(), "a\nb".to_string()];
    sink.append_row("/drafts/project.xlsx", "PROMOTE_STATUS", &row).await.unwrap();
    sink.append_row("/drafts/project.xlsx", "PROMOTE_STATUS", &row).await.unwrap();

    let path = sink.table_path("/drafts/project.xlsx", "PROMOTE_STATUS");
    assert!(path.ends_with("drafts_project.xlsx.PROMOTE_STATUS.jsonl"));
    let content = std::fs::read_to_string(path).unwrap();
    let rows: Vec<Vec<String>> =
        content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows, vec![row.clone(), row]);
}

#[tokio::test]
async fn fake_sink_records_and_fails() {
    let sink = FakeReportSink::new();
    sink.append_row("doc", "T", &["x".to_string()]).await.unwrap();
    assert_eq!(sink.calls()[0].row, vec!["x".to_string()]);
    sink.set_failing(true);
    assert!(sink.append_row("doc", "T", &[]).await.is_err());
}

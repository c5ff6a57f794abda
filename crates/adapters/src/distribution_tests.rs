// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn site() -> SiteRef {
    SiteRef { owner: "acme".into(), repo: "site".into(), branch: "main".into() }
}

#[yare::parameterized(
    preview = { DistributionOp::Preview, "/preview/acme/site/main/drafts/a" },
    publish = { DistributionOp::Publish, "/live/acme/site/main/drafts/a" },
)]
fn builds_admin_path(op: DistributionOp, expected: &str) {
    assert_eq!(request_path(op, &site(), "/drafts/a"), expected);
}

async fn serve_once(status_line: &'static str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        let response = format!("{status_line}\r\nContent-Length: 0\r\n\r\n");
        socket.write_all(response.as_bytes()).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn http_distribution_accepts_success() {
    let addr = serve_once("HTTP/1.1 200 OK").await;
    let dist = HttpDistribution::new(addr);
    dist.trigger(DistributionOp::Preview, &site(), "/a").await.unwrap();
}

#[tokio::test]
async fn http_distribution_reports_rejection() {
    let addr = serve_once("HTTP/1.1 503 Service Unavailable").await;
    let dist = HttpDistribution::new(addr).with_timeout(Duration::from_secs(5));
    let err = dist.trigger(DistributionOp::Publish, &site(), "/a").await.unwrap_err();
    assert!(matches!(err, DistributionError::Rejected { status: 503, .. }));
}

#[tokio::test]
async fn fake_records_and_rejects() {
    let dist = FakeDistribution::new();
    dist.reject(DistributionOp::Publish, "/b");
    dist.trigger(DistributionOp::Preview, &site(), "/b").await.unwrap();
    assert!(dist.trigger(DistributionOp::Publish, &site(), "/b").await.is_err());
    assert_eq!(dist.paths(DistributionOp::Preview), vec!["/b".to_string()]);
    assert_eq!(dist.calls().len(), 2);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal HTTP/1.1 over TCP for the admin endpoint.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Largest response body accepted from the admin endpoint.
const MAX_BODY: usize = 1024 * 1024;

/// Status code and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST with an empty body.
pub(crate) async fn post(
    addr: &str,
    path: &str,
    timeout: Duration,
) -> Result<HttpResponse, String> {
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        path, addr
    );
    tokio::time::timeout(timeout, send_request(addr, &request))
        .await
        .map_err(|_| "HTTP request timed out".to_string())?
}

async fn send_request(addr: &str, request: &str) -> Result<HttpResponse, String> {
    let mut stream =
        TcpStream::connect(addr).await.map_err(|e| format!("TCP connect failed: {}", e))?;
    stream.write_all(request.as_bytes()).await.map_err(|e| format!("write failed: {}", e))?;

    let mut reader = BufReader::new(&mut stream);
    read_response(&mut reader).await
}

async fn read_response<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<HttpResponse, String> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.map_err(|e| format!("read failed: {}", e))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| format!("malformed status line: {:?}", status_line.trim_end()))?;

    let mut content_length = None;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await.map_err(|e| format!("read failed: {}", e))?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }
    }

    let mut body = Vec::new();
    match content_length {
        Some(len) if len > MAX_BODY => {
            return Err(format!("response body of {} bytes exceeds {} byte limit", len, MAX_BODY));
        }
        Some(len) => {
            body.resize(len, 0);
            reader.read_exact(&mut body).await.map_err(|e| format!("read failed: {}", e))?;
        }
        None => {
            (&mut *reader)
                .take(MAX_BODY as u64 + 1)
                .read_to_end(&mut body)
                .await
                .map_err(|e| format!("read failed: {}", e))?;
            if body.len() > MAX_BODY {
                return Err(format!("response body exceeds {} byte limit", MAX_BODY));
            }
        }
    }
    Ok(HttpResponse { status, body: String::from_utf8_lossy(&body).into_owned() })
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

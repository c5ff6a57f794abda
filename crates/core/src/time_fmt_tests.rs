// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    none  = { None, "" },
    epoch = { Some(0), "Thu, 01 Jan 1970 00:00:00 GMT" },
    later = { Some(1_700_000_000_000), "Tue, 14 Nov 2023 22:13:20 GMT" },
)]
fn formats_utc(ms: Option<u64>, expected: &str) {
    assert_eq!(format_utc(ms), expected);
}

#[yare::parameterized(
    seconds = { 5_000, "5s" },
    minutes = { 184_000, "3m 4s" },
    hours   = { 3_720_000, "1h 2m" },
)]
fn formats_elapsed(ms: u64, expected: &str) {
    assert_eq!(format_elapsed_ms(ms), expected);
}

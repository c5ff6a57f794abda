// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod maint;
pub mod start;
pub mod status;
pub mod tick;
pub mod tree;
pub mod worker;

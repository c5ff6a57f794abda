// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fg_core::BatchState;
use serial_test::serial;

#[test]
#[serial]
fn batch_line_shows_state_and_size() {
    std::env::set_var("NO_COLOR", "1");
    let mut batch = Batch::new(2, 20);
    assert_eq!(batch_line(&batch), "   2  NOT_STARTED      20 items");

    batch.state = BatchState::Done;
    batch.activation_id = Some(fg_core::ActivationId::from_string("act-1"));
    assert_eq!(batch_line(&batch), "   2  DONE             20 items  act-1");
}

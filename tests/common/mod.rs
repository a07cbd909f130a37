#![allow(dead_code)]

pub use cronbackup_test_utils::builders;
pub use cronbackup_test_utils::{init_tracing, with_timeout};

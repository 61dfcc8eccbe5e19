#![allow(unused_imports)]

pub use buildwatch_test_utils::builders;
pub use buildwatch_test_utils::fake_runner;
pub use buildwatch_test_utils::recording;
pub use buildwatch_test_utils::{init_tracing, with_timeout};

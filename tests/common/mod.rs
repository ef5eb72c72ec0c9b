#![allow(dead_code, unused_imports)]

pub use sfnwatch_test_utils::{builders, fixtures, init_tracing, recording, with_timeout};

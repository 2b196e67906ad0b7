#![allow(dead_code)]

pub mod assertions;
pub mod fake_edc;
pub mod fixtures;
pub mod logging;

pub use assertions::{assert_contains, assert_not_contains};
pub use fake_edc::FakeEdc;
pub use fixtures::{TestEnv, edcctl};
pub use logging::init_test_logging;

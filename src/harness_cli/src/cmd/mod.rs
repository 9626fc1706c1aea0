pub mod admin;
pub mod config;
pub mod run;
pub mod simulate;

pub use run::{test_set, TestSet, TEST_SETS};

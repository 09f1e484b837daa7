//! Command-line workflow, separate from argument parsing

pub mod orchestration;

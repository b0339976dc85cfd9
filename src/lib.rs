use clap::ValueEnum;

pub mod benches;
pub mod command;
pub mod config;
pub mod error;
pub mod git;
pub mod harness;
pub mod history;
pub mod memory;
pub mod record;
pub mod runner;
pub mod schema;

pub use error::{Error, Result};

/// How the chart should compare values of a suite.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum Tool {
    /// Lower values are improvements (times, sizes).
    #[default]
    CustomSmallerIsBetter,
    /// Higher values are improvements (throughput).
    CustomBiggerIsBetter,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::CustomSmallerIsBetter => "customSmallerIsBetter",
            Tool::CustomBiggerIsBetter => "customBiggerIsBetter",
        }
    }
}

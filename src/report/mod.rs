//! Full report sections and output rendering.

pub mod generator;
pub mod runner;
pub mod sections;

pub use generator::{generate_batch_markdown, generate_json, generate_report_markdown};
pub use runner::run_report;

//! Saving and loading synthesis reports

pub mod report_io;

pub use report_io::{ReportEntry, RunMetadata, RunReport, SynthesisReport, WidthReport};

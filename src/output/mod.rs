pub mod writer;

pub use writer::format_result;
pub use writer::spawn_result_writer;
pub use writer::OutputFormat;
pub use writer::ProbeResult;

pub mod result_exporter;
pub mod result_row;
pub mod result_summary;

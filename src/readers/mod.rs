pub mod complaint_reader;

pub use complaint_reader::ComplaintReader;

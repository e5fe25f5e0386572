pub mod complaint;

pub use complaint::{NoiseComplaint, RawComplaint, RowKey};

pub mod analysis;
pub mod datasets;

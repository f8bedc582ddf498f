pub mod test_set;
pub mod benchmark;
pub mod upload;

pub use test_set::{Expected, Fixture, FixtureCategory, get_test_set};
pub use benchmark::{BenchmarkReport, Benchmarker};
pub use upload::upload_image;

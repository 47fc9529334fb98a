pub mod batch;
pub mod behaviors;
pub mod runner;
pub mod util;

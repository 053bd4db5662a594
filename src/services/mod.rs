pub mod attempt;
pub mod grading;
pub mod scoring;
pub mod timer;

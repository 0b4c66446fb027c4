pub mod catalog;
pub mod runner;
pub mod suites;

pub mod adb;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod menu;
pub mod models;
pub mod objection;
pub mod presentation;
pub mod process;
pub mod readiness;
pub mod report;
pub mod session;
pub mod summary;
pub mod target;

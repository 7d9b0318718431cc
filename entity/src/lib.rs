pub mod build;
pub mod build_log;
pub mod file;
pub mod project;

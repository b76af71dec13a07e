pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod lesson;
pub mod net;
pub mod report;
pub mod session;

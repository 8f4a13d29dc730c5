pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod extras;
pub mod logging;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod terms;
pub mod utils;

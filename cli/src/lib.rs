//! taskline-cli library, exposing the modules for unit and integration tests

pub mod app;
pub mod commands;
pub mod context;
pub mod logging;
pub mod shell;
pub mod taskfile;

pub mod commands;
pub mod config;
pub mod error;
pub mod parsers;
pub mod response;

pub mod cli;
pub mod config;
pub mod dto;
pub mod scenario;

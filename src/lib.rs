pub mod cli;
pub mod config;
pub mod sequence;
pub mod source;
pub mod template;

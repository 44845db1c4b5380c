pub mod commands;
pub mod reply;

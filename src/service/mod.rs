pub mod catalog;
pub mod drive_session;
pub mod tag_commands;

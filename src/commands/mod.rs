//! Entry-point commands
//!
//! Each command backs one binary and returns the line it prints.

pub mod init;
pub mod prices;
pub mod update;

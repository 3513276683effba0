//! Use cases - application flows built on the ports

pub mod chat_turn;
pub mod select_tools;

pub mod buffer;
pub mod cli;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod file_io;
pub mod keys;
pub mod logger;
pub mod mode;
pub mod screen;
pub mod terminal;
pub mod utf8;

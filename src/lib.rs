#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

//! An embeddable command shell for `no_std` systems.
//!
//! This crate provides line editing, command history, tab completion and
//! command dispatch over a byte stream, with an optional async driver for
//! `embedded-io-async` transports.

extern crate alloc;

pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod parser;
pub mod registry;
pub mod session;
pub mod task;
pub mod terminal;
pub mod writer;

pub use config::SessionConfig;
pub use error::{EditError, HistoryError, RegistrationError, TokenizeError};
pub use history::History;
pub use parser::CommandParser;
pub use registry::{CommandHandler, CommandRegistry, Descriptor};
pub use session::{PathProvider, Session};
pub use task::TaskError;
pub use terminal::Terminal;
pub use writer::{BufferedSink, FnSink, Sink};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::registry::{CommandHandler, Descriptor};
    pub use crate::session::{PathProvider, Session};
    pub use crate::writer::{BufferedSink, FnSink, Sink};
}

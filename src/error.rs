//! Error types. None of these end a session; they reject a single operation.

use thiserror::Error;

/// Why a command or parameter registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The command name was empty
    #[error("command name is empty")]
    EmptyName,
    /// The command name is longer than the configured maximum
    #[error("command name longer than {max} bytes")]
    NameTooLong {
        /// Configured maximum
        max: usize,
    },
    /// The brief is longer than the configured maximum
    #[error("brief longer than {max} bytes")]
    BriefTooLong {
        /// Configured maximum
        max: usize,
    },
    /// The name holds whitespace or bytes outside printable ASCII
    #[error("name must be printable ASCII without spaces")]
    InvalidName,
    /// A command with the same name is already registered
    #[error("command already registered")]
    DuplicateName,
    /// No command carries this descriptor
    #[error("no command with descriptor {0}")]
    UnknownDescriptor(usize),
    /// Parameter text was empty
    #[error("parameter text is empty")]
    EmptyParameter,
    /// The parameter arena cannot hold the text
    #[error("parameter pool exhausted")]
    ArenaExhausted,
}

/// Why the line editor rejected an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    /// The line already holds as many bytes as the buffer allows
    #[error("line buffer full")]
    BufferFull,
}

/// Why a parameter string could not be split into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// An odd number of `"` characters
    #[error("unbalanced quotes")]
    UnbalancedQuotes,
    /// More tokens than the argv can hold
    #[error("more than {max} parameters")]
    TooManyTokens {
        /// Argv capacity
        max: usize,
    },
}

/// Why a line was not stored in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The line does not fit in a history slot
    #[error("line longer than a history slot")]
    LineTooLong,
}

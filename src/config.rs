//! Capacities and runtime options for a shell session.

/// Longest accepted command name, in bytes.
///
/// Also sets the column width used by `help` when listing commands.
pub const COMMAND_NAME_MAX_LEN: usize = 10;

/// Longest accepted command brief, in bytes.
pub const BRIEF_MAX_LEN: usize = 100;

/// Default size of the line edit buffer.
///
/// One byte is held in reserve, so the longest editable line is
/// `RECEIVE_BUFFER_SIZE - 1` bytes.
pub const RECEIVE_BUFFER_SIZE: usize = 50;

/// Default number of lines kept for Up/Down recall. Zero disables recall.
pub const HISTORY_DEPTH: usize = 10;

/// Size of the scratch buffer used for formatted output.
pub const OUTPUT_BUFFER_SIZE: usize = 512;

/// Bytes available to parameter hints and their descriptions.
pub const PARAMETER_POOL_SIZE: usize = 512;

/// Maximum number of parameters handed to a command.
pub const MAX_ARGS: usize = 16;

/// Longest path a [`PathProvider`](crate::session::PathProvider) may return.
pub const PATH_MAX_LEN: usize = 64;

/// Runtime options for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Prompt printed before each line when no path provider is installed
    pub prompt: &'static str,
    /// Name printed in front of the path when a path provider is installed
    pub user_name: &'static str,
    /// Line printed once by [`Session::start`](crate::session::Session::start)
    pub banner: Option<&'static str>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: "> ",
            user_name: "shell@device",
            banner: Some("shell ready, type help to list commands"),
        }
    }
}

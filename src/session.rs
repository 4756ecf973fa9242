//! The shell session: feeds bytes through the line editor, renders the
//! line, and dispatches submitted lines to registered commands.
//!
//! A session is a single-owner object. Register commands first, then feed
//! bytes from one context only; nothing inside blocks or waits.

use alloc::boxed::Box;

use heapless::String;

use crate::completion::{self, Completion};
use crate::config::{
    SessionConfig, COMMAND_NAME_MAX_LEN, HISTORY_DEPTH, PARAMETER_POOL_SIZE, PATH_MAX_LEN,
    RECEIVE_BUFFER_SIZE,
};
use crate::error::{RegistrationError, TokenizeError};
use crate::history::{History, Recall};
use crate::parser::{Argv, CommandParser};
use crate::registry::{CommandHandler, CommandRegistry, Descriptor, Handler};
use crate::terminal::{KeyCode, Terminal};
use crate::writer::{ansi, colors, set_color, write_colored, Sink};

const NO_DESCRIPTION: &str = "no description";

/// Supplies the working directory shown in the prompt.
///
/// Queried every time the prompt is drawn. Closures returning a
/// `heapless::String<PATH_MAX_LEN>` qualify.
pub trait PathProvider {
    /// The path to show
    fn current_path(&self) -> String<PATH_MAX_LEN>;
}

impl<F> PathProvider for F
where
    F: Fn() -> String<PATH_MAX_LEN>,
{
    fn current_path(&self) -> String<PATH_MAX_LEN> {
        self()
    }
}

/// An interactive command shell bound to one output sink.
///
/// `BUF_SIZE` sizes the line buffer (lines hold up to `BUF_SIZE - 1`
/// bytes) and `HISTORY` the number of recallable lines.
pub struct Session<S, const BUF_SIZE: usize = RECEIVE_BUFFER_SIZE, const HISTORY: usize = HISTORY_DEPTH>
{
    out: S,
    config: SessionConfig,
    registry: CommandRegistry<PARAMETER_POOL_SIZE>,
    terminal: Terminal<BUF_SIZE>,
    history: History<HISTORY, BUF_SIZE>,
    path: Option<Box<dyn PathProvider>>,
    recall_enabled: bool,
}

impl<S: Sink, const BUF_SIZE: usize, const HISTORY: usize> Session<S, BUF_SIZE, HISTORY> {
    /// Create a session with the built-in `help` and `clear` commands
    pub fn new(out: S, config: SessionConfig) -> Self {
        let mut session = Self {
            out,
            config,
            registry: CommandRegistry::new(),
            terminal: Terminal::new(),
            history: History::new(),
            path: None,
            recall_enabled: true,
        };
        let builtins = [
            ("help", "list commands, or describe one", Handler::Help),
            ("clear", "clear screen", Handler::Clear),
        ];
        for (name, brief, handler) in builtins {
            // failures are already reported to the sink
            let _ = session.add_command(name, brief, handler);
        }
        session
    }

    /// Print the banner, if any, and the first prompt
    pub fn start(&mut self) {
        if let Some(banner) = self.config.banner {
            self.out.write_str(banner);
            self.out.write_str(ansi::NEWLINE);
        }
        self.write_prompt();
    }

    /// Show the working directory in the prompt
    pub fn set_path_provider<P: PathProvider + 'static>(&mut self, provider: P) {
        self.path = Some(Box::new(provider));
    }

    /// Register a command implemented by a closure.
    ///
    /// Errors are also reported on the sink. The new name becomes a
    /// parameter hint of `help`.
    pub fn register_command<F>(
        &mut self,
        name: &str,
        brief: &str,
        handler: F,
    ) -> Result<Descriptor, RegistrationError>
    where
        F: FnMut(&mut dyn Sink, &[&str]) + 'static,
    {
        self.register_handler(name, brief, handler)
    }

    /// Register a command implemented by any [`CommandHandler`]
    pub fn register_handler<H: CommandHandler + 'static>(
        &mut self,
        name: &str,
        brief: &str,
        handler: H,
    ) -> Result<Descriptor, RegistrationError> {
        self.add_command(name, brief, Handler::User(Box::new(handler)))
    }

    fn add_command(
        &mut self,
        name: &str,
        brief: &str,
        handler: Handler,
    ) -> Result<Descriptor, RegistrationError> {
        let descriptor = match self.registry.register(name, brief, handler) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                log::warn!("registration of `{}` refused: {}", name, err);
                write!(self.out, "cannot register `{}`: {}\r\n", name, err);
                return Err(err);
            }
        };
        if let Some(help) = self.registry.lookup("help") {
            if let Err(err) = self.registry.register_parameter(help, name, None) {
                log::warn!("help hint for `{}` refused: {}", name, err);
                write!(self.out, "`{}` missing from help completion: {}\r\n", name, err);
            }
        }
        Ok(descriptor)
    }

    /// Attach a completion hint, with optional description, to a command.
    ///
    /// Errors are also reported on the sink.
    pub fn register_parameter(
        &mut self,
        descriptor: Descriptor,
        text: &str,
        description: Option<&str>,
    ) -> Result<(), RegistrationError> {
        self.registry
            .register_parameter(descriptor, text, description)
            .inspect_err(|err| {
                log::warn!("parameter `{}` refused: {}", text, err);
                write!(self.out, "cannot register parameter `{}`: {}\r\n", text, err);
            })
    }

    /// Descriptor of the command with this exact name
    pub fn lookup(&self, name: &str) -> Option<Descriptor> {
        self.registry.lookup(name)
    }

    /// Feed a slice of input bytes
    pub fn process(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.process_byte(byte);
        }
    }

    /// Feed one input byte. All effects are sink writes and state changes.
    pub fn process_byte(&mut self, byte: u8) {
        let Some(key) = self.terminal.process_byte(byte) else {
            return;
        };
        match key {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.erase(),
            KeyCode::Tab => self.complete(),
            KeyCode::CtrlC => self.interrupt(),
            KeyCode::ArrowLeft => {
                if self.terminal.cursor_left() {
                    self.out.write_str(ansi::CURSOR_LEFT);
                }
            }
            KeyCode::ArrowRight => {
                if self.terminal.cursor_right() {
                    self.out.write_str(ansi::CURSOR_RIGHT);
                }
            }
            KeyCode::ArrowUp => self.recall(true),
            KeyCode::ArrowDown => self.recall(false),
            KeyCode::Char(byte) => self.insert(byte),
        }
    }

    fn insert(&mut self, byte: u8) {
        let at_end = self.terminal.at_end();
        if let Err(err) = self.terminal.insert(byte) {
            log::warn!("input {:#04x} rejected: {}", byte, err);
            self.out.write_str(ansi::BELL);
            return;
        }
        self.recall_enabled = false;
        self.out.write(&[byte]);
        if !at_end {
            self.out.write_str(ansi::SAVE_CURSOR);
            self.out.write_str(self.terminal.tail());
            self.out.write_str(ansi::RESTORE_CURSOR);
        }
    }

    fn erase(&mut self) {
        let at_end = self.terminal.at_end();
        if !self.terminal.backspace() {
            return;
        }
        if at_end {
            self.out.write_str(ansi::DESTRUCTIVE_BACKSPACE);
        } else {
            self.out.write(b"\x08");
            self.out.write_str(ansi::SAVE_CURSOR);
            self.out.write_str(ansi::ERASE_TO_EOL);
            self.out.write_str(self.terminal.tail());
            self.out.write_str(ansi::RESTORE_CURSOR);
        }
        self.recall_enabled = self.terminal.is_empty();
    }

    fn submit(&mut self) {
        self.out.write_str(ansi::NEWLINE);
        let line: String<BUF_SIZE> = String::try_from(self.terminal.line()).unwrap_or_default();
        self.terminal.clear_buffer();

        if !line.trim_matches(' ').is_empty() {
            if let Err(err) = self.history.push(&line) {
                log::warn!("line not kept in history: {}", err);
            }
            self.dispatch(&line);
        }
        self.history.reset_position();
        self.recall_enabled = true;
        self.write_prompt();
    }

    fn dispatch(&mut self, line: &str) {
        let Some(split) = CommandParser::split(line) else {
            return;
        };
        let Some(descriptor) = self.registry.lookup(split.command) else {
            log::debug!("no command `{}`", split.command);
            write!(self.out, "{}: command not registered\r\n", split.command);
            return;
        };
        let argv = match CommandParser::tokenize(split.rest) {
            Ok(argv) => argv,
            Err(TokenizeError::UnbalancedQuotes) => {
                log::warn!("unbalanced quotes in `{}`, passing no parameters", line);
                Argv::new()
            }
            Err(err) => {
                write!(self.out, "{}: {}\r\n", split.command, err);
                return;
            }
        };
        log::debug!("running `{}` with {} parameters", split.command, argv.len());

        if let Some(Handler::User(handler)) =
            self.registry.get_mut(descriptor).map(|c| &mut c.handler)
        {
            handler.invoke(&mut self.out, &argv);
            return;
        }
        match self.registry.get(descriptor).map(|c| &c.handler) {
            Some(Handler::Help) => help(&self.registry, &mut self.out, &argv),
            Some(Handler::Clear) => {
                self.out.write_str(ansi::CLEAR_SCREEN);
                self.out.write_str(ansi::CURSOR_HOME);
            }
            _ => {}
        }
    }

    fn complete(&mut self) {
        if self.terminal.is_empty() {
            return;
        }
        let capacity = Terminal::<BUF_SIZE>::capacity();
        match completion::complete(self.terminal.line(), &self.registry) {
            Completion::None => {}
            Completion::Unique { suffix } => {
                if self.terminal.len() + suffix.len() + 1 > capacity {
                    log::warn!("completion `{}` does not fit the line", suffix);
                    self.out.write_str(ansi::BELL);
                } else {
                    // fits: checked above
                    let _ = self.terminal.append(suffix);
                    let _ = self.terminal.append(" ");
                    self.recall_enabled = false;
                }
            }
            Completion::Multiple { candidates, suffix } => {
                self.out.write_str(ansi::NEWLINE);
                for (i, candidate) in candidates.iter().enumerate() {
                    if i > 0 {
                        self.out.write_str(" ");
                    }
                    self.out.write_str(candidate);
                }
                self.out.write_str(ansi::NEWLINE);
                if let Err(err) = self.terminal.append(suffix) {
                    log::warn!("completion `{}` rejected: {}", suffix, err);
                    self.out.write_str(ansi::BELL);
                } else if !suffix.is_empty() {
                    self.recall_enabled = false;
                }
            }
        }
        self.redraw_line();
    }

    fn interrupt(&mut self) {
        self.out.write_str("^C");
        self.out.write_str(ansi::NEWLINE);
        self.terminal.clear_buffer();
        self.history.reset_position();
        self.recall_enabled = true;
        self.write_prompt();
    }

    fn recall(&mut self, older: bool) {
        if HISTORY == 0 || !self.recall_enabled {
            return;
        }
        let recall = if older {
            self.history.up()
        } else {
            self.history.down()
        };
        match recall {
            Recall::Unchanged => return,
            Recall::Entry(entry) => {
                if let Err(err) = self.terminal.set_buffer(entry) {
                    log::warn!("history entry not loaded: {}", err);
                    return;
                }
            }
            Recall::Blank => self.terminal.clear_buffer(),
        }
        self.redraw_line();
    }

    /// Erase the current screen line and draw prompt and line again.
    ///
    /// Useful after foreign output has landed on the prompt line.
    pub fn redraw_line(&mut self) {
        self.out.write_str(ansi::CLEAR_LINE);
        self.write_prompt();
        self.out.write_str(self.terminal.line());
        let back = self.terminal.tail().len();
        if back > 0 {
            write!(self.out, "\x1b[{}D", back);
        }
    }

    fn write_prompt(&mut self) {
        let Some(path) = &self.path else {
            self.out.write_str(self.config.prompt);
            return;
        };
        let path = path.current_path();
        set_color(&mut self.out, colors::GREEN);
        self.out.write_str(self.config.user_name);
        self.out.write_str(":");
        self.out.write_str(ansi::RESET);
        write_colored(&mut self.out, &path, colors::BLUE);
        self.out.write_str("$ ");
    }

    /// The line being edited
    pub fn line(&self) -> &str {
        self.terminal.line()
    }

    /// Cursor position within the line
    pub fn cursor(&self) -> usize {
        self.terminal.cursor_position()
    }

    /// Registered commands
    pub fn registry(&self) -> &CommandRegistry<PARAMETER_POOL_SIZE> {
        &self.registry
    }

    /// Submitted lines available for recall
    pub fn history(&self) -> &History<HISTORY, BUF_SIZE> {
        &self.history
    }

    /// Session options
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The output sink
    pub fn sink(&self) -> &S {
        &self.out
    }

    /// The output sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.out
    }

    /// Consume the session, returning its sink
    pub fn into_sink(self) -> S {
        self.out
    }
}

fn help<const POOL: usize>(registry: &CommandRegistry<POOL>, out: &mut dyn Sink, argv: &[&str]) {
    if argv.is_empty() {
        for command in registry.iter().filter(|c| !c.brief().is_empty()) {
            let pad = COMMAND_NAME_MAX_LEN + 3 - command.name().len();
            write!(out, "{}:{:pad$}{}\r\n", command.name(), "", command.brief(), pad = pad);
        }
        return;
    }

    for &name in argv {
        let Some(descriptor) = registry.lookup(name) else {
            write!(out, "{}: command not registered\r\n", name);
            continue;
        };
        let brief = registry
            .get(descriptor)
            .map(|c| c.brief())
            .filter(|b| !b.is_empty())
            .unwrap_or(NO_DESCRIPTION);
        write!(out, "{}: {}\r\n", name, brief);
        for (text, description) in registry.parameters(descriptor) {
            write!(
                out,
                "  {:<width$} {}\r\n",
                text,
                description.unwrap_or(NO_DESCRIPTION),
                width = COMMAND_NAME_MAX_LEN
            );
        }
    }
}

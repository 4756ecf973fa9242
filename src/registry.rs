//! Registered commands, their parameter hints, and name lookup.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use core::ops::Range;

use heapless::String;

use crate::config::{BRIEF_MAX_LEN, COMMAND_NAME_MAX_LEN};
use crate::error::RegistrationError;
use crate::writer::Sink;

/// Handle to a registered command.
///
/// Descriptors start at 1, follow registration order and stay valid for
/// the life of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(NonZeroUsize);

impl Descriptor {
    fn from_index(index: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(index))
    }

    fn index(self) -> usize {
        self.0.get() - 1
    }

    /// The numeric handle, always at least 1
    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Code run when a command is entered.
///
/// `argv` holds the parameters after the command name; `argv.len()` is the
/// argument count. Any `FnMut(&mut dyn Sink, &[&str])` closure qualifies.
pub trait CommandHandler {
    /// Run the command
    fn invoke(&mut self, out: &mut dyn Sink, argv: &[&str]);
}

impl<F> CommandHandler for F
where
    F: FnMut(&mut dyn Sink, &[&str]),
{
    fn invoke(&mut self, out: &mut dyn Sink, argv: &[&str]) {
        self(out, argv)
    }
}

/// What runs when a command matches.
pub(crate) enum Handler {
    Help,
    Clear,
    User(Box<dyn CommandHandler>),
}

/// A parameter hint; both strings live in the registry's arena.
#[derive(Debug, Clone)]
struct Parameter {
    text: Range<usize>,
    description: Option<Range<usize>>,
}

/// A registered command.
pub struct Command {
    name: String<COMMAND_NAME_MAX_LEN>,
    brief: String<BRIEF_MAX_LEN>,
    pub(crate) handler: Handler,
    parameters: Vec<Parameter>,
}

impl Command {
    /// The name typed to run this command
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description shown by `help`
    pub fn brief(&self) -> &str {
        &self.brief
    }
}

/// Bump allocator for parameter strings. Nothing is ever freed; once the
/// pool is spent, later parameter registrations fail.
#[derive(Debug, Default)]
pub struct ParameterArena<const N: usize> {
    text: String<N>,
}

impl<const N: usize> ParameterArena<N> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self { text: String::new() }
    }

    fn alloc(&mut self, s: &str) -> Result<Range<usize>, RegistrationError> {
        let start = self.text.len();
        self.text
            .push_str(s)
            .map_err(|_| RegistrationError::ArenaExhausted)?;
        Ok(start..self.text.len())
    }

    fn get(&self, span: &Range<usize>) -> &str {
        self.text.get(span.clone()).unwrap_or("")
    }

    /// Bytes handed out so far
    pub fn used(&self) -> usize {
        self.text.len()
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        N - self.text.len()
    }
}

fn is_token(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_graphic())
}

/// Ordered set of commands. Lookup is first match in registration order.
pub struct CommandRegistry<const POOL: usize> {
    commands: Vec<Command>,
    arena: ParameterArena<POOL>,
}

impl<const POOL: usize> Default for CommandRegistry<POOL> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const POOL: usize> CommandRegistry<POOL> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            arena: ParameterArena::new(),
        }
    }

    pub(crate) fn register(
        &mut self,
        name: &str,
        brief: &str,
        handler: Handler,
    ) -> Result<Descriptor, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let name = String::try_from(name).map_err(|_| RegistrationError::NameTooLong {
            max: COMMAND_NAME_MAX_LEN,
        })?;
        let brief = String::try_from(brief).map_err(|_| RegistrationError::BriefTooLong {
            max: BRIEF_MAX_LEN,
        })?;
        if !is_token(&name) {
            return Err(RegistrationError::InvalidName);
        }
        if self.lookup(&name).is_some() {
            return Err(RegistrationError::DuplicateName);
        }

        let descriptor = Descriptor::from_index(self.commands.len());
        log::debug!("registered command `{}` as {}", name, descriptor.get());
        self.commands.push(Command {
            name,
            brief,
            handler,
            parameters: Vec::new(),
        });
        Ok(descriptor)
    }

    /// Attach a parameter hint to a command
    pub fn register_parameter(
        &mut self,
        descriptor: Descriptor,
        text: &str,
        description: Option<&str>,
    ) -> Result<(), RegistrationError> {
        let index = descriptor.index();
        if index >= self.commands.len() {
            return Err(RegistrationError::UnknownDescriptor(descriptor.get()));
        }
        if text.is_empty() {
            return Err(RegistrationError::EmptyParameter);
        }
        if !is_token(text) {
            return Err(RegistrationError::InvalidName);
        }

        let needed = text.len() + description.map_or(0, str::len);
        if needed > self.arena.remaining() {
            log::warn!(
                "parameter pool exhausted: {} bytes needed, {} left",
                needed,
                self.arena.remaining()
            );
            return Err(RegistrationError::ArenaExhausted);
        }
        let text = self.arena.alloc(text)?;
        let description = description
            .filter(|d| !d.is_empty())
            .map(|d| self.arena.alloc(d))
            .transpose()?;
        self.commands[index].parameters.push(Parameter { text, description });
        Ok(())
    }

    /// Find a command whose name equals `name` exactly
    pub fn lookup(&self, name: &str) -> Option<Descriptor> {
        self.commands
            .iter()
            .position(|c| c.name.as_str() == name)
            .map(Descriptor::from_index)
    }

    /// Find the command named by the first space-delimited token of `line`
    pub fn match_line(&self, line: &str) -> Option<Descriptor> {
        line.split(' ').find(|t| !t.is_empty()).and_then(|t| self.lookup(t))
    }

    /// The command behind a descriptor
    pub fn get(&self, descriptor: Descriptor) -> Option<&Command> {
        self.commands.get(descriptor.index())
    }

    pub(crate) fn get_mut(&mut self, descriptor: Descriptor) -> Option<&mut Command> {
        self.commands.get_mut(descriptor.index())
    }

    /// All commands in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Parameter hints of a command, with their optional descriptions
    pub fn parameters(
        &self,
        descriptor: Descriptor,
    ) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.get(descriptor)
            .map(|c| c.parameters.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|p| {
                (
                    self.arena.get(&p.text),
                    p.description.as_ref().map(|d| self.arena.get(d)),
                )
            })
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The shared parameter pool
    pub fn arena(&self) -> &ParameterArena<POOL> {
        &self.arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Handler {
        Handler::User(Box::new(|_: &mut dyn Sink, _: &[&str]| {}))
    }

    #[test]
    fn test_descriptors_follow_registration_order() {
        let mut registry = CommandRegistry::<64>::new();
        let a = registry.register("alpha", "first", user()).unwrap();
        let b = registry.register("beta", "second", user()).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(registry.lookup("alpha"), Some(a));
        assert_eq!(registry.lookup("beta"), Some(b));
        assert_eq!(registry.get(b).map(Command::brief), Some("second"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry = CommandRegistry::<64>::new();
        registry.register("test", "", user()).unwrap();
        assert!(registry.lookup("tes").is_none());
        assert!(registry.lookup("test2").is_none());
        assert!(registry.match_line("  test 1 2").is_some());
        assert!(registry.match_line("testing").is_none());
    }

    #[test]
    fn test_rejections_leave_registry_unchanged() {
        let mut registry = CommandRegistry::<64>::new();
        assert_eq!(
            registry.register("much_too_long", "", user()).unwrap_err(),
            RegistrationError::NameTooLong { max: COMMAND_NAME_MAX_LEN }
        );
        let brief = "x".repeat(BRIEF_MAX_LEN + 1);
        assert_eq!(
            registry.register("ok", &brief, user()).unwrap_err(),
            RegistrationError::BriefTooLong { max: BRIEF_MAX_LEN }
        );
        assert_eq!(registry.register("", "", user()).unwrap_err(), RegistrationError::EmptyName);
        assert_eq!(registry.register("a b", "", user()).unwrap_err(), RegistrationError::InvalidName);
        assert!(registry.is_empty());

        registry.register("ok", "", user()).unwrap();
        assert_eq!(registry.register("ok", "", user()).unwrap_err(), RegistrationError::DuplicateName);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_name_at_limit_is_accepted() {
        let mut registry = CommandRegistry::<64>::new();
        let name = "n".repeat(COMMAND_NAME_MAX_LEN);
        assert!(registry.register(&name, "", user()).is_ok());
    }

    #[test]
    fn test_parameters_are_stored_in_order() {
        let mut registry = CommandRegistry::<64>::new();
        let date = registry.register("date", "", user()).unwrap();
        registry.register_parameter(date, "get", Some("read the clock")).unwrap();
        registry.register_parameter(date, "set", None).unwrap();

        let params: alloc::vec::Vec<_> = registry.parameters(date).collect();
        assert_eq!(params, [("get", Some("read the clock")), ("set", None)]);
        assert_eq!(registry.arena().used(), "get".len() + "read the clock".len() + "set".len());
    }

    #[test]
    fn test_arena_exhaustion() {
        let mut registry = CommandRegistry::<8>::new();
        let cmd = registry.register("cmd", "", user()).unwrap();
        registry.register_parameter(cmd, "abcdef", None).unwrap();
        assert_eq!(
            registry.register_parameter(cmd, "ghi", None).unwrap_err(),
            RegistrationError::ArenaExhausted
        );
        // description would not fit: nothing is allocated
        assert_eq!(
            registry.register_parameter(cmd, "x", Some("yz")).unwrap_err(),
            RegistrationError::ArenaExhausted
        );
        assert_eq!(registry.arena().used(), 6);
        registry.register_parameter(cmd, "xy", None).unwrap();
        assert_eq!(registry.arena().remaining(), 0);
        assert_eq!(registry.parameters(cmd).count(), 2);
    }

    #[test]
    fn test_unknown_descriptor() {
        let mut registry = CommandRegistry::<8>::new();
        let cmd = registry.register("cmd", "", user()).unwrap();
        let mut other = CommandRegistry::<8>::new();
        other.register("a", "", user()).unwrap();
        let foreign = other.register("b", "", user()).unwrap();

        assert_eq!(
            registry.register_parameter(foreign, "p", None).unwrap_err(),
            RegistrationError::UnknownDescriptor(2)
        );
        assert_eq!(
            registry.register_parameter(cmd, "", None).unwrap_err(),
            RegistrationError::EmptyParameter
        );
    }
}

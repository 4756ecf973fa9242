//! Tab completion of command names and parameter hints.
//!
//! Completion only ever appends: the text being completed is always the
//! last token of the line, so the result is a suffix to add.

use alloc::vec::Vec;

use crate::parser::CommandParser;
use crate::registry::CommandRegistry;

/// What a Tab press should do to the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<'r> {
    /// No candidate; redraw the line unchanged
    None,
    /// One candidate: append `suffix` followed by a space
    Unique {
        /// Missing tail of the candidate
        suffix: &'r str,
    },
    /// Several candidates: list them and append their shared `suffix`
    Multiple {
        /// Every matching candidate, in registration order
        candidates: Vec<&'r str>,
        /// Tail shared by all candidates beyond what was typed
        suffix: &'r str,
    },
}

/// Length in bytes of the longest prefix shared by every candidate.
///
/// For a single candidate this is its full length; for none it is 0.
pub fn common_prefix_len(candidates: &[&str]) -> usize {
    let Some((first, others)) = candidates.split_first() else {
        return 0;
    };
    others.iter().fold(first.len(), |len, candidate| {
        first
            .bytes()
            .zip(candidate.bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    })
}

/// Work out the completion for `line`.
///
/// While the line holds a single token, command names are completed; a
/// token that already names a command only gets its trailing space.
/// Once the first token is a registered command followed by a space, the
/// last token is completed against that command's parameter hints. An
/// unknown command followed by more text has nothing to complete.
pub fn complete<'r, const POOL: usize>(
    line: &str,
    registry: &'r CommandRegistry<POOL>,
) -> Completion<'r> {
    let Some(split) = CommandParser::split(line) else {
        return resolve("", registry.iter().map(|c| c.name()));
    };

    if split.rest.is_empty() {
        if registry.lookup(split.command).is_some() {
            return Completion::Unique { suffix: "" };
        }
        return resolve(split.command, registry.iter().map(|c| c.name()));
    }

    match registry.lookup(split.command) {
        Some(descriptor) => {
            let prefix = split.rest.rsplit(' ').next().unwrap_or("");
            resolve(prefix, registry.parameters(descriptor).map(|(text, _)| text))
        }
        None => Completion::None,
    }
}

fn resolve<'r>(prefix: &str, names: impl Iterator<Item = &'r str>) -> Completion<'r> {
    let candidates: Vec<&'r str> = names.filter(|n| n.starts_with(prefix)).collect();
    let Some(&first) = candidates.first() else {
        return Completion::None;
    };
    match candidates.len() {
        1 => Completion::Unique {
            suffix: first.get(prefix.len()..).unwrap_or(""),
        },
        _ => {
            let shared = common_prefix_len(&candidates);
            let suffix = first.get(prefix.len()..shared).unwrap_or("");
            Completion::Multiple { candidates, suffix }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Handler;
    use alloc::boxed::Box;
    use alloc::string::String;
    use proptest::prelude::*;

    fn registry(names: &[&str]) -> CommandRegistry<128> {
        let mut registry = CommandRegistry::new();
        for name in names {
            registry
                .register(name, "", Handler::User(Box::new(|_: &mut dyn crate::Sink, _: &[&str]| {})))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_common_prefix_len() {
        assert_eq!(common_prefix_len(&[]), 0);
        assert_eq!(common_prefix_len(&["single"]), 6);
        assert_eq!(common_prefix_len(&["test2", "test3", "test4"]), 4);
        assert_eq!(common_prefix_len(&["test", "test2"]), 4);
        assert_eq!(common_prefix_len(&["abc", "xyz"]), 0);
    }

    #[test]
    fn test_multiple_commands_extend_to_shared_prefix() {
        let registry = registry(&["help", "clear", "test2", "test3", "test4"]);
        assert_eq!(
            complete("tes", &registry),
            Completion::Multiple {
                candidates: alloc::vec!["test2", "test3", "test4"],
                suffix: "t",
            }
        );
    }

    #[test]
    fn test_exact_command_gets_trailing_space() {
        let registry = registry(&["help", "clear", "test2"]);
        assert_eq!(complete("clear", &registry), Completion::Unique { suffix: "" });
        assert_eq!(complete("cl", &registry), Completion::Unique { suffix: "ear" });
    }

    #[test]
    fn test_no_command_match() {
        let registry = registry(&["help", "clear"]);
        assert_eq!(complete("xyz", &registry), Completion::None);
        assert_eq!(complete("xyz abc", &registry), Completion::None);
    }

    #[test]
    fn test_blank_line_lists_all_commands() {
        let registry = registry(&["help", "clear"]);
        match complete("  ", &registry) {
            Completion::Multiple { candidates, suffix } => {
                assert_eq!(candidates, ["help", "clear"]);
                assert_eq!(suffix, "");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parameter_completion() {
        let mut registry = registry(&["date"]);
        let date = registry.lookup("date").unwrap();
        registry.register_parameter(date, "get", None).unwrap();
        registry.register_parameter(date, "set", Some("set the clock")).unwrap();
        registry.register_parameter(date, "sync", None).unwrap();

        assert_eq!(complete("date g", &registry), Completion::Unique { suffix: "et" });
        assert_eq!(
            complete("date s", &registry),
            Completion::Multiple {
                candidates: alloc::vec!["set", "sync"],
                suffix: "",
            }
        );
        assert_eq!(complete("date get x", &registry), Completion::None);
        assert_eq!(complete("date get s", &registry), complete("date s", &registry));
        match complete("date ", &registry) {
            Completion::Multiple { candidates, .. } => assert_eq!(candidates.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_command_without_parameters() {
        let registry = registry(&["clear"]);
        assert_eq!(complete("clear ", &registry), Completion::None);
    }

    #[test]
    fn test_exact_name_with_longer_sibling() {
        let mut registry = registry(&["test", "test2"]);
        let test = registry.lookup("test").unwrap();
        registry.register_parameter(test, "alpha", None).unwrap();

        assert_eq!(complete("test", &registry), Completion::Unique { suffix: "" });
        assert_eq!(complete("test ", &registry), Completion::Unique { suffix: "alpha" });
        assert_eq!(
            complete("tes", &registry),
            Completion::Multiple {
                candidates: alloc::vec!["test", "test2"],
                suffix: "t",
            }
        );
    }

    proptest! {
        #[test]
        fn common_prefix_is_shared_and_maximal(words in proptest::collection::vec("[ab]{0,6}", 1..6)) {
            let refs: Vec<&str> = words.iter().map(String::as_str).collect();
            let len = common_prefix_len(&refs);
            let first = refs[0].as_bytes();
            for word in &refs {
                prop_assert!(word.len() >= len);
                prop_assert_eq!(&word.as_bytes()[..len], &first[..len]);
            }
            if refs.iter().all(|w| w.len() > len) {
                let next = first[len];
                prop_assert!(refs.iter().any(|w| w.as_bytes()[len] != next));
            }
        }
    }
}

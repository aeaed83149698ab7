//! Canonical registry of yok builtin functions.
//!
//! Single source of truth for which call names the fixer and the lowering pass
//! treat specially. Any other call name is an external command.

/// Builtins lowered to `${VAR...}` parameter expansion. Their first argument must be a
/// plain variable name by the time the compiler sees them, and they only make sense
/// where a value is expected.
pub const EXPANSION_BUILTINS: &[&str] = &[
    "len",
    "replace",
    "replace_all",
    "remove_prefix",
    "remove_suffix",
];

/// A builtin that runs as a shell command under another name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBuiltin {
    pub name: &'static str,
    pub command: &'static str,
    pub to_stderr: bool,
}

pub const COMMAND_BUILTINS: &[CommandBuiltin] = &[CommandBuiltin {
    name: "print",
    command: "echo",
    to_stderr: true,
}];

/// Number of arguments each expansion builtin takes.
pub fn arity(name: &str) -> Option<usize> {
    match name {
        "len" => Some(1),
        "replace" | "replace_all" => Some(3),
        "remove_prefix" | "remove_suffix" => Some(2),
        _ => None,
    }
}

pub fn is_expansion_builtin(name: &str) -> bool {
    EXPANSION_BUILTINS.contains(&name)
}

pub fn command_builtin(name: &str) -> Option<&'static CommandBuiltin> {
    COMMAND_BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// Arguments after the first of `replace`/`remove_*` end up inside `${...}` and must be
/// a literal or a command substitution.
pub fn takes_word_arguments(name: &str) -> bool {
    matches!(
        name,
        "replace" | "replace_all" | "remove_prefix" | "remove_suffix"
    )
}

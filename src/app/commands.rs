//! Command lines: tokenizer, status codes and the verb table engine.
//!
//! A line is split once into an immutable [`Command`].  Dispatch is a linear
//! lookup in a static table of [`CommandSpec`]s:
//!
//! ```text
//! ┌──────────┬───────┬──────────────────────┬──────────────────────┐
//! │ verb     │ arity │ usage                │ handler              │
//! ├──────────┼───────┼──────────────────────┼──────────────────────┤
//! │ "mode"   │ 0..=1 │ "mode [run|conf]"    │ fn(ctx, cmd, out)    │
//! │ "set"    │ 3..   │ "set <a> <p> <v>"    │ fn(ctx, cmd, out)    │
//! │ ...      │       │                      │                      │
//! └──────────┴───────┴──────────────────────┴──────────────────────┘
//! ```
//!
//! Arity is checked before the handler runs, so a mismatch has no side
//! effects.  A verb missing from the table yields `None` and the caller
//! decides on a fallback.

use core::fmt;

// ---------------------------------------------------------------------------
// Execution status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdExecStatus {
    NotFound,
    InvalidArgs,
    Executed,
    /// Executed; the caller must abandon the current cycle.
    ExecutedInterrupt,
    CmdFailed,
}

impl fmt::Display for CmdExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::InvalidArgs => write!(f, "Invalid args"),
            Self::Executed => write!(f, "Executed"),
            Self::ExecutedInterrupt => write!(f, "Executed w/int"),
            Self::CmdFailed => write!(f, "Failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// A tokenized command line.  Borrowed from the input, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    line: &'a str,
    verb: &'a str,
    /// Arguments with their byte offset in `line`.
    args: Vec<(usize, &'a str)>,
}

impl<'a> Command<'a> {
    /// Split on whitespace.  `None` for blank lines.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut tokens = line
            .split_whitespace()
            .map(|tok| (tok.as_ptr() as usize - line.as_ptr() as usize, tok));
        let (_, verb) = tokens.next()?;
        Some(Self {
            line,
            verb,
            args: tokens.collect(),
        })
    }

    pub fn verb(&self) -> &'a str {
        self.verb
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(|(_, a)| *a)
    }

    pub fn args(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.args.iter().map(|(_, a)| *a)
    }

    /// Raw text from argument `index` to the end of the line, internal
    /// spacing preserved.  Empty when there is no such argument.
    pub fn rest_from(&self, index: usize) -> &'a str {
        self.args
            .get(index)
            .map_or("", |(offset, _)| self.line[*offset..].trim_end())
    }
}

// ---------------------------------------------------------------------------
// Verb table
// ---------------------------------------------------------------------------

pub type CommandHandler<C> = fn(&mut C, &Command<'_>, &mut String) -> CmdExecStatus;

/// One row of a verb table.
pub struct CommandSpec<C> {
    pub verb: &'static str,
    pub min_args: usize,
    /// `None` means the last argument runs to the end of the line.
    pub max_args: Option<usize>,
    pub usage: &'static str,
    pub handler: CommandHandler<C>,
}

impl<C> CommandSpec<C> {
    pub fn accepts(&self, arg_count: usize) -> bool {
        arg_count >= self.min_args && self.max_args.is_none_or(|max| arg_count <= max)
    }
}

/// Run `cmd` against `table`.  `None` when the verb is not in the table.
pub fn dispatch<C>(
    table: &[CommandSpec<C>],
    ctx: &mut C,
    cmd: &Command<'_>,
    out: &mut String,
) -> Option<CmdExecStatus> {
    let spec = table.iter().find(|s| s.verb == cmd.verb())?;
    if !spec.accepts(cmd.arg_count()) {
        out.push_str("usage: ");
        out.push_str(spec.usage);
        out.push('\n');
        return Some(CmdExecStatus::InvalidArgs);
    }
    Some((spec.handler)(ctx, cmd, out))
}

/// Append one usage line per table row.
pub fn write_help<C>(table: &[CommandSpec<C>], out: &mut String) {
    for spec in table {
        out.push_str(spec.usage);
        out.push('\n');
    }
}

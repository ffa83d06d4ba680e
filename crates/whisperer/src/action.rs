//! Action definitions.

use std::fmt;
use std::rc::Rc;

use crate::flag::FlagScope;
use crate::whisperer::Whisperer;

/// Invoked by [`Whisperer::run`] with the positional arguments of one
/// occurrence. The returned value is a process style exit code (0 = success).
///
/// The callback receives the whisperer itself so it can read or set flags,
/// and may even parse further input.
pub type ActionCallback = Rc<dyn Fn(&mut Whisperer, &[String]) -> i32>;

pub(crate) type ArgumentsValidator = Rc<dyn Fn(&[String]) -> anyhow::Result<()>>;

/// Number of positional arguments an action occurrence consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exactly(usize),
    /// `n` or more arguments, consumed greedily until the next delimiter or
    /// action name.
    AtLeast(usize),
}

impl Arity {
    pub fn min(self) -> usize {
        match self {
            Self::Exactly(n) | Self::AtLeast(n) => n,
        }
    }

    pub fn is_variable(self) -> bool {
        matches!(self, Self::AtLeast(_))
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// A named subcommand.
///
/// ```
/// use whisperer::{Action, Arity, Whisperer};
///
/// let mut app = Whisperer::new();
/// app.define_action(
///     Action::new("trot", Arity::AtLeast(2))
///         .description("make the ponies trot in some way")
///         .callback(|_, args| {
///             for mode in args {
///                 println!("Trotting like a {mode}");
///             }
///             0
///         }),
/// );
/// ```
#[derive(Clone)]
pub struct Action {
    pub(crate) name: String,
    pub(crate) arity: Arity,
    pub(crate) chainable: bool,
    pub(crate) description: String,
    pub(crate) help: String,
    pub(crate) callback: Option<ActionCallback>,
    pub(crate) arguments_validator: Option<ArgumentsValidator>,
    pub(crate) flags: FlagScope,
}

impl Action {
    pub fn new(name: impl Into<String>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            arity,
            chainable: false,
            description: String::new(),
            help: String::new(),
            callback: None,
            arguments_validator: None,
            flags: FlagScope::default(),
        }
    }

    /// Whether a following action may run after this one succeeds.
    pub fn chainable(mut self, chainable: bool) -> Self {
        self.chainable = chainable;
        self
    }

    /// One-line summary shown in the global help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Text shown for `<action> --help`.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Whisperer, &[String]) -> i32 + 'static,
    {
        self.callback = Some(Rc::new(callback));
        self
    }

    /// Check the collected positional arguments once parsing has finished.
    pub fn validate_arguments<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[String]) -> anyhow::Result<()> + 'static,
    {
        self.arguments_validator = Some(Rc::new(validator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn is_chainable(&self) -> bool {
        self.chainable
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("chainable", &self.chainable)
            .field("has_callback", &self.callback.is_some())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

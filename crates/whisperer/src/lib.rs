//! Declarative command line parsing built around chained actions.
//!
//! A [`Whisperer`] holds:
//! - typed global flags and per-action flags, each reachable through several aliases
//! - named actions with an [`Arity`], a chainability switch and a callback
//! - the context stack produced by [`Whisperer::parse`]: one context per action
//!   occurrence, each with private flag copies and its positional arguments
//!
//! [`Whisperer::run`] then invokes the callbacks in input order, stopping at the
//! first failure or the first action that is not chainable.
//!
//! ```
//! use whisperer::{Action, Arity, ParseOutcome, Whisperer};
//!
//! let mut app = Whisperer::new();
//! app.set_delimiters(["+"]);
//! app.define_global_flag("n count", "how many times", 1i64);
//! app.define_action(
//!     Action::new("greet", Arity::Exactly(1))
//!         .chainable(true)
//!         .callback(|app, args| {
//!             let count = app.get_flag::<i64>("count").unwrap_or(1);
//!             for _ in 0..count {
//!                 println!("hello {}", args[0]);
//!             }
//!             0
//!         }),
//! );
//!
//! let outcome = app.parse(["greet", "world", "-n", "2", "+", "greet", "again"]).unwrap();
//! assert_eq!(outcome, ParseOutcome::Ok);
//! assert_eq!(app.run(), 0);
//! ```

mod action;
mod context;
mod dispatch;
mod error;
mod flag;
mod help;
mod parser;
mod whisperer;

pub use action::{Action, ActionCallback, Arity};
pub use dispatch::EXIT_FAILURE;
pub use error::{Error, ParseStatus, Result};
pub use flag::{FlagKind, FlagType, FlagValue};
pub use parser::ParseOutcome;
pub use whisperer::{Config, Whisperer};

//! Single pass, one-token-lookahead parser turning an argument vector into
//! action contexts.

use crate::action::Arity;
use crate::context::{Context, GLOBAL};
use crate::error::{Error, Result};
use crate::flag::{FlagId, FlagType, FlagValue, coerce};
use crate::whisperer::{VERBOSE, VERSION, Whisperer};

/// Successful result of [`Whisperer::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// All tokens were consumed; the contexts are ready to run.
    Ok,
    /// `-h` / `--help` was seen. Parsing stopped there.
    Help,
    /// `--version` was seen. Parsing stopped there.
    Version,
}

/// Whether the parse loop continues after a flag token.
enum Flow {
    Continue,
    Stop(ParseOutcome),
}

struct Tokens<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }
}

fn is_flag_token(token: &str) -> bool {
    token.starts_with('-')
}

/// Strip one or two leading dashes and split off an inline `=value`.
fn split_flag(token: &str) -> (&str, Option<&str>) {
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token);
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}

fn is_verbosity_run(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b == b'v')
}

impl Whisperer {
    /// Parse `tokens` (program name excluded), appending one context per
    /// action occurrence.
    ///
    /// `--help` and `--version` stop parsing immediately, before any further
    /// validation. After a complete pass the arguments validator of every new
    /// occurrence is run.
    ///
    /// Only a parse that returns `Ok(ParseOutcome::Ok)` leaves occurrences for
    /// [`Whisperer::run`]. On an error, `Help` or `Version` the occurrences of
    /// this call are dropped again; global flags assigned before the stop keep
    /// their values.
    pub fn parse<I, S>(&mut self, tokens: I) -> Result<ParseOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let first_new = self.contexts.len();
        let flags_len = self.flags.len();
        let entry = self.current;
        self.help_action = None;

        let result = self.parse_tokens(&tokens, first_new);
        if !matches!(result, Ok(ParseOutcome::Ok)) {
            self.contexts.truncate(first_new);
            self.flags.truncate(flags_len);
            self.current = entry;
        }
        result
    }

    fn parse_tokens(&mut self, tokens: &[String], first_new: usize) -> Result<ParseOutcome> {
        self.current = GLOBAL;
        let mut stream = Tokens::new(tokens);
        while let Some(token) = stream.next() {
            if is_flag_token(token) {
                if let Flow::Stop(outcome) = self.parse_flag(token, &mut stream)? {
                    return Ok(outcome);
                }
                continue;
            }

            if self.is_delimiter(token) {
                continue;
            }

            let Some(arity) = self.actions.get(token).map(|action| action.arity) else {
                return Err(Error::Failure(format!("unknown action: {token}")));
            };
            self.push_context(token);

            let flow = match arity {
                Arity::Exactly(n) => self.consume_exactly(token, n, &mut stream)?,
                Arity::AtLeast(n) => self.consume_at_least(token, n, &mut stream)?,
            };
            if let Flow::Stop(outcome) = flow {
                return Ok(outcome);
            }
        }

        self.validate_arguments(first_new)?;
        Ok(ParseOutcome::Ok)
    }

    /// Parse a full `argv`, skipping the program name.
    pub fn parse_argv<I, S>(&mut self, argv: I) -> Result<ParseOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse(argv.into_iter().skip(1))
    }

    /// Push a context for `name` holding private copies of its flags.
    fn push_context(&mut self, name: &str) {
        let Some(action) = self.actions.get(name) else {
            return;
        };
        let flags = &mut self.flags;
        let scope = action.flags.remapped(|id| {
            let copy = flags[id.0].clone();
            flags.push(copy);
            FlagId(flags.len() - 1)
        });

        self.contexts.push(Context::for_action(name, scope));
        self.current = self.contexts.len() - 1;
        tracing::debug!(action = name, context = self.current, "parsed action");
    }

    fn consume_exactly(&mut self, action: &str, arity: usize, stream: &mut Tokens<'_>) -> Result<Flow> {
        let mut remaining = arity;
        while remaining > 0 {
            let Some(token) = stream.next() else {
                return Err(Error::Failure(format!(
                    "expected {arity} parameters for action {action}. Only read {}.",
                    arity - remaining
                )));
            };

            if is_flag_token(token) {
                if let Flow::Stop(outcome) = self.parse_flag(token, stream)? {
                    return Ok(Flow::Stop(outcome));
                }
            } else if self.is_action(token) {
                return Err(Error::Failure(format!(
                    "expected parameter for action: {action}. Found action: {token}"
                )));
            } else if self.is_delimiter(token) {
                return Err(Error::Failure(format!(
                    "expected parameter for action: {action}. Found delimiter: {token}"
                )));
            } else {
                self.contexts[self.current].arguments.push(token.to_string());
                remaining -= 1;
            }
        }
        Ok(Flow::Continue)
    }

    fn consume_at_least(&mut self, action: &str, arity: usize, stream: &mut Tokens<'_>) -> Result<Flow> {
        let mut read = 0usize;
        while let Some(next) = stream.peek() {
            if self.is_delimiter(next) || self.is_action(next) {
                break;
            }
            stream.next();

            if is_flag_token(next) {
                if let Flow::Stop(outcome) = self.parse_flag(next, stream)? {
                    return Ok(Flow::Stop(outcome));
                }
            } else {
                self.contexts[self.current].arguments.push(next.to_string());
                read += 1;
            }
        }

        if read < arity {
            return Err(Error::Failure(format!(
                "expected at least {arity} parameters for action {action}. Only read {read}."
            )));
        }
        Ok(Flow::Continue)
    }

    fn parse_flag(&mut self, token: &str, stream: &mut Tokens<'_>) -> Result<Flow> {
        let (name, inline) = split_flag(token);

        if is_verbosity_run(name) {
            if inline.is_some() {
                return Err(Error::Failure(format!(
                    "verbosity flag does not take a value: {token}"
                )));
            }
            self.set_verbosity(name.len() as i64)?;
            return Ok(Flow::Continue);
        }

        if name == "help" || name == "h" {
            self.help_action = self.contexts[self.current].action.clone();
            return Ok(Flow::Stop(ParseOutcome::Help));
        }

        if name == VERSION || self.config.version_alias.as_deref() == Some(name) {
            return Ok(Flow::Stop(ParseOutcome::Version));
        }

        let Some(id) = self.resolve(name) else {
            return Err(Error::Failure(format!("unknown flag: {token}")));
        };
        let ty = self.flags[id.0].flag_type();

        let value = match (ty, inline) {
            (FlagType::Bool, None) => FlagValue::Bool(true),
            (FlagType::Bool, Some(raw)) => coerce(ty, raw).ok_or_else(|| {
                Error::Failure(format!(
                    "flag '{name}' is boolean and does not accept the value '{raw}'"
                ))
            })?,
            (_, inline) => {
                let raw = match inline {
                    Some(raw) => raw,
                    None => stream.next().ok_or_else(|| {
                        Error::Failure(format!("missing value for flag: {token}"))
                    })?,
                };
                coerce(ty, raw).ok_or_else(|| {
                    Error::InvalidFlag(format!("flag '{name}' expects a value of type {ty}"))
                })?
            }
        };

        let raises_verbosity =
            value == FlagValue::Bool(true) && self.global_flag(VERBOSE) == Some(id);
        self.assign(id, name, value)?;
        if raises_verbosity {
            self.ensure_min_verbosity()?;
        }
        Ok(Flow::Continue)
    }

    fn validate_arguments(&self, first_new: usize) -> Result<()> {
        for context in self.contexts.iter().skip(first_new) {
            let Some(action) = context.action.as_deref().and_then(|name| self.actions.get(name)) else {
                continue;
            };
            let Some(validator) = &action.arguments_validator else {
                continue;
            };
            validator(&context.arguments).map_err(|err| Error::ActionArgumentsValidation {
                action: action.name.clone(),
                message: format!("{err:#}"),
            })?;
        }
        Ok(())
    }
}

use indexmap::IndexMap;

use crate::action::Action;
use crate::context::{Context, GLOBAL};
use crate::error::{Error, Result};
use crate::flag::{
    Flag, FlagId, FlagKind, FlagType, FlagValidator, FlagValue, erase_validator, split_aliases,
};

pub(crate) const HELP_ALIASES: &str = "h help";
pub(crate) const VERBOSE: &str = "verbose";
pub(crate) const VLEVEL: &str = "vlevel";
pub(crate) const VERSION: &str = "version";

/// Application level settings consumed by the parser and the help renderer.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub app_name: String,
    pub help_banner: String,
    /// Printed for `--version`. Empty means no version flag is listed in help.
    pub version: String,
    /// Extra alias that also triggers the version short-circuit (e.g. `V`).
    pub version_alias: Option<String>,
    /// Literal tokens separating chained actions.
    pub delimiters: Vec<String>,
}

/// Flag and action registries plus the context stack built by parsing.
///
/// Flags live in a single arena owned by the whisperer; scopes and contexts
/// refer to them by index. Every parsed action occurrence receives its own
/// copies of the action's flags.
#[derive(Debug)]
pub struct Whisperer {
    pub(crate) config: Config,
    pub(crate) flags: Vec<Flag>,
    pub(crate) actions: IndexMap<String, Action>,
    pub(crate) contexts: Vec<Context>,
    /// Context used to resolve flag names before falling back to the global one.
    pub(crate) current: usize,
    /// First context not yet handed to the dispatcher.
    pub(crate) next_dispatch: usize,
    /// Action occurrence `--help` appeared in during the last parse.
    pub(crate) help_action: Option<String>,
}

impl Default for Whisperer {
    fn default() -> Self {
        Self::new()
    }
}

impl Whisperer {
    /// Create an empty whisperer holding only the builtin `help`, `verbose`
    /// and `vlevel` flags.
    pub fn new() -> Self {
        let mut whisperer = Self {
            config: Config::default(),
            flags: Vec::new(),
            actions: IndexMap::new(),
            contexts: vec![Context::global()],
            current: GLOBAL,
            next_dispatch: GLOBAL,
            help_action: None,
        };
        whisperer.define_global_flag(HELP_ALIASES, "Shows this message.", false);
        let vlevel = whisperer.bind_global(VLEVEL, "", FlagValue::Int(0), None);
        whisperer.flags[vlevel.0].hidden = true;
        whisperer.define_global_flag(VERBOSE, "Set verbose output", false);
        whisperer
    }

    pub fn with_config(config: Config) -> Self {
        let mut whisperer = Self::new();
        whisperer.config = config;
        if !whisperer.config.version.is_empty() {
            whisperer.register_version_flag();
        }
        whisperer
    }

    /// Drop every flag, action and context, returning to the state of [`Whisperer::new`].
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_app_name(&mut self, name: impl Into<String>) {
        self.config.app_name = name.into();
    }

    pub fn set_help_banner(&mut self, banner: impl Into<String>) {
        self.config.help_banner = banner.into();
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.config.version = version.into();
        self.register_version_flag();
    }

    pub fn set_version_alias(&mut self, alias: impl Into<String>) {
        self.config.version_alias = Some(alias.into());
        if !self.config.version.is_empty() {
            self.register_version_flag();
        }
    }

    pub fn set_delimiters<I, S>(&mut self, delimiters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.delimiters = delimiters.into_iter().map(Into::into).collect();
    }

    pub fn is_delimiter(&self, token: &str) -> bool {
        self.config.delimiters.iter().any(|d| d == token)
    }

    fn register_version_flag(&mut self) {
        let mut aliases = VERSION.to_string();
        if let Some(alias) = &self.config.version_alias {
            aliases = format!("{alias} {aliases}");
        }
        self.define_global_flag(&aliases, "Display version information", false);
    }

    fn push_flag(
        &mut self,
        aliases: &str,
        description: &str,
        default: FlagValue,
        validator: Option<FlagValidator>,
    ) -> (FlagId, Vec<String>) {
        let aliases = split_aliases(aliases);
        let id = FlagId(self.flags.len());
        self.flags
            .push(Flag::new(aliases.clone(), description, default, validator));
        (id, aliases)
    }

    fn bind_global(
        &mut self,
        aliases: &str,
        description: &str,
        default: FlagValue,
        validator: Option<FlagValidator>,
    ) -> FlagId {
        let (id, aliases) = self.push_flag(aliases, description, default, validator);
        self.contexts[GLOBAL].flags.bind(&aliases, id);
        id
    }

    fn bind_action(
        &mut self,
        action: &str,
        aliases: &str,
        description: &str,
        default: FlagValue,
        validator: Option<FlagValidator>,
    ) -> Result<()> {
        if !self.actions.contains_key(action) {
            return Err(Error::UndefinedAction(action.to_string()));
        }
        let (id, aliases) = self.push_flag(aliases, description, default, validator);
        if let Some(entry) = self.actions.get_mut(action) {
            entry.flags.bind(&aliases, id);
        }
        Ok(())
    }

    /// Define a global flag under every whitespace separated alias in `aliases`.
    ///
    /// Reusing an alias rebinds it to the new flag.
    pub fn define_global_flag<T: FlagKind>(&mut self, aliases: &str, description: &str, default: T) {
        self.bind_global(aliases, description, default.into_value(), None);
    }

    /// Like [`Whisperer::define_global_flag`], with a validator run on every assignment.
    pub fn define_global_flag_with<T, F>(
        &mut self,
        aliases: &str,
        description: &str,
        default: T,
        validator: F,
    ) where
        T: FlagKind,
        F: Fn(&T) -> anyhow::Result<()> + 'static,
    {
        self.bind_global(
            aliases,
            description,
            default.into_value(),
            Some(erase_validator(validator)),
        );
    }

    /// Define a flag local to `action`. The action must already be defined.
    pub fn define_action_flag<T: FlagKind>(
        &mut self,
        action: &str,
        aliases: &str,
        description: &str,
        default: T,
    ) -> Result<()> {
        self.bind_action(action, aliases, description, default.into_value(), None)
    }

    pub fn define_action_flag_with<T, F>(
        &mut self,
        action: &str,
        aliases: &str,
        description: &str,
        default: T,
        validator: F,
    ) -> Result<()>
    where
        T: FlagKind,
        F: Fn(&T) -> anyhow::Result<()> + 'static,
    {
        self.bind_action(
            action,
            aliases,
            description,
            default.into_value(),
            Some(erase_validator(validator)),
        )
    }

    /// Register `action`, replacing (flags included) any action of the same name.
    pub fn define_action(&mut self, action: Action) {
        tracing::debug!(action = %action.name, arity = %action.arity, "defining action");
        self.actions.insert(action.name.clone(), action);
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn is_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Resolve a flag name in the current context, then in the global one.
    pub(crate) fn resolve(&self, name: &str) -> Option<FlagId> {
        self.contexts
            .get(self.current)
            .and_then(|context| context.flags.get(name))
            .or_else(|| self.contexts[GLOBAL].flags.get(name))
    }

    fn lookup(&self, name: &str) -> Result<FlagId> {
        self.resolve(name)
            .ok_or_else(|| Error::UndefinedFlag(name.to_string()))
    }

    pub fn flag_value(&self, name: &str) -> Result<&FlagValue> {
        let id = self.lookup(name)?;
        Ok(&self.flags[id.0].value)
    }

    pub fn flag_type(&self, name: &str) -> Result<FlagType> {
        let id = self.lookup(name)?;
        Ok(self.flags[id.0].flag_type())
    }

    pub fn get_flag<T: FlagKind>(&self, name: &str) -> Result<T> {
        let value = self.flag_value(name)?;
        T::from_value(value).ok_or_else(|| Error::FlagType {
            flag: name.to_string(),
            expected: T::TYPE,
            actual: value.flag_type(),
        })
    }

    /// Validate and store `value`. On rejection the previous value is kept.
    pub fn set_flag<T: FlagKind>(&mut self, name: &str, value: T) -> Result<()> {
        let id = self.lookup(name)?;
        let actual = self.flags[id.0].flag_type();
        if actual != T::TYPE {
            return Err(Error::FlagType {
                flag: name.to_string(),
                expected: T::TYPE,
                actual,
            });
        }
        self.assign(id, name, value.into_value())
    }

    pub(crate) fn assign(&mut self, id: FlagId, name: &str, value: FlagValue) -> Result<()> {
        if let Some(validator) = self.flags[id.0].validator.clone() {
            validator(&value).map_err(|err| Error::FlagValidation {
                flag: name.to_string(),
                message: format!("{err:#}"),
            })?;
        }
        self.flags[id.0].value = value;
        Ok(())
    }

    pub(crate) fn global_flag(&self, name: &str) -> Option<FlagId> {
        self.contexts[GLOBAL].flags.get(name)
    }

    fn assign_global(&mut self, name: &str, value: FlagValue) -> Result<()> {
        let id = self
            .global_flag(name)
            .ok_or_else(|| Error::UndefinedFlag(name.to_string()))?;
        let actual = self.flags[id.0].flag_type();
        if actual != value.flag_type() {
            return Err(Error::FlagType {
                flag: name.to_string(),
                expected: value.flag_type(),
                actual,
            });
        }
        self.assign(id, name, value)
    }

    /// Turn on `verbose` and set `vlevel`.
    pub(crate) fn set_verbosity(&mut self, level: i64) -> Result<()> {
        self.assign_global(VERBOSE, FlagValue::Bool(true))?;
        self.assign_global(VLEVEL, FlagValue::Int(level))
    }

    /// `--verbose` implies a verbosity level of at least one.
    pub(crate) fn ensure_min_verbosity(&mut self) -> Result<()> {
        let level = match self.global_flag(VLEVEL).map(|id| &self.flags[id.0].value) {
            Some(FlagValue::Int(level)) => *level,
            _ => return Ok(()),
        };
        if level < 1 {
            self.assign_global(VLEVEL, FlagValue::Int(1))?;
        }
        Ok(())
    }

    /// Names of the parsed action occurrences, in input order.
    pub fn parsed_actions(&self) -> Vec<&str> {
        self.contexts
            .iter()
            .filter_map(|context| context.action.as_deref())
            .collect()
    }

    /// Action of the context flag lookups currently resolve against.
    pub fn current_action(&self) -> Option<&str> {
        self.contexts
            .get(self.current)
            .and_then(|context| context.action.as_deref())
    }

    /// Positional arguments of the current context.
    pub fn arguments(&self) -> &[String] {
        self.contexts
            .get(self.current)
            .map(|context| context.arguments.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Arity;

    fn prepare_global() -> Whisperer {
        let mut app = Whisperer::new();
        app.set_app_name("test-app");
        app.define_global_flag("global-get", "a test flag", false);
        app.define_global_flag("global-int", "an int flag", 1i64);
        app.define_global_flag("global-double", "a double flag", 1.1f64);
        app.define_global_flag("global-string", "a string flag", "bar".to_string());
        app
    }

    #[test]
    fn unset_flags_return_their_defaults() {
        let app = prepare_global();
        assert!(!app.get_flag::<bool>("global-get").unwrap());
        assert_eq!(app.get_flag::<i64>("global-int").unwrap(), 1);
        assert_eq!(app.get_flag::<f64>("global-double").unwrap(), 1.1);
        assert_eq!(app.get_flag::<String>("global-string").unwrap(), "bar");
        assert!(!app.get_flag::<bool>("help").unwrap());
        assert_eq!(app.get_flag::<i64>("vlevel").unwrap(), 0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut app = prepare_global();
        app.set_flag("global-get", true).unwrap();
        app.set_flag("global-int", 42i64).unwrap();
        app.set_flag("global-double", 3.14f64).unwrap();
        app.set_flag("global-string", "foo".to_string()).unwrap();

        assert!(app.get_flag::<bool>("global-get").unwrap());
        assert_eq!(app.get_flag::<i64>("global-int").unwrap(), 42);
        assert_eq!(app.get_flag::<f64>("global-double").unwrap(), 3.14);
        assert_eq!(app.get_flag::<String>("global-string").unwrap(), "foo");
    }

    #[test]
    fn undefined_flags_are_reported() {
        let mut app = prepare_global();
        assert!(matches!(
            app.get_flag::<bool>("not-global-get"),
            Err(Error::UndefinedFlag(name)) if name == "not-global-get"
        ));
        assert!(matches!(
            app.set_flag("not-global-get", false),
            Err(Error::UndefinedFlag(_))
        ));
    }

    #[test]
    fn wrong_rust_type_is_an_error() {
        let mut app = prepare_global();
        assert!(matches!(
            app.get_flag::<i64>("global-get"),
            Err(Error::FlagType {
                expected: FlagType::Int,
                actual: FlagType::Bool,
                ..
            })
        ));
        assert!(app.set_flag("global-int", "7".to_string()).is_err());
        assert_eq!(app.get_flag::<i64>("global-int").unwrap(), 1);
    }

    #[test]
    fn flag_types_are_reported() {
        let app = prepare_global();
        assert_eq!(app.flag_type("global-get").unwrap(), FlagType::Bool);
        assert_eq!(app.flag_type("global-int").unwrap(), FlagType::Int);
        assert_eq!(app.flag_type("global-double").unwrap(), FlagType::Double);
        assert_eq!(app.flag_type("global-string").unwrap(), FlagType::String);
    }

    #[test]
    fn accepting_validator_lets_value_through() {
        let mut app = prepare_global();
        app.define_global_flag_with("global-success", "a test flag", false, |_: &bool| Ok(()));
        app.set_flag("global-success", true).unwrap();
        assert!(app.get_flag::<bool>("global-success").unwrap());
    }

    #[test]
    fn rejecting_validator_keeps_previous_value() {
        let mut app = prepare_global();
        app.define_global_flag_with("ponies", "all the ponies", 1i64, |n: &i64| {
            anyhow::ensure!(*n <= 5, "You have assigned too many ponies!");
            Ok(())
        });
        app.set_flag("ponies", 4i64).unwrap();

        let err = app.set_flag("ponies", 6i64).unwrap_err();
        match err {
            Error::FlagValidation { flag, message } => {
                assert_eq!(flag, "ponies");
                assert_eq!(message, "You have assigned too many ponies!");
            }
            other => panic!("expected FlagValidation, got: {other:?}"),
        }
        assert_eq!(app.get_flag::<i64>("ponies").unwrap(), 4);
    }

    #[test]
    fn validator_error_chain_is_kept_in_message() {
        let mut app = prepare_global();
        app.define_global_flag_with("name", "a name", String::new(), |_: &String| {
            Err(anyhow::anyhow!("empty").context("name rejected"))
        });
        let err = app.set_flag("name", "x".to_string()).unwrap_err();
        assert_eq!(err.to_string(), "invalid value for flag 'name': name rejected: empty");
    }

    #[test]
    fn aliases_share_one_flag() {
        let mut app = prepare_global();
        app.define_global_flag("a alias", "aliased flag", false);
        app.set_flag("a", true).unwrap();
        assert!(app.get_flag::<bool>("a").unwrap());
        assert!(app.get_flag::<bool>("alias").unwrap());
    }

    #[test]
    fn redefinition_rebinds_alias() {
        let mut app = prepare_global();
        app.define_global_flag("global-get", "now an int", 9i64);
        assert_eq!(app.flag_type("global-get").unwrap(), FlagType::Int);
        assert_eq!(app.get_flag::<i64>("global-get").unwrap(), 9);
    }

    #[test]
    fn action_flags_require_a_defined_action() {
        let mut app = prepare_global();
        let err = app
            .define_action_flag("missing", "tired", "are the horses tired?", false)
            .unwrap_err();
        assert!(matches!(err, Error::UndefinedAction(name) if name == "missing"));

        app.define_action(Action::new("gallop", Arity::Exactly(0)));
        app.define_action_flag("gallop", "tired", "are the horses tired?", false)
            .unwrap();
        // Action flags are only visible from inside an occurrence.
        assert!(app.get_flag::<bool>("tired").is_err());
    }

    #[test]
    fn reset_drops_user_definitions() {
        let mut app = prepare_global();
        app.define_action(Action::new("gallop", Arity::Exactly(0)));
        app.set_delimiters(["+"]);
        app.reset();

        assert!(matches!(
            app.get_flag::<bool>("global-get"),
            Err(Error::UndefinedFlag(_))
        ));
        assert!(!app.is_action("gallop"));
        assert!(!app.is_delimiter("+"));
        assert!(!app.get_flag::<bool>("help").unwrap());
        assert!(!app.get_flag::<bool>("verbose").unwrap());
        assert_eq!(app.get_flag::<i64>("vlevel").unwrap(), 0);
    }

    #[test]
    fn delimiters_are_configurable() {
        let mut app = prepare_global();
        assert!(!app.is_delimiter(","));

        app.set_delimiters([",", "*"]);
        assert!(app.is_delimiter(","));
        assert!(app.is_delimiter("*"));
        assert!(!app.is_delimiter("+"));
    }

    #[test]
    fn version_registers_a_listed_flag() {
        let mut app = Whisperer::with_config(Config {
            app_name: "MyProg".to_string(),
            version: "0.1.0".to_string(),
            version_alias: Some("V".to_string()),
            ..Default::default()
        });
        assert_eq!(app.flag_type("version").unwrap(), FlagType::Bool);
        assert_eq!(app.flag_type("V").unwrap(), FlagType::Bool);

        app.set_version("0.2.0");
        assert_eq!(app.config().version, "0.2.0");
    }
}

//! Typed flag values, flag records and alias scopes.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// The closed set of types a flag can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    Bool,
    Int,
    Double,
    String,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

/// Current or default value of a flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl FlagValue {
    pub fn flag_type(&self) -> FlagType {
        match self {
            Self::Bool(_) => FlagType::Bool,
            Self::Int(_) => FlagType::Int,
            Self::Double(_) => FlagType::Double,
            Self::String(_) => FlagType::String,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

/// Rust types that can back a flag.
pub trait FlagKind: Sized + 'static {
    const TYPE: FlagType;

    fn into_value(self) -> FlagValue;

    /// Extract `Self` from a value of the matching variant.
    fn from_value(value: &FlagValue) -> Option<Self>;
}

impl FlagKind for bool {
    const TYPE: FlagType = FlagType::Bool;

    fn into_value(self) -> FlagValue {
        FlagValue::Bool(self)
    }

    fn from_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagKind for i64 {
    const TYPE: FlagType = FlagType::Int;

    fn into_value(self) -> FlagValue {
        FlagValue::Int(self)
    }

    fn from_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagKind for f64 {
    const TYPE: FlagType = FlagType::Double;

    fn into_value(self) -> FlagValue {
        FlagValue::Double(self)
    }

    fn from_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl FlagKind for String {
    const TYPE: FlagType = FlagType::String;

    fn into_value(self) -> FlagValue {
        FlagValue::String(self)
    }

    fn from_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

pub(crate) type FlagValidator = Rc<dyn Fn(&FlagValue) -> anyhow::Result<()>>;

/// Erase a typed validator so it can be stored next to any flag.
pub(crate) fn erase_validator<T, F>(validator: F) -> FlagValidator
where
    T: FlagKind,
    F: Fn(&T) -> anyhow::Result<()> + 'static,
{
    Rc::new(move |value: &FlagValue| match T::from_value(value) {
        Some(typed) => validator(&typed),
        None => Ok(()),
    })
}

/// Index of a flag record in the owning arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FlagId(pub(crate) usize);

#[derive(Clone)]
pub(crate) struct Flag {
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) value: FlagValue,
    pub(crate) default: FlagValue,
    pub(crate) validator: Option<FlagValidator>,
    pub(crate) hidden: bool,
}

impl Flag {
    pub(crate) fn new(
        aliases: Vec<String>,
        description: &str,
        default: FlagValue,
        validator: Option<FlagValidator>,
    ) -> Self {
        Self {
            aliases,
            description: description.to_string(),
            value: default.clone(),
            default,
            validator,
            hidden: false,
        }
    }

    pub(crate) fn flag_type(&self) -> FlagType {
        self.default.flag_type()
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("aliases", &self.aliases)
            .field("value", &self.value)
            .field("default", &self.default)
            .field("validated", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// Whitespace separated alias list, e.g. `"h help"`.
pub(crate) fn split_aliases(aliases: &str) -> Vec<String> {
    aliases.split_whitespace().map(str::to_string).collect()
}

/// Alias bindings of one scope (global context, action template or action
/// occurrence). Later bindings for an alias replace earlier ones.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlagScope {
    by_alias: IndexMap<String, FlagId>,
    order: Vec<FlagId>,
}

impl FlagScope {
    pub(crate) fn bind(&mut self, aliases: &[String], id: FlagId) {
        for alias in aliases {
            self.by_alias.insert(alias.clone(), id);
        }
        if !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    pub(crate) fn get(&self, alias: &str) -> Option<FlagId> {
        self.by_alias.get(alias).copied()
    }

    /// Flags in definition order that are still reachable through an alias.
    pub(crate) fn flags(&self) -> impl Iterator<Item = FlagId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|id| self.by_alias.values().any(|bound| bound == id))
    }

    /// Rebind every alias through `remap`, keeping alias order.
    pub(crate) fn remapped(&self, mut remap: impl FnMut(FlagId) -> FlagId) -> Self {
        let mut out = Self::default();
        for id in self.flags() {
            let copy = remap(id);
            let aliases: Vec<String> = self
                .by_alias
                .iter()
                .filter(|(_, bound)| **bound == id)
                .map(|(alias, _)| alias.clone())
                .collect();
            out.bind(&aliases, copy);
        }
        out
    }
}

/// Parse an integer flag value: optional leading `-`, then ASCII digits only.
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Parse a floating point flag value: optional leading `-`, then a digit or
/// `.`. The whole string must parse, so `inf` and `nan` never do.
pub(crate) fn parse_double(raw: &str) -> Option<f64> {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let first = unsigned.chars().next()?;
    if !(first.is_ascii_digit() || first == '.') {
        return None;
    }
    raw.parse().ok()
}

/// Coerce raw text into a value of `ty`. Bool flags never take a separate value
/// token, so only the inline `=true` / `=false` forms are accepted here.
pub(crate) fn coerce(ty: FlagType, raw: &str) -> Option<FlagValue> {
    match ty {
        FlagType::Bool => match raw {
            "true" => Some(FlagValue::Bool(true)),
            "false" => Some(FlagValue::Bool(false)),
            _ => None,
        },
        FlagType::Int => parse_int(raw).map(FlagValue::Int),
        FlagType::Double => parse_double(raw).map(FlagValue::Double),
        FlagType::String => Some(FlagValue::String(raw.to_string())),
    }
}

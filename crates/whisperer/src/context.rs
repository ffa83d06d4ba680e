use crate::flag::FlagScope;

/// Index of the implicit global context.
pub(crate) const GLOBAL: usize = 0;

/// One entry of the context stack: the global context, or one parsed action
/// occurrence with its private flag copies and positional arguments.
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    pub(crate) action: Option<String>,
    pub(crate) flags: FlagScope,
    pub(crate) arguments: Vec<String>,
}

impl Context {
    pub(crate) fn global() -> Self {
        Self::default()
    }

    pub(crate) fn for_action(name: &str, flags: FlagScope) -> Self {
        Self {
            action: Some(name.to_string()),
            flags,
            arguments: Vec::new(),
        }
    }
}

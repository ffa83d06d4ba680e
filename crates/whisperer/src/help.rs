//! Help and version text built from the registries.

use crate::context::GLOBAL;
use crate::flag::{Flag, FlagScope, FlagType};
use crate::whisperer::Whisperer;

fn format_aliases(flag: &Flag) -> String {
    flag.aliases
        .iter()
        .map(|alias| {
            if alias.chars().count() == 1 {
                format!("-{alias}")
            } else {
                format!("--{alias}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_flag_help(flag: &Flag) -> String {
    let mut out = flag.description.trim().to_string();
    if flag.flag_type() != FlagType::Bool {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("[default: {}]", flag.default));
    }
    out
}

fn write_table(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}

impl Whisperer {
    fn flag_rows(&self, scope: &FlagScope) -> Vec<(String, String)> {
        scope
            .flags()
            .map(|id| &self.flags[id.0])
            .filter(|flag| !flag.hidden)
            .map(|flag| (format_aliases(flag), format_flag_help(flag)))
            .collect()
    }

    /// Help for the place `--help` appeared in during the last parse: the
    /// action's own help inside an occurrence, the global help otherwise.
    pub fn help_text(&self) -> String {
        match self
            .help_action
            .as_deref()
            .and_then(|name| self.action_help(name))
        {
            Some(text) => text,
            None => self.global_help(),
        }
    }

    pub fn global_help(&self) -> String {
        let mut out = String::new();
        if !self.config.help_banner.trim().is_empty() {
            out.push_str(self.config.help_banner.trim_end());
            out.push_str("\n\n");
        }

        out.push_str("Global options:\n");
        write_table(&mut out, &self.flag_rows(&self.contexts[GLOBAL].flags));

        if !self.actions.is_empty() {
            out.push_str("\nActions:\n");
            let rows: Vec<(String, String)> = self
                .actions
                .values()
                .map(|action| (action.name.clone(), action.description.trim().to_string()))
                .collect();
            write_table(&mut out, &rows);
        }

        for action in self.actions.values() {
            let rows = self.flag_rows(&action.flags);
            if rows.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{} action options:\n", action.name));
            write_table(&mut out, &rows);
        }

        let app = if self.config.app_name.is_empty() {
            "<app>"
        } else {
            self.config.app_name.as_str()
        };
        out.push_str(&format!(
            "\nFor action specific help run \"{app} <action> --help\"\n"
        ));
        out
    }

    /// Help for a single action, or `None` if it is not defined.
    pub fn action_help(&self, name: &str) -> Option<String> {
        let action = self.actions.get(name)?;
        if action.help.trim().is_empty() {
            return Some(format!("No specific help found for action: {name}\n"));
        }

        let mut out = action.help.trim_end().to_string();
        out.push('\n');
        let rows = self.flag_rows(&action.flags);
        if !rows.is_empty() {
            out.push_str(&format!("\n{name} specific flags:\n"));
            write_table(&mut out, &rows);
        }
        Some(out)
    }

    pub fn version_text(&self) -> String {
        let version = self.config.version.trim_end();
        if version.is_empty() {
            format!("{}\n", self.config.app_name)
        } else {
            format!("{version}\n")
        }
    }
}

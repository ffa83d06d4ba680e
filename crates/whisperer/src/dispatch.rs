//! Sequential execution of parsed action occurrences.

use crate::whisperer::Whisperer;

/// Exit code reported when nothing could be run or a callback is missing.
pub const EXIT_FAILURE: i32 = 1;

impl Whisperer {
    /// Invoke the callback of every parsed action occurrence in order and
    /// return the last observed exit code.
    ///
    /// Once an action fails, the following actions are skipped. An action
    /// that is not chainable ends the run after it executes (or is skipped).
    ///
    /// Callbacks may parse further input; the new occurrences are dispatched
    /// after the callback returns unless the callback runs them itself. Each
    /// occurrence is dispatched at most once.
    pub fn run(&mut self) -> i32 {
        let pending = self.contexts[self.next_dispatch..]
            .iter()
            .any(|context| context.action.is_some());
        if !pending {
            tracing::warn!(
                "No action specified. See \"{} --help\" for available actions.",
                self.config.app_name
            );
            return EXIT_FAILURE;
        }

        let mut result = 0;
        while self.next_dispatch < self.contexts.len() {
            let index = self.next_dispatch;
            self.next_dispatch += 1;

            let Some(name) = self.contexts[index].action.clone() else {
                continue;
            };
            let Some(action) = self.actions.get(&name) else {
                tracing::error!(action = %name, "action is no longer defined");
                result = EXIT_FAILURE;
                continue;
            };
            let chainable = action.chainable;
            let callback = action.callback.clone();

            if result != 0 {
                tracing::warn!(
                    "Not starting action '{name}'. Previous action failed to complete successfully."
                );
            } else if let Some(callback) = callback {
                tracing::debug!(action = %name, context = index, "running action");
                let arguments = self.contexts[index].arguments.clone();
                let saved = self.current;
                self.current = index;
                result = callback(self, &arguments);
                self.current = saved;
                tracing::debug!(action = %name, exit_code = result, "action finished");
            } else {
                tracing::error!(action = %name, "no callback bound to action");
                result = EXIT_FAILURE;
            }

            if !chainable {
                let skipped = self.contexts[self.next_dispatch..]
                    .iter()
                    .filter(|context| context.action.is_some())
                    .count();
                if skipped > 0 {
                    tracing::warn!(
                        "Action '{name}' is not chainable; {skipped} following action(s) will not run."
                    );
                }
                self.next_dispatch = self.contexts.len();
                break;
            }
        }

        result
    }
}

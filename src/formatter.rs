//! Help layout policy.

use clap::Arg;

use crate::argument::Binding;
use crate::config::HelpSettings;

/// Wide-terminal help layout with default values shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    pub indent_increment: usize,
    /// Column cap for help text; longer invocations push help to the next line
    pub max_help_position: usize,
    pub width: usize,
    pub show_defaults: bool,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            indent_increment: 2,
            max_help_position: 48,
            width: 140,
            show_defaults: true,
        }
    }
}

impl From<&HelpSettings> for Formatter {
    fn from(settings: &HelpSettings) -> Self {
        Self {
            indent_increment: settings.indent_increment,
            max_help_position: settings.max_help_position,
            width: settings.width,
            show_defaults: settings.show_defaults,
        }
    }
}

impl Formatter {
    /// Column at which help text starts.
    pub fn help_position(&self) -> usize {
        self.max_help_position
            .min(self.width.saturating_sub(20).max(self.indent_increment * 2))
    }

    /// Whether an argument list overflows the help column.
    pub(crate) fn needs_next_line(&self, bindings: &[Binding]) -> bool {
        bindings
            .iter()
            .map(|b| self.indent_increment + b.invocation().len() + 2)
            .any(|w| w > self.help_position())
    }

    pub(crate) fn layout(&self, parser: clap::Command, bindings: &[Binding]) -> clap::Command {
        parser
            .term_width(self.width)
            .max_term_width(self.width)
            .next_line_help(self.needs_next_line(bindings))
    }

    pub(crate) fn argument(&self, binding: &Binding) -> Arg {
        binding.to_arg(self.show_defaults)
    }
}

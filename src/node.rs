//! Registration and resolution shared by the root command and sub-commands.

use std::collections::HashSet;
use std::sync::Arc;

use clap::parser::MatchesError;
use clap::{Arg, ArgAction, ArgMatches};
use tracing::debug;

use crate::argument::{ArgumentSpec, Binding};
use crate::declaration::CommandSpec;
use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::formatter::Formatter;
use crate::handler::{Handler, PrintHelp};
use crate::namespace::{Namespace, Value};
use crate::subcommand::SubCommand;

pub(crate) const HELP_ID: &str = "help";
pub(crate) const VERSION_ID: &str = "version";

/// Handle through which sub-commands register under a parent parser.
///
/// Names and aliases must be unique within one group.
pub struct SubcommandGroup {
    parent: String,
    parsers: Vec<clap::Command>,
    names: HashSet<String>,
}

impl SubcommandGroup {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            parsers: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Claim `name` and its aliases before the sub-command's parser is built.
    pub(crate) fn reserve(&mut self, name: &str, aliases: &[String]) -> ConfigurationResult<()> {
        for candidate in std::iter::once(name).chain(aliases.iter().map(String::as_str)) {
            if !self.names.insert(candidate.to_string()) {
                return Err(ConfigurationError::DuplicateCommand {
                    parent: self.parent.clone(),
                    name: candidate.to_string(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn push(&mut self, parser: clap::Command) {
        self.parsers.push(parser);
    }

    /// Add every registered sub-command to `parser`, in registration order.
    pub fn attach(self, parser: clap::Command) -> clap::Command {
        parser.subcommands(self.parsers)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

/// A dispatchable node: its arguments, handler and children.
pub(crate) struct Node {
    name: String,
    bindings: Vec<Binding>,
    handler: Arc<dyn Handler>,
    children: Vec<SubCommand>,
    /// Namespace key recording which child matched
    group_dest: Option<String>,
}

impl Node {
    /// Register `arguments` on `parser` in declaration order.
    ///
    /// Every node gets `-h/--help`; ids in `reserved` and their option strings
    /// cannot be reused.
    pub(crate) fn register_arguments(
        parser: clap::Command,
        name: &str,
        arguments: &[ArgumentSpec],
        formatter: &Formatter,
        reserved: &[&str],
    ) -> ConfigurationResult<(clap::Command, Vec<Binding>)> {
        let mut seen: HashSet<String> = reserved.iter().map(|id| id.to_string()).collect();
        let mut flags: HashSet<String> = reserved
            .iter()
            .flat_map(|id| reserved_flags(id))
            .map(|flag| flag.to_string())
            .collect();
        let mut bindings = Vec::with_capacity(arguments.len());
        for spec in arguments {
            let binding = spec.bind(name)?;
            if !seen.insert(binding.dest().to_string()) {
                return Err(ConfigurationError::DuplicateArgument {
                    command: name.to_string(),
                    dest: binding.dest().to_string(),
                });
            }
            for flag in binding.option_strings() {
                if !flags.insert(flag.clone()) {
                    return Err(ConfigurationError::DuplicateFlag {
                        command: name.to_string(),
                        flag,
                    });
                }
            }
            bindings.push(binding);
        }
        check_positional_order(name, &bindings)?;

        let mut parser = formatter
            .layout(parser, &bindings)
            .disable_help_flag(true)
            .disable_help_subcommand(true)
            .arg(
                Arg::new(HELP_ID)
                    .short('h')
                    .long("help")
                    .action(ArgAction::HelpLong)
                    .help("show this help message and exit"),
            );
        for binding in &bindings {
            debug!(command = name, dest = binding.dest(), "register argument");
            parser = parser.arg(formatter.argument(binding));
        }
        Ok((parser, bindings))
    }

    /// Construct `specs` as children of `parser`, depth first, in declared order.
    pub(crate) fn register_subcommands(
        parser: clap::Command,
        name: &str,
        specs: &[CommandSpec],
        formatter: &Formatter,
    ) -> ConfigurationResult<(clap::Command, Vec<SubCommand>)> {
        if specs.is_empty() {
            return Ok((parser, Vec::new()));
        }

        let mut group = SubcommandGroup::new(name);
        let children = specs
            .iter()
            .map(|spec| SubCommand::new(spec, &mut group, formatter))
            .collect::<ConfigurationResult<Vec<_>>>()?;
        debug!(command = name, count = group.len(), "register sub-commands");
        Ok((group.attach(parser), children))
    }

    pub(crate) fn new(
        name: String,
        bindings: Vec<Binding>,
        handler: Option<Arc<dyn Handler>>,
        children: Vec<SubCommand>,
        group_dest: Option<String>,
    ) -> Self {
        Self {
            name,
            bindings,
            handler: handler.unwrap_or_else(|| Arc::new(PrintHelp)),
            children,
            group_dest,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn children(&self) -> &[SubCommand] {
        &self.children
    }

    /// This node plus all descendants.
    pub(crate) fn count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.node().count())
            .sum::<usize>()
    }

    /// Fill `args` from `matches` and return the handler of the deepest matched node.
    pub(crate) fn resolve<'a>(
        &'a self,
        matches: &ArgMatches,
        args: &mut Namespace,
    ) -> Result<&'a dyn Handler, MatchesError> {
        for binding in &self.bindings {
            if let Some(value) = binding.extract(matches)? {
                args.insert(binding.dest(), value);
            }
        }

        if let Some((name, sub_matches)) = matches.subcommand() {
            if let Some(child) = self.children.iter().find(|c| c.name() == name) {
                if let Some(dest) = &self.group_dest {
                    args.insert(dest.clone(), Value::Text(name.to_string()));
                }
                args.push_command(name);
                return child.node().resolve(sub_matches, args);
            }
        }
        Ok(self.handler.as_ref())
    }
}

/// Option strings clap attaches to a reserved argument id.
fn reserved_flags(id: &str) -> &'static [&'static str] {
    match id {
        HELP_ID => &["-h", "--help"],
        VERSION_ID => &["-V", "--version"],
        _ => &[],
    }
}

/// Positionals are matched left to right: nothing may follow an unbounded one,
/// and a required one may not follow an optional one.
fn check_positional_order(name: &str, bindings: &[Binding]) -> ConfigurationResult<()> {
    let positionals: Vec<&Binding> = bindings.iter().filter(|b| b.is_positional()).collect();
    for pair in positionals.windows(2) {
        let (before, current) = (pair[0], pair[1]);
        if before.is_unbounded() || (!before.is_required() && current.is_required()) {
            return Err(ConfigurationError::PositionalOrder {
                command: name.to_string(),
                name: current.dest().to_string(),
                before: before.dest().to_string(),
            });
        }
    }
    Ok(())
}

//! The explicit configuration record a command node is built from.

use std::fmt;
use std::sync::Arc;

use crate::argument::ArgumentSpec;
use crate::handler::{Context, HandleResult, Handler};
use crate::meta::{Declarative, MetaValue};
use crate::namespace::Namespace;

/// Declaration of a command or sub-command.
///
/// Fields map one-to-one to the attributes in [`crate::meta::COMMAND_ATTRIBUTES`]
/// and [`crate::meta::SUBCOMMAND_ATTRIBUTES`]; `handler` is the dispatch target
/// and falls back to [`crate::handler::PrintHelp`].
///
/// ```
/// use flagparse::{ArgumentSpec, CommandSpec, ExitStatus, Nargs, ValueType};
///
/// let sum = CommandSpec::new("sum")
///     .help("sum the integers at the command line")
///     .argument(
///         ArgumentSpec::positional("integers")
///             .metavar("INT")
///             .value_type(ValueType::Int)
///             .nargs(Nargs::OneOrMore),
///     )
///     .handle_with(|args, ctx| {
///         use std::io::Write;
///         writeln!(ctx, "{}", args.get_ints("integers").iter().sum::<i64>())?;
///         Ok(ExitStatus::Success)
///     });
/// let calc = CommandSpec::new("calc").subcommand(sum);
/// assert_eq!(calc.subcommands.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct CommandSpec {
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub help: Option<String>,
    pub description: Option<String>,
    /// Root command only; adds `-V/--version`
    pub version: Option<String>,
    pub arguments: Vec<ArgumentSpec>,
    pub subcommands: Vec<CommandSpec>,
    pub handler: Option<Arc<dyn Handler>>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("help", &self.help)
            .field("description", &self.description)
            .field("version", &self.version)
            .field("arguments", &self.arguments)
            .field("subcommands", &self.subcommands)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .finish()
    }
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = ArgumentSpec>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn subcommand(mut self, subcommand: CommandSpec) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn subcommands(mut self, subcommands: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.subcommands.extend(subcommands);
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Use a closure as the handler.
    pub fn handle_with<F>(self, handler: F) -> Self
    where
        F: Fn(&Namespace, &mut Context<'_>) -> HandleResult + Send + Sync + 'static,
    {
        self.handler(handler)
    }
}

impl Declarative for CommandSpec {
    fn attribute(&self, name: &str) -> Option<MetaValue> {
        match name {
            "name" => self.name.clone().map(MetaValue::Text),
            "aliases" => non_empty(&self.aliases).map(MetaValue::List),
            "help" => self.help.clone().map(MetaValue::Text),
            "description" => self.description.clone().map(MetaValue::Text),
            "version" => self.version.clone().map(MetaValue::Text),
            "arguments" => non_empty(&self.arguments).map(MetaValue::Arguments),
            "subcommands" => non_empty(&self.subcommands).map(MetaValue::Commands),
            _ => None,
        }
    }
}

fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}

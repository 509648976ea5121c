//! Declarative command trees with sub-command dispatch, built on clap.
//!
//! A program describes its root command and nested sub-commands as
//! [`CommandSpec`] records. [`Command::new`] validates the whole tree and
//! builds the parser eagerly; [`Command::run`] parses an argument vector,
//! invokes the handler of the deepest matched node and maps its result to an
//! exit code.
//!
//! ```
//! use flagparse::{ArgumentSpec, Command, CommandSpec, ExitStatus, Nargs, Outcome, ValueType};
//! use std::io::Write;
//!
//! let calc = Command::new(
//!     CommandSpec::new("calc").subcommand(
//!         CommandSpec::new("sum")
//!             .argument(
//!                 ArgumentSpec::positional("integers")
//!                     .value_type(ValueType::Int)
//!                     .nargs(Nargs::OneOrMore),
//!             )
//!             .handle_with(|args, ctx| {
//!                 writeln!(ctx, "{}", args.get_ints("integers").iter().sum::<i64>())?;
//!                 Ok(ExitStatus::Success)
//!             }),
//!     ),
//! )
//! .unwrap();
//!
//! let (mut out, mut err) = (Vec::new(), Vec::new());
//! let outcome = calc.run(["sum", "3", "4", "5"], &mut out, &mut err);
//! assert_eq!(outcome, Outcome::Success);
//! assert_eq!(out, b"12\n");
//! ```

pub mod argument;
pub mod command;
pub mod config;
pub mod declaration;
pub mod errors;
pub mod exitcode;
pub mod formatter;
pub mod handler;
pub mod meta;
pub mod namespace;
mod node;
pub mod subcommand;
pub mod util;

pub use argument::{Action, ArgOptions, ArgumentSpec, Nargs, ValueType};
pub use command::{Command, Dispatch, Outcome};
pub use crate::config::{HelpSettings, Settings};
pub use declaration::CommandSpec;
pub use errors::{ConfigurationError, ConfigurationResult, DispatchError, SettingsError};
pub use formatter::Formatter;
pub use handler::{Context, ExitSignal, ExitStatus, HandleResult, Handler, PrintHelp};
pub use meta::{AttributeSpec, Declarative, MetaRecord, MetaValue};
pub use namespace::{Namespace, Value};
pub use node::SubcommandGroup;
pub use subcommand::SubCommand;

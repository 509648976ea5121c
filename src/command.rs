//! Root command: owns the parser, dispatches, maps outcomes to exit codes.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use tracing::{debug, instrument};

use crate::declaration::CommandSpec;
use crate::errors::{ConfigurationResult, DispatchError};
use crate::exitcode;
use crate::formatter::Formatter;
use crate::handler::{Context, ExitSignal, ExitStatus, HandleResult, Handler};
use crate::meta::{self, MetaRecord, COMMAND_ATTRIBUTES};
use crate::namespace::Namespace;
use crate::node::{Node, HELP_ID, VERSION_ID};
use crate::subcommand::SubCommand;

/// Terminal state of one dispatch. Maps 1:1 to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(i32),
}

impl Outcome {
    pub fn from_code(code: i32) -> Self {
        if code == exitcode::OK {
            Outcome::Success
        } else {
            Outcome::Failure(code)
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Outcome::Success => exitcode::OK,
            Outcome::Failure(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }

    /// Terminate the process with this outcome's code.
    pub fn exit(self) -> ! {
        std::process::exit(self.code())
    }

    /// Translate a handler result, reporting messages on `err`.
    fn conclude(result: HandleResult, err: &mut dyn Write) -> Self {
        match result {
            Ok(ExitStatus::Success) => Outcome::Success,
            Ok(ExitStatus::Exit(signal)) => Self::signaled(&signal, err),
            Err(e) => match e.downcast_ref::<ExitSignal>() {
                Some(signal) => Self::signaled(signal, err),
                None => {
                    debug!(error = %e, "handler failed");
                    report(err, &format!("{e:#}"));
                    Outcome::Failure(exitcode::FAILURE)
                }
            },
        }
    }

    fn signaled(signal: &ExitSignal, err: &mut dyn Write) -> Self {
        debug!(code = signal.code(), "exit signaled");
        if let Some(message) = signal.message() {
            report(err, message);
        }
        Self::from_code(signal.code())
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        u8::try_from(outcome.code())
            .map(ExitCode::from)
            .unwrap_or(ExitCode::FAILURE)
    }
}

fn report(err: &mut dyn Write, message: &str) {
    writeln!(err, "{message}").ok();
    err.flush().ok();
}

/// Namespace of one parse plus the handler it resolved to.
pub struct Dispatch<'a> {
    pub args: Namespace,
    handler: &'a dyn Handler,
}

impl<'a> Dispatch<'a> {
    pub fn handler(&self) -> &'a dyn Handler {
        self.handler
    }
}

/// Root of a command tree.
///
/// The whole parser tree is built eagerly by the constructor; nothing is
/// registered afterwards.
pub struct Command {
    meta: MetaRecord,
    parser: clap::Command,
    node: Node,
}

impl Command {
    /// Build the command tree declared by `spec` with the default [`Formatter`].
    ///
    /// # Errors
    ///
    /// Any [`crate::ConfigurationError`] in `spec` or its sub-commands.
    pub fn new(spec: CommandSpec) -> ConfigurationResult<Self> {
        Self::with_formatter(spec, Formatter::default())
    }

    /// # Errors
    ///
    /// Any [`crate::ConfigurationError`] in `spec` or its sub-commands.
    #[instrument(level = "debug", skip_all, fields(name = ?spec.name))]
    pub fn with_formatter(spec: CommandSpec, formatter: Formatter) -> ConfigurationResult<Self> {
        let meta = meta::collect(&spec, COMMAND_ATTRIBUTES, "command")?;
        let name = meta.name()?.to_string();

        let mut parser = clap::Command::new(name.clone());
        if let Some(help) = meta.text("help")? {
            parser = parser.about(help.to_string());
        }
        if let Some(description) = meta.text("description")? {
            parser = parser.long_about(description.to_string());
        }
        let version = meta.text("version")?;
        let reserved: &[&str] = match version {
            Some(version) => {
                parser = parser.version(version.to_string());
                &[HELP_ID, VERSION_ID]
            }
            None => &[HELP_ID],
        };

        let (parser, bindings) = Node::register_arguments(
            parser,
            &name,
            meta.arguments("arguments")?,
            &formatter,
            reserved,
        )?;
        let (mut parser, children) =
            Node::register_subcommands(parser, &name, meta.commands("subcommands")?, &formatter)?;
        parser.build();

        let node = Node::new(name, bindings, spec.handler.clone(), children, None);
        debug!(nodes = node.count(), "command tree built");
        Ok(Self { meta, parser, node })
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn meta(&self) -> &MetaRecord {
        &self.meta
    }

    pub fn subcommands(&self) -> &[SubCommand] {
        self.node.children()
    }

    /// The assembled clap parser.
    pub fn parser(&self) -> &clap::Command {
        &self.parser
    }

    /// Number of dispatchable nodes: the root plus every sub-command.
    pub fn node_count(&self) -> usize {
        self.node.count()
    }

    /// Parse `argv` (without program name) and resolve the matched handler.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Parse`] for usage errors and help/version requests.
    pub fn resolve<I, T>(&self, argv: I) -> Result<Dispatch<'_>, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(self.name()))
            .chain(argv.into_iter().map(Into::into));
        let matches = self.parser.clone().try_get_matches_from(argv)?;

        let mut args = Namespace::default();
        let handler = self.node.resolve(&matches, &mut args)?;
        Ok(Dispatch { args, handler })
    }

    /// Parse `argv` (without program name) into a namespace, without dispatching.
    ///
    /// # Errors
    ///
    /// See [`Command::resolve`].
    pub fn parse_args<I, T>(&self, argv: I) -> Result<Namespace, DispatchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.resolve(argv).map(|dispatch| dispatch.args)
    }

    /// Parse `argv`, invoke the matched handler and report on the given streams.
    ///
    /// Never exits the process; the returned outcome carries the exit code.
    #[instrument(level = "debug", skip_all, fields(command = self.name()))]
    pub fn run<I, T>(&self, argv: I, out: &mut dyn Write, err: &mut dyn Write) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let outcome = match self.resolve(argv) {
            Ok(dispatch) => self.dispatch(dispatch, out, err),
            Err(DispatchError::Parse(e)) => {
                let rendered = e.render();
                let stream: &mut dyn Write = if e.use_stderr() { &mut *err } else { &mut *out };
                write!(stream, "{rendered}").ok();
                stream.flush().ok();
                Outcome::from_code(e.exit_code())
            }
            Err(e) => {
                report(err, &e.to_string());
                Outcome::Failure(exitcode::FAILURE)
            }
        };
        out.flush().ok();
        debug!(code = outcome.code(), "dispatch finished");
        outcome
    }

    fn dispatch(&self, dispatch: Dispatch<'_>, out: &mut dyn Write, err: &mut dyn Write) -> Outcome {
        let Dispatch { args, handler } = dispatch;
        debug!(path = ?args.path(), "dispatching");
        let result = {
            let mut ctx = Context::new(&self.parser, args.path(), out, err);
            handler.handle(&args, &mut ctx)
        };
        Outcome::conclude(result, err)
    }

    /// Parse the process arguments, dispatch, and exit.
    pub fn parse(&self) -> ! {
        self.parse_from(std::env::args_os().skip(1))
    }

    /// Parse `argv` (without program name), dispatch on stdout/stderr, and exit.
    pub fn parse_from<I, T>(&self, argv: I) -> !
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.run(argv, &mut stdout.lock(), &mut stderr.lock()).exit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use rstest::rstest;

    #[rstest]
    #[case::ok(Ok(ExitStatus::Success), 0, "")]
    #[case::signal(Ok(ExitStatus::code(3)), 3, "")]
    #[case::signal_message(Ok(ExitStatus::failure("nope")), 1, "nope\n")]
    #[case::signal_as_error(Err(ExitSignal::new(2).with_message("bad input").into()), 2, "bad input\n")]
    #[case::zero_signal(Err(ExitSignal::new(0).into()), 0, "")]
    #[case::error(Err(anyhow!("boom")), 1, "boom\n")]
    #[case::error_with_context(Err(anyhow!("boom").context("sum failed")), 1, "sum failed: boom\n")]
    fn test_conclude(#[case] result: HandleResult, #[case] code: i32, #[case] stderr: &str) {
        let mut err = Vec::new();

        let outcome = Outcome::conclude(result, &mut err);

        assert_eq!(outcome.code(), code);
        assert_eq!(String::from_utf8(err).unwrap(), stderr);
    }

    #[test]
    fn given_unnamed_root_when_built_then_fails_before_parsing() {
        let result = Command::new(CommandSpec::default());

        assert!(matches!(
            result,
            Err(crate::ConfigurationError::MissingAttribute { attribute: "name", .. })
        ));
    }

    #[test]
    fn test_outcome_exit_code_conversion() {
        assert_eq!(Outcome::from_code(0), Outcome::Success);
        assert_eq!(Outcome::from_code(4), Outcome::Failure(4));
        assert!(!Outcome::Failure(4).is_success());
    }
}

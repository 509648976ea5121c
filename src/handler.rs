//! Dispatch targets and their outcomes.
//!
//! A handler receives the parsed [`Namespace`] and a [`Context`] and returns a
//! [`HandleResult`]:
//! - `Ok(ExitStatus::Success)` exits 0
//! - `Ok(ExitStatus::Exit(signal))` exits with the signal's code, printing its message
//! - `Err(e)` exits with the code of an [`ExitSignal`] if `e` is one, else prints `e` and exits 1

use std::fmt;
use std::io::{self, Write};

use crate::exitcode;
use crate::namespace::Namespace;

/// Result of a handler invocation.
pub type HandleResult = anyhow::Result<ExitStatus>;

/// Explicit termination request with an exit code and optional message.
///
/// Usable as a status (`Ok(ExitStatus::Exit(..))`) or as an error (`Err(signal.into())`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitSignal {
    code: i32,
    message: Option<String>,
}

impl ExitSignal {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Failure with the default code.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(exitcode::FAILURE).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => write!(f, "exit status {}", self.code),
        }
    }
}

impl std::error::Error for ExitSignal {}

/// Status a handler returns on its normal path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExitStatus {
    #[default]
    Success,
    Exit(ExitSignal),
}

impl ExitStatus {
    pub fn code(code: i32) -> Self {
        ExitStatus::Exit(ExitSignal::new(code))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ExitStatus::Exit(ExitSignal::failure(message))
    }
}

impl From<ExitSignal> for ExitStatus {
    fn from(signal: ExitSignal) -> Self {
        ExitStatus::Exit(signal)
    }
}

/// Dispatch capability bound to a command node.
pub trait Handler: Send + Sync {
    fn handle(&self, args: &Namespace, ctx: &mut Context<'_>) -> HandleResult;
}

impl<F> Handler for F
where
    F: Fn(&Namespace, &mut Context<'_>) -> HandleResult + Send + Sync,
{
    fn handle(&self, args: &Namespace, ctx: &mut Context<'_>) -> HandleResult {
        self(args, ctx)
    }
}

/// Default handler: print the node's help and succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintHelp;

impl Handler for PrintHelp {
    fn handle(&self, _args: &Namespace, ctx: &mut Context<'_>) -> HandleResult {
        ctx.print_help()?;
        Ok(ExitStatus::Success)
    }
}

/// Streams and parser access handed to a handler.
///
/// Writing to the context writes to the output stream.
pub struct Context<'a> {
    parser: &'a clap::Command,
    path: &'a [String],
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        parser: &'a clap::Command,
        path: &'a [String],
        out: &'a mut dyn Write,
        err: &'a mut dyn Write,
    ) -> Self {
        Self {
            parser,
            path,
            out,
            err,
        }
    }

    /// Matched sub-command names, outermost first. Empty for the root.
    pub fn path(&self) -> &[String] {
        self.path
    }

    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.err
    }

    /// Help text of the matched node.
    pub fn help(&self) -> String {
        let mut parser = self.parser.clone();
        render_help(&mut parser, self.path)
    }

    pub fn print_help(&mut self) -> io::Result<()> {
        let help = self.help();
        self.out.write_all(help.as_bytes())?;
        self.out.flush()
    }
}

impl Write for Context<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn render_help(parser: &mut clap::Command, path: &[String]) -> String {
    if let Some((head, rest)) = path.split_first() {
        if let Some(sub) = parser.find_subcommand_mut(head) {
            return render_help(sub, rest);
        }
    }
    parser.render_long_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> clap::Command {
        let mut cmd = clap::Command::new("calc")
            .about("calculator")
            .subcommand(clap::Command::new("sum").about("sum the integers"));
        cmd.build();
        cmd
    }

    #[test]
    fn given_signal_without_message_when_displayed_then_shows_code() {
        assert_eq!(ExitSignal::new(3).to_string(), "exit status 3");
        assert_eq!(ExitSignal::new(3).with_message("bad").to_string(), "bad");
    }

    #[test]
    fn given_failure_when_created_then_uses_default_code() {
        let status = ExitStatus::failure("nope");
        assert_eq!(
            status,
            ExitStatus::Exit(ExitSignal::new(exitcode::FAILURE).with_message("nope"))
        );
    }

    #[test]
    fn given_signal_as_error_when_downcast_then_recovers_signal() {
        let err: anyhow::Error = ExitSignal::new(2).with_message("bad input").into();

        let signal = err.downcast_ref::<ExitSignal>().unwrap();

        assert_eq!(signal.code(), 2);
        assert_eq!(signal.message(), Some("bad input"));
    }

    #[test]
    fn given_path_when_printing_help_then_renders_matched_node() {
        let parser = parser();
        let path = vec!["sum".to_string()];
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut ctx = Context::new(&parser, &path, &mut out, &mut err);

        PrintHelp.handle(&Namespace::default(), &mut ctx).unwrap();

        let help = String::from_utf8(out).unwrap();
        assert!(help.contains("sum the integers"), "{help}");
        assert!(help.contains("calc sum"), "{help}");
    }

    #[test]
    fn given_closure_when_used_as_handler_then_writes_to_output() {
        let parser = parser();
        let mut out = Vec::new();
        let mut err = Vec::new();
        fn handler<F>(f: F) -> F
        where
            F: Fn(&Namespace, &mut Context<'_>) -> HandleResult,
        {
            f
        }
        let handler = handler(|_, ctx| {
            writeln!(ctx, "hello")?;
            writeln!(ctx.stderr(), "warn")?;
            Ok(ExitStatus::Success)
        });

        {
            let mut ctx = Context::new(&parser, &[], &mut out, &mut err);
            handler.handle(&Namespace::default(), &mut ctx).unwrap();
        }

        assert_eq!(out, b"hello\n");
        assert_eq!(err, b"warn\n");
    }
}

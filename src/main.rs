use std::ffi::OsString;
use std::io::Write;
use std::{env, process};

use anyhow::Context as _;
use flagparse::{
    exitcode, Action, ArgumentSpec, Command, CommandSpec, ExitStatus, Formatter, Nargs, Settings,
    ValueType,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

fn main() {
    let settings = Settings::load(None).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(exitcode::FAILURE);
    });
    let calc = Command::with_formatter(calc(), Formatter::from(&settings.help)).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(exitcode::FAILURE);
    });

    let argv: Vec<OsString> = env::args_os().skip(1).collect();
    let verbosity = calc
        .parse_args(argv.clone())
        .ok()
        .and_then(|args| args.get_int("debug"))
        .unwrap_or(0);
    setup_logging(verbosity);

    calc.parse_from(argv)
}

fn setup_logging(verbosity: i64) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // RUST_LOG wins over -d
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match level {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

fn numbers(value_type: ValueType) -> ArgumentSpec {
    ArgumentSpec::positional("numbers")
        .metavar("N")
        .value_type(value_type)
        .nargs(Nargs::OneOrMore)
}

fn calc() -> CommandSpec {
    CommandSpec::new("calc")
        .help("a tiny calculator")
        .description("A tiny calculator built on a declarative command tree.")
        .version(env!("CARGO_PKG_VERSION"))
        .argument(
            ArgumentSpec::flag(["-d", "--debug"])
                .action(Action::Count)
                .help("increase log verbosity (-d info, -dd debug, -ddd trace)"),
        )
        .subcommand(
            CommandSpec::new("sum")
                .alias("add")
                .help("sum the integers at the command line")
                .argument(numbers(ValueType::Int).help("integers to add"))
                .handle_with(|args, ctx| {
                    writeln!(ctx, "{}", args.get_ints("numbers").iter().sum::<i64>())?;
                    Ok(ExitStatus::Success)
                }),
        )
        .subcommand(
            CommandSpec::new("mul")
                .alias("product")
                .help("multiply the integers at the command line")
                .argument(numbers(ValueType::Int).help("integers to multiply"))
                .handle_with(|args, ctx| {
                    let product = args
                        .get_ints("numbers")
                        .iter()
                        .try_fold(1i64, |acc, n| acc.checked_mul(*n))
                        .context("product overflows a 64-bit integer")?;
                    writeln!(ctx, "{product}")?;
                    Ok(ExitStatus::Success)
                }),
        )
        .subcommand(
            CommandSpec::new("div")
                .help("divide two numbers")
                .argument(ArgumentSpec::positional("dividend").value_type(ValueType::Float))
                .argument(ArgumentSpec::positional("divisor").value_type(ValueType::Float))
                .handle_with(|args, ctx| {
                    let dividend = args.get_float("dividend").unwrap_or_default();
                    let divisor = args.get_float("divisor").unwrap_or_default();
                    if divisor == 0.0 {
                        return Ok(ExitStatus::failure("division by zero"));
                    }
                    writeln!(ctx, "{}", dividend / divisor)?;
                    Ok(ExitStatus::Success)
                }),
        )
        .subcommand(
            CommandSpec::new("stats")
                .help("descriptive statistics")
                .subcommand(
                    CommandSpec::new("mean")
                        .alias("avg")
                        .help("arithmetic mean")
                        .argument(numbers(ValueType::Float))
                        .argument(
                            ArgumentSpec::flag(["-p", "--precision"])
                                .value_type(ValueType::Int)
                                .default_value("2")
                                .help("digits after the decimal point"),
                        )
                        .handle_with(|args, ctx| {
                            let values = args.get_floats("numbers");
                            let mean = values.iter().sum::<f64>() / values.len() as f64;
                            let precision = args.get_int("precision").unwrap_or(2).max(0) as usize;
                            writeln!(ctx, "{mean:.precision$}")?;
                            Ok(ExitStatus::Success)
                        }),
                )
                .subcommand(
                    CommandSpec::new("max")
                        .help("largest value")
                        .argument(numbers(ValueType::Float))
                        .handle_with(|args, ctx| {
                            let max = args
                                .get_floats("numbers")
                                .into_iter()
                                .fold(f64::NEG_INFINITY, f64::max);
                            writeln!(ctx, "{max}")?;
                            Ok(ExitStatus::Success)
                        }),
                ),
        )
        .subcommand(
            CommandSpec::new("config")
                .help("show help layout settings")
                .argument(
                    ArgumentSpec::flag(["--template"])
                        .action(Action::StoreTrue)
                        .help("print a commented settings template instead"),
                )
                .handle_with(|args, ctx| {
                    if args.get_flag("template") {
                        write!(ctx, "{}", Settings::template())?;
                    } else {
                        let settings = Settings::load(None)?;
                        write!(ctx, "{}", settings.to_toml()?)?;
                    }
                    Ok(ExitStatus::Success)
                }),
        )
}

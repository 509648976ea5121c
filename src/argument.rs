//! Declarative argument descriptions and their translation to `clap::Arg`.
//!
//! An [`ArgumentSpec`] is the ordered pair `(names, options)`. Names are either a
//! single positional name or one or more flags (`-v`, `--verbose`). The options are
//! passed through to clap; after parsing, the matched values are read back into
//! [`Value`]s keyed by the argument's destination name.

use std::any::Any;

use clap::builder::{PossibleValuesParser, TypedValueParser, ValueParser, ValueRange};
use clap::parser::MatchesError;
use clap::{Arg, ArgAction, ArgMatches};

use crate::errors::{ConfigurationError, ConfigurationResult};
use crate::namespace::Value;

/// Type every value of an argument is converted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueType {
    #[default]
    Text,
    Int,
    Float,
}

/// Number of values an argument consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Nargs {
    /// Exactly one value, stored as a scalar
    #[default]
    One,
    /// Zero or one value, stored as a scalar
    Optional,
    /// Any number of values, stored as a list
    ZeroOrMore,
    /// At least one value, stored as a list
    OneOrMore,
    /// Exactly `n` values, stored as a list
    Exactly(usize),
}

impl Nargs {
    fn is_multiple(self) -> bool {
        matches!(self, Nargs::ZeroOrMore | Nargs::OneOrMore | Nargs::Exactly(_))
    }

    fn requires_value(self) -> bool {
        match self {
            Nargs::One | Nargs::OneOrMore => true,
            Nargs::Exactly(n) => n > 0,
            Nargs::Optional | Nargs::ZeroOrMore => false,
        }
    }

    fn range(self) -> ValueRange {
        match self {
            Nargs::One => ValueRange::new(1),
            Nargs::Optional => ValueRange::new(0..=1),
            Nargs::ZeroOrMore => ValueRange::new(0..),
            Nargs::OneOrMore => ValueRange::new(1..),
            Nargs::Exactly(n) => ValueRange::new(n),
        }
    }
}

/// What happens when the argument is encountered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Store,
    StoreTrue,
    StoreFalse,
    Count,
    Append,
}

impl Action {
    fn is_flag_only(self) -> bool {
        matches!(self, Action::StoreTrue | Action::StoreFalse | Action::Count)
    }
}

/// Option descriptor of an argument. Contents are handed to clap unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOptions {
    pub help: Option<String>,
    pub metavar: Option<String>,
    pub value_type: ValueType,
    pub nargs: Nargs,
    pub action: Action,
    pub default: Option<String>,
    /// Defaults to `true` for positionals that need a value, `false` for flags
    pub required: Option<bool>,
    pub choices: Vec<String>,
    pub dest: Option<String>,
    /// Environment variable consulted when the argument is absent
    pub env: Option<String>,
}

/// One parseable command-line argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    names: Vec<String>,
    options: ArgOptions,
}

impl ArgumentSpec {
    pub fn new<I, S>(names: I, options: ArgOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            options,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new([name.into()], ArgOptions::default())
    }

    pub fn flag<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names, ArgOptions::default())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn options(&self) -> &ArgOptions {
        &self.options
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.options.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.options.metavar = Some(metavar.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.options.value_type = value_type;
        self
    }

    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.options.nargs = nargs;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.options.action = action;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.options.default = Some(default.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.options.required = Some(required);
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.options.dest = Some(dest.into());
        self
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.options.env = Some(var.into());
        self
    }

    /// Validate the names and resolve the namespace key.
    pub(crate) fn bind(&self, command: &str) -> ConfigurationResult<Binding> {
        let shape = Shape::classify(&self.names, command)?;
        if let Shape::Positional(name) = &shape {
            if self.options.action.is_flag_only() {
                return Err(ConfigurationError::PositionalAction {
                    command: command.to_string(),
                    name: name.clone(),
                });
            }
        }

        let dest = self
            .options
            .dest
            .clone()
            .unwrap_or_else(|| shape.default_dest())
            .replace('-', "_");

        Ok(Binding {
            dest,
            shape,
            spec: self.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Positional(String),
    Flags { shorts: Vec<char>, longs: Vec<String> },
}

impl Shape {
    fn classify(names: &[String], command: &str) -> ConfigurationResult<Self> {
        let Some(first) = names.first() else {
            return Err(ConfigurationError::EmptyArgumentNames {
                command: command.to_string(),
            });
        };

        let flags = names.iter().filter(|n| n.starts_with('-')).count();
        if flags == 0 {
            if names.len() > 1 || first.is_empty() {
                return Err(ConfigurationError::MixedArgumentNames {
                    command: command.to_string(),
                    names: names.to_vec(),
                });
            }
            return Ok(Shape::Positional(first.clone()));
        }
        if flags != names.len() {
            return Err(ConfigurationError::MixedArgumentNames {
                command: command.to_string(),
                names: names.to_vec(),
            });
        }

        let mut shorts = Vec::new();
        let mut longs = Vec::new();
        for name in names {
            let invalid = || ConfigurationError::InvalidFlag {
                command: command.to_string(),
                flag: name.clone(),
            };
            if let Some(long) = name.strip_prefix("--") {
                if long.is_empty() || long.starts_with('-') {
                    return Err(invalid());
                }
                longs.push(long.to_string());
            } else {
                let mut chars = name[1..].chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c != '-' => shorts.push(c),
                    _ => return Err(invalid()),
                }
            }
        }
        Ok(Shape::Flags { shorts, longs })
    }

    fn default_dest(&self) -> String {
        match self {
            Shape::Positional(name) => name.clone(),
            Shape::Flags { shorts, longs } => longs
                .first()
                .cloned()
                .or_else(|| shorts.first().map(char::to_string))
                .unwrap_or_default(),
        }
    }
}

/// An argument registered on a parser, remembered for reading values back.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    dest: String,
    shape: Shape,
    spec: ArgumentSpec,
}

impl Binding {
    pub(crate) fn dest(&self) -> &str {
        &self.dest
    }

    pub(crate) fn is_positional(&self) -> bool {
        matches!(self.shape, Shape::Positional(_))
    }

    /// Every option string, e.g. `["-n", "--count"]`. Empty for positionals.
    pub(crate) fn option_strings(&self) -> Vec<String> {
        match &self.shape {
            Shape::Positional(_) => Vec::new(),
            Shape::Flags { shorts, longs } => shorts
                .iter()
                .map(|c| format!("-{c}"))
                .chain(longs.iter().map(|l| format!("--{l}")))
                .collect(),
        }
    }

    /// Positional without an upper bound on its value count.
    pub(crate) fn is_unbounded(&self) -> bool {
        self.is_positional()
            && matches!(self.spec.options.nargs, Nargs::ZeroOrMore | Nargs::OneOrMore)
    }

    fn is_multiple(&self) -> bool {
        self.spec.options.action == Action::Append || self.spec.options.nargs.is_multiple()
    }

    fn takes_values(&self) -> bool {
        !self.spec.options.action.is_flag_only()
    }

    pub(crate) fn is_required(&self) -> bool {
        let options = &self.spec.options;
        options.required.unwrap_or_else(|| {
            self.is_positional() && options.default.is_none() && options.nargs.requires_value()
        })
    }

    /// Argument as it reads in help output, e.g. `-n, --count COUNT`.
    pub(crate) fn invocation(&self) -> String {
        let metavar = self
            .spec
            .options
            .metavar
            .clone()
            .unwrap_or_else(|| self.dest.to_uppercase());
        match &self.shape {
            Shape::Positional(_) => metavar,
            Shape::Flags { shorts, longs } => {
                let mut parts: Vec<String> = shorts.iter().map(|c| format!("-{c}")).collect();
                parts.extend(longs.iter().map(|l| format!("--{l}")));
                let mut text = parts.join(", ");
                if self.takes_values() {
                    text.push(' ');
                    text.push_str(&metavar);
                }
                text
            }
        }
    }

    pub(crate) fn to_arg(&self, show_defaults: bool) -> Arg {
        let options = &self.spec.options;
        let mut arg = Arg::new(self.dest.clone());

        if let Shape::Flags { shorts, longs } = &self.shape {
            if let Some((short, rest)) = shorts.split_first() {
                arg = arg.short(*short).visible_short_aliases(rest.to_vec());
            }
            if let Some((long, rest)) = longs.split_first() {
                arg = arg.long(long.clone()).visible_aliases(rest.to_vec());
            }
        }
        if let Some(help) = &options.help {
            arg = arg.help(help.clone());
        }
        if let Some(metavar) = &options.metavar {
            arg = arg.value_name(metavar.clone());
        }
        if let Some(var) = &options.env {
            arg = arg.env(var.clone());
        }

        arg = match options.action {
            Action::StoreTrue => arg.action(ArgAction::SetTrue),
            Action::StoreFalse => arg.action(ArgAction::SetFalse),
            Action::Count => arg.action(ArgAction::Count),
            Action::Store | Action::Append => {
                let action = if options.action == Action::Append
                    || (self.is_positional() && options.nargs.is_multiple())
                {
                    ArgAction::Append
                } else {
                    ArgAction::Set
                };
                let mut arg = arg
                    .action(action)
                    .num_args(options.nargs.range())
                    .value_parser(self.value_parser())
                    .allow_negative_numbers(options.value_type != ValueType::Text)
                    .hide_default_value(!show_defaults);
                if let Some(default) = &options.default {
                    arg = arg.default_value(default.clone());
                }
                arg
            }
        };

        arg.required(self.is_required())
    }

    fn value_parser(&self) -> ValueParser {
        let options = &self.spec.options;
        if options.choices.is_empty() {
            return match options.value_type {
                ValueType::Text => ValueParser::string(),
                ValueType::Int => ValueParser::new(|s: &str| s.parse::<i64>()),
                ValueType::Float => ValueParser::new(|s: &str| s.parse::<f64>()),
            };
        }

        let choices = PossibleValuesParser::new(options.choices.clone());
        match options.value_type {
            ValueType::Text => ValueParser::new(choices),
            ValueType::Int => ValueParser::new(choices.try_map(|s: String| s.parse::<i64>())),
            ValueType::Float => ValueParser::new(choices.try_map(|s: String| s.parse::<f64>())),
        }
    }

    /// Read this argument's parsed value(s) out of clap's matches.
    pub(crate) fn extract(&self, matches: &ArgMatches) -> Result<Option<Value>, MatchesError> {
        let id = self.dest.as_str();
        match self.spec.options.action {
            Action::StoreTrue | Action::StoreFalse => {
                Ok(matches.try_get_one::<bool>(id)?.map(|b| Value::Bool(*b)))
            }
            Action::Count => Ok(matches
                .try_get_one::<u8>(id)?
                .map(|n| Value::Int(i64::from(*n)))),
            Action::Store | Action::Append => match self.spec.options.value_type {
                ValueType::Text => self.collect::<String>(matches, |s| Value::Text(s.clone())),
                ValueType::Int => self.collect::<i64>(matches, |n| Value::Int(*n)),
                ValueType::Float => self.collect::<f64>(matches, |x| Value::Float(*x)),
            },
        }
    }

    fn collect<T>(
        &self,
        matches: &ArgMatches,
        to_value: impl Fn(&T) -> Value,
    ) -> Result<Option<Value>, MatchesError>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        let id = self.dest.as_str();
        if !self.is_multiple() {
            return Ok(matches.try_get_one::<T>(id)?.map(to_value));
        }

        let values = matches
            .try_get_many::<T>(id)?
            .map(|values| Value::List(values.map(&to_value).collect()));
        // A positional that accepts zero values still binds, to an empty list
        let empty = self.is_positional() && self.spec.options.nargs == Nargs::ZeroOrMore;
        Ok(values.or_else(|| empty.then(|| Value::List(Vec::new()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bind(spec: ArgumentSpec) -> ConfigurationResult<Binding> {
        spec.bind("calc")
    }

    #[rstest]
    #[case::positional(ArgumentSpec::positional("integers"), "integers")]
    #[case::long(ArgumentSpec::flag(["-v", "--dry-run"]), "dry_run")]
    #[case::short_only(ArgumentSpec::flag(["-q"]), "q")]
    #[case::explicit(ArgumentSpec::flag(["--out"]).dest("output"), "output")]
    fn test_dest_resolution(#[case] spec: ArgumentSpec, #[case] expected: &str) {
        assert_eq!(bind(spec).unwrap().dest(), expected);
    }

    #[rstest]
    #[case::empty(ArgumentSpec::flag(Vec::<String>::new()))]
    #[case::mixed(ArgumentSpec::flag(["-v", "verbose"]))]
    #[case::two_positionals(ArgumentSpec::flag(["a", "b"]))]
    #[case::long_short(ArgumentSpec::flag(["-vv"]))]
    #[case::triple_dash(ArgumentSpec::flag(["---x"]))]
    #[case::bare_dashes(ArgumentSpec::flag(["--"]))]
    #[case::positional_flag_action(ArgumentSpec::positional("x").action(Action::StoreTrue))]
    fn test_invalid_names_rejected(#[case] spec: ArgumentSpec) {
        assert!(bind(spec).is_err());
    }

    #[rstest]
    #[case::positional(ArgumentSpec::positional("n"), true)]
    #[case::positional_optional(ArgumentSpec::positional("n").nargs(Nargs::Optional), false)]
    #[case::positional_many(ArgumentSpec::positional("n").nargs(Nargs::ZeroOrMore), false)]
    #[case::positional_default(ArgumentSpec::positional("n").default_value("1"), false)]
    #[case::flag(ArgumentSpec::flag(["--n"]), false)]
    #[case::flag_required(ArgumentSpec::flag(["--n"]).required(true), true)]
    fn test_required_defaults(#[case] spec: ArgumentSpec, #[case] expected: bool) {
        assert_eq!(bind(spec).unwrap().is_required(), expected);
    }

    #[rstest]
    #[case::positional(ArgumentSpec::positional("integers").metavar("INT"), "INT")]
    #[case::flag_with_value(ArgumentSpec::flag(["-n", "--count"]), "-n, --count COUNT")]
    #[case::switch(ArgumentSpec::flag(["--verbose"]).action(Action::StoreTrue), "--verbose")]
    fn test_invocation(#[case] spec: ArgumentSpec, #[case] expected: &str) {
        assert_eq!(bind(spec).unwrap().invocation(), expected);
    }

    #[test]
    fn given_pair_form_when_constructed_then_matches_builder_form() {
        let pair = ArgumentSpec::new(
            ["integers"],
            ArgOptions {
                metavar: Some("INT".into()),
                value_type: ValueType::Int,
                nargs: Nargs::OneOrMore,
                help: Some("integers to be summed".into()),
                ..ArgOptions::default()
            },
        );
        let built = ArgumentSpec::positional("integers")
            .metavar("INT")
            .value_type(ValueType::Int)
            .nargs(Nargs::OneOrMore)
            .help("integers to be summed");

        assert_eq!(pair, built);
    }

    #[test]
    fn given_typed_choices_when_parsing_then_values_are_converted() {
        let binding = bind(
            ArgumentSpec::flag(["--level"])
                .value_type(ValueType::Int)
                .choices(["1", "2", "3"]),
        )
        .unwrap();
        let cmd = clap::Command::new("calc").arg(binding.to_arg(true));

        let matches = cmd.clone().try_get_matches_from(["calc", "--level", "2"]).unwrap();
        assert_eq!(binding.extract(&matches).unwrap(), Some(Value::Int(2)));

        assert!(cmd.try_get_matches_from(["calc", "--level", "7"]).is_err());
    }

    #[test]
    fn given_count_action_when_repeated_then_counts_occurrences() {
        let binding = bind(ArgumentSpec::flag(["-d", "--debug"]).action(Action::Count)).unwrap();
        let cmd = clap::Command::new("calc").arg(binding.to_arg(true));

        let matches = cmd.try_get_matches_from(["calc", "-d", "-d", "--debug"]).unwrap();

        assert_eq!(binding.extract(&matches).unwrap(), Some(Value::Int(3)));
    }

    #[test]
    fn given_append_action_when_repeated_then_collects_list() {
        let binding = bind(ArgumentSpec::flag(["-I"]).action(Action::Append)).unwrap();
        let cmd = clap::Command::new("calc").arg(binding.to_arg(true));

        let matches = cmd.try_get_matches_from(["calc", "-I", "a", "-I", "b"]).unwrap();

        assert_eq!(
            binding.extract(&matches).unwrap(),
            Some(Value::List(vec![Value::Text("a".into()), Value::Text("b".into())]))
        );
    }

    #[test]
    fn given_absent_zero_or_more_positional_when_parsing_then_binds_empty_list() {
        let binding = bind(ArgumentSpec::positional("files").nargs(Nargs::ZeroOrMore)).unwrap();
        let cmd = clap::Command::new("calc").arg(binding.to_arg(true));

        let matches = cmd.try_get_matches_from(["calc"]).unwrap();

        assert_eq!(binding.extract(&matches).unwrap(), Some(Value::List(vec![])));
    }
}

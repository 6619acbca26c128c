use std::{
    collections::{BTreeMap, HashSet},
    error, fmt,
};

static IGNORE_CASE: &str = "IGNORE_CASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    pub fn option_type(&self) -> OptionType {
        match *self {
            OptionValue::Bool(_) => OptionType::Bool,
            OptionValue::Int(_) => OptionType::Int,
            OptionValue::Str(_) => OptionType::Str,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    Int,
    Str,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OptionType::Bool => write!(f, "boolean"),
            OptionType::Int => write!(f, "integer"),
            OptionType::Str => write!(f, "string"),
        }
    }
}

/// The `options { ... }` block of a grammar.
///
/// Only options that change the behaviour of the analyses are interpreted, all others are
/// kept as written so that callers can still inspect them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrammarOptions {
    ignore_case: bool,
    others: BTreeMap<String, OptionValue>,
}

impl GrammarOptions {
    pub fn new() -> Self {
        GrammarOptions::default()
    }

    /// Builds the options from `(name, value)` entries in declaration order. Option names are
    /// case-insensitive, so `ignore_case` and `IGNORE_CASE` are the same option.
    pub fn from_entries<I, S>(entries: I) -> Result<GrammarOptions, OptionError>
    where
        I: IntoIterator<Item = (S, OptionValue)>,
        S: Into<String>,
    {
        let mut options = GrammarOptions::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (name, value) in entries {
            let name: String = name.into();
            if !seen.insert(name.to_uppercase()) {
                return Err(OptionError::Duplicate(name));
            }
            options.set(name, value)?;
        }

        Ok(options)
    }

    fn set(&mut self, name: String, value: OptionValue) -> Result<(), OptionError> {
        if name.eq_ignore_ascii_case(IGNORE_CASE) {
            return match value {
                OptionValue::Bool(flag) => {
                    self.ignore_case = flag;
                    Ok(())
                }
                other => Err(OptionError::TypeMismatch {
                    name,
                    expected: OptionType::Bool,
                    found: other.option_type(),
                }),
            };
        }

        debug!("Keeping uninterpreted grammar option {} = {:?}", name, value);
        self.others.insert(name, value);
        Ok(())
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.others
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn uninterpreted(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.others.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionError {
    TypeMismatch {
        name: String,
        expected: OptionType,
        found: OptionType,
    },
    Duplicate(String),
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OptionError::TypeMismatch {
                ref name,
                ref expected,
                ref found,
            } => write!(
                f,
                "Option {} expects a value of type {} but found {}",
                name, expected, found
            ),
            OptionError::Duplicate(ref name) => write!(f, "Option {} is set more than once", name),
        }
    }
}

impl error::Error for OptionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

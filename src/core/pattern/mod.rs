use {
    crate::core::{
        lex::token::Token,
        tree::{CharacterDescriptor, NameResolver, NodeId, OccurrenceIndicator, RegexNode},
        util::string_utils,
    },
    regex::Regex,
    std::{error, fmt},
};

pub mod empty;

/// Matches nothing, not even the empty string.
static NEVER_MATCH: &str = r"(?:\b\B)";

/// Matches any single character, line terminators included.
static ANY_CHAR: &str = "(?s:.)";

/// An executable pattern compiled from a grammar regex.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    prefix_only: bool,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// True if the pattern is only anchored at the start of the text.
    pub fn is_prefix_only(&self) -> bool {
        self.prefix_only
    }

    /// For a full pattern, whether `text` matches entirely. For a prefix pattern, whether some
    /// prefix of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Length in bytes of the longest non-empty prefix of `text` matched entirely by this full
    /// pattern. Prefix patterns cannot answer this question and return `None`.
    pub fn longest_match(&self, text: &str) -> Option<usize> {
        if self.prefix_only {
            return None;
        }

        let mut ends: Vec<usize> = text.char_indices().map(|(i, _)| i).skip(1).collect();
        if !text.is_empty() {
            ends.push(text.len());
        }

        ends.into_iter()
            .rev()
            .find(|&end| self.regex.is_match(&text[..end]))
    }
}

/// Lowers grammar regexes to executable patterns, resolving `<NAME>` references through the
/// given resolver.
pub struct RegexCompiler<'r> {
    resolver: &'r dyn NameResolver,
}

impl<'r> RegexCompiler<'r> {
    pub fn new(resolver: &'r dyn NameResolver) -> Self {
        RegexCompiler { resolver }
    }

    /// Compiles `node`, returning `None` if it references an unknown or cyclic token or if the
    /// resulting pattern is invalid.
    pub fn compile(&self, node: &RegexNode, prefix_only: bool) -> Option<Pattern> {
        match self.try_compile(node, prefix_only) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                debug!("Could not compile regular expression: {}", err);
                None
            }
        }
    }

    /// Compiles the regex of `token`, honouring its case sensitivity.
    pub fn compile_token(&self, token: &Token, prefix_only: bool) -> Option<Pattern> {
        match self.try_compile_token(token, prefix_only) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                debug!(
                    "Could not compile token {}: {}",
                    token.name().unwrap_or("<unnamed>"),
                    err
                );
                None
            }
        }
    }

    pub fn try_compile(
        &self,
        node: &RegexNode,
        prefix_only: bool,
    ) -> Result<Pattern, CompileError> {
        self.build(node, prefix_only, false, &mut vec![])
    }

    pub fn try_compile_token(
        &self,
        token: &Token,
        prefix_only: bool,
    ) -> Result<Pattern, CompileError> {
        self.build(
            token.regular_expression(),
            prefix_only,
            token.is_ignore_case(),
            &mut vec![token.id()],
        )
    }

    fn build(
        &self,
        node: &RegexNode,
        prefix_only: bool,
        ignore_case: bool,
        visiting: &mut Vec<NodeId>,
    ) -> Result<Pattern, CompileError> {
        let mut body = String::new();
        self.lower(node, visiting, &mut body)?;

        let mut source = String::with_capacity(body.len() + 10);
        if ignore_case {
            source.push_str("(?i)");
        }
        source.push_str("^(?:");
        source.push_str(&body);
        source.push(')');
        if !prefix_only {
            source.push('$');
        }

        Ok(Pattern {
            regex: Regex::new(&source)?,
            prefix_only,
        })
    }

    fn lower(
        &self,
        node: &RegexNode,
        visiting: &mut Vec<NodeId>,
        out: &mut String,
    ) -> Result<(), CompileError> {
        match *node {
            RegexNode::Literal(ref raw) => {
                out.push_str(&regex::escape(&string_utils::replace_escapes(raw)));
            }
            RegexNode::Named { ref inner, .. } => self.lower(inner, visiting, out)?,
            RegexNode::Container(Some(ref inner)) => self.lower(inner, visiting, out)?,
            RegexNode::Container(None) => {
                return Err(CompileError::Malformed(
                    "angle brackets without a regular expression".to_string(),
                ));
            }
            RegexNode::Reference(ref name) => {
                let token = match self.resolver.resolve_token(name) {
                    Some(token) => token,
                    None => return Err(CompileError::Unresolved(name.clone())),
                };
                if visiting.contains(&token.id()) {
                    return Err(CompileError::ReferenceCycle(name.clone()));
                }

                visiting.push(token.id());
                let res = self.lower(token.regular_expression(), visiting, out);
                visiting.pop();
                res?;
            }
            RegexNode::Eof => out.push('$'),
            RegexNode::Sequence(ref parts) => {
                for part in parts {
                    self.lower(part, visiting, out)?;
                }
            }
            RegexNode::Alternative(ref branches) => {
                if branches.is_empty() {
                    return Err(CompileError::Malformed(
                        "alternative without branches".to_string(),
                    ));
                }
                out.push_str("(?:");
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    self.lower(branch, visiting, out)?;
                }
                out.push(')');
            }
            RegexNode::CharacterList {
                negated,
                ref descriptors,
            } => lower_character_list(negated, descriptors, out),
            RegexNode::Parenthesized(ref inner, ref indicator) => {
                out.push_str("(?:");
                self.lower(inner, visiting, out)?;
                out.push(')');
                match *indicator {
                    Some(OccurrenceIndicator::Range { min, max: Some(max) }) if max < min => {
                        warn!(
                            "Dropping repetition range {{{},{}}}: bounds out of order",
                            min, max
                        );
                    }
                    Some(ref indicator) => out.push_str(&indicator.to_string()),
                    None => {}
                }
            }
        }

        Ok(())
    }
}

fn lower_character_list(negated: bool, descriptors: &[CharacterDescriptor], out: &mut String) {
    let classes: Vec<String> = descriptors
        .iter()
        .filter_map(|descriptor| match lower_descriptor(descriptor) {
            Ok(class) => Some(class),
            Err(err) => {
                warn!("Dropping character descriptor: {}", err);
                None
            }
        })
        .collect();

    if classes.is_empty() {
        out.push_str(if negated { ANY_CHAR } else { NEVER_MATCH });
        return;
    }

    out.push('[');
    if negated {
        out.push('^');
    }
    for class in classes {
        out.push_str(&class);
    }
    out.push(']');
}

fn lower_descriptor(descriptor: &CharacterDescriptor) -> Result<String, CompileError> {
    let start = descriptor_char(&descriptor.start)?;

    match descriptor.end {
        None => Ok(format!("[{}]", escape_char(start))),
        Some(ref end) => {
            let end = descriptor_char(end)?;
            if end < start {
                return Err(CompileError::Malformed(format!(
                    "character range {:?}-{:?} is out of order",
                    start, end
                )));
            }
            Ok(format!("[{}-{}]", escape_char(start), escape_char(end)))
        }
    }
}

fn descriptor_char(raw: &str) -> Result<char, CompileError> {
    string_utils::single_char(raw).ok_or_else(|| {
        CompileError::Malformed(format!("\"{}\" does not denote a single character", raw))
    })
}

fn escape_char(c: char) -> String {
    regex::escape(&c.to_string())
}

#[derive(Debug)]
pub enum CompileError {
    Unresolved(String),
    ReferenceCycle(String),
    Malformed(String),
    Syntax(regex::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CompileError::Unresolved(ref name) => write!(f, "Undefined token <{}>", name),
            CompileError::ReferenceCycle(ref name) => {
                write!(f, "Token <{}> is defined in terms of itself", name)
            }
            CompileError::Malformed(ref msg) => write!(f, "Malformed regular expression: {}", msg),
            CompileError::Syntax(ref err) => write!(f, "Invalid pattern: {}", err),
        }
    }
}

impl error::Error for CompileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            CompileError::Unresolved(_) => None,
            CompileError::ReferenceCycle(_) => None,
            CompileError::Malformed(_) => None,
            CompileError::Syntax(ref err) => Some(err),
        }
    }
}

impl From<regex::Error> for CompileError {
    fn from(err: regex::Error) -> CompileError {
        CompileError::Syntax(err)
    }
}

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate regex;
extern crate stopwatch;

use {
    crate::core::{
        bnf::{
            first::{self, AtomicUnit},
            left_recursion,
            nullable::NullabilityAnalyzer,
            usage::{self, Usage},
        },
        config::{GrammarOptions, OptionError, OptionValue},
        data::dfs::Cycle,
        lex::{
            shadow::{BnfStringShadowing, Shadowing},
            token::{unwrap_label, Token},
            LexicalGrammar,
        },
        pattern::{empty, CompileError, RegexCompiler},
        tree::{Expansion, Production, ProductionId, RegexNode, SyntaxTree},
    },
    std::{collections::HashSet, error, fmt},
    stopwatch::Stopwatch,
};

pub mod core;

/// Builds a syntax tree snapshot from parsed productions and the entries of the grammar's
/// `options` block.
pub fn build_tree<I, S>(productions: Vec<Production>, options: I) -> Result<SyntaxTree, Error>
where
    I: IntoIterator<Item = (S, OptionValue)>,
    S: Into<String>,
{
    let options = GrammarOptions::from_entries(options)?;
    Ok(SyntaxTree::new(productions, options))
}

/// All analyses of one grammar snapshot.
///
/// The lexical grammar and the nullable set are computed once on construction. If the grammar
/// changes, build a new tree and a new analysis.
pub struct GrammarAnalysis<'t> {
    tree: &'t SyntaxTree,
    lexical_grammar: LexicalGrammar<'t>,
    nullability: NullabilityAnalyzer<'t>,
    nullable_set: HashSet<ProductionId>,
}

impl<'t> GrammarAnalysis<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        let lexical_grammar = timed("Building lexical grammar", || LexicalGrammar::build(tree));
        let nullability = NullabilityAnalyzer::new(tree);
        let nullable_set = timed("Computing nullable set", || nullability.nullable_set());

        GrammarAnalysis {
            tree,
            lexical_grammar,
            nullability,
            nullable_set,
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn lexical_grammar(&self) -> &LexicalGrammar<'t> {
        &self.lexical_grammar
    }

    /// Memoized single-production nullability probe.
    pub fn is_nullable(&mut self, production: ProductionId) -> bool {
        self.nullability.is_nullable(production)
    }

    pub fn is_empty_match_possible(&mut self, expansion: &Expansion) -> bool {
        self.nullability.is_empty_match_possible(expansion, None)
    }

    /// Every nullable BNF production, as computed by the whole-grammar fixed point.
    pub fn nullable_set(&self) -> &HashSet<ProductionId> {
        &self.nullable_set
    }

    pub fn leftmost_set(&self, production: ProductionId) -> Option<Vec<ProductionId>> {
        left_recursion::leftmost_set(self.tree, production, &self.nullable_set)
    }

    pub fn detect_left_recursion(&self) -> Vec<Cycle<ProductionId>> {
        left_recursion::detect_left_recursion(self.tree, &self.nullable_set)
    }

    pub fn detect_regex_loops(&self) -> Vec<Cycle<Token<'t>>> {
        self.lexical_grammar.detect_regex_loops()
    }

    pub fn first_set(&self, production: ProductionId, group_unary: bool) -> Vec<AtomicUnit<'t>> {
        first::first_set(
            &self.lexical_grammar,
            &self.nullable_set,
            production,
            group_unary,
        )
    }

    pub fn shadowed_tokens(&self) -> Vec<Shadowing<'t>> {
        self.lexical_grammar.shadowed_tokens()
    }

    pub fn shadowed_bnf_strings(&self) -> Vec<BnfStringShadowing<'t>> {
        self.lexical_grammar.shadowed_bnf_strings()
    }

    pub fn unused_productions(&self) -> Vec<(ProductionId, Usage)> {
        usage::unused_productions(self.tree)
    }

    pub fn unused_private_regexes(&self) -> Vec<(Token<'t>, Usage)> {
        let tree: &'t SyntaxTree = self.tree;
        usage::unused_private_regexes(tree)
    }

    /// Tokens whose regex may match the empty string. Tokens that merely alias another token
    /// (`<A: <B>>`) are left out, the referenced token is reported instead.
    pub fn regexes_matching_empty(&self) -> Vec<Token<'t>> {
        let tree: &'t SyntaxTree = self.tree;

        self.lexical_grammar
            .all_tokens()
            .iter()
            .filter(|token| !is_alias(token.regular_expression()))
            .filter(|token| empty::regex_matches_empty(token.regular_expression(), tree))
            .cloned()
            .collect()
    }

    /// Whether the token named `name` matches the whole of `text`.
    pub fn check_regex(&self, name: &str, text: &str) -> Result<bool, Error> {
        let token = match self.lexical_grammar.get_token_by_name(name) {
            Some(token) => token,
            None => return Err(Error::UnknownToken(name.to_string())),
        };

        let pattern = RegexCompiler::new(self.tree).try_compile_token(&token, false)?;
        Ok(pattern.is_match(text))
    }

    /// Runs every whole-grammar analysis.
    pub fn report(&self) -> AnalysisReport<'t> {
        let sw = Stopwatch::start_new();

        let mut nullable_productions: Vec<ProductionId> =
            self.nullable_set.iter().cloned().collect();
        nullable_productions.sort();

        let report = AnalysisReport {
            left_recursions: timed("Left recursion detection", || self.detect_left_recursion()),
            regex_loops: timed("Regex loop detection", || self.detect_regex_loops()),
            nullable_productions,
            regexes_matching_empty: timed("Empty regex detection", || {
                self.regexes_matching_empty()
            }),
            shadowed_tokens: timed("Token shadowing detection", || self.shadowed_tokens()),
            shadowed_bnf_strings: timed("BNF string shadowing detection", || {
                self.shadowed_bnf_strings()
            }),
            unused_productions: timed("Production usage", || self.unused_productions()),
            unused_private_regexes: timed("Private regex usage", || {
                self.unused_private_regexes()
            }),
        };

        debug!("Analysing grammar took {}ms", sw.elapsed_ms());
        report
    }
}

fn is_alias(regex: &RegexNode) -> bool {
    let mut node = match unwrap_label(regex) {
        Some(node) => node,
        None => return false,
    };
    while let RegexNode::Parenthesized(ref inner, None) = *node {
        node = inner;
    }
    match *node {
        RegexNode::Reference(_) => true,
        _ => false,
    }
}

fn timed<T, F>(what: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let sw = Stopwatch::start_new();
    let res = f();
    debug!("{} took {}ms", what, sw.elapsed_ms());
    res
}

/// Findings of all whole-grammar analyses.
#[derive(Debug)]
pub struct AnalysisReport<'t> {
    pub left_recursions: Vec<Cycle<ProductionId>>,
    pub regex_loops: Vec<Cycle<Token<'t>>>,
    pub nullable_productions: Vec<ProductionId>,
    pub regexes_matching_empty: Vec<Token<'t>>,
    pub shadowed_tokens: Vec<Shadowing<'t>>,
    pub shadowed_bnf_strings: Vec<BnfStringShadowing<'t>>,
    pub unused_productions: Vec<(ProductionId, Usage)>,
    pub unused_private_regexes: Vec<(Token<'t>, Usage)>,
}

impl<'t> AnalysisReport<'t> {
    /// True if nothing was found that prevents JavaCC from generating a parser: no left
    /// recursion and no regex loops.
    pub fn is_generable(&self) -> bool {
        self.left_recursions.is_empty() && self.regex_loops.is_empty()
    }
}

#[derive(Debug)]
pub enum Error {
    Options(OptionError),
    Compile(CompileError),
    UnknownToken(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Options(ref err) => write!(f, "Invalid grammar options: {}", err),
            Error::Compile(ref err) => write!(f, "Failed to compile token: {}", err),
            Error::UnknownToken(ref name) => write!(f, "No token named {}", name),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Options(ref err) => Some(err),
            Error::Compile(ref err) => Some(err),
            Error::UnknownToken(_) => None,
        }
    }
}

impl From<OptionError> for Error {
    fn from(err: OptionError) -> Error {
        Error::Options(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Error {
        Error::Compile(err)
    }
}

use {
    crate::core::{
        lex::{
            state::{LexicalState, LexicalStateBuilder},
            token::{root_element, unwrap_label, Token},
        },
        pattern::{Pattern, RegexCompiler},
        tree::{NameResolver, NodeId, Production, RegexKind, RegexNode, RegexUnit, SyntaxTree},
        util::string_utils,
    },
    std::collections::HashMap,
};

pub mod loops;
pub mod shadow;
pub mod state;
pub mod token;

pub const DEFAULT_STATE: &str = "DEFAULT";

/// Only regular tokens, the default for matching.
pub const JUST_TOKEN: &[RegexKind] = &[RegexKind::Token];

pub const ALL_KINDS: &[RegexKind] = &[
    RegexKind::Token,
    RegexKind::SpecialToken,
    RegexKind::Skip,
    RegexKind::More,
];

struct TokenPatterns {
    prefix: Option<Pattern>,
    full: Option<Pattern>,
}

/// The lexical states of a grammar and the tokens they contain.
///
/// Built once from a tree snapshot and never modified afterwards. A `DEFAULT` state always
/// exists.
pub struct LexicalGrammar<'t> {
    tree: &'t SyntaxTree,
    states: Vec<LexicalState<'t>>,
    default_state: usize,
    all_tokens: Vec<Token<'t>>,
    patterns: HashMap<NodeId, TokenPatterns>,
}

impl<'t> LexicalGrammar<'t> {
    pub fn build(tree: &'t SyntaxTree) -> Self {
        let ignore_case = tree.options().ignore_case();
        let mut builders = init_builders(tree);
        let default_state = builders
            .iter()
            .position(|builder| builder.name() == DEFAULT_STATE)
            .unwrap_or(0);

        for (_, production) in tree.productions() {
            match *production {
                Production::Regex(ref regex) => {
                    for spec in &regex.specs {
                        let token = Token::explicit(regex, spec, ignore_case);
                        for builder in builders.iter_mut() {
                            if regex.lexical_states.is_empty()
                                || regex.lexical_states.iter().any(|s| s == builder.name())
                            {
                                builder.add_token(token, tree);
                            }
                        }
                    }
                }
                Production::Bnf(ref bnf) => {
                    let units = match bnf.expansion {
                        Some(ref expansion) => expansion.regex_units(),
                        None => continue,
                    };
                    let builder = &mut builders[default_state];
                    for unit in units {
                        if let Some(token) = synthesize(unit, builder, ignore_case) {
                            builder.add_token(token, tree);
                        }
                    }
                }
                Production::Javacode(_) => {}
            }
        }

        let states: Vec<LexicalState<'t>> =
            builders.into_iter().map(LexicalStateBuilder::build).collect();

        let mut all_tokens: Vec<Token<'t>> = states
            .iter()
            .flat_map(|state| state.tokens().iter().cloned())
            .collect();
        all_tokens.sort();
        all_tokens.dedup();

        let compiler = RegexCompiler::new(tree);
        let patterns: HashMap<NodeId, TokenPatterns> = all_tokens
            .iter()
            .map(|token| {
                let patterns = TokenPatterns {
                    prefix: compiler.compile_token(token, true),
                    full: compiler.compile_token(token, false),
                };
                (token.id(), patterns)
            })
            .collect();

        LexicalGrammar {
            tree,
            states,
            default_state,
            all_tokens,
            patterns,
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn lexical_states(&self) -> &[LexicalState<'t>] {
        &self.states
    }

    pub fn default_state(&self) -> &LexicalState<'t> {
        &self.states[self.default_state]
    }

    pub fn get_lexical_state(&self, name: &str) -> Option<&LexicalState<'t>> {
        self.states.iter().find(|state| state.name() == name)
    }

    /// The states with the given names, or all states if `names` is empty.
    pub fn get_lexical_states(&self, names: &[&str]) -> Vec<&LexicalState<'t>> {
        self.states
            .iter()
            .filter(|state| names.is_empty() || names.iter().any(|name| *name == state.name()))
            .collect()
    }

    /// Every distinct token of the grammar, in declaration order.
    pub fn all_tokens(&self) -> &[Token<'t>] {
        &self.all_tokens
    }

    /// The first token declared with this name. Names are unique in well-formed grammars, but
    /// malformed ones may contain duplicates.
    pub fn get_token_by_name(&self, name: &str) -> Option<Token<'t>> {
        let tree: &'t SyntaxTree = self.tree;
        tree.tokens_named(name).into_iter().next()
    }

    pub fn get_tokens_by_name(&self, name: &str) -> Vec<Token<'t>> {
        let tree: &'t SyntaxTree = self.tree;
        tree.tokens_named(name)
    }

    /// The pattern matching a prefix of a text, `None` if the token's regex does not compile.
    pub fn prefix_pattern(&self, token: &Token) -> Option<&Pattern> {
        self.patterns.get(&token.id())?.prefix.as_ref()
    }

    /// The pattern matching a whole text.
    pub fn full_pattern(&self, token: &Token) -> Option<&Pattern> {
        self.patterns.get(&token.id())?.full.as_ref()
    }

    /// Returns the token the JavaCC token manager would produce for `text` in `state`.
    ///
    /// # Parameters
    ///
    /// * `state` - the name of the lexical state to match in.
    /// * `text` - the text to match.
    /// * `exact` - if true, only string tokens whose literal is exactly `text` are considered and
    /// the first one declared is returned. Otherwise the token matching the longest prefix of
    /// `text` wins, ties going to the token declared first. Private tokens never win such a
    /// match since they are not lexed on their own.
    /// * `stop_at` - if set, only tokens declared at or before this site are considered.
    /// * `kinds` - the regex kinds to consider, usually `JUST_TOKEN`.
    pub fn match_literal(
        &self,
        state: &str,
        text: &str,
        exact: bool,
        stop_at: Option<NodeId>,
        kinds: &[RegexKind],
    ) -> Option<Token<'t>> {
        let state = self.get_lexical_state(state)?;
        let candidates = state
            .tokens()
            .iter()
            .filter(|token| kinds.contains(&token.regex_kind()))
            .filter(|token| stop_at.map_or(true, |stop_at| token.id() <= stop_at));

        if exact {
            return candidates.cloned().find(|token| token.matches_literal(text));
        }

        candidates
            .filter(|token| !token.is_private())
            .filter_map(|token| self.munch(token, text).map(|len| (*token, len)))
            .max_by(|(left, left_len), (right, right_len)| {
                left_len.cmp(right_len).then_with(|| {
                    right
                        .declaration_offset()
                        .cmp(&left.declaration_offset())
                })
            })
            .map(|(token, _)| token)
    }

    /// Length of the longest non-empty prefix of `text` matched by `token`.
    fn munch(&self, token: &Token, text: &str) -> Option<usize> {
        if !self.prefix_pattern(token)?.is_match(text) {
            return None;
        }
        self.full_pattern(token)?.longest_match(text)
    }

    /// The token a regex unit of a BNF expansion stands for: the string token matching it
    /// exactly in the `DEFAULT` state, the token it references, or the synthetic token declared
    /// at that unit.
    pub fn token_for_unit(&self, unit: &RegexUnit) -> Option<Token<'t>> {
        let tree: &'t SyntaxTree = self.tree;

        match unwrap_label(&unit.regex) {
            Some(RegexNode::Reference(name)) => return tree.resolve_token(name),
            Some(RegexNode::Literal(raw)) => {
                let value = string_utils::replace_escapes(raw);
                let matched = self.match_literal(DEFAULT_STATE, &value, true, None, ALL_KINDS);
                if matched.is_some() {
                    return matched;
                }
            }
            _ => {}
        }

        self.all_tokens
            .iter()
            .find(|token| token.id() == unit.id)
            .cloned()
    }

    /// Lexical states reachable from `state` in one transition.
    pub fn successors(&self, state: &str) -> Vec<&LexicalState<'t>> {
        match self.get_lexical_state(state) {
            Some(state) => state
                .transitions()
                .into_iter()
                .filter_map(|name| self.get_lexical_state(name))
                .collect(),
            None => vec![],
        }
    }

    /// Lexical states from which `state` is reachable in one transition.
    pub fn predecessors(&self, state: &str) -> Vec<&LexicalState<'t>> {
        self.states
            .iter()
            .filter(|candidate| candidate.transitions().iter().any(|name| *name == state))
            .collect()
    }
}

/// Creates one builder per lexical state mentioned by a regex production, in order of first
/// mention, then `DEFAULT` if it was never mentioned.
fn init_builders<'t>(tree: &'t SyntaxTree) -> Vec<LexicalStateBuilder<'t>> {
    let mut builders: Vec<LexicalStateBuilder<'t>> = Vec::new();

    for (_, production) in tree.productions() {
        if let Production::Regex(ref regex) = *production {
            for name in &regex.lexical_states {
                if !builders.iter().any(|builder| builder.name() == name) {
                    builders.push(LexicalStateBuilder::new(name));
                }
            }
        }
    }

    if !builders.iter().any(|builder| builder.name() == DEFAULT_STATE) {
        builders.push(LexicalStateBuilder::new(DEFAULT_STATE));
    }

    builders
}

/// The synthetic token declared by an inline regex unit, if JavaCC would create one: `<EOF>`
/// and references declare nothing, and string literals already declared in the default state
/// reuse that declaration.
fn synthesize<'t>(
    unit: &'t RegexUnit,
    default_builder: &LexicalStateBuilder<'t>,
    ignore_case: bool,
) -> Option<Token<'t>> {
    if let RegexNode::Eof = unit.regex {
        return None;
    }

    if let Some(RegexNode::Reference(_)) = unwrap_label(&unit.regex) {
        return None;
    }

    if let Some(RegexNode::Literal(raw)) = root_element(&unit.regex) {
        let value = string_utils::replace_escapes(raw);
        if default_builder
            .current_tokens()
            .iter()
            .any(|token| token.matches_literal(&value))
        {
            return None;
        }
    }

    Some(Token::synthetic(unit, ignore_case))
}

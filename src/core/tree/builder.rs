use crate::core::{
    config::GrammarOptions,
    tree::{
        BnfProduction, CharacterDescriptor, Expansion, JavacodeProduction, Lookahead, NodeId,
        OccurrenceIndicator, Production, RegexKind, RegexNode, RegexProduction, RegexSpec,
        RegexUnit, RepetitionKind, SyntaxTree,
    },
};

/// Assembles the productions of a grammar in declaration order.
pub struct SyntaxTreeBuilder {
    productions: Vec<Production>,
    options: GrammarOptions,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        SyntaxTreeBuilder {
            productions: Vec::new(),
            options: GrammarOptions::new(),
        }
    }

    pub fn options(&mut self, options: GrammarOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn bnf(&mut self, name: &str, expansion: Expansion) -> &mut Self {
        self.productions.push(Production::Bnf(BnfProduction {
            name: name.to_string(),
            expansion: Some(expansion),
        }));
        self
    }

    /// A BNF production whose expansion is missing, as produced for a half-written rule.
    pub fn bnf_incomplete(&mut self, name: &str) -> &mut Self {
        self.productions.push(Production::Bnf(BnfProduction {
            name: name.to_string(),
            expansion: None,
        }));
        self
    }

    pub fn javacode(&mut self, name: &str) -> &mut Self {
        self.productions
            .push(Production::Javacode(JavacodeProduction {
                name: name.to_string(),
            }));
        self
    }

    /// Starts a regex production applying to all lexical states.
    pub fn tokens(&mut self, kind: RegexKind) -> RegexProductionBuilder<'_> {
        self.tokens_in(&[], kind)
    }

    /// Starts a regex production applying to the given lexical states.
    pub fn tokens_in(&mut self, states: &[&str], kind: RegexKind) -> RegexProductionBuilder<'_> {
        self.productions.push(Production::Regex(RegexProduction {
            lexical_states: states.iter().map(|state| state.to_string()).collect(),
            kind,
            ignore_case: false,
            specs: Vec::new(),
        }));
        let index = self.productions.len() - 1;

        RegexProductionBuilder {
            tree_builder: self,
            index,
        }
    }

    pub fn build(self) -> SyntaxTree {
        SyntaxTree::new(self.productions, self.options)
    }
}

pub struct RegexProductionBuilder<'builder> {
    tree_builder: &'builder mut SyntaxTreeBuilder,
    index: usize,
}

impl<'builder> RegexProductionBuilder<'builder> {
    fn production(&mut self) -> &mut RegexProduction {
        match self.tree_builder.productions[self.index] {
            Production::Regex(ref mut regex) => regex,
            _ => unreachable!(),
        }
    }

    pub fn ignore_case(&mut self) -> &mut Self {
        self.production().ignore_case = true;
        self
    }

    pub fn spec(&mut self, regex: RegexNode) -> &mut Self {
        self.push_spec(regex, None)
    }

    /// Adds a spec that switches the lexer to `next_state` once matched.
    pub fn spec_to(&mut self, regex: RegexNode, next_state: &str) -> &mut Self {
        self.push_spec(regex, Some(next_state.to_string()))
    }

    fn push_spec(&mut self, regex: RegexNode, next_state: Option<String>) -> &mut Self {
        self.production().specs.push(RegexSpec {
            id: NodeId(0),
            regex,
            next_state,
        });
        self
    }
}

pub fn lit(text: &str) -> RegexNode {
    RegexNode::Literal(text.to_string())
}

pub fn named(name: &str, inner: RegexNode) -> RegexNode {
    RegexNode::Named {
        name: name.to_string(),
        private: false,
        inner: Box::new(inner),
    }
}

pub fn private(name: &str, inner: RegexNode) -> RegexNode {
    RegexNode::Named {
        name: name.to_string(),
        private: true,
        inner: Box::new(inner),
    }
}

pub fn reference(name: &str) -> RegexNode {
    RegexNode::Reference(name.to_string())
}

pub fn container(inner: RegexNode) -> RegexNode {
    RegexNode::Container(Some(Box::new(inner)))
}

pub fn eof() -> RegexNode {
    RegexNode::Eof
}

pub fn regex_seq(parts: Vec<RegexNode>) -> RegexNode {
    RegexNode::Sequence(parts)
}

pub fn regex_alt(branches: Vec<RegexNode>) -> RegexNode {
    RegexNode::Alternative(branches)
}

pub fn group(inner: RegexNode, indicator: Option<OccurrenceIndicator>) -> RegexNode {
    RegexNode::Parenthesized(Box::new(inner), indicator)
}

/// A character list such as `["a"-"z", "_"]`, bounds given escaped.
pub fn chars(descriptors: &[(&str, Option<&str>)]) -> RegexNode {
    character_list(false, descriptors)
}

/// A negated character list such as `~["\n"]`.
pub fn not_chars(descriptors: &[(&str, Option<&str>)]) -> RegexNode {
    character_list(true, descriptors)
}

fn character_list(negated: bool, descriptors: &[(&str, Option<&str>)]) -> RegexNode {
    RegexNode::CharacterList {
        negated,
        descriptors: descriptors
            .iter()
            .map(|&(start, end)| CharacterDescriptor {
                start: start.to_string(),
                end: end.map(|end| end.to_string()),
            })
            .collect(),
    }
}

pub fn seq(units: Vec<Expansion>) -> Expansion {
    Expansion::Sequence(units)
}

pub fn alt(branches: Vec<Expansion>) -> Expansion {
    Expansion::Alternative(branches)
}

pub fn opt(inner: Expansion) -> Expansion {
    Expansion::Optional(Box::new(inner))
}

pub fn zero_or_more(inner: Expansion) -> Expansion {
    Expansion::Repeated(Box::new(inner), RepetitionKind::ZeroOrMore)
}

pub fn one_or_more(inner: Expansion) -> Expansion {
    Expansion::Repeated(Box::new(inner), RepetitionKind::OneOrMore)
}

pub fn paren(inner: Expansion, indicator: Option<OccurrenceIndicator>) -> Expansion {
    Expansion::Parenthesized(Box::new(inner), indicator)
}

pub fn assigned(inner: Expansion) -> Expansion {
    Expansion::Assigned(Box::new(inner))
}

pub fn scoped(inner: Expansion, node: &str) -> Expansion {
    Expansion::Scoped(Box::new(inner), node.to_string())
}

pub fn try_catch(inner: Expansion) -> Expansion {
    Expansion::TryCatch(Box::new(inner))
}

pub fn lookahead(amount: Option<u32>, expansion: Option<Expansion>) -> Expansion {
    Expansion::Lookahead(Lookahead {
        amount,
        expansion: expansion.map(Box::new),
        semantic: None,
    })
}

pub fn semantic_lookahead(predicate: &str) -> Expansion {
    Expansion::Lookahead(Lookahead {
        amount: None,
        expansion: None,
        semantic: Some(predicate.to_string()),
    })
}

pub fn action() -> Expansion {
    Expansion::Action
}

pub fn nt(name: &str) -> Expansion {
    Expansion::NonTerminal(name.to_string())
}

pub fn unit(regex: RegexNode) -> Expansion {
    Expansion::Regex(RegexUnit {
        id: NodeId(0),
        regex,
    })
}

use {
    crate::core::{
        bnf::nullable::expansion_matches_empty,
        lex::{token::Token, LexicalGrammar},
        tree::{
            Expansion, NameResolver, Production, ProductionId, RegexNode, RepetitionKind,
            SyntaxTree,
        },
    },
    std::collections::{HashMap, HashSet},
};

/// An element of a FIRST set.
#[derive(Clone, Debug, PartialEq)]
pub enum AtomicUnit<'t> {
    Token(Token<'t>),
    UnresolvedToken(String),
    UnresolvedProduction(String),
    /// A production not expanded further: javacode, left-recursive, or matching at most one
    /// token when unary productions are grouped.
    Production(ProductionId),
}

/// Computes the FIRST set of a production: the tokens that may start a match of it.
///
/// If `group_unary` is set, productions that can match at most one token are not expanded and
/// stand for themselves in the set.
pub fn first_set<'t>(
    grammar: &LexicalGrammar<'t>,
    nullable_set: &HashSet<ProductionId>,
    production: ProductionId,
    group_unary: bool,
) -> Vec<AtomicUnit<'t>> {
    let mut builder = FirstSetBuilder {
        grammar,
        nullable_set,
        group_unary,
        path: Vec::new(),
        cache: HashMap::new(),
        max_tokens: HashMap::new(),
    };
    builder.production(production)
}

struct FirstSetBuilder<'g, 't> {
    grammar: &'g LexicalGrammar<'t>,
    nullable_set: &'g HashSet<ProductionId>,
    group_unary: bool,
    path: Vec<ProductionId>,
    cache: HashMap<ProductionId, Vec<AtomicUnit<'t>>>,
    max_tokens: HashMap<ProductionId, Option<usize>>,
}

impl<'g, 't> FirstSetBuilder<'g, 't> {
    fn production(&mut self, id: ProductionId) -> Vec<AtomicUnit<'t>> {
        if let Some(first) = self.cache.get(&id) {
            return first.clone();
        }
        if self.path.contains(&id) {
            return vec![AtomicUnit::Production(id)];
        }

        let tree: &'t SyntaxTree = self.grammar.tree();
        let expansion = match tree.production(id) {
            Some(Production::Bnf(bnf)) => bnf.expansion.as_ref(),
            Some(Production::Javacode(_)) => return vec![AtomicUnit::Production(id)],
            _ => return vec![],
        };

        let first = if self.group_unary
            && max_production_tokens(tree, id, &mut self.max_tokens).map_or(false, |max| max <= 1)
        {
            vec![AtomicUnit::Production(id)]
        } else {
            self.path.push(id);
            let mut first = Vec::new();
            if let Some(expansion) = expansion {
                self.expansion(expansion, &mut first);
            }
            self.path.pop();
            first
        };

        self.cache.insert(id, first.clone());
        first
    }

    fn expansion(&mut self, expansion: &'t Expansion, first: &mut Vec<AtomicUnit<'t>>) {
        match *expansion {
            Expansion::Lookahead(_) | Expansion::Action => {}
            Expansion::Regex(ref unit) => match self.grammar.token_for_unit(unit) {
                Some(token) => add(first, AtomicUnit::Token(token)),
                None => {
                    if let RegexNode::Reference(ref name) = unit.regex {
                        add(first, AtomicUnit::UnresolvedToken(name.clone()));
                    }
                }
            },
            Expansion::Optional(ref inner)
            | Expansion::Repeated(ref inner, _)
            | Expansion::Parenthesized(ref inner, _)
            | Expansion::Assigned(ref inner)
            | Expansion::Scoped(ref inner, _)
            | Expansion::TryCatch(ref inner) => self.expansion(inner, first),
            Expansion::Sequence(ref units) => {
                let tree = self.grammar.tree();
                let nullable_set = self.nullable_set;
                for unit in units {
                    self.expansion(unit, first);
                    if !expansion_matches_empty(tree, unit, &mut |id| nullable_set.contains(&id)) {
                        break;
                    }
                }
            }
            Expansion::Alternative(ref branches) => {
                for branch in branches {
                    self.expansion(branch, first);
                }
            }
            Expansion::NonTerminal(ref name) => {
                match self.grammar.tree().resolve_production(name) {
                    Some(id) => {
                        for unit in self.production(id) {
                            add(first, unit);
                        }
                    }
                    None => add(first, AtomicUnit::UnresolvedProduction(name.clone())),
                }
            }
        }
    }
}

fn add<'t>(first: &mut Vec<AtomicUnit<'t>>, unit: AtomicUnit<'t>) {
    if !first.contains(&unit) {
        first.push(unit);
    }
}

/// Maximum number of tokens the production can match, `None` if unbounded. Javacode
/// productions and productions re-entered while being counted are unbounded.
fn max_production_tokens(
    tree: &SyntaxTree,
    id: ProductionId,
    memo: &mut HashMap<ProductionId, Option<usize>>,
) -> Option<usize> {
    if let Some(max) = memo.get(&id) {
        return *max;
    }

    // Unbounded while in progress.
    memo.insert(id, None);
    let max = match tree.production(id) {
        Some(Production::Bnf(bnf)) => match bnf.expansion {
            Some(ref expansion) => max_tokens(tree, expansion, memo),
            None => Some(0),
        },
        _ => None,
    };
    memo.insert(id, max);
    max
}

fn max_tokens(
    tree: &SyntaxTree,
    expansion: &Expansion,
    memo: &mut HashMap<ProductionId, Option<usize>>,
) -> Option<usize> {
    match *expansion {
        Expansion::Lookahead(_) | Expansion::Action => Some(0),
        Expansion::Regex(_) => Some(1),
        Expansion::Repeated(_, RepetitionKind::ZeroOrMore)
        | Expansion::Repeated(_, RepetitionKind::OneOrMore) => None,
        Expansion::Parenthesized(ref inner, indicator) => match indicator {
            Some(indicator) if indicator.is_unbounded() => None,
            _ => max_tokens(tree, inner, memo),
        },
        Expansion::Optional(ref inner)
        | Expansion::Assigned(ref inner)
        | Expansion::Scoped(ref inner, _)
        | Expansion::TryCatch(ref inner) => max_tokens(tree, inner, memo),
        Expansion::Sequence(ref units) => units.iter().try_fold(0, |sum, unit| {
            max_tokens(tree, unit, memo).map(|max| sum + max)
        }),
        Expansion::Alternative(ref branches) => branches.iter().try_fold(0, |acc, branch| {
            max_tokens(tree, branch, memo).map(|max| acc.max(max))
        }),
        Expansion::NonTerminal(ref name) => {
            let id = tree.resolve_production(name)?;
            max_production_tokens(tree, id, memo)
        }
    }
}

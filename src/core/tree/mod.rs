use {
    crate::core::{config::GrammarOptions, lex::token::Token},
    std::{collections::HashMap, fmt},
};

pub mod builder;

/// Identifies a token declaration site: a regex spec of a regex production or a regex unit
/// inside a BNF expansion. Ids follow document order, so they double as declaration offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a top-level production in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum Production {
    Bnf(BnfProduction),
    Regex(RegexProduction),
    Javacode(JavacodeProduction),
}

impl Production {
    pub fn name(&self) -> Option<&str> {
        match *self {
            Production::Bnf(ref bnf) => Some(bnf.name.as_str()),
            Production::Javacode(ref javacode) => Some(javacode.name.as_str()),
            Production::Regex(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BnfProduction {
    pub name: String,
    pub expansion: Option<Expansion>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JavacodeProduction {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegexProduction {
    /// Empty means the production applies to all lexical states (`<*>`).
    pub lexical_states: Vec<String>,
    pub kind: RegexKind,
    pub ignore_case: bool,
    pub specs: Vec<RegexSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegexSpec {
    pub id: NodeId,
    pub regex: RegexNode,
    pub next_state: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegexKind {
    Token,
    SpecialToken,
    Skip,
    More,
}

impl fmt::Display for RegexKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RegexKind::Token => write!(f, "TOKEN"),
            RegexKind::SpecialToken => write!(f, "SPECIAL_TOKEN"),
            RegexKind::Skip => write!(f, "SKIP"),
            RegexKind::More => write!(f, "MORE"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepetitionKind {
    ZeroOrMore,
    OneOrMore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccurrenceIndicator {
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
    Range { min: u32, max: Option<u32> },
}

impl OccurrenceIndicator {
    /// True if the indicator allows zero repetitions of the decorated node.
    pub fn admits_zero(&self) -> bool {
        match *self {
            OccurrenceIndicator::ZeroOrOne | OccurrenceIndicator::ZeroOrMore => true,
            OccurrenceIndicator::OneOrMore => false,
            OccurrenceIndicator::Range { min, .. } => min == 0,
        }
    }

    /// True if the indicator allows more than one repetition.
    pub fn is_unbounded(&self) -> bool {
        match *self {
            OccurrenceIndicator::ZeroOrOne => false,
            OccurrenceIndicator::ZeroOrMore | OccurrenceIndicator::OneOrMore => true,
            OccurrenceIndicator::Range { max, .. } => max.map_or(true, |max| max > 1),
        }
    }
}

impl fmt::Display for OccurrenceIndicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OccurrenceIndicator::ZeroOrOne => write!(f, "?"),
            OccurrenceIndicator::ZeroOrMore => write!(f, "*"),
            OccurrenceIndicator::OneOrMore => write!(f, "+"),
            OccurrenceIndicator::Range { min, max: None } => write!(f, "{{{},}}", min),
            OccurrenceIndicator::Range {
                min,
                max: Some(max),
            } if min == max => write!(f, "{{{}}}", min),
            OccurrenceIndicator::Range {
                min,
                max: Some(max),
            } => write!(f, "{{{},{}}}", min, max),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expansion {
    Sequence(Vec<Expansion>),
    Alternative(Vec<Expansion>),
    Optional(Box<Expansion>),
    Repeated(Box<Expansion>, RepetitionKind),
    Parenthesized(Box<Expansion>, Option<OccurrenceIndicator>),
    Assigned(Box<Expansion>),
    Scoped(Box<Expansion>, String),
    TryCatch(Box<Expansion>),
    Lookahead(Lookahead),
    Action,
    NonTerminal(String),
    Regex(RegexUnit),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lookahead {
    pub amount: Option<u32>,
    pub expansion: Option<Box<Expansion>>,
    pub semantic: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegexUnit {
    pub id: NodeId,
    pub regex: RegexNode,
}

impl Expansion {
    /// Direct sub-expansions, including the nested expansion of a syntactic lookahead.
    pub fn children(&self) -> Vec<&Expansion> {
        match *self {
            Expansion::Sequence(ref units) | Expansion::Alternative(ref units) => {
                units.iter().collect()
            }
            Expansion::Optional(ref inner)
            | Expansion::Repeated(ref inner, _)
            | Expansion::Parenthesized(ref inner, _)
            | Expansion::Assigned(ref inner)
            | Expansion::Scoped(ref inner, _)
            | Expansion::TryCatch(ref inner) => vec![&**inner],
            Expansion::Lookahead(ref lookahead) => match lookahead.expansion {
                Some(ref inner) => vec![&**inner],
                None => vec![],
            },
            Expansion::Action | Expansion::NonTerminal(_) | Expansion::Regex(_) => vec![],
        }
    }

    /// Visits this expansion and all its descendants in pre-order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Expansion)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// The child at `index`, in the order of `children`.
    pub fn child(&self, index: usize) -> Option<&Expansion> {
        match *self {
            Expansion::Sequence(ref units) | Expansion::Alternative(ref units) => units.get(index),
            Expansion::Optional(ref inner)
            | Expansion::Repeated(ref inner, _)
            | Expansion::Parenthesized(ref inner, _)
            | Expansion::Assigned(ref inner)
            | Expansion::Scoped(ref inner, _)
            | Expansion::TryCatch(ref inner) if index == 0 => Some(&**inner),
            Expansion::Lookahead(ref lookahead) if index == 0 => {
                lookahead.expansion.as_ref().map(|inner| &**inner)
            }
            _ => None,
        }
    }

    /// Follows a path of child indices down from this expansion.
    pub fn descendant(&self, path: &[usize]) -> Option<&Expansion> {
        path.iter()
            .try_fold(self, |expansion, index| expansion.child(*index))
    }

    /// Pre-order walk passing each expansion with its path of child indices from `self`.
    fn walk_mut(
        &mut self,
        path: &mut Vec<usize>,
        f: &mut dyn FnMut(&mut Expansion, &[usize]),
    ) {
        f(self, path);
        match *self {
            Expansion::Sequence(ref mut units) | Expansion::Alternative(ref mut units) => {
                for (index, unit) in units.iter_mut().enumerate() {
                    path.push(index);
                    unit.walk_mut(path, f);
                    path.pop();
                }
            }
            Expansion::Optional(ref mut inner)
            | Expansion::Repeated(ref mut inner, _)
            | Expansion::Parenthesized(ref mut inner, _)
            | Expansion::Assigned(ref mut inner)
            | Expansion::Scoped(ref mut inner, _)
            | Expansion::TryCatch(ref mut inner) => {
                path.push(0);
                inner.walk_mut(path, f);
                path.pop();
            }
            Expansion::Lookahead(ref mut lookahead) => {
                if let Some(ref mut inner) = lookahead.expansion {
                    path.push(0);
                    inner.walk_mut(path, f);
                    path.pop();
                }
            }
            Expansion::Action | Expansion::NonTerminal(_) | Expansion::Regex(_) => {}
        }
    }

    /// All regex units of this expansion in document order.
    pub fn regex_units(&self) -> Vec<&RegexUnit> {
        let mut units = Vec::new();
        self.walk(&mut |exp| {
            if let Expansion::Regex(ref unit) = *exp {
                units.push(unit);
            }
        });
        units
    }

    /// Names of all non-terminals referenced by this expansion in document order.
    pub fn non_terminals(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |exp| {
            if let Expansion::NonTerminal(ref name) = *exp {
                names.push(name.as_str());
            }
        });
        names
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegexNode {
    /// The text between the quotes, escapes included.
    Literal(String),
    Named {
        name: String,
        private: bool,
        inner: Box<RegexNode>,
    },
    Reference(String),
    Container(Option<Box<RegexNode>>),
    Eof,
    Sequence(Vec<RegexNode>),
    Alternative(Vec<RegexNode>),
    CharacterList {
        negated: bool,
        descriptors: Vec<CharacterDescriptor>,
    },
    Parenthesized(Box<RegexNode>, Option<OccurrenceIndicator>),
}

/// A single character or character range of a character list. Bounds are kept escaped.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterDescriptor {
    pub start: String,
    pub end: Option<String>,
}

impl RegexNode {
    pub fn children(&self) -> Vec<&RegexNode> {
        match *self {
            RegexNode::Named { ref inner, .. } | RegexNode::Parenthesized(ref inner, _) => {
                vec![&**inner]
            }
            RegexNode::Container(Some(ref inner)) => vec![&**inner],
            RegexNode::Sequence(ref parts) | RegexNode::Alternative(ref parts) => {
                parts.iter().collect()
            }
            RegexNode::Container(None)
            | RegexNode::Literal(_)
            | RegexNode::Reference(_)
            | RegexNode::Eof
            | RegexNode::CharacterList { .. } => vec![],
        }
    }

    /// Visits this node and all its descendants in pre-order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a RegexNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Names referenced with `<NAME>` anywhere in this regex, in document order.
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node| {
            if let RegexNode::Reference(ref name) = *node {
                names.push(name.as_str());
            }
        });
        names
    }
}

/// Where a token is declared.
#[derive(Clone, Copy, Debug)]
pub enum TokenSite<'t> {
    Explicit {
        production: &'t RegexProduction,
        spec: &'t RegexSpec,
    },
    Synthetic(&'t RegexUnit),
}

#[derive(Clone, Debug)]
enum SiteLocation {
    Spec {
        production: ProductionId,
        spec: usize,
    },
    /// Child indices leading from the production's expansion to the unit.
    Unit {
        production: ProductionId,
        path: Vec<usize>,
    },
}

/// Resolves names used in a grammar. Lookups return the first declaration in document order.
pub trait NameResolver {
    fn resolve_token(&self, name: &str) -> Option<Token<'_>>;
    fn resolve_production(&self, name: &str) -> Option<ProductionId>;
}

/// An immutable snapshot of a parsed grammar.
#[derive(Debug)]
pub struct SyntaxTree {
    productions: Vec<Production>,
    options: GrammarOptions,
    sites: Vec<SiteLocation>,
    tokens_by_name: HashMap<String, Vec<NodeId>>,
    productions_by_name: HashMap<String, Vec<ProductionId>>,
}

impl SyntaxTree {
    /// Takes ownership of the productions and numbers every token site in document order.
    pub fn new(mut productions: Vec<Production>, options: GrammarOptions) -> Self {
        let mut sites: Vec<SiteLocation> = Vec::new();
        let mut productions_by_name: HashMap<String, Vec<ProductionId>> = HashMap::new();

        for (index, production) in productions.iter_mut().enumerate() {
            let production_id = ProductionId(index);

            if let Some(name) = production.name() {
                productions_by_name
                    .entry(name.to_string())
                    .or_insert_with(Vec::new)
                    .push(production_id);
            }

            match *production {
                Production::Regex(ref mut regex) => {
                    for (spec_index, spec) in regex.specs.iter_mut().enumerate() {
                        spec.id = NodeId(sites.len());
                        sites.push(SiteLocation::Spec {
                            production: production_id,
                            spec: spec_index,
                        });
                    }
                }
                Production::Bnf(ref mut bnf) => {
                    if let Some(ref mut expansion) = bnf.expansion {
                        expansion.walk_mut(&mut vec![], &mut |exp, path| {
                            if let Expansion::Regex(ref mut unit) = *exp {
                                unit.id = NodeId(sites.len());
                                sites.push(SiteLocation::Unit {
                                    production: production_id,
                                    path: path.to_vec(),
                                });
                            }
                        });
                    }
                }
                Production::Javacode(_) => {}
            }
        }

        let mut tree = SyntaxTree {
            productions,
            options,
            sites,
            tokens_by_name: HashMap::new(),
            productions_by_name,
        };
        tree.tokens_by_name = tree.index_named_tokens();
        tree
    }

    fn index_named_tokens(&self) -> HashMap<String, Vec<NodeId>> {
        let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
        for token in self.token_sites() {
            if let Some(name) = token.name() {
                index
                    .entry(name.to_string())
                    .or_insert_with(Vec::new)
                    .push(token.id());
            }
        }
        index
    }

    pub fn options(&self) -> &GrammarOptions {
        &self.options
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionId, &Production)> {
        self.productions
            .iter()
            .enumerate()
            .map(|(index, production)| (ProductionId(index), production))
    }

    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id.0)
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub fn production_name(&self, id: ProductionId) -> Option<&str> {
        self.production(id).and_then(Production::name)
    }

    pub fn bnf_productions(&self) -> impl Iterator<Item = (ProductionId, &BnfProduction)> {
        self.productions().filter_map(|(id, production)| match *production {
            Production::Bnf(ref bnf) => Some((id, bnf)),
            _ => None,
        })
    }

    /// The token declared at the given site.
    pub fn token(&self, id: NodeId) -> Option<Token<'_>> {
        let ignore_case = self.options.ignore_case();

        match *self.sites.get(id.0)? {
            SiteLocation::Spec { production, spec } => match *self.production(production)? {
                Production::Regex(ref regex) => regex
                    .specs
                    .get(spec)
                    .map(|spec| Token::explicit(regex, spec, ignore_case)),
                _ => None,
            },
            SiteLocation::Unit {
                production,
                ref path,
            } => match *self.production(production)? {
                Production::Bnf(ref bnf) => match *bnf.expansion.as_ref()?.descendant(path)? {
                    Expansion::Regex(ref unit) => Some(Token::synthetic(unit, ignore_case)),
                    _ => None,
                },
                _ => None,
            },
        }
    }

    /// Every potential token of the grammar in document order, before any deduplication.
    pub fn token_sites(&self) -> impl Iterator<Item = Token<'_>> {
        (0..self.sites.len()).filter_map(move |index| self.token(NodeId(index)))
    }

    pub fn tokens_named(&self, name: &str) -> Vec<Token<'_>> {
        match self.tokens_by_name.get(name) {
            Some(ids) => ids.iter().filter_map(|id| self.token(*id)).collect(),
            None => vec![],
        }
    }
}

impl NameResolver for SyntaxTree {
    fn resolve_token(&self, name: &str) -> Option<Token<'_>> {
        let id = self.tokens_by_name.get(name)?.first()?;
        self.token(*id)
    }

    fn resolve_production(&self, name: &str) -> Option<ProductionId> {
        self.productions_by_name.get(name)?.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{builder::*, *};

    #[test]
    fn sites_numbered_in_document_order() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("A", lit("a")))
            .spec(named("B", lit("b")));
        builder.bnf(
            "Start",
            seq(vec![
                lookahead(Some(1), Some(unit(lit("la")))),
                unit(lit("x")),
                nt("Other"),
            ]),
        );
        builder.tokens(RegexKind::Skip).spec(lit(" "));

        //exercise
        let tree = builder.build();

        //verify
        let offsets: Vec<usize> = tree.token_sites().map(|t| t.declaration_offset()).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
        assert_eq!(tree.token(NodeId(2)).unwrap().regular_expression(), &lit("la"));
        assert!(!tree.token(NodeId(3)).unwrap().is_explicit());
        assert_eq!(tree.token(NodeId(4)).unwrap().regex_kind(), RegexKind::Skip);
        assert!(tree.token(NodeId(5)).is_none());
    }

    #[test]
    fn nested_units_resolve_by_path() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf(
            "Start",
            alt(vec![
                seq(vec![unit(lit("a")), opt(paren(unit(lit("b")), None))]),
                zero_or_more(seq(vec![action(), unit(lit("c"))])),
            ]),
        );

        //exercise
        let tree = builder.build();

        //verify
        let literals: Vec<&RegexNode> = tree
            .token_sites()
            .map(|token| token.regular_expression())
            .collect();
        assert_eq!(literals, vec![&lit("a"), &lit("b"), &lit("c")]);
        let start = match tree.production(ProductionId(0)) {
            Some(Production::Bnf(bnf)) => bnf.expansion.as_ref().unwrap(),
            _ => panic!("Expected a BNF production"),
        };
        assert_eq!(start.descendant(&[1, 0, 1]), Some(&unit_with_id(lit("c"), 2)));
        assert!(start.descendant(&[2]).is_none());
    }

    fn unit_with_id(regex: RegexNode, id: usize) -> Expansion {
        Expansion::Regex(RegexUnit {
            id: NodeId(id),
            regex,
        })
    }

    #[test]
    fn resolve_first_declaration() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("A", lit("a")))
            .spec(named("A", lit("again")));
        builder.bnf("Start", unit(named("C", lit("c"))));
        builder.javacode("Skip");
        let tree = builder.build();

        //exercise
        let a = tree.resolve_token("A").unwrap();
        let c = tree.resolve_token("C").unwrap();
        let start = tree.resolve_production("Start");
        let skip = tree.resolve_production("Skip");

        //verify
        assert_eq!(a.declaration_offset(), 0);
        assert_eq!(tree.tokens_named("A").len(), 2);
        assert_eq!(c.declaration_offset(), 2);
        assert!(!c.is_explicit());
        assert_eq!(start, Some(ProductionId(1)));
        assert_eq!(skip, Some(ProductionId(2)));
        assert!(tree.resolve_token("Missing").is_none());
        assert!(tree.resolve_production("Missing").is_none());
    }

    #[test]
    fn occurrence_indicator_text() {
        //exercise
        let texts: Vec<String> = vec![
            OccurrenceIndicator::ZeroOrOne,
            OccurrenceIndicator::ZeroOrMore,
            OccurrenceIndicator::OneOrMore,
            OccurrenceIndicator::Range { min: 2, max: None },
            OccurrenceIndicator::Range {
                min: 3,
                max: Some(3),
            },
            OccurrenceIndicator::Range {
                min: 0,
                max: Some(4),
            },
        ]
        .iter()
        .map(|ind| ind.to_string())
        .collect();

        //verify
        assert_eq!(texts, vec!["?", "*", "+", "{2,}", "{3}", "{0,4}"]);
    }
}

use {
    crate::core::tree::{
        Expansion, NameResolver, OccurrenceIndicator, Production, ProductionId, RepetitionKind,
        SyntaxTree,
    },
    std::collections::{HashMap, HashSet},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Nullability {
    Unknown,
    Yes,
    No,
}

/// Answers whether productions and expansions can derive the empty string.
///
/// Single-production queries are memoized in a cache owned by the analyzer. A production
/// referenced again while its own nullability is still being computed counts as not nullable,
/// so cached answers may be too pessimistic for mutually recursive productions; use
/// `nullable_set` when a precise grammar-wide answer is needed.
pub struct NullabilityAnalyzer<'t> {
    tree: &'t SyntaxTree,
    memo: HashMap<ProductionId, Nullability>,
}

impl<'t> NullabilityAnalyzer<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        NullabilityAnalyzer {
            tree,
            memo: HashMap::new(),
        }
    }

    /// True if the production can derive the empty string. Only BNF productions with an
    /// expansion can; javacode productions are opaque.
    pub fn is_nullable(&mut self, production: ProductionId) -> bool {
        match self.memo.get(&production) {
            Some(Nullability::Yes) => return true,
            Some(Nullability::No) | Some(Nullability::Unknown) => return false,
            None => {}
        }

        self.memo.insert(production, Nullability::Unknown);

        let tree = self.tree;
        let nullable = match tree.production(production) {
            Some(Production::Bnf(bnf)) => match bnf.expansion {
                Some(ref expansion) => self.is_empty_match_possible(expansion, None),
                None => false,
            },
            _ => false,
        };

        let res = if nullable {
            Nullability::Yes
        } else {
            Nullability::No
        };
        self.memo.insert(production, res);
        nullable
    }

    /// True if the expansion can match without consuming a token. Referenced productions are
    /// looked up in `nullable_set` if given, or probed with `is_nullable` otherwise.
    pub fn is_empty_match_possible(
        &mut self,
        expansion: &Expansion,
        nullable_set: Option<&HashSet<ProductionId>>,
    ) -> bool {
        let tree = self.tree;
        match nullable_set {
            Some(set) => expansion_matches_empty(tree, expansion, &mut |id| set.contains(&id)),
            None => expansion_matches_empty(tree, expansion, &mut |id| self.is_nullable(id)),
        }
    }

    /// The set of all nullable BNF productions, as the least fixed point of the nullability
    /// equations. Each pass promotes the candidates nullable under the set confirmed by the
    /// previous passes, until a pass promotes nothing.
    pub fn nullable_set(&self) -> HashSet<ProductionId> {
        let tree = self.tree;
        let mut nullable: HashSet<ProductionId> = HashSet::new();
        let mut candidates: Vec<(ProductionId, &Expansion)> = tree
            .bnf_productions()
            .filter_map(|(id, bnf)| bnf.expansion.as_ref().map(|expansion| (id, expansion)))
            .collect();

        let mut passes = 0;
        loop {
            passes += 1;

            let (promoted, remaining): (Vec<_>, Vec<_>) =
                candidates.into_iter().partition(|&(_, expansion)| {
                    expansion_matches_empty(tree, expansion, &mut |id| nullable.contains(&id))
                });

            if promoted.is_empty() {
                break;
            }

            nullable.extend(promoted.into_iter().map(|(id, _)| id));
            candidates = remaining;
        }

        trace!(
            "Nullable set of {} productions reached in {} passes",
            nullable.len(),
            passes
        );
        nullable
    }
}

/// Structural nullability of an expansion. `is_nullable` answers for referenced BNF
/// productions; unresolved and javacode references are never nullable.
pub fn expansion_matches_empty(
    tree: &SyntaxTree,
    expansion: &Expansion,
    is_nullable: &mut dyn FnMut(ProductionId) -> bool,
) -> bool {
    match *expansion {
        Expansion::Action | Expansion::Lookahead(_) | Expansion::Optional(_) => true,
        Expansion::Repeated(_, RepetitionKind::ZeroOrMore) => true,
        Expansion::Repeated(ref inner, RepetitionKind::OneOrMore) => {
            expansion_matches_empty(tree, inner, is_nullable)
        }
        Expansion::Parenthesized(_, Some(OccurrenceIndicator::ZeroOrOne))
        | Expansion::Parenthesized(_, Some(OccurrenceIndicator::ZeroOrMore)) => true,
        Expansion::Parenthesized(ref inner, _)
        | Expansion::Assigned(ref inner)
        | Expansion::Scoped(ref inner, _)
        | Expansion::TryCatch(ref inner) => expansion_matches_empty(tree, inner, is_nullable),
        Expansion::Sequence(ref units) => units
            .iter()
            .all(|unit| expansion_matches_empty(tree, unit, is_nullable)),
        Expansion::Alternative(ref branches) => branches
            .iter()
            .any(|branch| expansion_matches_empty(tree, branch, is_nullable)),
        Expansion::Regex(_) => false,
        Expansion::NonTerminal(ref name) => match tree.resolve_production(name) {
            Some(id) => match tree.production(id) {
                Some(Production::Bnf(_)) => is_nullable(id),
                _ => false,
            },
            None => false,
        },
    }
}

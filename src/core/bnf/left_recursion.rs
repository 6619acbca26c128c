use {
    crate::core::{
        bnf::nullable::expansion_matches_empty,
        data::dfs::{self, Cycle},
        tree::{Expansion, NameResolver, Production, ProductionId, SyntaxTree},
    },
    std::collections::HashSet,
};

/// The productions that may be derived first from `production` without consuming a token, one
/// hop deep: the non-terminals at the start of its expansion, and after each nullable prefix.
///
/// Returns `None` for javacode productions and productions without an expansion, whose leftmost
/// derivations cannot be known, and when the leftmost part references an unknown production.
pub fn leftmost_set(
    tree: &SyntaxTree,
    production: ProductionId,
    nullable_set: &HashSet<ProductionId>,
) -> Option<Vec<ProductionId>> {
    let expansion = match tree.production(production)? {
        Production::Bnf(bnf) => bnf.expansion.as_ref()?,
        Production::Regex(_) => return Some(vec![]),
        Production::Javacode(_) => return None,
    };

    let mut leftmost: Vec<ProductionId> = Vec::new();
    collect_leftmost(tree, expansion, nullable_set, &mut leftmost)?;
    Some(leftmost)
}

fn collect_leftmost(
    tree: &SyntaxTree,
    expansion: &Expansion,
    nullable_set: &HashSet<ProductionId>,
    leftmost: &mut Vec<ProductionId>,
) -> Option<()> {
    match *expansion {
        Expansion::Sequence(ref units) => {
            for unit in units {
                collect_leftmost(tree, unit, nullable_set, leftmost)?;
                if !expansion_matches_empty(tree, unit, &mut |id| nullable_set.contains(&id)) {
                    break;
                }
            }
        }
        Expansion::Alternative(ref branches) => {
            for branch in branches {
                collect_leftmost(tree, branch, nullable_set, leftmost)?;
            }
        }
        Expansion::Optional(ref inner)
        | Expansion::Repeated(ref inner, _)
        | Expansion::Parenthesized(ref inner, _)
        | Expansion::Assigned(ref inner)
        | Expansion::Scoped(ref inner, _)
        | Expansion::TryCatch(ref inner) => {
            collect_leftmost(tree, inner, nullable_set, leftmost)?
        }
        Expansion::NonTerminal(ref name) => {
            let id = tree.resolve_production(name)?;
            if !leftmost.contains(&id) {
                leftmost.push(id);
            }
        }
        Expansion::Lookahead(_) | Expansion::Action | Expansion::Regex(_) => {}
    }

    Some(())
}

/// Finds productions that can derive themselves before consuming any token.
///
/// Every production is a potential root of the search, in declaration order. Productions whose
/// leftmost set is unknown contribute no edges.
pub fn detect_left_recursion(
    tree: &SyntaxTree,
    nullable_set: &HashSet<ProductionId>,
) -> Vec<Cycle<ProductionId>> {
    let successors = |index: usize| -> Vec<usize> {
        leftmost_set(tree, ProductionId(index), nullable_set)
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.0)
            .collect()
    };

    dfs::find_cycles(tree.production_count(), successors)
        .into_iter()
        .map(|cycle| cycle.map(ProductionId))
        .collect()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::core::{
            bnf::nullable::NullabilityAnalyzer,
            tree::{builder::*, RegexKind},
        },
    };

    fn cycles_of(tree: &SyntaxTree) -> Vec<Vec<&str>> {
        let nullable_set = NullabilityAnalyzer::new(tree).nullable_set();
        detect_left_recursion(tree, &nullable_set)
            .iter()
            .map(|cycle| {
                cycle
                    .path()
                    .iter()
                    .map(|id| tree.production_name(*id).unwrap_or("?"))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn direct_left_recursion() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf("Bar", seq(vec![nt("Bar"), unit(lit("foo"))]));
        let tree = builder.build();

        //exercise
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(cycles, vec![vec!["Bar", "Bar"]]);
    }

    #[test]
    fn indirect_left_recursion() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf("Foo", seq(vec![nt("Bar"), unit(lit("x"))]));
        builder.bnf("Bar", seq(vec![nt("Foo"), unit(lit("y"))]));
        let tree = builder.build();

        //exercise
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(cycles, vec![vec!["Foo", "Bar", "Foo"]]);
    }

    #[test]
    fn through_nullable_prefix() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf(
            "List",
            seq(vec![
                lookahead(Some(2), None),
                nt("Modifiers"),
                action(),
                nt("List"),
                unit(lit(",")),
            ]),
        );
        builder.bnf("Modifiers", zero_or_more(unit(lit("final"))));
        let tree = builder.build();
        let nullable_set = NullabilityAnalyzer::new(&tree).nullable_set();

        //exercise
        let leftmost = leftmost_set(&tree, ProductionId(0), &nullable_set);
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(leftmost, Some(vec![ProductionId(1), ProductionId(0)]));
        assert_eq!(cycles, vec![vec!["List", "List"]]);
    }

    #[test]
    fn consuming_prefix_breaks_recursion() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf(
            "Expr",
            alt(vec![
                seq(vec![unit(lit("(")), nt("Expr"), unit(lit(")"))]),
                seq(vec![nt("Atom"), opt(seq(vec![unit(lit("+")), nt("Expr")]))]),
            ]),
        );
        builder.bnf("Atom", unit(lit("a")));
        let tree = builder.build();
        let nullable_set = NullabilityAnalyzer::new(&tree).nullable_set();

        //exercise
        let leftmost = leftmost_set(&tree, ProductionId(0), &nullable_set);
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(leftmost, Some(vec![ProductionId(1)]));
        assert!(cycles.is_empty());
    }

    #[test]
    fn opaque_productions() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.javacode("Opaque");
        builder.bnf("Unknown", seq(vec![nt("Missing"), nt("Unknown")]));
        builder.bnf("Skips", alt(vec![nt("Opaque"), nt("Skips")]));
        builder.tokens(RegexKind::Token).spec(named("T", lit("t")));
        let tree = builder.build();
        let nullable_set = NullabilityAnalyzer::new(&tree).nullable_set();

        //exercise
        let opaque = leftmost_set(&tree, ProductionId(0), &nullable_set);
        let unknown = leftmost_set(&tree, ProductionId(1), &nullable_set);
        let skips = leftmost_set(&tree, ProductionId(2), &nullable_set);
        let tokens = leftmost_set(&tree, ProductionId(3), &nullable_set);
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(opaque, None);
        assert_eq!(unknown, None);
        assert_eq!(skips, Some(vec![ProductionId(0), ProductionId(2)]));
        assert_eq!(tokens, Some(vec![]));
        assert_eq!(cycles, vec![vec!["Skips", "Skips"]]);
    }

    #[test]
    fn independent_cycles_are_all_reported() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf("A", nt("B"));
        builder.bnf("B", alt(vec![nt("A"), nt("C")]));
        builder.bnf("C", unit(lit("c")));
        builder.bnf("D", seq(vec![opt(nt("C")), nt("E")]));
        builder.bnf("E", seq(vec![nt("D"), unit(lit("e"))]));
        let tree = builder.build();

        //exercise
        let cycles = cycles_of(&tree);

        //verify
        assert_eq!(cycles, vec![vec!["A", "B", "A"], vec!["D", "E", "D"]]);
    }
}

use {
    crate::core::{
        tree::{NameResolver, NodeId, RegexNode},
        util::string_utils,
    },
    std::collections::HashSet,
};

/// True if `node` may match the empty string. References are followed to the tokens they name;
/// a reference back to a token already being inspected contributes `false`.
///
/// This is independent from the nullability of BNF expansions, where a regex unit always
/// consumes a token.
pub fn regex_matches_empty(node: &RegexNode, resolver: &dyn NameResolver) -> bool {
    matches_empty(node, resolver, &mut HashSet::new())
}

fn matches_empty(
    node: &RegexNode,
    resolver: &dyn NameResolver,
    visiting: &mut HashSet<NodeId>,
) -> bool {
    match *node {
        RegexNode::Literal(ref raw) => string_utils::replace_escapes(raw).is_empty(),
        RegexNode::CharacterList { .. } | RegexNode::Eof => false,
        RegexNode::Parenthesized(ref inner, indicator) => {
            indicator.map_or(false, |indicator| indicator.admits_zero())
                || matches_empty(inner, resolver, visiting)
        }
        RegexNode::Sequence(ref parts) => parts
            .iter()
            .all(|part| matches_empty(part, resolver, visiting)),
        RegexNode::Alternative(ref branches) => branches
            .iter()
            .any(|branch| matches_empty(branch, resolver, visiting)),
        RegexNode::Named { ref inner, .. } => matches_empty(inner, resolver, visiting),
        RegexNode::Container(ref inner) => match *inner {
            Some(ref inner) => matches_empty(inner, resolver, visiting),
            None => false,
        },
        RegexNode::Reference(ref name) => match resolver.resolve_token(name) {
            Some(token) if visiting.insert(token.id()) => {
                let res = matches_empty(token.regular_expression(), resolver, visiting);
                visiting.remove(&token.id());
                res
            }
            _ => false,
        },
    }
}

use {
    crate::core::{
        lex::DEFAULT_STATE,
        tree::{
            NameResolver, NodeId, RegexKind, RegexNode, RegexProduction, RegexSpec, RegexUnit,
            TokenSite,
        },
        util::string_utils,
    },
    std::{
        cmp::Ordering,
        collections::HashSet,
        hash::{Hash, Hasher},
    },
};

/// A token of the lexical grammar.
///
/// Explicit tokens are declared in a regex production. Synthetic tokens are created by JavaCC for
/// regular expressions written inline in a BNF expansion, as if they were declared in the
/// `DEFAULT` state at that location.
#[derive(Clone, Copy, Debug)]
pub struct Token<'t> {
    site: TokenSite<'t>,
    id: NodeId,
    ignore_case: bool,
}

impl<'t> Token<'t> {
    pub fn explicit(
        production: &'t RegexProduction,
        spec: &'t RegexSpec,
        global_ignore_case: bool,
    ) -> Self {
        Token {
            site: TokenSite::Explicit { production, spec },
            id: spec.id,
            ignore_case: production.ignore_case || global_ignore_case,
        }
    }

    pub fn synthetic(unit: &'t RegexUnit, global_ignore_case: bool) -> Self {
        Token {
            site: TokenSite::Synthetic(unit),
            id: unit.id,
            ignore_case: global_ignore_case,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Position of the declaration in the grammar, used to break ties between equally long
    /// matches.
    pub fn declaration_offset(&self) -> usize {
        self.id.0
    }

    pub fn is_explicit(&self) -> bool {
        match self.site {
            TokenSite::Explicit { .. } => true,
            TokenSite::Synthetic(_) => false,
        }
    }

    pub fn regular_expression(&self) -> &'t RegexNode {
        match self.site {
            TokenSite::Explicit { spec, .. } => &spec.regex,
            TokenSite::Synthetic(unit) => &unit.regex,
        }
    }

    pub fn name(&self) -> Option<&'t str> {
        match *self.regular_expression() {
            RegexNode::Named { ref name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Private regexes (`#NAME`) may only be referenced from other regexes and are never
    /// matched by the token manager on their own.
    pub fn is_private(&self) -> bool {
        match *self.regular_expression() {
            RegexNode::Named { private, .. } => private,
            _ => false,
        }
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn regex_kind(&self) -> RegexKind {
        match self.site {
            TokenSite::Explicit { production, .. } => production.kind,
            TokenSite::Synthetic(_) => RegexKind::Token,
        }
    }

    /// Names of the lexical states this token applies to. Empty means all states.
    pub fn lexical_states(&self) -> Vec<&'t str> {
        match self.site {
            TokenSite::Explicit { production, .. } => production
                .lexical_states
                .iter()
                .map(String::as_str)
                .collect(),
            TokenSite::Synthetic(_) => vec![DEFAULT_STATE],
        }
    }

    pub fn lexical_state_transition(&self) -> Option<&'t str> {
        match self.site {
            TokenSite::Explicit { spec, .. } => spec.next_state.as_ref().map(String::as_str),
            TokenSite::Synthetic(_) => None,
        }
    }

    /// Root element of this token's regex, without following references.
    pub fn root_element(&self) -> Option<&'t RegexNode> {
        root_element(self.regular_expression())
    }

    /// The unescaped value of this token if its regex is a single literal, without following
    /// references.
    pub fn as_string_token(&self) -> Option<String> {
        match self.root_element() {
            Some(RegexNode::Literal(raw)) => Some(string_utils::replace_escapes(raw)),
            _ => None,
        }
    }

    /// True if this token is a single literal matching `value`, modulo this token's case
    /// sensitivity.
    pub fn matches_literal(&self, value: &str) -> bool {
        match self.as_string_token() {
            Some(literal) => text_eq(&literal, value, self.ignore_case),
            None => false,
        }
    }

    /// Like `as_string_token`, but follows chains of bare references (`<A>` where `A` is itself a
    /// string token). Chains that loop back on themselves resolve to nothing.
    pub fn resolved_string_literal(&self, resolver: &dyn NameResolver) -> Option<String> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(self.id);

        let mut node = unwrap_label(self.regular_expression())?;
        loop {
            match *node {
                RegexNode::Literal(ref raw) => return Some(string_utils::replace_escapes(raw)),
                RegexNode::Reference(ref name) => {
                    let target = resolver.resolve_token(name)?;
                    if !visited.insert(target.id()) {
                        trace!("Abandoning reference chain at <{}>: cycle", name);
                        return None;
                    }
                    node = unwrap_label(target.regular_expression())?;
                }
                _ => return None,
            }
        }
    }

    /// Tokens are equivalent if they carry the same name, or, when at least one of them is
    /// unnamed, if they denote the same string.
    pub fn is_equivalent(&self, other: &Token, resolver: &dyn NameResolver) -> bool {
        if let (Some(name), Some(other_name)) = (self.name(), other.name()) {
            return name == other_name;
        }

        match (
            self.resolved_string_literal(resolver),
            other.resolved_string_literal(resolver),
        ) {
            (Some(literal), Some(other_literal)) => {
                text_eq(&literal, &other_literal, self.ignore_case)
                    || text_eq(&literal, &other_literal, other.ignore_case)
            }
            _ => false,
        }
    }
}

impl<'t> PartialEq for Token<'t> {
    fn eq(&self, other: &Token<'t>) -> bool {
        self.id == other.id
    }
}

impl<'t> Eq for Token<'t> {}

impl<'t> Hash for Token<'t> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<'t> PartialOrd for Token<'t> {
    fn partial_cmp(&self, other: &Token<'t>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'t> Ord for Token<'t> {
    fn cmp(&self, other: &Token<'t>) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Unwraps one level of label: the inner regex of a named or container regex.
pub fn unwrap_label(node: &RegexNode) -> Option<&RegexNode> {
    match *node {
        RegexNode::Named { ref inner, .. } => Some(&**inner),
        RegexNode::Container(ref inner) => inner.as_ref().map(|inner| &**inner),
        ref other => Some(other),
    }
}

/// The root element of a regex, without following references. Bare references and `<EOF>` have
/// no root element.
pub fn root_element(node: &RegexNode) -> Option<&RegexNode> {
    match unwrap_label(node)? {
        RegexNode::Reference(_) | RegexNode::Eof => None,
        root => Some(root),
    }
}

/// The root element of a regex, following bare references to the tokens they name.
pub fn resolved_root_element<'r>(
    node: &'r RegexNode,
    resolver: &'r dyn NameResolver,
) -> Option<&'r RegexNode> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut current = unwrap_label(node)?;

    loop {
        match *current {
            RegexNode::Reference(ref name) => {
                let target = resolver.resolve_token(name)?;
                if !visited.insert(target.id()) {
                    return None;
                }
                current = unwrap_label(target.regular_expression())?;
            }
            RegexNode::Eof => return None,
            _ => return Some(current),
        }
    }
}

pub fn text_eq(left: &str, right: &str, ignore_case: bool) -> bool {
    if ignore_case {
        left.to_lowercase() == right.to_lowercase()
    } else {
        left == right
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::core::tree::{builder::*, SyntaxTree},
    };

    fn tree_with_chain() -> SyntaxTree {
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens_in(&["DEFAULT", "IN_COMMENT"], RegexKind::Skip)
            .spec_to(named("A", reference("B")), "IN_COMMENT")
            .spec(named("B", lit("b\\n")))
            .spec(private("C", reference("D")))
            .spec(named("D", reference("C")));
        builder.bnf("Start", seq(vec![unit(lit("b\\n")), unit(reference("A"))]));
        builder.build()
    }

    #[test]
    fn explicit_properties() {
        //setup
        let tree = tree_with_chain();

        //exercise
        let a = tree.resolve_token("A").unwrap();
        let c = tree.resolve_token("C").unwrap();

        //verify
        assert_eq!(a.name(), Some("A"));
        assert!(a.is_explicit());
        assert!(!a.is_private());
        assert!(c.is_private());
        assert_eq!(a.regex_kind(), RegexKind::Skip);
        assert_eq!(a.lexical_states(), vec!["DEFAULT", "IN_COMMENT"]);
        assert_eq!(a.lexical_state_transition(), Some("IN_COMMENT"));
        assert_eq!(c.lexical_state_transition(), None);
    }

    #[test]
    fn synthetic_properties() {
        //setup
        let tree = tree_with_chain();

        //exercise
        let synthetic = tree.token(NodeId(4)).unwrap();

        //verify
        assert!(!synthetic.is_explicit());
        assert_eq!(synthetic.name(), None);
        assert_eq!(synthetic.regex_kind(), RegexKind::Token);
        assert_eq!(synthetic.lexical_states(), vec![DEFAULT_STATE]);
        assert_eq!(synthetic.as_string_token(), Some("b\n".to_string()));
    }

    #[test]
    fn string_literal_through_references() {
        //setup
        let tree = tree_with_chain();
        let a = tree.resolve_token("A").unwrap();
        let c = tree.resolve_token("C").unwrap();
        let reference_unit = tree.token(NodeId(5)).unwrap();

        //exercise
        let a_direct = a.as_string_token();
        let a_resolved = a.resolved_string_literal(&tree);
        let c_resolved = c.resolved_string_literal(&tree);
        let unit_resolved = reference_unit.resolved_string_literal(&tree);

        //verify
        assert_eq!(a_direct, None);
        assert_eq!(a_resolved, Some("b\n".to_string()));
        assert_eq!(c_resolved, None);
        assert_eq!(unit_resolved, Some("b\n".to_string()));
    }

    #[test]
    fn equivalence() {
        //setup
        let tree = tree_with_chain();
        let a = tree.resolve_token("A").unwrap();
        let b = tree.resolve_token("B").unwrap();
        let synthetic = tree.token(NodeId(4)).unwrap();

        //exercise
        let named_differently = a.is_equivalent(&b, &tree);
        let same_string = synthetic.is_equivalent(&b, &tree);
        let through_reference = synthetic.is_equivalent(&a, &tree);
        let itself = a.is_equivalent(&a, &tree);

        //verify
        assert!(!named_differently);
        assert!(same_string);
        assert!(through_reference);
        assert!(itself);
    }

    #[test]
    fn matches_literal_respects_case() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .ignore_case()
            .spec(named("SELECT", lit("select")));
        builder
            .tokens(RegexKind::Token)
            .spec(named("FROM", lit("from")));
        let tree = builder.build();
        let select = tree.resolve_token("SELECT").unwrap();
        let from = tree.resolve_token("FROM").unwrap();

        //exercise
        let select_upper = select.matches_literal("SELECT");
        let from_upper = from.matches_literal("FROM");
        let from_lower = from.matches_literal("from");

        //verify
        assert!(select_upper);
        assert!(!from_upper);
        assert!(from_lower);
    }

    #[test]
    fn root_elements() {
        //setup
        let tree = tree_with_chain();
        let a = tree.resolve_token("A").unwrap();

        //exercise
        let direct = a.root_element();
        let resolved = resolved_root_element(a.regular_expression(), &tree);
        let eof_has_root = root_element(&eof()).is_some();
        let of_container = root_element(&container(lit("x"))).cloned();

        //verify
        assert_eq!(direct, None);
        assert_eq!(resolved, Some(&lit("b\\n")));
        assert!(!eof_has_root);
        assert_eq!(of_container, Some(lit("x")));
    }
}

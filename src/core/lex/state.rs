use crate::core::{
    lex::token::Token,
    tree::{NameResolver, RegexNode},
};

/// A named lexical state and its tokens in declaration order. The order matters: among
/// equally long matches, the token declared first wins.
#[derive(Debug)]
pub struct LexicalState<'t> {
    name: String,
    tokens: Vec<Token<'t>>,
}

impl<'t> LexicalState<'t> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[Token<'t>] {
        &self.tokens
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.tokens.iter().any(|candidate| candidate.id() == token.id())
    }

    /// Lexical states named as the next state by the tokens of this state, in order of first
    /// mention.
    pub fn transitions(&self) -> Vec<&'t str> {
        let mut targets: Vec<&'t str> = Vec::new();
        for target in self.tokens.iter().filter_map(Token::lexical_state_transition) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        targets
    }
}

pub struct LexicalStateBuilder<'t> {
    name: String,
    tokens: Vec<Token<'t>>,
}

impl<'t> LexicalStateBuilder<'t> {
    pub fn new(name: &str) -> Self {
        LexicalStateBuilder {
            name: name.to_string(),
            tokens: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_tokens(&self) -> &[Token<'t>] {
        &self.tokens
    }

    /// Appends a token. Must be called in document order.
    ///
    /// Free-standing references (`< <FOO> >`) declare nothing and are ignored, and synthetic
    /// tokens equivalent to a token already in the state are not added twice.
    pub fn add_token(&mut self, token: Token<'t>, resolver: &dyn NameResolver) {
        if let RegexNode::Reference(ref name) = *token.regular_expression() {
            trace!("Ignoring free-standing reference <{}> in {}", name, self.name);
            return;
        }

        if !token.is_explicit()
            && self
                .tokens
                .iter()
                .any(|existing| existing.is_equivalent(&token, resolver))
        {
            return;
        }

        self.tokens.push(token);
    }

    pub fn build(self) -> LexicalState<'t> {
        LexicalState {
            name: self.name,
            tokens: self.tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::core::tree::{builder::*, NodeId, RegexKind},
    };

    #[test]
    fn add_token_skips_references_and_duplicates() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("PLUS", lit("+")))
            .spec(reference("PLUS"));
        builder.bnf(
            "Expr",
            seq(vec![unit(lit("-")), unit(lit("-")), unit(lit("+"))]),
        );
        let tree = builder.build();
        let mut state = LexicalStateBuilder::new("DEFAULT");

        //exercise
        for token in tree.token_sites() {
            state.add_token(token, &tree);
        }
        let state = state.build();

        //verify
        let ids: Vec<NodeId> = state.tokens().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(2)]);
        assert_eq!(state.name(), "DEFAULT");
    }

    #[test]
    fn explicit_duplicates_are_kept() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("LBRACKET", lit("[")))
            .spec(named("OPEN", lit("[")))
            .spec(lit("["));
        let tree = builder.build();
        let mut state = LexicalStateBuilder::new("DEFAULT");

        //exercise
        for token in tree.token_sites() {
            state.add_token(token, &tree);
        }

        //verify
        assert_eq!(state.current_tokens().len(), 3);
    }

    #[test]
    fn transitions_in_order_of_mention() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::More)
            .spec_to(lit("/*"), "IN_COMMENT")
            .spec_to(lit("\""), "IN_STRING")
            .spec_to(lit("/**"), "IN_COMMENT");
        let tree = builder.build();
        let mut state = LexicalStateBuilder::new("DEFAULT");
        for token in tree.token_sites() {
            state.add_token(token, &tree);
        }

        //exercise
        let transitions = state.build().transitions();

        //verify
        assert_eq!(transitions, vec!["IN_COMMENT", "IN_STRING"]);
    }
}

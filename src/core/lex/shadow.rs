use crate::core::{
    lex::{token::Token, LexicalGrammar, ALL_KINDS, DEFAULT_STATE, JUST_TOKEN},
    tree::{NodeId, RegexNode},
    util::string_utils,
};

/// A string of a token that another token matches instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadowing<'t> {
    pub token: Token<'t>,
    /// Unescaped value of the shadowed literal.
    pub literal: String,
    /// The first explicit token matching the literal instead of `token`.
    pub shadowed_by: Token<'t>,
    /// True if the literal is the whole token, which then can never be matched at all. False if
    /// it is only one branch of an alternative.
    pub whole_token: bool,
    /// The lexical states in which `token` loses the match, in grammar order.
    pub states: Vec<String>,
}

/// A string literal of a BNF expansion that is lexed as some other token than the string token
/// it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct BnfStringShadowing<'t> {
    /// The regex unit of the expansion.
    pub unit: NodeId,
    pub literal: String,
    pub string_token: Token<'t>,
    pub matched_by: Token<'t>,
}

impl<'t> LexicalGrammar<'t> {
    /// Reports the string literals of explicit tokens that are lexed as another explicit token
    /// in at least one lexical state containing the token, because that token is declared
    /// earlier or matches more text.
    ///
    /// Only tokens whose root element is a literal, or an alternative with literal branches, are
    /// inspected.
    pub fn shadowed_tokens(&self) -> Vec<Shadowing<'t>> {
        let mut shadowed: Vec<Shadowing<'t>> = Vec::new();

        for token in self.all_tokens() {
            if !token.is_explicit() || token.is_private() {
                continue;
            }

            let (literals, whole_token): (Vec<&String>, bool) = match token.root_element() {
                Some(RegexNode::Literal(raw)) => (vec![raw], true),
                Some(RegexNode::Alternative(branches)) => {
                    let literals = branches
                        .iter()
                        .filter_map(|branch| match *branch {
                            RegexNode::Literal(ref raw) => Some(raw),
                            _ => None,
                        })
                        .collect();
                    (literals, false)
                }
                _ => continue,
            };

            for raw in literals {
                let literal = string_utils::replace_escapes(raw);
                if let Some((winner, states)) = self.shadowing_token(token, &literal) {
                    debug!(
                        "Token {} can never match {:?} in {:?}, {} does",
                        token.name().unwrap_or("<unnamed>"),
                        literal,
                        states,
                        winner.name().unwrap_or("<unnamed>")
                    );
                    shadowed.push(Shadowing {
                        token: *token,
                        literal,
                        shadowed_by: winner,
                        whole_token,
                        states,
                    });
                }
            }
        }

        shadowed
    }

    /// The first explicit token matching `literal` instead of `token` in a state containing
    /// `token`, with every state where such a token wins.
    fn shadowing_token(
        &self,
        token: &Token<'t>,
        literal: &str,
    ) -> Option<(Token<'t>, Vec<String>)> {
        let mut shadowed_by: Option<Token<'t>> = None;
        let mut states: Vec<String> = Vec::new();

        for state in self.lexical_states().iter().filter(|state| state.contains(token)) {
            match self.match_literal(state.name(), literal, false, None, ALL_KINDS) {
                Some(winner) if winner != *token && winner.is_explicit() => {
                    shadowed_by.get_or_insert(winner);
                    states.push(state.name().to_string());
                }
                _ => {}
            }
        }

        shadowed_by.map(|winner| (winner, states))
    }

    /// Reports the string literals of BNF expansions that the token manager lexes as a different
    /// token than their string token, in the `DEFAULT` state.
    ///
    /// The string token of a literal unit is the token matching its value exactly. A named unit
    /// (`<NAME: "x">`) is its own string token. References to string tokens are checked through
    /// the literal they resolve to.
    pub fn shadowed_bnf_strings(&self) -> Vec<BnfStringShadowing<'t>> {
        let tree = self.tree();
        let mut shadowed: Vec<BnfStringShadowing<'t>> = Vec::new();

        for (_, bnf) in tree.bnf_productions() {
            let units = match bnf.expansion {
                Some(ref expansion) => expansion.regex_units(),
                None => continue,
            };

            for unit in units {
                let literal = match tree
                    .token(unit.id)
                    .and_then(|own| own.resolved_string_literal(tree))
                {
                    Some(literal) => literal,
                    None => continue,
                };

                let string_token = match unit.regex {
                    RegexNode::Named { .. } => tree.token(unit.id),
                    _ => self.match_literal(DEFAULT_STATE, &literal, true, None, JUST_TOKEN),
                };
                let string_token = match string_token {
                    Some(token) => token,
                    None => continue,
                };

                match self.match_literal(DEFAULT_STATE, &literal, false, None, JUST_TOKEN) {
                    Some(matched_by) if matched_by != string_token => {
                        debug!(
                            "{:?} in {} is lexed as {}",
                            literal,
                            bnf.name,
                            matched_by.name().unwrap_or("<unnamed>")
                        );
                        shadowed.push(BnfStringShadowing {
                            unit: unit.id,
                            literal,
                            string_token,
                            matched_by,
                        });
                    }
                    _ => {}
                }
            }
        }

        shadowed
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{
        lex::{token::Token, LexicalGrammar},
        tree::{builder::*, NodeId, OccurrenceIndicator, RegexKind},
    };

    fn describe(grammar: &LexicalGrammar) -> Vec<(String, String, String, bool)> {
        grammar
            .shadowed_tokens()
            .into_iter()
            .map(|shadowing| {
                (
                    shadowing.token.name().unwrap_or("?").to_string(),
                    shadowing.literal,
                    shadowing.shadowed_by.name().unwrap_or("?").to_string(),
                    shadowing.whole_token,
                )
            })
            .collect()
    }

    fn entry(token: &str, literal: &str, by: &str, whole: bool) -> (String, String, String, bool) {
        (token.to_string(), literal.to_string(), by.to_string(), whole)
    }

    #[test]
    fn whole_token_shadowed() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("BRACKETS", regex_alt(vec![lit("["), lit("]")])))
            .spec(named("LBRACKET", lit("[")));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe(&grammar);

        //verify
        assert_eq!(shadowed, vec![entry("LBRACKET", "[", "BRACKETS", true)]);
    }

    #[test]
    fn alternative_branch_shadowed() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("LBRACKET", lit("[")))
            .spec(named("BRACKETS", regex_alt(vec![lit("["), lit("]")])));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe(&grammar);

        //verify
        assert_eq!(shadowed, vec![entry("BRACKETS", "[", "LBRACKET", false)]);
    }

    #[test]
    fn keyword_after_identifier() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named(
                "IDENT",
                group(
                    chars(&[("a", Some("z"))]),
                    Some(OccurrenceIndicator::OneOrMore),
                ),
            ))
            .spec(named("IF", lit("if")))
            .spec(private("HIDDEN", lit("x")));
        builder.tokens(RegexKind::Skip).spec(named("SPACE", lit(" ")));
        builder.tokens(RegexKind::Token).spec(named("BLANK", lit(" ")));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe(&grammar);

        //verify
        assert_eq!(
            shadowed,
            vec![entry("IF", "if", "IDENT", true), entry("BLANK", " ", "SPACE", true)]
        );
    }

    #[test]
    fn synthetic_winners_are_ignored() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder.bnf("Start", unit(lit("x")));
        builder.tokens(RegexKind::Token).spec(named("X", lit("x")));
        builder
            .tokens_in(&["OTHER"], RegexKind::Token)
            .spec(named("Y", lit("y")));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe(&grammar);

        //verify
        assert!(shadowed.is_empty());
    }

    #[test]
    fn shadowed_in_one_state_only() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens_in(&["IN_X"], RegexKind::Token)
            .spec(named("ANY_X", regex_alt(vec![lit("x"), lit("y")])));
        builder
            .tokens_in(&["DEFAULT", "IN_X"], RegexKind::Token)
            .spec(named("X", lit("x")));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = grammar.shadowed_tokens();

        //verify
        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].token.name(), Some("X"));
        assert_eq!(shadowed[0].shadowed_by.name(), Some("ANY_X"));
        assert_eq!(shadowed[0].states, vec!["IN_X".to_string()]);
    }

    fn describe_bnf_strings(grammar: &LexicalGrammar) -> Vec<(String, String, String)> {
        let label = |token: &Token| match token.name() {
            Some(name) => name.to_string(),
            None => format!("#{}", token.declaration_offset()),
        };

        grammar
            .shadowed_bnf_strings()
            .into_iter()
            .map(|shadowing| {
                (
                    shadowing.literal,
                    label(&shadowing.string_token),
                    label(&shadowing.matched_by),
                )
            })
            .collect()
    }

    #[test]
    fn bnf_string_lexed_as_earlier_token() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("BRACKETS", regex_alt(vec![lit("["), lit("]")])));
        builder.bnf("Start", unit(lit("[")));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = grammar.shadowed_bnf_strings();

        //verify
        assert_eq!(
            describe_bnf_strings(&grammar),
            vec![("[".to_string(), "#1".to_string(), "BRACKETS".to_string())]
        );
        assert_eq!(shadowed[0].unit, NodeId(1));
    }

    #[test]
    fn bnf_string_matching_its_token() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named("LBRACKET", lit("[")))
            .spec(named("BRACKETS", regex_alt(vec![lit("["), lit("]")])));
        builder.bnf("Start", seq(vec![unit(lit("[")), unit(reference("LBRACKET"))]));
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe_bnf_strings(&grammar);

        //verify
        assert!(shadowed.is_empty());
    }

    #[test]
    fn bnf_named_units_and_references() {
        //setup
        let mut builder = SyntaxTreeBuilder::new();
        builder
            .tokens(RegexKind::Token)
            .spec(named(
                "IDENT",
                group(
                    chars(&[("a", Some("z"))]),
                    Some(OccurrenceIndicator::OneOrMore),
                ),
            ))
            .spec(named("FOO", lit("foo")))
            .spec(named("DOT", lit(".")));
        builder.bnf(
            "Start",
            seq(vec![
                unit(reference("FOO")),
                unit(named("PERIOD", lit("."))),
                unit(reference("DOT")),
                unit(chars(&[("0", Some("9"))])),
            ]),
        );
        let tree = builder.build();
        let grammar = LexicalGrammar::build(&tree);

        //exercise
        let shadowed = describe_bnf_strings(&grammar);

        //verify
        assert_eq!(
            shadowed,
            vec![
                ("foo".to_string(), "FOO".to_string(), "IDENT".to_string()),
                (".".to_string(), "PERIOD".to_string(), "DOT".to_string()),
            ]
        );
    }
}

use {
    crate::core::{
        data::dfs::{self, Cycle},
        lex::{token::Token, LexicalGrammar},
        tree::{NameResolver, NodeId},
    },
    std::collections::HashMap,
};

impl<'t> LexicalGrammar<'t> {
    /// Finds tokens whose regexes reference each other in a circle. JavaCC refuses to generate
    /// a token manager for such grammars.
    ///
    /// Edges go from a token to the tokens named by `<NAME>` references in its own regex.
    /// References to unknown names are ignored.
    pub fn detect_regex_loops(&self) -> Vec<Cycle<Token<'t>>> {
        let tree = self.tree();
        let tokens = self.all_tokens();
        let indices: HashMap<NodeId, usize> = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| (token.id(), index))
            .collect();

        let successors = |index: usize| -> Vec<usize> {
            tokens[index]
                .regular_expression()
                .references()
                .into_iter()
                .filter_map(|name| tree.resolve_token(name))
                .filter_map(|target| indices.get(&target.id()).cloned())
                .collect()
        };

        dfs::find_cycles(tokens.len(), successors)
            .into_iter()
            .map(|cycle| cycle.map(|index| tokens[index]))
            .collect()
    }
}

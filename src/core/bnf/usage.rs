use {
    crate::core::{
        lex::token::Token,
        tree::{NameResolver, NodeId, Production, ProductionId, SyntaxTree},
    },
    std::{
        collections::{HashMap, HashSet},
        fmt,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    /// Never referenced.
    Unused,
    /// Referenced, but only from symbols that are themselves not reachable.
    Unreachable,
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Usage::Unused => write!(f, "unused"),
            Usage::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Non-terminal productions that are never referenced from a BNF expansion, or that cannot be
/// reached from the root production. The root is the first non-terminal production of the
/// grammar and is never reported.
pub fn unused_productions(tree: &SyntaxTree) -> Vec<(ProductionId, Usage)> {
    let non_terminals: Vec<ProductionId> = tree
        .productions()
        .filter(|(_, production)| match production {
            Production::Bnf(_) | Production::Javacode(_) => true,
            Production::Regex(_) => false,
        })
        .map(|(id, _)| id)
        .collect();

    let root = match non_terminals.first() {
        Some(root) => *root,
        None => return vec![],
    };

    let references = |id: ProductionId| -> Vec<ProductionId> {
        match tree.production(id) {
            Some(Production::Bnf(bnf)) => match bnf.expansion {
                Some(ref expansion) => expansion
                    .non_terminals()
                    .into_iter()
                    .filter_map(|name| tree.resolve_production(name))
                    .collect(),
                None => vec![],
            },
            _ => vec![],
        }
    };

    let used: HashSet<ProductionId> = non_terminals
        .iter()
        .flat_map(|id| references(*id))
        .collect();
    let reachable = reachable_from(vec![root], references);

    non_terminals
        .into_iter()
        .skip(1)
        .filter_map(|id| {
            if !used.contains(&id) {
                Some((id, Usage::Unused))
            } else if !reachable.contains(&id) {
                Some((id, Usage::Unreachable))
            } else {
                None
            }
        })
        .collect()
}

/// Private regexes (`#NAME`) never referenced from another regex, or referenced only from
/// private regexes that are themselves not reachable from a non-private token.
pub fn unused_private_regexes(tree: &SyntaxTree) -> Vec<(Token<'_>, Usage)> {
    let tokens: HashMap<NodeId, Token> = tree.token_sites().map(|t| (t.id(), t)).collect();

    let references = |id: NodeId| -> Vec<NodeId> {
        match tokens.get(&id) {
            Some(token) => token
                .regular_expression()
                .references()
                .into_iter()
                .filter_map(|name| tree.resolve_token(name))
                .map(|target| target.id())
                .collect(),
            None => vec![],
        }
    };

    let used: HashSet<NodeId> = tokens.keys().flat_map(|id| references(*id)).collect();
    let roots: Vec<NodeId> = tree
        .token_sites()
        .filter(|token| !token.is_private())
        .map(|token| token.id())
        .collect();
    let reachable = reachable_from(roots, references);

    tree.token_sites()
        .filter(|token| token.is_private())
        .filter_map(|token| {
            if !used.contains(&token.id()) {
                Some((token, Usage::Unused))
            } else if !reachable.contains(&token.id()) {
                Some((token, Usage::Unreachable))
            } else {
                None
            }
        })
        .collect()
}

fn reachable_from<T, F>(roots: Vec<T>, successors: F) -> HashSet<T>
where
    T: Copy + Eq + std::hash::Hash,
    F: Fn(T) -> Vec<T>,
{
    let mut reachable: HashSet<T> = roots.iter().cloned().collect();
    let mut work_stack: Vec<T> = roots;

    while let Some(symbol) = work_stack.pop() {
        for succ in successors(symbol) {
            if reachable.insert(succ) {
                work_stack.push(succ);
            }
        }
    }

    reachable
}

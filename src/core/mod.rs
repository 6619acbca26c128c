pub mod bnf;
pub mod config;
pub mod data;
pub mod lex;
pub mod pattern;
pub mod tree;
pub mod util;

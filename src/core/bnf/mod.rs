pub mod first;
pub mod left_recursion;
pub mod nullable;
pub mod usage;

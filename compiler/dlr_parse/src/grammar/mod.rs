//! Grammar productions, split by declaration level and expression level.

mod expr;
mod line;

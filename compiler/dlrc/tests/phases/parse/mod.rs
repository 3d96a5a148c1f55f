//! Parse phase tests.
//!
//! Whole scripts through `dlr_parse`, and syntax errors as reported by the
//! module registry.

mod scripts;

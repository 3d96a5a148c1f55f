//! Sandbox phase tests.
//!
//! Host classes and host objects reached from scripts, with the matcher
//! registry deciding which methods are callable.

mod host;

//! Evaluation phase tests.
//!
//! Scripts are compiled through a `ModuleRegistry` exactly as the `dlr`
//! driver does, then evaluated through the public `Engine` API.

mod imports;
mod scripts;

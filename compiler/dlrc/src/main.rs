//! dlr command line driver.
//!
//! Evaluates attributes of a script file. Imports resolve to sibling
//! `<Name>.dlr` files.

use std::path::Path;

use dlrc::params::parse_params;
use dlrc::registry::module_name_of;
use dlrc::{init_tracing, ModuleRegistry};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("help" | "--help" | "-h") => print_usage(),
        Some("version" | "--version" | "-V") => {
            println!("dlr {}", env!("CARGO_PKG_VERSION"));
        }
        Some(_) if args.len() < 4 => {
            eprintln!("error: missing node or attribute names");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
        Some(file) => {
            if let Err(message) = run(Path::new(file), &args[2], &args[3], &args[4..]) {
                eprintln!("{message}");
                std::process::exit(1);
            }
        }
    }
}

fn run(path: &Path, node: &str, attrs: &str, params: &[String]) -> Result<(), String> {
    let Some(module) = module_name_of(path) else {
        return Err(format!("error: cannot derive a module name from {}", path.display()));
    };
    let source = std::fs::read_to_string(path)
        .map_err(|err| format!("error: cannot read {}: {err}", path.display()))?;
    let params = parse_params(params).map_err(|err| format!("error: {err}"))?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let registry = ModuleRegistry::with_root(root).source(module, source);
    let engine = registry.engine(module).map_err(|diag| diag.to_string())?;

    let attrs: Vec<&str> = attrs.split(',').map(str::trim).filter(|a| !a.is_empty()).collect();
    let values = engine
        .evaluate_many(node, &attrs, params)
        .map_err(|err| err.to_string())?;
    for (attr, value) in attrs.iter().zip(values) {
        println!("{attr} = {}", value.inspect());
    }
    Ok(())
}

fn print_usage() {
    println!("dlr: evaluate attributes of a dlr script");
    println!();
    println!("Usage: dlr <file.dlr> <Node> <attr>[,<attr>...] [name=value ...]");
    println!();
    println!("Parameters:");
    println!("  name=value     Integers, floats, true, false and nil keep their type;");
    println!("                 anything else is passed as a string");
    println!();
    println!("Imports resolve to <Name>.dlr files next to the script.");
    println!("Set RUST_LOG (e.g. RUST_LOG=dlr_eval=trace) for evaluation logs.");
}

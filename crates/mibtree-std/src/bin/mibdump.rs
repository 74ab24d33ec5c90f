//! Compile MIB files and print what was derived from them.
//!
//! Usage: mibdump <file>... [--cache <path>]
//!
//! Files are compiled in the order given. For every module the resolved
//! objects are listed as `OID<TAB>name<TAB>macro`, followed by the scalar
//! and table providers derived from it.

use std::env;
use std::process;

use mibtree_core::{ModuleSet, ProviderSpec};
use mibtree_std::{compile_files, compile_files_cached};

fn main() {
    let mut files = Vec::new();
    let mut cache = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--cache" {
            cache = args.next();
        } else {
            files.push(arg);
        }
    }
    if files.is_empty() {
        eprintln!("Usage: mibdump <file>... [--cache <path>]");
        process::exit(1);
    }

    let result = match &cache {
        Some(path) => compile_files_cached(&files, path),
        None => compile_files(&files),
    };
    let modules = match result {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    for module in modules.modules() {
        println!("# {}", module.name());
        for obj in module.objects() {
            if let Some(oid) = obj.oid() {
                println!("{oid}\t{}\t{}", obj.name(), obj.macro_name().unwrap_or("-"));
            }
        }
        print_providers(&modules, module.name());
        println!();
    }
}

fn print_providers(modules: &ModuleSet, module: &str) {
    let providers = match modules.derive_providers(module) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("{module}: {e}");
            return;
        }
    };
    for provider in providers {
        match provider {
            ProviderSpec::Scalar(scalar) => {
                let ty = scalar.scalar_type.map_or("?", |t| t.as_str());
                println!("scalar {} {} {ty}", scalar.name, scalar.oid);
            }
            ProviderSpec::Table(table) => {
                let index: Vec<String> = table.index.iter().map(|e| e.label()).collect();
                match &table.augments {
                    Some(base) => println!("table {} {} augments {base}", table.name, table.oid),
                    None => println!("table {} {} index {}", table.name, table.oid, index.join(",")),
                }
                for column in &table.columns {
                    let ty = column.value_type.map_or("?", |t| t.as_str());
                    println!("  {} {} {ty}", column.number, column.name);
                }
            }
        }
    }
}

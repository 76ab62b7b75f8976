/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

use std::env;
use std::process;

use riparian_analysis::args::RunParameters;
use riparian_analysis::{logging, pipeline};

fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();
    let params = match RunParameters::parse(&argv) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init(&params.log_level, params.log_dir.as_deref()) {
        eprintln!("cannot initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = pipeline::validate_inputs(&params) {
        tracing::error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = pipeline::run(&params) {
        tracing::error!("Unexpected failure. Program terminating: {}", e);
        process::exit(2);
    }
}

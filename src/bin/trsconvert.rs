//! Command-line interface for trs-convert
//! Converts a Transcriber observation transcript into a tab-delimited pollinator behavior table.
//!
//! Usage:
//!   trsconvert -i `<transcript.trs>` -o `<table.tsv>` -l `<layout.txt>` [-c `<config.toml>`]
//!
//! Logging goes to stderr. `RUST_LOG` takes precedence over the configured `logging.level`.

use clap::{Arg, Command};
use trs_convert::trs::{ConvertConfig, Converter, Loader};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("trsconvert")
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            "Read the XML output of Transcriber for processed audio observations and write a \
             tab-delimited long-form table of insect landing and transition behaviors",
        )
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("example.trs")
                .help(".trs input file")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("example.tsv")
                .help(".tsv output file")
                .required(true),
        )
        .arg(
            Arg::new("layout")
                .short('l')
                .long("layout")
                .value_name("layout.tsv")
                .help("Whitespace-delimited exclosure layout file")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("config.toml")
                .help("Configuration file layered over the built-in defaults"),
        )
        .get_matches();

    let input = matches.get_one::<String>("input").unwrap();
    let output = matches.get_one::<String>("output").unwrap();
    let layout = matches.get_one::<String>("layout").unwrap();

    let config = load_config(matches.get_one::<String>("config")).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    init_tracing(&config);

    let converter = Converter::new(config);
    if let Err(e) = converter.convert_files(input, output, layout) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&String>) -> Result<ConvertConfig, config::ConfigError> {
    let loader = match path {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new(),
    };
    loader.build()
}

fn init_tracing(config: &ConvertConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! Command-line interface for parsource
//! This binary reads source files, classifies them with a delimiter table,
//! extracts a generic tree and prints it in one of the supported formats.
//!
//! Usage:
//!   parsource parse `<path>`... [--lang js] [--format tdoc|xml|json]   - Parse files and print trees
//!   parsource languages                                              - List built-in languages

use clap::{Arg, ArgAction, Command};

use parsource::formats::{json, tdoc, xml};
use parsource::langs::{javascript, BUILTIN};
use parsource::parsing::classifiers::BlockClassifier;
use parsource::parsing::language::{load_block_spec, BlockLanguage};
use parsource::transform::extractor::{StreamTransform, TreeExtractor};
use parsource::transform::normalize::{expression_expander, normalizer};

fn main() {
    let matches = Command::new("parsource")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts generic trees from source files using delimiter tables")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Parse files and print the extracted trees")
                .arg(
                    Arg::new("paths")
                        .help("Paths to the source files")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("lang")
                        .long("lang")
                        .short('l')
                        .help("Built-in language to classify with")
                        .default_value("js"),
                )
                .arg(
                    Arg::new("lang-file")
                        .long("lang-file")
                        .help("Load the block language spec from a JSON or YAML file"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('tdoc', 'xml' or 'json')")
                        .default_value("tdoc"),
                )
                .arg(
                    Arg::new("normalize")
                        .long("normalize")
                        .help("Run the normalization passes over the extracted tree")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("expand")
                        .long("expand")
                        .help("Re-classify text leaves with the expression table")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-offsets")
                        .long("no-offsets")
                        .help("Do not record source offsets on nodes")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("lookahead")
                        .long("lookahead")
                        .help("Scanner lookahead window in bytes")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(Command::new("languages").about("List built-in languages"))
        .get_matches();

    match matches.subcommand() {
        Some(("parse", parse_matches)) => {
            let paths: Vec<&String> = parse_matches
                .get_many::<String>("paths")
                .map(|values| values.collect())
                .unwrap_or_default();
            handle_parse_command(parse_matches, &paths);
        }
        Some(("languages", _)) => handle_languages_command(),
        _ => unreachable!(),
    }
}

/// Resolve the block language from the command line
fn resolve_language(matches: &clap::ArgMatches) -> BlockLanguage {
    if let Some(path) = matches.get_one::<String>("lang-file") {
        let spec = load_block_spec(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        return spec.build().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
    }
    let name = matches
        .get_one::<String>("lang")
        .map(String::as_str)
        .unwrap_or("js");
    match name {
        "js" | "javascript" => javascript::blocks().clone(),
        other => {
            eprintln!("Error: unknown language '{}'", other);
            std::process::exit(1);
        }
    }
}

/// Handle the parse command
fn handle_parse_command(matches: &clap::ArgMatches, paths: &[&String]) {
    let lang = resolve_language(matches);
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("tdoc");
    let with_offsets = !matches.get_flag("no-offsets");
    let lookahead = matches
        .get_one::<usize>("lookahead")
        .copied()
        .unwrap_or(parsource::parsing::DEFAULT_LOOKAHEAD);

    for path in paths {
        let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading file {}: {}", path, e);
            std::process::exit(1);
        });

        let mut extractor = TreeExtractor::with_offsets(with_offsets);
        let diagnostics =
            extractor.process(BlockClassifier::with_lookahead(&source, &lang, lookahead));
        for diagnostic in &diagnostics {
            eprintln!("ERROR {}: {}", path, diagnostic);
        }
        let tree = extractor.root();

        if matches.get_flag("normalize") {
            for diagnostic in normalizer().process(&tree) {
                eprintln!("ERROR {}: {}", path, diagnostic);
            }
        }
        if matches.get_flag("expand") {
            let expander = expression_expander(javascript::expressions().clone());
            for diagnostic in expander.process(&tree) {
                eprintln!("ERROR {}: {}", path, diagnostic);
            }
        }

        match format {
            "tdoc" => println!("{}", tdoc::render(&tree)),
            "xml" => println!("{}", xml::render(&tree)),
            "json" => println!("{}", json::render(&tree)),
            other => {
                eprintln!("Error: unknown format '{}'", other);
                std::process::exit(2);
            }
        }
    }
}

/// Handle the languages command
fn handle_languages_command() {
    println!("Built-in languages:\n");
    for name in BUILTIN {
        println!("  {}", name);
    }
}

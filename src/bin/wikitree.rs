//! Command-line interface for wikitree
//! This binary is a debugging aid: it shows what the parser makes of a wiki text file.
//!
//! Usage:
//!   wikitree tree `<path>` [--format dump|json] [--title `<title>`] [--siteinfo `<file>`]
//!   wikitree macros `<path>` [--included] [--siteinfo `<file>`]
//!   wikitree passes                                  - List the refinement passes in run order

use clap::{Arg, ArgAction, ArgMatches, Command};
use wikitree::wiki::config::SiteConfig;
use wikitree::wiki::formats::{dump, dump_macros, to_json};
use wikitree::wiki::refine::{Pipeline, RefineOptions};
use wikitree::wiki::templ::MacroParser;

fn siteinfo_arg() -> Arg {
    Arg::new("siteinfo")
        .long("siteinfo")
        .help("Site configuration (siteinfo JSON); defaults to the built-in English one")
}

fn main() {
    let matches = Command::new("wikitree")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect how wiki text is parsed")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("tree")
                .about("Print the document tree")
                .arg(
                    Arg::new("path")
                        .help("Path to the wiki text file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('dump' or 'json')")
                        .default_value("dump"),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Page title, for relative links"),
                )
                .arg(siteinfo_arg()),
        )
        .subcommand(
            Command::new("macros")
                .about("Print the macro AST")
                .arg(
                    Arg::new("path")
                        .help("Path to the wiki text file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("included")
                        .long("included")
                        .help("Parse as transcluded text")
                        .action(ArgAction::SetTrue),
                )
                .arg(siteinfo_arg()),
        )
        .subcommand(Command::new("passes").about("List the refinement passes in run order"))
        .get_matches();

    match matches.subcommand() {
        Some(("tree", tree_matches)) => handle_tree_command(tree_matches),
        Some(("macros", macro_matches)) => handle_macros_command(macro_matches),
        Some(("passes", _)) => handle_passes_command(),
        _ => unreachable!(),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn read(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("reading {}: {}", path, e)))
}

fn load_site(matches: &ArgMatches) -> SiteConfig {
    let site = match matches.get_one::<String>("siteinfo") {
        Some(path) => SiteConfig::from_json(&read(path)),
        None => SiteConfig::english(),
    };
    site.unwrap_or_else(|e| fail(e))
}

fn handle_tree_command(matches: &ArgMatches) {
    let Some(path) = matches.get_one::<String>("path") else {
        fail("missing path");
    };
    let source = read(path);
    let site = load_site(matches);

    let mut options = RefineOptions::new(&site).unwrap_or_else(|e| fail(e));
    if let Some(title) = matches.get_one::<String>("title") {
        options = options.with_title(title);
    }

    let nodes = wikitree::wiki::parse_txt(&source, &options);
    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => match serde_json::to_string_pretty(&to_json(&nodes)) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        },
        Some("dump") | None => print!("{}", dump(&nodes)),
        Some(other) => fail(format!("unknown format '{}'", other)),
    }
}

fn handle_macros_command(matches: &ArgMatches) {
    let Some(path) = matches.get_one::<String>("path") else {
        fail("missing path");
    };
    let source = read(path);
    let site = load_site(matches);

    let parser = MacroParser::new(&site).unwrap_or_else(|e| fail(e));
    let nodes = parser.parse(&source, matches.get_flag("included"));
    print!("{}", dump_macros(&nodes));
}

fn handle_passes_command() {
    let names: Vec<_> = Pipeline::standard().names().collect();
    for (step, name) in names.iter().enumerate().rev() {
        println!("{:2}. {}", step + 1, name);
    }
}

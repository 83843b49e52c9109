use std::path::PathBuf;

use clap::Parser;

/// Search a JSON-lines log file from the most recent line backward using
/// a small boolean query language over `field:"regex"` terms.
#[derive(Debug, Parser)]
#[command(name = "logfind", version, about)]
pub struct Args {
    /// Enable debug logging.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Path to the log file to search.
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Print only the number of matching lines.
    #[arg(short = 'c', long = "count")]
    pub count: bool,

    /// Dump the query's token stream instead of searching.
    #[arg(short = 't')]
    pub dump_tokens: bool,

    /// Dump the query's AST instead of searching.
    #[arg(short = 's')]
    pub dump_ast: bool,

    /// Dump the query's compiled bytecode instead of searching.
    #[arg(short = 'p')]
    pub dump_program: bool,

    /// The query, e.g. `level:"fatal" AND msg:"panic"`. Multiple
    /// positional words are joined with single spaces.
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,
}

impl Args {
    /// Parses `std::env::args`, exiting the process on a usage error or
    /// `--help`/`--version`, matching clap's derive default behaviour.
    pub fn parse_env() -> Self {
        Args::parse()
    }

    /// The positional query words joined into one query string.
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }

    /// Whether any of `-t`/`-s`/`-p` was requested.
    pub fn wants_dump(&self) -> bool {
        self.dump_tokens || self.dump_ast || self.dump_program
    }
}

use std::process;

use logsearch::lexer::Lexer;
use logsearch::token::Token;
use logsearch::{Engine, MemFile, MemFileError};

mod args;

use args::Args;

fn main() {
    let args = Args::parse_env();
    init_logger(args.debug);
    process::exit(run(&args));
}

fn init_logger(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Runs the search driver, returning the process exit code:
/// `0` success, `1` a diagnostic dump was printed, `2` user error, `3` a
/// fatal runtime error.
fn run(args: &Args) -> i32 {
    let Some(path) = args.file.as_ref() else {
        eprintln!("logfind: missing -file/-f PATH");
        return 2;
    };
    if args.query.is_empty() {
        eprintln!("logfind: missing query");
        return 2;
    }
    let query_text = args.query_text();

    let mut engine = Engine::new();
    let compiled = match engine.compile(&query_text) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("logfind: {e}");
            return 2;
        }
    };

    if args.wants_dump() {
        if args.dump_tokens {
            print!("{}", dump_tokens(&query_text));
        }
        if args.dump_ast {
            println!("{}", compiled.ast());
        }
        if args.dump_program {
            print!("{}", compiled.program().disassemble());
        }
        return 1;
    }

    let mut file = match MemFile::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("logfind: {}: {e}", path.display());
            return 3;
        }
    };
    file.goto_end();

    let mut matched: u64 = 0;
    loop {
        match file.read_prev_line() {
            Ok(line) => match engine.eval(&compiled, &line) {
                Ok(true) => {
                    matched += 1;
                    if !args.count {
                        println!("{line}");
                    }
                }
                Ok(false) => {}
                Err(e) => log::warn!("skipping unparsable line: {e}"),
            },
            Err(MemFileError::Bof) => break,
            Err(e) => {
                eprintln!("logfind: {e}");
                return 3;
            }
        }
    }

    if args.count {
        println!("{matched}");
    }
    0
}

/// The `-t` dump: one `line:column TOKEN literal` line per token.
fn dump_tokens(query: &str) -> String {
    let mut lexer = Lexer::new(query);
    let mut out = String::new();
    loop {
        let (pos, token, literal) = lexer.lex();
        if token == Token::Eof {
            break;
        }
        out.push_str(&format!("{pos}\t{token}\t{literal}\n"));
    }
    out
}

use crate::ast::Syntax;
use crate::compiler::compile;
use crate::error::{EvalError, ParseError};
use crate::optimizer::Optimizer;
use crate::program::Program;
use crate::record::Record;
use crate::vm::Vm;
use log::{debug, trace};

/// A compiled, ready-to-run query. Cheap to clone-share across workers:
/// the regexes inside each `Term` operand are immutable after compilation.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    ast: Syntax,
    program: Program,
}

impl CompiledQuery {
    pub fn ast(&self) -> &Syntax {
        &self.ast
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}

/// The facade tying lexer, parser, compiler, optimiser, and VM together
/// for a single-threaded caller: compile a query once, then evaluate it
/// against many lines.
///
/// Mirrors the shape of ripgrep's `grep::Searcher`, which likewise wraps
/// pattern compilation and per-line matching behind one entry point.
pub struct Engine {
    vm: Vm,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine { vm: Vm::new() }
    }

    /// Lexes, parses, compiles, and optimises `query` into a
    /// [`CompiledQuery`] ready for repeated [`Engine::eval`] calls.
    pub fn compile(&self, query: &str) -> Result<CompiledQuery, ParseError> {
        trace!("parsing query: {query:?}");
        let ast = crate::parser::parse(query)?;
        debug!("parsed AST: {ast}");
        let code = compile(&ast);
        let program = Optimizer::new(code)
            .optimize()
            .expect("optimiser only fails on optimiser bugs, never on user input");
        debug!("compiled program:\n{}", program.pretty());
        Ok(CompiledQuery { ast, program })
    }

    /// Decodes `line` as a JSON record and evaluates `query` against it.
    /// Returns `true` iff the program's accumulator is `1`.
    pub fn eval(&mut self, query: &CompiledQuery, line: &str) -> Result<bool, EvalError> {
        let record = Record::decode(line)?;
        self.vm.load_code(query.program.clone())?;
        self.vm.set_record(record)?;
        let result = self.vm.run()?;
        Ok(result == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_evaluates_a_simple_query() {
        let engine = Engine::new();
        let query = engine.compile(r#"level:"info""#).unwrap();
        let mut engine = engine;
        assert!(engine.eval(&query, r#"{"level":"info"}"#).unwrap());
        assert!(!engine.eval(&query, r#"{"level":"fatal"}"#).unwrap());
    }

    #[test]
    fn reuses_compiled_query_across_many_lines() {
        let mut engine = Engine::new();
        let query = engine
            .compile(r#"(msg:"panic") AND (level:"info" OR level:"fatal")"#)
            .unwrap();
        let lines = [
            (r#"{"level":"fatal","msg":"kernel panic"}"#, true),
            (r#"{"level":"info","msg":"hello world"}"#, false),
            (r#"{"level":"info","msg":"panic in the disco"}"#, true),
        ];
        for (line, expected) in lines {
            assert_eq!(engine.eval(&query, line).unwrap(), expected, "{line}");
        }
    }

    #[test]
    fn malformed_line_is_a_decode_error() {
        let mut engine = Engine::new();
        let query = engine.compile(r#"level:"info""#).unwrap();
        assert!(engine.eval(&query, "not json").is_err());
    }

    #[test]
    fn malformed_query_is_a_parse_error() {
        let engine = Engine::new();
        assert!(engine.compile("level \"info\"").is_err());
    }
}

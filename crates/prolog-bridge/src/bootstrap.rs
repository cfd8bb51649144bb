//! Helper clauses installed at session startup
//!
//! The engine reads one term at a time, so loading a whole program from a
//! string needs a small interpreter loop on the Prolog side: open the
//! string as a term stream, read terms until end of file, execute `:-` and
//! `?-` terms immediately and assert everything else. The stream is closed
//! on every exit path. `consult_string` calls `load_program_from_string/1`
//! once these clauses are in place.

use prolog_engine::{EngineError, Machine};
use prolog_parser::SrcId;

pub const BOOTSTRAP: &str = r#"
load_program_from_string(Code) :-
    open_string(Code, Stream),
    call_cleanup(load_stream_terms(Stream), close(Stream)).

load_stream_terms(Stream) :-
    read_term(Stream, Term, []),
    ( Term == end_of_file
    -> true
    ;  load_stream_term(Term),
       load_stream_terms(Stream)
    ).

load_stream_term((:- Goal)) :- !, call(Goal).
load_stream_term((?- Goal)) :- !, call(Goal).
load_stream_term(Clause) :- assertz(Clause).
"#;

/// Assert the bootstrap clauses term by term. Failure here is fatal to
/// initialization; the caller tears the engine down.
pub fn install(machine: &mut Machine) -> Result<(), EngineError> {
    machine.consult_source(BOOTSTRAP, SrcId::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prolog_parser::parse_term;

    fn goal(machine: &mut Machine, input: &str) -> bool {
        let goal = parse_term(input, SrcId::empty()).expect("parse error");
        machine
            .solve_first(&goal)
            .expect("goal should not raise")
            .is_some()
    }

    #[test]
    fn test_install_defines_loader() {
        let mut machine = Machine::new();
        install(&mut machine).unwrap();
        assert!(machine.has_predicate(&(prolog_parser::Symbol::new(
            "load_program_from_string".to_string()
        ), 1)));
    }

    #[test]
    fn test_load_program_with_facts_and_rules() {
        let mut machine = Machine::new();
        install(&mut machine).unwrap();
        let code = "parent(tom, bob). parent(bob, ann). \
                    grandparent(X, Z) :- parent(X, Y), parent(Y, Z).";
        let load = parse_term(
            &format!("load_program_from_string(\"{}\")", code.replace('"', "\\\"")),
            SrcId::empty(),
        )
        .expect("parse error");
        assert!(machine.solve_first(&load).unwrap().is_some());
        assert!(goal(&mut machine, "grandparent(tom, ann)"));
    }

    #[test]
    fn test_load_program_executes_directives_in_order() {
        let mut machine = Machine::new();
        install(&mut machine).unwrap();
        let load = parse_term(
            "load_program_from_string(\"p(1). :- assertz(saw(p)). q(1).\")",
            SrcId::empty(),
        )
        .expect("parse error");
        assert!(machine.solve_first(&load).unwrap().is_some());
        assert!(goal(&mut machine, "saw(p)"));
        assert!(goal(&mut machine, "q(1)"));
    }

    #[test]
    fn test_load_program_syntax_error_raises() {
        let mut machine = Machine::new();
        install(&mut machine).unwrap();
        let load = parse_term(
            "load_program_from_string(\"this is ( not valid\")",
            SrcId::empty(),
        )
        .expect("parse error");
        assert!(machine.solve_first(&load).is_err());
    }
}

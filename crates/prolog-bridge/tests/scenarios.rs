//! End to end scenarios driving a Session the way a host application would.

use std::io::Write;

use prolog_bridge::{HostValue, InitOptions, Session, Solution};

fn session() -> Session {
    let mut session = Session::new();
    assert!(session.initialize(InitOptions::default()));
    session
}

const FAMILY: &str = "
parent(tom, bob).
parent(tom, liz).
parent(bob, ann).
parent(bob, pat).

grandparent(X, Z) :- parent(X, Y), parent(Y, Z).
";

#[test]
fn family_program_loads_and_answers() {
    let mut session = session();
    assert!(session.consult_string(FAMILY));

    assert!(session.query("parent(tom, bob)", &[]));
    assert!(session.query("grandparent(tom, ann)", &[]));
    assert!(!session.query("grandparent(ann, tom)", &[]));
    assert!(session.last_error().is_empty());
}

#[test]
fn query_all_returns_solutions_in_order() {
    let mut session = session();
    session.consult_string(FAMILY);

    // "tom" is an atom, so the whole solved goal comes back per solution,
    // still in engine enumeration order: bob then liz.
    let args = vec![HostValue::string("tom"), HostValue::string("X")];
    let solutions = session.query_all("parent", &args);
    assert_eq!(
        solutions,
        vec![
            Solution::Term(HostValue::compound(
                "parent",
                vec![HostValue::string("tom"), HostValue::string("bob")],
            )),
            Solution::Term(HostValue::compound(
                "parent",
                vec![HostValue::string("tom"), HostValue::string("liz")],
            )),
        ]
    );
}

#[test]
fn query_all_extracts_bindings_for_variable_args() {
    let mut session = session();
    session.consult_string(FAMILY);

    let args = vec![HostValue::string("P"), HostValue::string("C")];
    let solutions = session.query_all("parent", &args);
    assert_eq!(solutions.len(), 4);
    assert_eq!(
        solutions[0],
        Solution::Bindings(vec![
            ("P".to_string(), HostValue::string("tom")),
            ("C".to_string(), HostValue::string("bob")),
        ])
    );
    assert_eq!(
        solutions[3],
        Solution::Bindings(vec![
            ("P".to_string(), HostValue::string("bob")),
            ("C".to_string(), HostValue::string("pat")),
        ])
    );
}

#[test]
fn query_all_without_variable_args_returns_solved_goals() {
    let mut session = session();
    session.consult_string(FAMILY);

    let args = vec![HostValue::string("tom"), HostValue::string("bob")];
    let solutions = session.query_all("parent", &args);
    assert_eq!(
        solutions,
        vec![Solution::Term(HostValue::compound(
            "parent",
            vec![HostValue::string("tom"), HostValue::string("bob")],
        ))]
    );
}

#[test]
fn query_one_returns_first_solution_only() {
    let mut session = session();
    session.consult_string(FAMILY);

    // Mixed arguments: the whole solved goal comes back.
    let args = vec![HostValue::string("tom"), HostValue::string("Child")];
    assert_eq!(
        session.query_one("parent", &args),
        Some(Solution::Term(HostValue::compound(
            "parent",
            vec![HostValue::string("tom"), HostValue::string("bob")],
        )))
    );

    // All-variable arguments: name to value bindings.
    let args = vec![HostValue::string("Who"), HostValue::string("Child")];
    assert_eq!(
        session.query_one("parent", &args),
        Some(Solution::Bindings(vec![
            ("Who".to_string(), HostValue::string("tom")),
            ("Child".to_string(), HostValue::string("bob")),
        ]))
    );

    assert_eq!(session.query_one("parent(nobody, X)", &[]), None);
}

#[test]
fn dynamic_fact_lifecycle() {
    let mut session = session();

    assert!(!session.query("stock(widget, 5)", &[]));
    assert!(session.add_fact("stock(widget, 5)"));
    assert!(session.query("stock(widget, 5)", &[]));

    assert!(session.retract_fact("stock(widget, 5)"));
    assert!(!session.query("stock(widget, 5)", &[]));

    // Already gone: retract fails quietly without recording an error.
    assert!(!session.retract_fact("stock(widget, 5)"));
}

#[test]
fn retract_all_succeeds_even_with_no_matches() {
    let mut session = session();
    session.add_fact("stock(widget, 5)");
    session.add_fact("stock(gadget, 3)");

    assert!(session.retract_all("stock(_, _)"));
    assert!(!session.query("stock(widget, 5)", &[]));

    // Pattern parses, nothing matches: still true.
    assert!(session.retract_all("stock(_, _)"));
    // Predicate stays known, so calling it fails instead of erroring.
    assert!(!session.query("stock(anything, 1)", &[]));
    assert!(session.last_error().is_empty());
}

#[test]
fn syntax_error_is_contained_and_session_stays_usable() {
    let mut session = session();

    assert!(!session.consult_string("broken(a, :- ."));
    assert!(!session.last_error().is_empty());

    assert!(session.add_fact("fine(1)"));
    assert!(session.query("fine(1)", &[]));
}

#[test]
fn malformed_goal_text_yields_false_with_error() {
    let mut session = session();
    assert!(!session.query("p(unclosed", &[]));
    assert!(session.last_error().contains("Query error"));
}

#[test]
fn compound_and_list_disambiguation() {
    let mut session = session();
    session.consult_string("holds(box, [a, b, c]).\nholds(tag, label(urgent, 2)).");

    let contents = session.query_one("holds(box, X)", &[]);
    assert_eq!(
        contents,
        Some(Solution::Term(HostValue::compound(
            "holds",
            vec![
                HostValue::string("box"),
                HostValue::List(vec![
                    HostValue::string("a"),
                    HostValue::string("b"),
                    HostValue::string("c"),
                ]),
            ],
        )))
    );

    let tagged = session.call_function("holds", &[HostValue::string("tag")]);
    assert_eq!(
        tagged,
        HostValue::compound(
            "label",
            vec![HostValue::string("urgent"), HostValue::Int(2)],
        )
    );
}

#[test]
fn encoded_arguments_round_through_the_engine() {
    let mut session = session();
    session.consult_string("echo(X, X).");

    let value = HostValue::List(vec![
        HostValue::Int(1),
        HostValue::Float(2.5),
        HostValue::Bool(true),
        HostValue::compound("pair", vec![HostValue::string("k"), HostValue::Int(7)]),
    ]);
    assert!(session.call_predicate("echo", &[value.clone(), value.clone()]));

    let back = session.call_function("echo", &[value.clone()]);
    // Bool(true) encodes to the atom true, which decodes to a string.
    let expected = HostValue::List(vec![
        HostValue::Int(1),
        HostValue::Float(2.5),
        HostValue::string("true"),
        HostValue::compound("pair", vec![HostValue::string("k"), HostValue::Int(7)]),
    ]);
    assert_eq!(back, expected);
}

#[test]
fn arithmetic_through_call_function() {
    let mut session = session();
    session.consult_string("triangle(N, Area) :- Area is N * (N + 1) / 2.");
    assert_eq!(
        session.call_function("triangle", &[HostValue::Int(10)]),
        HostValue::Int(55),
    );
}

#[test]
fn integer_overflow_in_arithmetic_is_contained() {
    let mut session = session();
    session.consult_string("negate(X, Y) :- Y is X / -1.");

    // i64::MIN / -1 cannot be represented; the engine raises an
    // evaluation error instead of aborting the host.
    let result = session.call_function("negate", &[HostValue::Int(i64::MIN)]);
    assert_eq!(result, HostValue::Null);
    assert!(session.last_error().contains("int_overflow"));

    assert_eq!(
        session.call_function("negate", &[HostValue::Int(7)]),
        HostValue::Int(-7),
    );
}

#[test]
fn huge_float_arguments_survive_goal_rendering() {
    let mut session = session();
    session.consult_string("huge(X) :- X > 1.0e100.");

    assert!(session.query("huge", &[HostValue::Float(1e300)]));
    assert!(!session.query("huge", &[HostValue::Float(5.0)]));
    assert!(session.last_error().is_empty());
}

#[test]
fn consult_file_accumulates_with_consult_string() {
    let mut session = session();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "city(oslo).").unwrap();
    writeln!(file, "city(bergen).").unwrap();
    let path = file.path().to_string_lossy().to_string();

    assert!(session.consult_file(&path));
    assert!(session.consult_string("capital(oslo)."));

    assert!(session.query("city(bergen)", &[]));
    assert!(session.query("capital(oslo)", &[]));
    assert_eq!(session.query_all("city(X)", &[]).len(), 2);
}

#[test]
fn consult_resolves_search_path_aliases() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.pl"), "asset(loaded).\n").unwrap();

    let mut session = Session::new();
    let options = InitOptions {
        file_search_paths: vec![(
            "res".to_string(),
            dir.path().to_string_lossy().to_string(),
        )],
        ..InitOptions::default()
    };
    assert!(session.initialize(options));
    assert!(session.consult_file("res://data.pl"));
    assert!(session.query("asset(loaded)", &[]));
}

#[test]
fn consult_missing_file_is_reported() {
    let mut session = session();
    assert!(!session.consult_file("/no/such/place.pl"));
    assert!(session.last_error().contains("Consult error"));
}

#[test]
fn directives_run_during_consult_string() {
    let mut session = session();
    assert!(session.consult_string(":- assertz(seeded(1)).\nuses(X) :- seeded(X)."));
    assert!(session.query("uses(1)", &[]));
}

#[test]
fn failing_directive_aborts_consult() {
    let mut session = session();
    assert!(!session.consult_string("before(1).\n:- fail.\nafter(2)."));
    assert!(!session.last_error().is_empty());
}

#[test]
fn lifecycle_is_idempotent_and_errors_when_down() {
    let mut session = Session::new();
    assert!(session.initialize(InitOptions::default()));
    assert!(session.initialize(InitOptions::default()));

    session.add_fact("p(1)");
    session.cleanup();
    session.cleanup();
    assert!(!session.is_initialized());

    assert!(!session.query("p(1)", &[]));
    assert!(session.query_all("p(X)", &[]).is_empty());
    assert!(session.query_one("p(X)", &[]).is_none());
    assert_eq!(session.call_function("p", &[]), HostValue::Null);
    assert!(session.last_error().contains("not initialized"));

    // A fresh initialize starts from an empty knowledge base.
    assert!(session.initialize(InitOptions::default()));
    assert!(!session.query("p(1)", &[]));
}

#[test]
fn predicate_introspection() {
    let mut session = session();
    session.consult_string(FAMILY);

    assert!(session.predicate_exists("parent", 2));
    assert!(session.predicate_exists("grandparent", 2));
    assert!(!session.predicate_exists("parent", 3));
    assert!(session.predicate_exists("assertz", 1));

    let listed = session.list_predicates();
    let parent = HostValue::compound(
        "/",
        vec![HostValue::string("parent"), HostValue::Int(2)],
    );
    let grandparent = HostValue::compound(
        "/",
        vec![HostValue::string("grandparent"), HostValue::Int(2)],
    );
    let parent_pos = listed.iter().position(|p| *p == parent);
    let grandparent_pos = listed.iter().position(|p| *p == grandparent);
    assert!(parent_pos.is_some());
    assert!(grandparent_pos.is_some());
    // First-seen order.
    assert!(parent_pos < grandparent_pos);
}

#[test]
fn goal_text_accepts_optional_terminator() {
    let mut session = session();
    assert!(session.add_fact("tidy(yes)."));
    assert!(session.query("tidy(yes)", &[]));
}

#[test]
fn empty_inputs_are_rejected() {
    let mut session = session();
    assert!(!session.add_fact("   "));
    assert!(session.last_error().contains("empty"));
    assert!(!session.retract_fact("."));
    assert!(!session.consult_string(""));
    assert_eq!(session.call_function("  ", &[]), HostValue::Null);
}

#[test]
fn thrown_errors_surface_in_last_error() {
    let mut session = session();
    session.consult_string("boom :- throw(my_error(42)).");
    assert!(!session.query("boom", &[]));
    assert!(session.last_error().contains("my_error"));
}

#[test]
fn deep_recursion_fails_quietly() {
    let mut session = Session::new();
    let options = InitOptions {
        stack_limit: Some("256k".to_string()),
        ..InitOptions::default()
    };
    assert!(session.initialize(options));
    session.consult_string("loop :- loop.");
    assert!(!session.query("loop", &[]));
    assert!(session.last_error().contains("resource_error"));
}

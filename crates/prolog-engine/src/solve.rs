//! SLD resolution with continuation-passing solution enumeration
//!
//! Goals are solved left to right, clauses tried in assertion order. Each
//! solution is delivered to a continuation which decides whether enumeration
//! continues. Exceptions travel as `Err(Term)` to the nearest `catch/3` or
//! out of the engine.
//!
//! # Cut
//!
//! Cut is tracked with barrier identifiers allocated from a per-machine
//! counter, so no two frames ever share one. Solving a clause body opens a
//! barrier; `!` reports `Flow::CutTo(barrier)` which prunes choice points
//! until the frame that opened that barrier absorbs it. `call/1`, `\+/1`,
//! `findall/3`, `catch/3` and the condition of if-then-else open their own
//! barriers, so cuts inside them stay local.

use std::path::Path;

use prolog_parser::{ParseError, SrcId, Symbol, Term};

use crate::arith::{self, CompOp};
use crate::machine::{EngineError, Machine, PredicateKey};
use crate::unify::{terms_identical, unify, Bindings};

/// What enumeration should do after a solution or an exhausted branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Try the next alternative.
    Continue,
    /// A cut fired; prune choice points up to the named barrier.
    CutTo(usize),
    /// The consumer has seen enough; unwind the whole search.
    Stop,
}

/// Solution consumer. Receives the machine back so it can keep resolving.
pub type Solutions<'a> = &'a mut dyn FnMut(&mut Machine, &mut Bindings) -> Result<Flow, Term>;

/// Control constructs and builtin predicates, by name and arity.
/// Callable even when no clause database entry exists.
pub const BUILTINS: &[(&str, usize)] = &[
    ("true", 0),
    ("fail", 0),
    ("false", 0),
    ("!", 0),
    (",", 2),
    (";", 2),
    ("->", 2),
    ("\\+", 1),
    ("call", 1),
    ("=", 2),
    ("\\=", 2),
    ("==", 2),
    ("\\==", 2),
    ("var", 1),
    ("nonvar", 1),
    ("atom", 1),
    ("number", 1),
    ("is", 2),
    ("<", 2),
    (">", 2),
    ("=<", 2),
    (">=", 2),
    ("=:=", 2),
    ("=\\=", 2),
    ("assert", 1),
    ("asserta", 1),
    ("assertz", 1),
    ("retract", 1),
    ("retractall", 1),
    ("findall", 3),
    ("current_predicate", 1),
    ("dynamic", 1),
    ("throw", 1),
    ("catch", 3),
    ("consult", 1),
    ("open_string", 2),
    ("read_term", 3),
    ("close", 1),
    ("call_cleanup", 2),
];

pub fn is_builtin(name: &str, arity: usize) -> bool {
    BUILTINS.contains(&(name, arity))
}

fn ball(kind: Term, context: &str) -> Term {
    Term::compound("error", vec![kind, Term::atom(context)])
}

fn instantiation_error(context: &str) -> Term {
    ball(Term::atom("instantiation_error"), context)
}

fn type_error(expected: &str, culprit: Term, context: &str) -> Term {
    ball(
        Term::compound("type_error", vec![Term::atom(expected), culprit]),
        context,
    )
}

fn existence_error(key: &PredicateKey) -> Term {
    ball(
        Term::compound(
            "existence_error",
            vec![
                Term::atom("procedure"),
                Term::compound(
                    "/",
                    vec![Term::Atom(key.0), Term::Int(key.1 as i64)],
                ),
            ],
        ),
        "call",
    )
}

fn depth_limit_error(limit: usize) -> Term {
    ball(
        Term::compound("resource_error", vec![Term::atom("depth_limit")]),
        &format!("depth limit {} exceeded", limit),
    )
}

fn syntax_ball(errors: &[ParseError], context: &str) -> Term {
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ball(
        Term::compound("syntax_error", vec![Term::atom(&rendered.join("; "))]),
        context,
    )
}

fn engine_error_ball(err: EngineError, context: &str) -> Term {
    match err {
        EngineError::Exception(term) => term,
        EngineError::Parse(errors) => syntax_ball(&errors, context),
        EngineError::Io(io) => ball(
            Term::compound(
                "existence_error",
                vec![Term::atom("source_sink"), Term::atom(&io.to_string())],
            ),
            context,
        ),
        EngineError::DirectiveFailed(goal) => ball(
            Term::compound("directive_failed", vec![goal]),
            context,
        ),
    }
}

/// Solve a goal, delivering each solution's bindings to `k`.
pub fn solve(
    machine: &mut Machine,
    goal: &Term,
    bindings: &mut Bindings,
    depth: usize,
    barrier: usize,
    k: Solutions,
) -> Result<Flow, Term> {
    if depth > machine.depth_limit() {
        return Err(depth_limit_error(machine.depth_limit()));
    }
    let resolved = bindings.resolve(goal);
    match &resolved {
        Term::Var(_) => Err(instantiation_error("call")),
        Term::Int(_) | Term::Float(_) | Term::Str(_) => {
            Err(type_error("callable", resolved.clone(), "call"))
        }
        Term::Atom(name) => match name.as_ref().as_str() {
            "true" => k(machine, bindings),
            "fail" | "false" => Ok(Flow::Continue),
            "!" => match k(machine, bindings)? {
                Flow::Continue => Ok(Flow::CutTo(barrier)),
                other => Ok(other),
            },
            _ => call_predicate(machine, (*name, 0), &resolved, bindings, depth, k),
        },
        Term::Compound(name, args) => {
            solve_compound(machine, *name, args, &resolved, bindings, depth, barrier, k)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_compound(
    machine: &mut Machine,
    name: Symbol,
    args: &[Term],
    goal: &Term,
    bindings: &mut Bindings,
    depth: usize,
    barrier: usize,
    k: Solutions,
) -> Result<Flow, Term> {
    match (name.as_ref().as_str(), args.len()) {
        (",", 2) => solve(machine, &args[0], bindings, depth, barrier, &mut |machine,
                                                                             bindings| {
            solve(machine, &args[1], bindings, depth, barrier, &mut *k)
        }),

        (";", 2) => {
            // (Cond -> Then ; Else) commits to the first solution of Cond.
            if let Term::Compound(inner, inner_args) = &args[0] {
                if inner.as_ref() == "->" && inner_args.len() == 2 {
                    return if_then_else(
                        machine,
                        &inner_args[0],
                        &inner_args[1],
                        Some(&args[1]),
                        bindings,
                        depth,
                        barrier,
                        k,
                    );
                }
            }
            let flow = {
                let mut local = bindings.clone();
                solve(machine, &args[0], &mut local, depth, barrier, &mut *k)?
            };
            if flow != Flow::Continue {
                return Ok(flow);
            }
            let mut local = bindings.clone();
            solve(machine, &args[1], &mut local, depth, barrier, k)
        }

        ("->", 2) => if_then_else(
            machine, &args[0], &args[1], None, bindings, depth, barrier, k,
        ),

        ("\\+", 1) => {
            let mut found = false;
            let inner = machine.next_barrier();
            let mut local = bindings.clone();
            solve(machine, &args[0], &mut local, depth + 1, inner, &mut |_, _| {
                found = true;
                Ok(Flow::Stop)
            })?;
            if found {
                Ok(Flow::Continue)
            } else {
                k(machine, bindings)
            }
        }

        ("call", 1) => {
            let inner = machine.next_barrier();
            match solve(machine, &args[0], bindings, depth + 1, inner, k)? {
                // A cut inside call/1 prunes only the call's alternatives.
                Flow::CutTo(target) if target == inner => Ok(Flow::Continue),
                other => Ok(other),
            }
        }

        ("=", 2) => {
            let mut local = bindings.clone();
            if unify(&args[0], &args[1], &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("\\=", 2) => {
            let mut local = bindings.clone();
            if unify(&args[0], &args[1], &mut local) {
                Ok(Flow::Continue)
            } else {
                k(machine, bindings)
            }
        }

        ("==", 2) => {
            if terms_identical(&args[0], &args[1], bindings) {
                k(machine, bindings)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("\\==", 2) => {
            if terms_identical(&args[0], &args[1], bindings) {
                Ok(Flow::Continue)
            } else {
                k(machine, bindings)
            }
        }

        ("var", 1) => {
            if bindings.is_unbound(&args[0]) {
                k(machine, bindings)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("nonvar", 1) => {
            if bindings.is_unbound(&args[0]) {
                Ok(Flow::Continue)
            } else {
                k(machine, bindings)
            }
        }

        ("atom", 1) => {
            if matches!(bindings.resolve(&args[0]), Term::Atom(_)) {
                k(machine, bindings)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("number", 1) => {
            if matches!(bindings.resolve(&args[0]), Term::Int(_) | Term::Float(_)) {
                k(machine, bindings)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("is", 2) => {
            let value = arith::eval_arith(&args[1], bindings)?;
            let mut local = bindings.clone();
            if unify(&args[0], &value.to_term(), &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        (op, 2) if CompOp::from_name(op).is_some() => {
            // from_name is checked by the guard
            let Some(op) = CompOp::from_name(op) else {
                return Ok(Flow::Continue);
            };
            if arith::eval_comparison(op, &args[0], &args[1], bindings)? {
                k(machine, bindings)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("assert", 1) | ("assertz", 1) => {
            let clause = bindings.resolve(&args[0]);
            machine.assertz(&clause)?;
            k(machine, bindings)
        }

        ("asserta", 1) => {
            let clause = bindings.resolve(&args[0]);
            machine.asserta(&clause)?;
            k(machine, bindings)
        }

        ("retract", 1) => {
            let mut local = bindings.clone();
            if machine.retract(&args[0], &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("retractall", 1) => {
            machine.retractall(&args[0], bindings);
            k(machine, bindings)
        }

        ("findall", 3) => {
            let mut collected = Vec::new();
            {
                let inner = machine.next_barrier();
                let mut local = bindings.clone();
                solve(
                    machine,
                    &args[1],
                    &mut local,
                    depth + 1,
                    inner,
                    &mut |machine, bindings| {
                        let witness = bindings.resolve(&args[0]);
                        collected.push(machine.refresh(&witness));
                        Ok(Flow::Continue)
                    },
                )?;
            }
            let mut local = bindings.clone();
            if unify(&args[2], &Term::list(collected), &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("current_predicate", 1) => {
            let keys: Vec<PredicateKey> = machine.predicate_keys().cloned().collect();
            for key in keys {
                let indicator = Term::compound(
                    "/",
                    vec![Term::Atom(key.0), Term::Int(key.1 as i64)],
                );
                let mut local = bindings.clone();
                if unify(&args[0], &indicator, &mut local) {
                    match k(machine, &mut local)? {
                        Flow::Continue => {}
                        other => return Ok(other),
                    }
                }
            }
            Ok(Flow::Continue)
        }

        ("dynamic", 1) => {
            declare_indicators(machine, &bindings.resolve(&args[0]))?;
            k(machine, bindings)
        }

        ("throw", 1) => {
            let thrown = bindings.resolve(&args[0]);
            if matches!(thrown, Term::Var(_)) {
                Err(instantiation_error("throw"))
            } else {
                Err(thrown)
            }
        }

        ("catch", 3) => {
            let inner = machine.next_barrier();
            let attempt = {
                let mut local = bindings.clone();
                solve(
                    machine,
                    &args[0],
                    &mut local,
                    depth + 1,
                    inner,
                    &mut |machine, bindings| {
                        // Only the protected goal is guarded: exceptions
                        // raised by goals after this catch in the
                        // conjunction are marked so they pass through the
                        // recovery check below uncaught.
                        k(machine, bindings).map_err(mark_outside)
                    },
                )
            };
            match attempt {
                Ok(Flow::CutTo(target)) if target == inner => Ok(Flow::Continue),
                Ok(flow) => Ok(flow),
                Err(thrown) => {
                    if let Some(ball) = unmark_outside(&thrown) {
                        return Err(ball);
                    }
                    let mut local = bindings.clone();
                    if unify(&args[1], &thrown, &mut local) {
                        solve(machine, &args[2], &mut local, depth, barrier, k)
                    } else {
                        Err(thrown)
                    }
                }
            }
        }

        ("consult", 1) => {
            let path = match bindings.resolve(&args[0]) {
                Term::Atom(name) => name.as_ref().clone(),
                Term::Str(path) => path,
                Term::Var(_) => return Err(instantiation_error("consult")),
                other => return Err(type_error("atom", other, "consult")),
            };
            machine
                .consult_file(Path::new(&path))
                .map_err(|err| engine_error_ball(err, "consult"))?;
            k(machine, bindings)
        }

        ("open_string", 2) => {
            let text = match bindings.resolve(&args[0]) {
                Term::Str(text) => text,
                Term::Atom(text) => text.as_ref().clone(),
                Term::Var(_) => return Err(instantiation_error("open_string")),
                other => return Err(type_error("string", other, "open_string")),
            };
            let id = machine
                .open_stream(&text, SrcId::goal())
                .map_err(|errors| syntax_ball(&errors, "open_string"))?;
            let handle = stream_handle(id);
            let mut local = bindings.clone();
            if unify(&args[1], &handle, &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("read_term", 3) => {
            let id = stream_id(&bindings.resolve(&args[0]))?;
            let term = machine
                .read_stream(id)
                .map_err(|errors| syntax_ball(&errors, "read_term"))?;
            let term = match term {
                Some(term) => machine.refresh(&term),
                None => Term::atom("end_of_file"),
            };
            let mut local = bindings.clone();
            if unify(&args[1], &term, &mut local) {
                k(machine, &mut local)
            } else {
                Ok(Flow::Continue)
            }
        }

        ("close", 1) => {
            let id = stream_id(&bindings.resolve(&args[0]))?;
            machine.close_stream(id);
            k(machine, bindings)
        }

        ("call_cleanup", 2) => {
            let inner = machine.next_barrier();
            let result = solve(machine, &args[0], bindings, depth + 1, inner, &mut *k);
            let cleanup = bindings.resolve(&args[1]);
            let cleanup_result = machine.solve_first(&cleanup);
            match (result, cleanup_result) {
                (Err(thrown), _) => Err(thrown),
                (Ok(_), Err(thrown)) => Err(thrown),
                (Ok(Flow::CutTo(target)), Ok(_)) if target == inner => Ok(Flow::Continue),
                (Ok(flow), Ok(_)) => Ok(flow),
            }
        }

        _ => call_predicate(machine, (name, args.len()), goal, bindings, depth, k),
    }
}

/// Try the clauses of a user predicate in order. This is the cut barrier:
/// a cut in a clause body prunes the remaining clauses and is absorbed here.
fn call_predicate(
    machine: &mut Machine,
    key: PredicateKey,
    goal: &Term,
    bindings: &mut Bindings,
    depth: usize,
    k: Solutions,
) -> Result<Flow, Term> {
    let clauses = match machine.clauses(&key) {
        Some(clauses) => clauses.to_vec(),
        None => return Err(existence_error(&key)),
    };
    let body_barrier = machine.next_barrier();
    for clause in &clauses {
        let renamed = machine.refresh_clause(clause);
        let mut local = bindings.clone();
        if unify(goal, &renamed.head, &mut local) {
            let flow = solve(
                machine,
                &renamed.body,
                &mut local,
                depth + 1,
                body_barrier,
                &mut *k,
            )?;
            match flow {
                Flow::Continue => {}
                Flow::CutTo(target) if target == body_barrier => return Ok(Flow::Continue),
                other => return Ok(other),
            }
        }
    }
    Ok(Flow::Continue)
}

#[allow(clippy::too_many_arguments)]
fn if_then_else(
    machine: &mut Machine,
    cond: &Term,
    then_goal: &Term,
    else_goal: Option<&Term>,
    bindings: &mut Bindings,
    depth: usize,
    barrier: usize,
    k: Solutions,
) -> Result<Flow, Term> {
    let mut committed = false;
    let mut then_flow = Flow::Continue;
    {
        let cond_barrier = machine.next_barrier();
        let mut cond_bindings = bindings.clone();
        solve(
            machine,
            cond,
            &mut cond_bindings,
            depth + 1,
            cond_barrier,
            &mut |machine, bindings| {
                committed = true;
                then_flow = solve(machine, then_goal, bindings, depth, barrier, &mut *k)?;
                // Commit: discard the condition's remaining alternatives.
                Ok(Flow::Stop)
            },
        )?;
    }
    if committed {
        return Ok(then_flow);
    }
    match else_goal {
        Some(else_goal) => {
            let mut local = bindings.clone();
            solve(machine, else_goal, &mut local, depth, barrier, k)
        }
        None => Ok(Flow::Continue),
    }
}

fn declare_indicators(machine: &mut Machine, indicator: &Term) -> Result<(), Term> {
    match indicator {
        Term::Compound(functor, args) if functor.as_ref() == "," && args.len() == 2 => {
            declare_indicators(machine, &args[0])?;
            declare_indicators(machine, &args[1])
        }
        Term::Compound(functor, args) if functor.as_ref() == "/" && args.len() == 2 => {
            match (&args[0], &args[1]) {
                (Term::Atom(name), Term::Int(arity)) if *arity >= 0 => {
                    machine.declare((*name, *arity as usize));
                    Ok(())
                }
                _ => Err(type_error(
                    "predicate_indicator",
                    indicator.clone(),
                    "dynamic",
                )),
            }
        }
        other => Err(type_error("predicate_indicator", other.clone(), "dynamic")),
    }
}

/// Wrap an exception raised outside a catch's protected goal so the catch
/// it unwinds into re-raises it instead of running recovery.
fn mark_outside(ball: Term) -> Term {
    Term::compound("$outside_catch", vec![ball])
}

fn unmark_outside(thrown: &Term) -> Option<Term> {
    match thrown {
        Term::Compound(functor, args)
            if functor.as_ref() == "$outside_catch" && args.len() == 1 =>
        {
            Some(args[0].clone())
        }
        _ => None,
    }
}

fn stream_handle(id: usize) -> Term {
    Term::compound("$stream", vec![Term::Int(id as i64)])
}

fn stream_id(term: &Term) -> Result<usize, Term> {
    match term {
        Term::Compound(functor, args) if functor.as_ref() == "$stream" && args.len() == 1 => {
            match &args[0] {
                Term::Int(id) if *id >= 0 => Ok(*id as usize),
                _ => Err(type_error("stream", term.clone(), "stream")),
            }
        }
        Term::Var(_) => Err(instantiation_error("stream")),
        other => Err(type_error("stream", other.clone(), "stream")),
    }
}

//! The clause database and engine state
//!
//! A [`Machine`] owns everything a resolution run needs: the clause database
//! keyed by name/arity, open term streams for `read_term/3`, the counters
//! for fresh variables and cut barriers, and the depth limit that bounds
//! runaway recursion.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use prolog_parser::{ParseError, SrcId, Symbol, Term, TermStream};

use crate::solve::{self, Flow};
use crate::unify::Bindings;

/// Predicates are indexed by functor name and arity.
pub type PredicateKey = (Symbol, usize);

/// A stored clause. Facts carry the body `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub head: Term,
    pub body: Term,
}

impl Clause {
    /// Split a source term into head and body.
    pub fn from_term(term: &Term) -> Clause {
        if let Term::Compound(functor, args) = term {
            if functor.as_ref() == ":-" && args.len() == 2 {
                return Clause {
                    head: args[0].clone(),
                    body: args[1].clone(),
                };
            }
        }
        Clause {
            head: term.clone(),
            body: Term::atom("true"),
        }
    }

    /// Key of the predicate this clause belongs to, if its head is callable.
    pub fn key(&self) -> Option<PredicateKey> {
        self.head.functor()
    }
}

#[derive(Debug)]
pub enum EngineError {
    Io(std::io::Error),
    Parse(Vec<ParseError>),
    /// An exception term propagated out of resolution uncaught.
    Exception(Term),
    /// A `:- Goal` directive failed during consult.
    DirectiveFailed(Term),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Io(err) => write!(f, "io error: {}", err),
            EngineError::Parse(errors) => {
                let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "{}", rendered.join("; "))
            }
            EngineError::Exception(term) => write!(f, "uncaught exception: {}", term),
            EngineError::DirectiveFailed(goal) => write!(f, "directive failed: {}", goal),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err)
    }
}

impl From<Vec<ParseError>> for EngineError {
    fn from(errors: Vec<ParseError>) -> Self {
        EngineError::Parse(errors)
    }
}

/// List predicates available to every program.
const PRELUDE: &str = r#"
member(X, [X|_]).
member(X, [_|T]) :- member(X, T).

append([], L, L).
append([H|T], L, [H|R]) :- append(T, L, R).

length([], 0).
length([_|T], N) :- length(T, M), N is M + 1.

between(Low, High, Low) :- Low =< High.
between(Low, High, X) :- Low < High, Next is Low + 1, between(Next, High, X).
"#;

/// Default bound on resolution depth.
pub const DEFAULT_DEPTH_LIMIT: usize = 4096;

pub struct Machine {
    database: HashMap<PredicateKey, Vec<Clause>>,
    /// Insertion order of predicate keys, for stable enumeration.
    predicate_order: Vec<PredicateKey>,
    streams: Vec<Option<TermStream>>,
    fresh_counter: u64,
    barrier_counter: usize,
    depth_limit: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        let mut machine = Machine {
            database: HashMap::new(),
            predicate_order: Vec::new(),
            streams: Vec::new(),
            fresh_counter: 0,
            barrier_counter: 0,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        };
        if let Err(err) = machine.consult_source(PRELUDE, SrcId::empty()) {
            // The prelude is fixed at compile time; a failure here is a bug.
            tracing::error!(error = %err, "prelude failed to load");
        }
        machine
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    pub fn set_depth_limit(&mut self, limit: usize) {
        self.depth_limit = limit.max(1);
    }

    /// Clauses for a predicate, in assertion order.
    pub fn clauses(&self, key: &PredicateKey) -> Option<&[Clause]> {
        self.database.get(key).map(Vec::as_slice)
    }

    pub fn has_predicate(&self, key: &PredicateKey) -> bool {
        self.database.contains_key(key)
    }

    /// Predicate keys in first-seen order.
    pub fn predicate_keys(&self) -> impl Iterator<Item = &PredicateKey> {
        self.predicate_order.iter()
    }

    fn entry(&mut self, key: PredicateKey) -> &mut Vec<Clause> {
        if !self.database.contains_key(&key) {
            self.predicate_order.push(key);
        }
        self.database.entry(key).or_default()
    }

    /// Register a predicate without clauses, as `dynamic/1` and
    /// `retractall/1` do. Calls to it fail instead of raising.
    pub fn declare(&mut self, key: PredicateKey) {
        self.entry(key);
    }

    fn add_clause(&mut self, term: &Term, front: bool) -> Result<(), Term> {
        let clause = Clause::from_term(term);
        let Some(key) = clause.key() else {
            return Err(Term::compound(
                "error",
                vec![
                    Term::compound(
                        "type_error",
                        vec![Term::atom("callable"), clause.head.clone()],
                    ),
                    Term::atom("assert"),
                ],
            ));
        };
        tracing::debug!(predicate = %key.0, arity = key.1, "assert clause");
        let clauses = self.entry(key);
        if front {
            clauses.insert(0, clause);
        } else {
            clauses.push(clause);
        }
        Ok(())
    }

    /// Add a clause at the end of its predicate.
    pub fn assertz(&mut self, term: &Term) -> Result<(), Term> {
        self.add_clause(term, false)
    }

    /// Add a clause at the front of its predicate.
    pub fn asserta(&mut self, term: &Term) -> Result<(), Term> {
        self.add_clause(term, true)
    }

    /// Remove the first clause unifying with `pattern`, binding its
    /// variables. Fails quietly when nothing matches.
    pub fn retract(&mut self, pattern: &Term, bindings: &mut Bindings) -> bool {
        let pattern = Clause::from_term(&bindings.resolve(pattern));
        let Some(key) = pattern.key() else {
            return false;
        };
        let Some(clauses) = self.database.get(&key).cloned() else {
            return false;
        };
        for (idx, clause) in clauses.iter().enumerate() {
            let mut attempt = bindings.clone();
            let fresh = self.refresh_clause_terms(clause);
            if crate::unify::unify(&pattern.head, &fresh.0, &mut attempt)
                && crate::unify::unify(&pattern.body, &fresh.1, &mut attempt)
            {
                *bindings = attempt;
                if let Some(clauses) = self.database.get_mut(&key) {
                    clauses.remove(idx);
                }
                tracing::debug!(predicate = %key.0, arity = key.1, "retract clause");
                return true;
            }
        }
        false
    }

    /// Remove every clause whose head unifies with `head`. Always succeeds
    /// and registers the predicate so later calls fail instead of raising.
    pub fn retractall(&mut self, head: &Term, bindings: &Bindings) {
        let head = bindings.resolve(head);
        let Some(key) = head.functor() else {
            return;
        };
        // Registration happens even when nothing matched.
        let fresh_heads: Vec<Term> = self
            .entry(key.clone())
            .iter()
            .map(|clause| clause.head.clone())
            .collect();
        let mut keep = Vec::with_capacity(fresh_heads.len());
        for stored_head in &fresh_heads {
            let refreshed = self.refresh(stored_head);
            let mut attempt = bindings.clone();
            keep.push(!crate::unify::unify(&head, &refreshed, &mut attempt));
        }
        if let Some(clauses) = self.database.get_mut(&key) {
            let mut keep_iter = keep.into_iter();
            clauses.retain(|_| keep_iter.next().unwrap_or(true));
        }
    }

    /// Clone a term with all its variables renamed fresh.
    pub fn refresh(&mut self, term: &Term) -> Term {
        let mut mapping = HashMap::new();
        self.refresh_inner(term, &mut mapping)
    }

    /// Rename a clause apart before resolution.
    pub fn refresh_clause(&mut self, clause: &Clause) -> Clause {
        let (head, body) = self.refresh_clause_terms(clause);
        Clause { head, body }
    }

    fn refresh_clause_terms(&mut self, clause: &Clause) -> (Term, Term) {
        let mut mapping = HashMap::new();
        let head = self.refresh_inner(&clause.head, &mut mapping);
        let body = self.refresh_inner(&clause.body, &mut mapping);
        (head, body)
    }

    fn refresh_inner(&mut self, term: &Term, mapping: &mut HashMap<Symbol, Symbol>) -> Term {
        match term {
            Term::Var(var) if var.as_ref() == "_" => term.clone(),
            Term::Var(var) => {
                let renamed = mapping.entry(*var).or_insert_with(|| {
                    self.fresh_counter += 1;
                    Symbol::new(format!("_G{}", self.fresh_counter))
                });
                Term::Var(*renamed)
            }
            Term::Int(_) | Term::Float(_) | Term::Atom(_) | Term::Str(_) => term.clone(),
            Term::Compound(functor, args) => Term::Compound(
                *functor,
                args.iter()
                    .map(|arg| self.refresh_inner(arg, mapping))
                    .collect(),
            ),
        }
    }

    /// A fresh variable, for machine-introduced bindings.
    pub fn fresh_var(&mut self) -> Term {
        self.fresh_counter += 1;
        Term::Var(Symbol::new(format!("_G{}", self.fresh_counter)))
    }

    /// A cut barrier identifier no other frame holds. Ids start at 1;
    /// the top-level goal runs under barrier 0.
    pub fn next_barrier(&mut self) -> usize {
        self.barrier_counter += 1;
        self.barrier_counter
    }

    // --- streams ---

    /// Open a term stream over in-memory source text.
    pub fn open_stream(&mut self, source: &str, src: SrcId) -> Result<usize, Vec<ParseError>> {
        let stream = TermStream::new(source, src)?;
        self.streams.push(Some(stream));
        Ok(self.streams.len() - 1)
    }

    /// Read the next term from a stream, None at end of input.
    pub fn read_stream(&mut self, id: usize) -> Result<Option<Term>, Vec<ParseError>> {
        match self.streams.get_mut(id) {
            Some(Some(stream)) => stream.next_term(),
            _ => Ok(None),
        }
    }

    pub fn close_stream(&mut self, id: usize) {
        if let Some(slot) = self.streams.get_mut(id) {
            *slot = None;
        }
    }

    // --- loading ---

    /// Load clauses and run directives from source text.
    /// A failing or raising directive aborts the load.
    pub fn consult_source(&mut self, source: &str, src: SrcId) -> Result<(), EngineError> {
        let mut stream = TermStream::new(source, src)?;
        while let Some(term) = stream.next_term()? {
            self.load_term(&term)?;
        }
        Ok(())
    }

    /// Consult a file from disk.
    pub fn consult_file(&mut self, path: &Path) -> Result<(), EngineError> {
        tracing::debug!(path = %path.display(), "consult file");
        let source = std::fs::read_to_string(path)?;
        self.consult_source(&source, SrcId::from_path(path))
    }

    fn load_term(&mut self, term: &Term) -> Result<(), EngineError> {
        let directive = match term {
            Term::Compound(functor, args)
                if args.len() == 1
                    && (functor.as_ref() == ":-" || functor.as_ref() == "?-") =>
            {
                Some(&args[0])
            }
            _ => None,
        };
        match directive {
            Some(goal) => match self.solve_first(goal).map_err(EngineError::Exception)? {
                Some(_) => Ok(()),
                None => Err(EngineError::DirectiveFailed(goal.clone())),
            },
            None => self.assertz(term).map_err(EngineError::Exception),
        }
    }

    /// Find the first solution of a goal, if any.
    pub fn solve_first(&mut self, goal: &Term) -> Result<Option<Bindings>, Term> {
        let mut solution = None;
        let mut bindings = Bindings::new();
        solve::solve(self, goal, &mut bindings, 0, 0, &mut |_, bindings| {
            solution = Some(bindings.clone());
            Ok(Flow::Stop)
        })?;
        Ok(solution)
    }

    /// Collect bindings for every solution of a goal, in discovery order,
    /// up to an optional limit.
    pub fn solve_all(
        &mut self,
        goal: &Term,
        limit: Option<usize>,
    ) -> Result<Vec<Bindings>, Term> {
        let mut solutions = Vec::new();
        let mut bindings = Bindings::new();
        solve::solve(self, goal, &mut bindings, 0, 0, &mut |_, bindings| {
            solutions.push(bindings.clone());
            if limit.is_some_and(|limit| solutions.len() >= limit) {
                Ok(Flow::Stop)
            } else {
                Ok(Flow::Continue)
            }
        })?;
        Ok(solutions)
    }
}

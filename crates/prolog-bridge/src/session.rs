//! Session lifecycle and the public operation surface
//!
//! A [`Session`] owns one engine instance and the error state around it.
//! Every operation converts failures into its designated empty result
//! (false, empty list, None) and records the message in the last-error
//! slot; nothing here panics or propagates an engine fault to the host.
//! A failed query is indistinguishable from a query with zero solutions
//! unless the caller inspects [`Session::last_error`].
//!
//! The session is single-threaded by contract: callers on multi-threaded
//! hosts must serialize access externally.

use std::path::PathBuf;

use prolog_engine::Machine;
use prolog_parser::{parse_term, ParseError, SrcId, Symbol, Term};

use crate::bootstrap;
use crate::codec;
use crate::config::{Disposition, InitOptions};
use crate::error::BridgeError;
use crate::goal;
use crate::value::{HostValue, Solution};

#[derive(Default)]
pub struct Session {
    machine: Option<Machine>,
    last_error: String,
    on_error: Disposition,
    on_warning: Disposition,
    /// Path alias → directory, applied to `alias://` consult paths.
    search_paths: Vec<(String, String)>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Start the engine. Idempotent: an already initialized session
    /// returns true without touching the engine. Any failing step leaves
    /// the session uninitialized with the error recorded.
    pub fn initialize(&mut self, options: InitOptions) -> bool {
        if self.machine.is_some() {
            return true;
        }
        self.on_error = options.on_error;
        self.on_warning = options.on_warning;
        self.search_paths = options.file_search_paths.clone();
        if !options.prolog_flags.is_empty() || !options.extra_args.is_empty() {
            self.warn("flags and extra arguments are recorded but not applied by the embedded engine");
        }
        match boot(&options) {
            Ok(machine) => {
                if !options.quiet {
                    tracing::info!(
                        version = env!("CARGO_PKG_VERSION"),
                        "embedded Prolog engine started"
                    );
                }
                tracing::debug!(depth_limit = machine.depth_limit(), "engine initialized");
                self.machine = Some(machine);
                true
            }
            Err(err) => {
                self.report("Initialization error", &err);
                false
            }
        }
    }

    /// Shut the engine down. Idempotent and safe on a never-initialized
    /// session. The last error is kept until overwritten.
    pub fn cleanup(&mut self) {
        if self.machine.take().is_some() {
            tracing::debug!("engine shut down");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.machine.is_some()
    }

    /// Most recently recorded error text, empty if nothing failed yet.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    // --- queries ---

    /// True iff the goal has at least one solution.
    pub fn query(&mut self, goal_or_name: &str, args: &[HostValue]) -> bool {
        match self.try_query(goal_or_name, args) {
            Ok(found) => found,
            Err(err) => {
                self.report("Query error", &err);
                false
            }
        }
    }

    /// Every solution, in engine enumeration order. Each element is a
    /// name → value mapping when all arguments were variable names,
    /// otherwise the whole solved goal decoded.
    pub fn query_all(&mut self, goal_or_name: &str, args: &[HostValue]) -> Vec<Solution> {
        match self.try_query_all(goal_or_name, args) {
            Ok(solutions) => solutions,
            Err(err) => {
                self.report("Query error", &err);
                Vec::new()
            }
        }
    }

    /// The first solution, or None when the goal fails or errors.
    pub fn query_one(&mut self, goal_or_name: &str, args: &[HostValue]) -> Option<Solution> {
        match self.try_query_one(goal_or_name, args) {
            Ok(solution) => solution,
            Err(err) => {
                self.report("Query error", &err);
                None
            }
        }
    }

    // --- knowledge base mutation ---

    /// Parse and assert one fact or rule at the end of its predicate.
    pub fn add_fact(&mut self, text: &str) -> bool {
        match self.run_wrapped("assertz", text, "fact") {
            Ok(added) => added,
            Err(err) => {
                self.report("Assert error", &err);
                false
            }
        }
    }

    /// Retract the first clause unifying with the pattern. False when
    /// nothing matched; that is a quiet failure, not an error.
    pub fn retract_fact(&mut self, text: &str) -> bool {
        match self.run_wrapped("retract", text, "fact") {
            Ok(removed) => removed,
            Err(err) => {
                self.report("Retract error", &err);
                false
            }
        }
    }

    /// Retract every clause whose head unifies with the pattern. True
    /// whenever the pattern parses, even if zero clauses matched.
    pub fn retract_all(&mut self, pattern: &str) -> bool {
        match self.run_wrapped("retractall", pattern, "pattern") {
            Ok(done) => done,
            Err(err) => {
                self.report("Retract error", &err);
                false
            }
        }
    }

    /// Load a program from a file, accumulating into the knowledge base.
    /// `alias://rest` paths resolve through the configured search paths.
    pub fn consult_file(&mut self, path: &str) -> bool {
        let resolved = self.resolve_path(path);
        let result = (|| {
            if resolved.as_os_str().is_empty() {
                return Err(BridgeError::EmptyInput("path"));
            }
            let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
            machine
                .consult_file(&resolved)
                .map_err(|err| BridgeError::Engine(err.to_string()))
        })();
        match result {
            Ok(()) => true,
            Err(err) => {
                self.report("Consult error", &err);
                false
            }
        }
    }

    /// Load a whole program from a string via the bootstrap loader.
    pub fn consult_string(&mut self, code: &str) -> bool {
        match self.try_consult_string(code) {
            Ok(()) => true,
            Err(err) => {
                self.report("Consult error", &err);
                false
            }
        }
    }

    // --- structured calls ---

    /// Call `name(args...)` with each argument encoded as a term.
    pub fn call_predicate(&mut self, name: &str, args: &[HostValue]) -> bool {
        match self.try_call(name, args, false) {
            Ok((found, _)) => found,
            Err(err) => {
                self.report("Call error", &err);
                false
            }
        }
    }

    /// Call `name(args..., Result)` and decode the trailing result
    /// argument. Null when the call fails.
    pub fn call_function(&mut self, name: &str, args: &[HostValue]) -> HostValue {
        match self.try_call(name, args, true) {
            Ok((_, result)) => result,
            Err(err) => {
                self.report("Call error", &err);
                HostValue::Null
            }
        }
    }

    // --- introspection ---

    /// Whether a predicate of the given name and arity is callable,
    /// either as a builtin or from the knowledge base.
    pub fn predicate_exists(&mut self, name: &str, arity: usize) -> bool {
        let Some(machine) = self.machine.as_ref() else {
            self.report("Introspection error", &BridgeError::NotInitialized);
            return false;
        };
        if name.is_empty() {
            return false;
        }
        prolog_engine::is_builtin(name, arity)
            || machine.has_predicate(&(Symbol::new(name.to_string()), arity))
    }

    /// Every known predicate as a `name/arity` compound, in first-seen
    /// order.
    pub fn list_predicates(&mut self) -> Vec<HostValue> {
        let Some(machine) = self.machine.as_ref() else {
            self.report("Introspection error", &BridgeError::NotInitialized);
            return Vec::new();
        };
        machine
            .predicate_keys()
            .map(|(name, arity)| {
                HostValue::compound(
                    "/",
                    vec![
                        HostValue::String(name.to_string()),
                        HostValue::Int(*arity as i64),
                    ],
                )
            })
            .collect()
    }

    // --- internals ---

    fn try_query(&mut self, goal_or_name: &str, args: &[HostValue]) -> Result<bool, BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        let goal = parse_goal_text(&goal::build_query(goal_or_name, args))?;
        machine
            .solve_first(&goal)
            .map(|solution| solution.is_some())
            .map_err(|thrown| BridgeError::Engine(thrown.to_string()))
    }

    fn try_query_all(
        &mut self,
        goal_or_name: &str,
        args: &[HostValue],
    ) -> Result<Vec<Solution>, BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        let names = goal::extraction_names(args);
        let goal = parse_goal_text(&goal::build_query(goal_or_name, args))?;

        // The engine's own solution loop: collect a solved copy of the
        // goal per solution, in enumeration order.
        let collected = machine.fresh_var();
        let findall = Term::compound("findall", vec![goal.clone(), goal, collected.clone()]);
        let Some(bindings) = machine
            .solve_first(&findall)
            .map_err(|thrown| BridgeError::Engine(thrown.to_string()))?
        else {
            return Ok(Vec::new());
        };

        let list = bindings.resolve(&collected);
        let elements = list.list_elements().unwrap_or_default();
        Ok(elements
            .into_iter()
            .map(|element| match &names {
                Some(names) => Solution::Bindings(codec::extract_bindings(element, names)),
                None => Solution::Term(codec::decode(element)),
            })
            .collect())
    }

    fn try_query_one(
        &mut self,
        goal_or_name: &str,
        args: &[HostValue],
    ) -> Result<Option<Solution>, BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        let names = goal::extraction_names(args);
        let goal = parse_goal_text(&goal::build_query(goal_or_name, args))?;
        let solution = machine
            .solve_first(&goal)
            .map_err(|thrown| BridgeError::Engine(thrown.to_string()))?;
        Ok(solution.map(|bindings| {
            let solved = bindings.resolve(&goal);
            match &names {
                Some(names) => Solution::Bindings(codec::extract_bindings(&solved, names)),
                None => Solution::Term(codec::decode(&solved)),
            }
        }))
    }

    /// Parse `text` and run `builtin(text)` once.
    fn run_wrapped(
        &mut self,
        builtin: &str,
        text: &str,
        what: &'static str,
    ) -> Result<bool, BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        let stripped = goal::strip_terminator(text);
        if stripped.is_empty() {
            return Err(BridgeError::EmptyInput(what));
        }
        let term = parse_goal_text(stripped)?;
        let wrapped = Term::compound(builtin, vec![term]);
        machine
            .solve_first(&wrapped)
            .map(|solution| solution.is_some())
            .map_err(|thrown| BridgeError::Engine(thrown.to_string()))
    }

    fn try_consult_string(&mut self, code: &str) -> Result<(), BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        if code.trim().is_empty() {
            return Err(BridgeError::EmptyInput("program"));
        }
        let load = Term::compound(
            "load_program_from_string",
            vec![Term::Str(code.to_string())],
        );
        match machine.solve_first(&load) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(BridgeError::Engine("program failed to load".to_string())),
            Err(thrown) => Err(BridgeError::Engine(thrown.to_string())),
        }
    }

    fn try_call(
        &mut self,
        name: &str,
        args: &[HostValue],
        with_result: bool,
    ) -> Result<(bool, HostValue), BridgeError> {
        let machine = self.machine.as_mut().ok_or(BridgeError::NotInitialized)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(BridgeError::EmptyInput("predicate name"));
        }
        let mut encoded: Vec<Term> = args.iter().map(codec::encode).collect();
        let result_var = with_result.then(|| machine.fresh_var());
        if let Some(var) = &result_var {
            encoded.push(var.clone());
        }
        let goal = Term::compound(name, encoded);
        let solution = machine
            .solve_first(&goal)
            .map_err(|thrown| BridgeError::Engine(thrown.to_string()))?;
        match solution {
            Some(bindings) => {
                let result = match &result_var {
                    Some(var) => codec::decode(&bindings.resolve(var)),
                    None => HostValue::Null,
                };
                Ok((true, result))
            }
            None => Ok((false, HostValue::Null)),
        }
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = path.trim();
        if let Some((alias, rest)) = path.split_once("://") {
            for (name, directory) in &self.search_paths {
                if name == alias {
                    return PathBuf::from(directory).join(rest);
                }
            }
        }
        PathBuf::from(path)
    }

    fn report(&mut self, context: &str, err: &BridgeError) {
        let message = format!("{}: {}", context, err);
        match self.on_error {
            Disposition::Print => tracing::error!("{}", message),
            Disposition::Halt => tracing::error!(fatal = true, "{}", message),
            Disposition::Status => {}
        }
        self.last_error = message;
    }

    fn warn(&mut self, message: &str) {
        match self.on_warning {
            Disposition::Print => tracing::warn!("{}", message),
            Disposition::Halt => tracing::warn!(fatal = true, "{}", message),
            Disposition::Status => {}
        }
    }
}

fn parse_goal_text(text: &str) -> Result<Term, BridgeError> {
    parse_term(text, SrcId::goal()).map_err(|errors| BridgeError::Parse(render_errors(&errors)))
}

fn render_errors(errors: &[ParseError]) -> String {
    let rendered: Vec<String> = errors.iter().map(|err| err.to_string()).collect();
    rendered.join("; ")
}

/// Build and configure a fresh engine per the options. Consult order:
/// init file, script file, startup goals, bootstrap clauses, toplevel
/// goal. The first failure aborts the boot.
fn boot(options: &InitOptions) -> Result<Machine, BridgeError> {
    let mut machine = Machine::new();
    machine.set_depth_limit(options.depth_limit());

    for path in [&options.init_file, &options.script_file].into_iter().flatten() {
        machine
            .consult_file(path)
            .map_err(|err| BridgeError::Engine(err.to_string()))?;
    }
    for goal_text in &options.startup_goals {
        run_boot_goal(&mut machine, goal_text)?;
    }
    bootstrap::install(&mut machine).map_err(|err| BridgeError::Bootstrap(err.to_string()))?;
    if let Some(goal_text) = &options.toplevel_goal {
        run_boot_goal(&mut machine, goal_text)?;
    }
    Ok(machine)
}

fn run_boot_goal(machine: &mut Machine, goal_text: &str) -> Result<(), BridgeError> {
    let goal = parse_goal_text(goal::strip_terminator(goal_text))?;
    match machine.solve_first(&goal) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(BridgeError::Engine(format!(
            "startup goal failed: {}",
            goal_text
        ))),
        Err(thrown) => Err(BridgeError::Engine(thrown.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new();
        assert!(session.initialize(InitOptions::default()));
        session
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut session = Session::new();
        assert!(session.initialize(InitOptions::default()));
        assert!(session.initialize(InitOptions::default()));
        assert!(session.is_initialized());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut session = Session::new();
        session.cleanup();
        assert!(!session.is_initialized());
        session.initialize(InitOptions::default());
        session.cleanup();
        session.cleanup();
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_operations_before_initialize_return_empty() {
        let mut session = Session::new();
        assert!(!session.query("true", &[]));
        assert!(session.query_all("true", &[]).is_empty());
        assert!(session.query_one("true", &[]).is_none());
        assert!(!session.add_fact("p(1)"));
        assert!(!session.consult_string("p(1)."));
        assert!(session.list_predicates().is_empty());
        assert!(!session.last_error().is_empty());
    }

    #[test]
    fn test_query_with_goal_string() {
        let mut session = session();
        assert!(session.add_fact("parent(tom, bob)"));
        assert!(session.query("parent(tom, bob)", &[]));
        assert!(!session.query("parent(bob, tom)", &[]));
    }

    #[test]
    fn test_query_with_name_and_args() {
        let mut session = session();
        session.add_fact("parent(tom, bob)");
        let args = vec![HostValue::string("tom"), HostValue::string("X")];
        assert!(session.query("parent", &args));
    }

    #[test]
    fn test_startup_goal_runs_before_use() {
        let mut session = Session::new();
        let options = InitOptions {
            startup_goals: vec!["assertz(booted(yes))".to_string()],
            ..InitOptions::default()
        };
        assert!(session.initialize(options));
        assert!(session.query("booted(yes)", &[]));
    }

    #[test]
    fn test_failing_startup_goal_aborts_initialize() {
        let mut session = Session::new();
        let options = InitOptions {
            startup_goals: vec!["fail".to_string()],
            ..InitOptions::default()
        };
        assert!(!session.initialize(options));
        assert!(!session.is_initialized());
        assert!(session.last_error().contains("startup goal failed"));
    }

    #[test]
    fn test_missing_init_file_aborts_initialize() {
        let mut session = Session::new();
        let options = InitOptions {
            init_file: Some(PathBuf::from("/no/such/init.pl")),
            ..InitOptions::default()
        };
        assert!(!session.initialize(options));
        assert!(!session.is_initialized());
    }

    #[test]
    fn test_status_disposition_records_quietly() {
        let mut session = Session::new();
        let options = InitOptions {
            on_error: Disposition::Status,
            ..InitOptions::default()
        };
        session.initialize(options);
        assert!(!session.query("this is ( broken", &[]));
        assert!(!session.last_error().is_empty());
    }

    #[test]
    fn test_call_function_decodes_trailing_result() {
        let mut session = session();
        assert!(session.consult_string("double(X, Y) :- Y is X * 2."));
        let result = session.call_function("double", &[HostValue::Int(21)]);
        assert_eq!(result, HostValue::Int(42));
    }

    #[test]
    fn test_call_function_failure_is_null() {
        let mut session = session();
        session.consult_string("double(X, Y) :- Y is X * 2.");
        let result = session.call_function("double", &[HostValue::string("nan")]);
        assert_eq!(result, HostValue::Null);
        assert!(session.last_error().contains("error"));
    }

    #[test]
    fn test_call_predicate_with_encoded_args() {
        let mut session = session();
        assert!(session.call_predicate("assertz", &[HostValue::compound(
            "likes",
            vec![HostValue::string("mary"), HostValue::string("wine")],
        )]));
        assert!(session.query("likes(mary, wine)", &[]));
    }

    #[test]
    fn test_predicate_exists() {
        let mut session = session();
        assert!(session.predicate_exists("findall", 3));
        assert!(session.predicate_exists("member", 2));
        assert!(!session.predicate_exists("no_such", 1));
        session.add_fact("custom(1)");
        assert!(session.predicate_exists("custom", 1));
        assert!(!session.predicate_exists("custom", 2));
    }

    #[test]
    fn test_list_predicates_returns_indicators() {
        let mut session = session();
        session.add_fact("solo(1)");
        let listed = session.list_predicates();
        assert!(listed.contains(&HostValue::compound(
            "/",
            vec![HostValue::string("solo"), HostValue::Int(1)],
        )));
    }
}

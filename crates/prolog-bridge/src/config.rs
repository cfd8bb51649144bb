//! Session configuration
//!
//! Every option is independent and defaulted, so `InitOptions::default()`
//! is a complete working configuration. Hosts passing a dynamic key/value
//! map use [`InitOptions::from_pairs`].

use std::path::PathBuf;

use crate::value::HostValue;

/// What to do with an error or warning besides recording it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Record and log through the diagnostic channel.
    #[default]
    Print,
    /// Record and log with a fatal marker. Halting the host process is not
    /// actually possible from this layer.
    Halt,
    /// Record only, log nothing.
    Status,
}

impl Disposition {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Disposition::Print),
            "halt" => Some(Disposition::Halt),
            "status" => Some(Disposition::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitOptions {
    /// Engine install directory. Informational for the embedded engine.
    pub home: Option<PathBuf>,
    /// Suppress the startup banner.
    pub quiet: bool,
    pub optimised: bool,
    pub traditional: bool,
    pub threads: bool,
    pub packs: bool,
    pub on_error: Disposition,
    pub on_warning: Disposition,
    /// Free-form size string such as "512m" or "4g"; bounds resolution depth.
    pub stack_limit: Option<String>,
    pub table_space: Option<String>,
    pub shared_table_space: Option<String>,
    /// Consulted before anything else runs.
    pub init_file: Option<PathBuf>,
    /// Consulted after the init file.
    pub script_file: Option<PathBuf>,
    /// Goals run after files load; each must succeed.
    pub startup_goals: Vec<String>,
    /// Goal run last, after bootstrap.
    pub toplevel_goal: Option<String>,
    pub prolog_flags: Vec<(String, String)>,
    pub file_search_paths: Vec<(String, String)>,
    /// Pass-through arguments, kept for compatibility and logged only.
    pub extra_args: Vec<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        InitOptions {
            home: None,
            quiet: true,
            optimised: false,
            traditional: false,
            threads: true,
            packs: true,
            on_error: Disposition::Print,
            on_warning: Disposition::Print,
            stack_limit: None,
            table_space: None,
            shared_table_space: None,
            init_file: None,
            script_file: None,
            startup_goals: Vec::new(),
            toplevel_goal: None,
            prolog_flags: Vec::new(),
            file_search_paths: Vec::new(),
            extra_args: Vec::new(),
        }
    }
}

impl InitOptions {
    /// Build options from a dynamic key/value map. Unknown keys and badly
    /// typed values are skipped with a warning rather than failing init.
    pub fn from_pairs(pairs: &[(String, HostValue)]) -> InitOptions {
        let mut options = InitOptions::default();
        for (key, value) in pairs {
            match key.as_str() {
                "home" => options.home = as_string(value).map(PathBuf::from),
                "quiet" => set_bool(&mut options.quiet, key, value),
                "optimised" | "optimized" => set_bool(&mut options.optimised, key, value),
                "traditional" => set_bool(&mut options.traditional, key, value),
                "threads" => set_bool(&mut options.threads, key, value),
                "packs" => set_bool(&mut options.packs, key, value),
                "on_error" => set_disposition(&mut options.on_error, key, value),
                "on_warning" => set_disposition(&mut options.on_warning, key, value),
                "stack_limit" => options.stack_limit = as_string(value),
                "table_space" => options.table_space = as_string(value),
                "shared_table_space" => options.shared_table_space = as_string(value),
                "init_file" => options.init_file = as_string(value).map(PathBuf::from),
                "script_file" => options.script_file = as_string(value).map(PathBuf::from),
                "toplevel_goal" => options.toplevel_goal = as_string(value),
                "goal" | "goals" | "startup_goals" => match value {
                    HostValue::String(goal) => options.startup_goals.push(goal.clone()),
                    HostValue::List(goals) => {
                        for goal in goals {
                            if let Some(goal) = as_string(goal) {
                                options.startup_goals.push(goal);
                            }
                        }
                    }
                    _ => tracing::warn!(key = %key, "expected a string or list of strings"),
                },
                "flags" | "prolog_flags" => {
                    collect_pairs(&mut options.prolog_flags, key, value);
                }
                "file_search_paths" => {
                    collect_pairs(&mut options.file_search_paths, key, value);
                }
                "args" | "extra_args" => match value {
                    HostValue::List(args) => {
                        options.extra_args.extend(args.iter().filter_map(as_string));
                    }
                    _ => tracing::warn!(key = %key, "expected a list of strings"),
                },
                _ => tracing::warn!(key = %key, "unknown option, ignored"),
            }
        }
        options
    }

    /// Resolution depth bound derived from the stack limit, defaulting to
    /// the engine's built-in limit. One depth frame is costed at 1 KiB.
    pub fn depth_limit(&self) -> usize {
        self.stack_limit
            .as_deref()
            .and_then(parse_size)
            .map(|bytes| ((bytes / 1024) as usize).clamp(64, 1 << 24))
            .unwrap_or(prolog_engine::DEFAULT_DEPTH_LIMIT)
    }
}

fn as_string(value: &HostValue) -> Option<String> {
    match value {
        HostValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn set_bool(slot: &mut bool, key: &str, value: &HostValue) {
    match value {
        HostValue::Bool(b) => *slot = *b,
        _ => tracing::warn!(key = %key, "expected a boolean"),
    }
}

fn set_disposition(slot: &mut Disposition, key: &str, value: &HostValue) {
    match value {
        HostValue::String(name) => match Disposition::from_name(name) {
            Some(disposition) => *slot = disposition,
            None => tracing::warn!(key = %key, value = %name, "expected print, halt or status"),
        },
        _ => tracing::warn!(key = %key, "expected a string"),
    }
}

fn collect_pairs(slot: &mut Vec<(String, String)>, key: &str, value: &HostValue) {
    match value {
        HostValue::List(entries) => {
            for entry in entries {
                if let HostValue::Compound { functor, args } = entry {
                    if args.len() == 1 {
                        if let Some(text) = as_string(&args[0]) {
                            slot.push((functor.clone(), text));
                            continue;
                        }
                    }
                }
                tracing::warn!(key = %key, "expected name(value) entries");
            }
        }
        _ => tracing::warn!(key = %key, "expected a list of name(value) entries"),
    }
}

/// Parse a free-form size string: a number with an optional k/m/g suffix
/// (binary multiples), case-insensitive, optional trailing "b".
pub fn parse_size(text: &str) -> Option<u64> {
    let lowered = text.trim().to_ascii_lowercase();
    let lowered = lowered.strip_suffix('b').unwrap_or(&lowered);
    let (digits, multiplier) = match lowered.chars().last()? {
        'k' => (&lowered[..lowered.len() - 1], 1u64 << 10),
        'm' => (&lowered[..lowered.len() - 1], 1u64 << 20),
        'g' => (&lowered[..lowered.len() - 1], 1u64 << 30),
        _ => (lowered, 1),
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = InitOptions::default();
        assert!(options.quiet);
        assert!(!options.optimised);
        assert!(options.threads);
        assert_eq!(options.on_error, Disposition::Print);
        assert_eq!(options.depth_limit(), prolog_engine::DEFAULT_DEPTH_LIMIT);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512"), Some(512));
        assert_eq!(parse_size("64k"), Some(64 * 1024));
        assert_eq!(parse_size("512M"), Some(512 << 20));
        assert_eq!(parse_size("4gb"), Some(4 << 30));
        assert_eq!(parse_size("oops"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn test_depth_limit_from_stack_limit() {
        let options = InitOptions {
            stack_limit: Some("1m".to_string()),
            ..InitOptions::default()
        };
        assert_eq!(options.depth_limit(), 1024);
    }

    #[test]
    fn test_from_pairs() {
        let pairs = vec![
            ("quiet".to_string(), HostValue::Bool(false)),
            ("on_error".to_string(), HostValue::string("status")),
            (
                "goals".to_string(),
                HostValue::List(vec![HostValue::string("assertz(booted(yes))")]),
            ),
            ("mystery_key".to_string(), HostValue::Int(9)),
        ];
        let options = InitOptions::from_pairs(&pairs);
        assert!(!options.quiet);
        assert_eq!(options.on_error, Disposition::Status);
        assert_eq!(options.startup_goals, vec!["assertz(booted(yes))"]);
    }

    #[test]
    fn test_from_pairs_flag_entries() {
        let pairs = vec![(
            "flags".to_string(),
            HostValue::List(vec![HostValue::compound(
                "double_quotes",
                vec![HostValue::string("codes")],
            )]),
        )];
        let options = InitOptions::from_pairs(&pairs);
        assert_eq!(
            options.prolog_flags,
            vec![("double_quotes".to_string(), "codes".to_string())]
        );
    }
}

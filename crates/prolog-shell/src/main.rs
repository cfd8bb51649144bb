//! Interactive Prolog shell over the bridge session
//!
//! Usage: prolog-shell [options] [source_files...]
//!
//! Commands:
//!   :help       - Show help
//!   :quit       - Exit (halt. works too)
//!   :list       - List known predicates
//!   :consult F  - Load a source file
//!   :reset      - Start over with a fresh engine

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing_subscriber::EnvFilter;

use prolog_bridge::{InitOptions, Session, Solution};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = "?- ";
const CONTINUATION: &str = "|  ";

struct Args {
    source_files: Vec<PathBuf>,
    goals: Vec<String>,
    interactive: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args {
        source_files: Vec::new(),
        goals: Vec::new(),
        interactive: true,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-g" | "--goal" => {
                let goal = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow!("-g requires a goal argument"))?;
                parsed.goals.push(goal.clone());
                i += 2;
            }
            "-n" | "--non-interactive" => {
                parsed.interactive = false;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                println!("prolog-shell v{}", VERSION);
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow!("unknown option: {}", flag));
            }
            path => {
                parsed.source_files.push(PathBuf::from(path));
                i += 1;
            }
        }
    }
    Ok(parsed)
}

fn print_usage() {
    println!("prolog-shell v{} - interactive Prolog shell", VERSION);
    println!();
    println!("Usage: prolog-shell [OPTIONS] [source_files...]");
    println!();
    println!("Options:");
    println!("  -g, --goal <goal>      Run a goal after loading files (repeatable)");
    println!("  -n, --non-interactive  Exit after files and goals instead of prompting");
    println!("  -h, --help             Show help and exit");
    println!("  -v, --version          Show version and exit");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let mut session = Session::new();
    if !session.initialize(InitOptions::default()) {
        return Err(anyhow!("{}", session.last_error()));
    }

    for path in &args.source_files {
        let shown = path.display().to_string();
        if session.consult_file(&shown) {
            println!("% {} loaded", shown);
        } else {
            eprintln!("Error: {}", session.last_error());
        }
    }
    for goal in &args.goals {
        run_goal(&mut session, goal);
    }
    if !args.interactive {
        return Ok(());
    }

    println!("prolog-shell v{}", VERSION);
    println!("Type :help for help, :quit or halt. to exit\n");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;
    let history_path = history_path();
    if let Some(path) = &history_path {
        let _ = rl.load_history(path);
    }

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { PROMPT } else { CONTINUATION };
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim_end();
                if buffer.is_empty() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(command) = line.trim().strip_prefix(':') {
                        if !handle_command(&mut session, command) {
                            break;
                        }
                        continue;
                    }
                }
                buffer.push_str(line);
                if buffer.trim_end().ends_with('.') {
                    let input = std::mem::take(&mut buffer);
                    let input = input.trim();
                    if input == "halt." {
                        break;
                    }
                    run_goal(&mut session, input);
                } else {
                    buffer.push('\n');
                }
            }
            Err(ReadlineError::Interrupted) => {
                if buffer.is_empty() {
                    println!("Use :quit or halt. to exit");
                } else {
                    buffer.clear();
                    println!("^C");
                }
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
    session.cleanup();
    Ok(())
}

/// Handle a meta-command. Returns false when the shell should exit.
fn handle_command(session: &mut Session, command: &str) -> bool {
    let mut words = command.split_whitespace();
    match words.next() {
        Some("help") => {
            println!(":help            show this help");
            println!(":quit            exit the shell");
            println!(":list            list known predicates");
            println!(":consult <file>  load a source file");
            println!(":reset           start over with a fresh engine");
            println!();
            println!("Anything else is a goal; finish it with a period.");
        }
        Some("quit") | Some("exit") => return false,
        Some("list") => {
            for indicator in session.list_predicates() {
                println!("{}", indicator);
            }
        }
        Some("consult") => match words.next() {
            Some(path) => {
                if session.consult_file(path) {
                    println!("% {} loaded", path);
                } else {
                    eprintln!("Error: {}", session.last_error());
                }
            }
            None => eprintln!("Usage: :consult <file>"),
        },
        Some("reset") => {
            session.cleanup();
            if session.initialize(InitOptions::default()) {
                println!("Engine reset.");
            } else {
                eprintln!("Error: {}", session.last_error());
            }
        }
        Some(other) => eprintln!("Unknown command :{} (try :help)", other),
        None => {}
    }
    true
}

fn run_goal(session: &mut Session, goal: &str) {
    let error_before = session.last_error().to_string();
    let solutions = session.query_all(goal, &[]);
    if solutions.is_empty() {
        if session.last_error() == error_before {
            println!("false.");
        } else {
            eprintln!("Error: {}", session.last_error());
        }
        return;
    }
    for solution in &solutions {
        match solution {
            Solution::Term(value) => println!("{}", value),
            Solution::Bindings(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect();
                println!("{}", rendered.join(", "));
            }
        }
    }
    println!("true.");
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".prolog_shell_history"))
}

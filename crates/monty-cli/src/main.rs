//! Command-line host for monty projects: reads every file with a given
//! extension from a directory, registers them with the interpreter, and
//! runs the entry file.
//!
//! This binary's own design is deliberately undecorated — a thin
//! consumer of `monty`'s public API, swappable without touching the
//! interpreter core.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use monty::{BuiltinRegistry, Interpreter};

struct Config {
    project_dir: PathBuf,
    extension: String,
    entry: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Config, String> {
    let mut project_dir = None;
    let mut extension = "mt".to_string();
    let mut entry = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--ext" => {
                extension = iter.next().ok_or("--ext requires a value")?.clone();
            }
            "--entry" => {
                entry = Some(iter.next().ok_or("--entry requires a value")?.clone());
            }
            other if project_dir.is_none() => {
                project_dir = Some(PathBuf::from(other));
            }
            other => return Err(format!("unexpected argument '{other}'")),
        }
    }

    let project_dir = project_dir.ok_or("usage: monty <project-dir> [--ext <ext>] [--entry <file>]")?;
    Ok(Config { project_dir, extension, entry })
}

/// Collects every file directly under `dir` whose extension matches
/// `extension`, sorted by file name so the choice of default entry file is
/// deterministic.
fn collect_source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir).map_err(|err| format!("could not read directory '{}': {err}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("could not read directory entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_key(path: &Path) -> String {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string()
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let files = match collect_source_files(&config.project_dir, &config.extension) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            eprintln!("error: no '.{}' files found in '{}'", config.extension, config.project_dir.display());
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = Interpreter::new(BuiltinRegistry::standard());
    let mut keys = Vec::with_capacity(files.len());
    for path in &files {
        let key = file_key(path);
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error: could not read '{}': {err}", path.display());
                return ExitCode::FAILURE;
            }
        };
        interpreter.register_file(&key, &source);
        keys.push(key);
    }

    let entry = config.entry.unwrap_or_else(|| default_entry(&keys, &config.extension));
    if !keys.contains(&entry) {
        eprintln!("error: entry file '{entry}' was not among the registered project files");
        return ExitCode::FAILURE;
    }

    interpreter.run_project(&entry);

    interpreter.diagnostics().flush_to(std::io::stderr()).expect("stderr is writable");

    if interpreter.diagnostics().has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn default_entry(keys: &[String], extension: &str) -> String {
    let conventional = format!("main.{extension}");
    if keys.iter().any(|k| k == &conventional) {
        conventional
    } else {
        keys.first().cloned().unwrap_or_default()
    }
}

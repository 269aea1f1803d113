use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use mapl_eval::Interpreter;

#[derive(Parser)]
#[command(name = "mapl", about = "mapl: a tiny language whose only value is a map")]
struct Cli {
    /// Program file to execute
    file: Option<String>,

    /// Evaluate an expression
    #[arg(short, long)]
    eval: Option<String>,

    /// Bootstrap program replacing the built-in prelude
    #[arg(long)]
    prelude: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let interpreter = match &cli.prelude {
        Some(path) => {
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Error reading prelude {path}: {e}");
                    std::process::exit(1);
                }
            };
            match Interpreter::with_prelude(&source) {
                Ok(interpreter) => interpreter,
                Err(e) => {
                    eprintln!("Error loading prelude {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => Interpreter::new(),
    };

    if let Some(expr) = &cli.eval {
        match interpreter.eval_str(expr) {
            Ok(val) => println!("{val}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(file) = &cli.file {
        match std::fs::read_to_string(file) {
            Ok(content) => {
                if let Err(e) = interpreter.eval_str(&content) {
                    eprintln!("Error in {file}: {e}");
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error reading {file}: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    repl(interpreter);
}

fn repl(interpreter: Interpreter) {
    let mut rl = DefaultEditor::new().expect("failed to create editor");
    let history_path = dirs_path().join("history.txt");
    let _ = rl.load_history(&history_path);

    println!("mapl v0.1.0 — everything is a map");
    println!("Type ,help for help, ,quit to exit\n");

    let mut buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "  ... " } else { "mapl> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !in_multiline {
                    match trimmed {
                        ",quit" | ",exit" | ",q" => break,
                        ",help" | ",h" => {
                            print_help();
                            continue;
                        }
                        ",env" => {
                            print_env(&interpreter);
                            continue;
                        }
                        _ => {}
                    }
                }

                if in_multiline {
                    buffer.push('\n');
                    buffer.push_str(&line);
                } else {
                    buffer = line.clone();
                }

                if !is_balanced(&buffer) {
                    in_multiline = true;
                    continue;
                }

                in_multiline = false;
                let input = buffer.trim().to_string();
                buffer.clear();

                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&input);

                match interpreter.eval_str(&input) {
                    Ok(val) => println!("{val}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_multiline {
                    buffer.clear();
                    in_multiline = false;
                    println!("^C");
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(dirs_path());
    let _ = rl.save_history(&history_path);
    println!("Goodbye!");
}

/// Bracket balance over comment-stripped input; decides multiline continuation.
fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_comment = false;
    for ch in input.chars() {
        match ch {
            '\n' => in_comment = false,
            _ if in_comment => {}
            ';' => in_comment = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

fn print_help() {
    println!("mapl REPL commands:");
    println!("  ,quit / ,q    Exit the REPL");
    println!("  ,help / ,h    Show this help");
    println!("  ,env          Show defined variables");
    println!();
    println!("The only value is a map. Literals:");
    println!("  (f x y)       apply f; a map in operator position looks up a key");
    println!("  [a b c]       sequence: a map keyed 0, 1, 2");
    println!("  {{k: v}}        map literal (`:` and `,` are whitespace)");
    println!("  {{(a b) -> e}}  function literal");
    println!();
    println!("Primitives: def, fn, =, this, next, prn, add, rem");
}

fn print_env(interpreter: &Interpreter) {
    let bindings = interpreter.global_env.bindings.borrow();
    let mut user_bindings: Vec<(String, &mapl_core::Value)> = bindings
        .iter()
        .filter(|(_, v)| !matches!(v, mapl_core::Value::Native(_)))
        .map(|(k, v)| (mapl_core::resolve(*k), v))
        .collect();
    user_bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
    if user_bindings.is_empty() {
        println!("(no user-defined bindings)");
    } else {
        for (name, val) in user_bindings {
            println!("  {name} = {val}");
        }
    }
}

fn dirs_path() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join(".mapl")
}

#[cfg(test)]
mod tests {
    use super::is_balanced;

    #[test]
    fn balance_tracks_all_three_brackets() {
        assert!(is_balanced("(add {1 2} [3])"));
        assert!(!is_balanced("(add {1 2}"));
        assert!(!is_balanced("[1 {2"));
        assert!(is_balanced(""));
    }

    #[test]
    fn balance_ignores_brackets_in_comments() {
        assert!(is_balanced("(f) ; ("));
        assert!(!is_balanced("(f ; )"));
        assert!(is_balanced("(f ; )\n)"));
    }
}

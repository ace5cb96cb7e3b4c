//! The app runner: builtin apps and the installed-app payload
//! mini-language.
//!
//! The core only stores and retrieves payload text; everything here is
//! interpretation. Installed payloads support a `PRINT:` tag, a
//! `SCRIPT:NOTEPAD <filename>` tag, and fall back to echoing the payload
//! verbatim.

use crate::input::Input;
use anyhow::Result;
use rand::Rng;
use std::cmp::Ordering;
use std::io::BufRead;
use vdisk_core::{END_MARK, Session};

/// Parsed payload of an installed app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Print the text after the tag.
    Print(String),
    /// Capture lines interactively and save them to the named file in the
    /// current directory.
    ScriptedCapture(String),
    /// No recognized tag: echo the payload text.
    Raw(String),
}

impl Payload {
    /// Classify a stored payload string.
    pub fn parse(code: &str) -> Self {
        if let Some(text) = code.strip_prefix("PRINT:") {
            Payload::Print(text.trim_end_matches('\n').to_string())
        } else if let Some(rest) = code.strip_prefix("SCRIPT:NOTEPAD") {
            let target = rest.lines().next().unwrap_or("").trim();
            Payload::ScriptedCapture(target.to_string())
        } else {
            Payload::Raw(code.trim_end_matches('\n').to_string())
        }
    }
}

/// Canned package catalog for `install`.
///
/// Returns the record file name and its content.
pub fn package_source(pkg: &str) -> Option<(&'static str, &'static str)> {
    match pkg {
        "hello" => Some((
            "hello.app",
            "APP_NAME=hello\nAPP_DESC=Simple Hello App\nCODE=PRINT:Hello from installed Hello App!\nENDAPP\n",
        )),
        "simple-notepad" => Some((
            "simple-notepad.app",
            "APP_NAME=snotepad\nAPP_DESC=Simple installed notepad (saves to given filename)\nCODE=SCRIPT:NOTEPAD default_note.txt\nENDAPP\n",
        )),
        _ => None,
    }
}

/// Package names `install` understands.
pub const KNOWN_PACKAGES: &[&str] = &["hello", "simple-notepad"];

/// Look up an app by name and run it.
pub fn run_app<R: BufRead>(session: &mut Session, input: &mut Input<R>, name: &str) -> Result<()> {
    let Some(record) = session.apps().lookup(name).cloned() else {
        println!("App '{}' not found.", name);
        return Ok(());
    };

    if record.builtin {
        match record.code.as_str() {
            "BUILTIN_CALC" => run_calculator(input)?,
            "BUILTIN_NOTEPAD" => run_notepad(session, input)?,
            "BUILTIN_NUMBERGAME" => run_number_game(input)?,
            "BUILTIN_ABOUT" => run_about(),
            _ => println!("Builtin app stub."),
        }
        return Ok(());
    }

    match Payload::parse(&record.code) {
        Payload::Print(text) => println!("{}", text),
        Payload::ScriptedCapture(target) => run_scripted_capture(session, input, &target)?,
        Payload::Raw(text) => {
            println!("--- App Output ---");
            println!("{}", text);
            println!("--- End ---");
        }
    }
    Ok(())
}

fn run_calculator<R: BufRead>(input: &mut Input<R>) -> Result<()> {
    println!("Calculator - enter: <num> <op> <num>  (e.g. 5 * 3)");
    let Some(line) = input.next_line()? else {
        return Ok(());
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    let &[a, op, b] = parts.as_slice() else {
        println!("Invalid input.");
        return Ok(());
    };
    let (Ok(a), Ok(b)) = (a.parse::<f64>(), b.parse::<f64>()) else {
        println!("Invalid input.");
        return Ok(());
    };

    let result = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
            if b == 0.0 {
                println!("Error: divide by zero.");
                return Ok(());
            }
            a / b
        }
        _ => {
            println!("Unknown operator.");
            return Ok(());
        }
    };
    println!("Result: {}", result);
    Ok(())
}

fn run_notepad<R: BufRead>(session: &mut Session, input: &mut Input<R>) -> Result<()> {
    println!("Notepad - enter filename to save in current directory:");
    let Some(filename) = input.next_line()? else {
        return Ok(());
    };
    let filename = filename.trim();
    if filename.is_empty() {
        println!("Notepad needs a filename.");
        return Ok(());
    }
    capture_into(session, input, filename)
}

fn run_scripted_capture<R: BufRead>(
    session: &mut Session,
    input: &mut Input<R>,
    target: &str,
) -> Result<()> {
    if target.is_empty() {
        println!("Installed notepad missing filename.");
        return Ok(());
    }
    println!("Installed notepad saving to '{}' in current directory.", target);
    capture_into(session, input, target)
}

fn capture_into<R: BufRead>(
    session: &mut Session,
    input: &mut Input<R>,
    filename: &str,
) -> Result<()> {
    println!(
        "Enter text lines. Type '{}' on its own line to finish.",
        END_MARK
    );
    let body = input.read_body(END_MARK)?;

    let existed = session.read_file(filename).is_ok();
    match session.write_file(filename, &body) {
        Ok(()) => println!(
            "File '{}' {}.",
            filename,
            if existed { "overwritten" } else { "saved" }
        ),
        Err(err) => println!("Error: {}", err),
    }
    Ok(())
}

fn run_number_game<R: BufRead>(input: &mut Input<R>) -> Result<()> {
    let target: i32 = rand::thread_rng().gen_range(1..=100);
    let mut tries = 0;
    println!("Number Guess Game! Guess a number from 1 to 100.");
    loop {
        println!("Enter guess:");
        let Some(line) = input.next_line()? else {
            break;
        };
        let Ok(guess) = line.trim().parse::<i32>() else {
            println!("Invalid. Try again.");
            continue;
        };
        tries += 1;
        match guess.cmp(&target) {
            Ordering::Greater => println!("Too high!"),
            Ordering::Less => println!("Too low!"),
            Ordering::Equal => {
                println!("Correct! You took {} tries.", tries);
                break;
            }
        }
    }
    Ok(())
}

fn run_about() {
    println!("vdisk virtual shell");
    println!(
        "Features: virtual filesystem, autosave, app library, app install/uninstall, wipe."
    );
    println!("All operations are sandboxed in the virtual filesystem.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use vdisk_core::{AppRecord, Store};

    #[test]
    fn test_payload_parse_print() {
        assert_eq!(
            Payload::parse("PRINT:hi\n"),
            Payload::Print("hi".to_string())
        );
    }

    #[test]
    fn test_payload_parse_scripted_capture() {
        assert_eq!(
            Payload::parse("SCRIPT:NOTEPAD default_note.txt\n"),
            Payload::ScriptedCapture("default_note.txt".to_string())
        );
        assert_eq!(
            Payload::parse("SCRIPT:NOTEPAD\n"),
            Payload::ScriptedCapture(String::new())
        );
    }

    #[test]
    fn test_payload_parse_raw_fallback() {
        assert_eq!(
            Payload::parse("just some text\n"),
            Payload::Raw("just some text".to_string())
        );
    }

    #[test]
    fn test_canned_packages_parse_as_app_records() {
        for &pkg in KNOWN_PACKAGES {
            let (file_name, source) = package_source(pkg).unwrap();
            assert!(file_name.ends_with(".app"));
            let record = AppRecord::parse(source).unwrap();
            assert!(!record.builtin);
            assert!(!record.name.is_empty());
        }
        assert!(package_source("unknown").is_none());
    }

    #[test]
    fn test_hello_package_payload_prints_greeting() {
        let (_, source) = package_source("hello").unwrap();
        let record = AppRecord::parse(source).unwrap();
        assert_eq!(
            Payload::parse(&record.code),
            Payload::Print("Hello from installed Hello App!".to_string())
        );
    }

    #[test]
    fn test_scripted_capture_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::open(Store::at(temp_dir.path().join("vdisk.txt"))).unwrap();

        let (file_name, source) = package_source("simple-notepad").unwrap();
        session.install_package(file_name, source).unwrap();

        let mut input = Input::new(Cursor::new("captured line\nEND\n"));
        run_app(&mut session, &mut input, "snotepad").unwrap();

        assert_eq!(
            session.read_file("default_note.txt").unwrap(),
            "captured line\n"
        );
    }

    #[test]
    fn test_run_unknown_app_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::open(Store::at(temp_dir.path().join("vdisk.txt"))).unwrap();

        let mut input = Input::new(Cursor::new(""));
        run_app(&mut session, &mut input, "missing").unwrap();
    }
}

//! Interactive shell loop and command dispatch.

use crate::input::Input;
use crate::runner;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use vdisk_core::{END_MARK, Session};

/// Run the interactive shell until `exit` or end of input.
///
/// Core errors are printed and the loop continues; nothing a command does
/// is fatal to the session.
pub fn run(session: &mut Session) -> Result<()> {
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut input = Input::new(stdin.lock());

    if interactive {
        println!("vdisk virtual shell");
        println!("Type 'help' for commands.");
    }

    loop {
        if interactive {
            print!("vdisk:{}> ", session.cwd_path());
            io::stdout().flush()?;
        }
        let Some(line) = input.next_line()? else {
            break;
        };
        if !dispatch(session, &mut input, &line, interactive)? {
            break;
        }
    }

    Ok(())
}

/// Handle one command line. Returns false when the shell should exit.
fn dispatch<R: BufRead>(
    session: &mut Session,
    input: &mut Input<R>,
    line: &str,
    interactive: bool,
) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(true);
    };
    let arg = parts.next();

    match cmd {
        "help" => print_help(),
        "ls" => print_listing(session),
        "cd" => match arg {
            Some(name) => match session.change_dir(name) {
                Ok(true) => {}
                Ok(false) => println!("Already at root."),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("cd needs an argument."),
        },
        "back" => {
            if !session.go_up() {
                println!("Already at root.");
            }
        }
        "mkdir" => match arg {
            Some(name) => match session.make_dir(name) {
                Ok(()) => println!("Directory '{}' created.", name),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("mkdir needs a name."),
        },
        "rmdir" => match arg {
            Some(name) => match session.remove_dir(name) {
                Ok(()) => println!("Directory '{}' and all contents removed.", name),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("rmdir needs a name."),
        },
        "write" => match arg {
            Some(name) => {
                if interactive {
                    println!(
                        "Enter file content. Type '{}' on its own line to finish.",
                        END_MARK
                    );
                }
                let body = input.read_body(END_MARK)?;
                match session.write_file(name, &body) {
                    Ok(()) => println!("File '{}' written.", name),
                    Err(err) => println!("Error: {}", err),
                }
            }
            None => println!("write needs a filename."),
        },
        "cat" => match arg {
            Some(name) => match session.read_file(name) {
                Ok(content) => {
                    println!("---- {} ----", name);
                    if content.is_empty() {
                        println!("(empty)");
                    } else {
                        print!("{}", content);
                        if !content.ends_with('\n') {
                            println!();
                        }
                    }
                    println!("---- end ----");
                }
                Err(err) => println!("Error: {}", err),
            },
            None => println!("cat needs a filename."),
        },
        "rm" => match arg {
            Some(name) => match session.remove_file(name) {
                Ok(()) => println!("File '{}' deleted.", name),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("rm needs a filename."),
        },
        "clear" => {
            for _ in 0..50 {
                println!();
            }
            println!("[screen cleared]");
        }
        "wipe" => {
            println!("Wipe ALL user data? This cannot be undone (type 'yes' to confirm):");
            match input.next_line()? {
                Some(confirm) if confirm.trim() == "yes" => match session.wipe() {
                    Ok(()) => println!("All user data wiped."),
                    Err(err) => println!("Error: {}", err),
                },
                _ => println!("Wipe cancelled."),
            }
        }
        "apps" => print_apps(session),
        "run" => match arg {
            Some(name) => runner::run_app(session, input, name)?,
            None => println!("run needs an app name."),
        },
        "install" => match arg {
            Some(pkg) => match runner::package_source(pkg) {
                Some((file_name, source)) => match session.install_package(file_name, source) {
                    Ok(()) => println!("Package '{}' installed.", pkg),
                    Err(err) => println!("Error: {}", err),
                },
                None => println!(
                    "Unknown package '{}'. Known: {}",
                    pkg,
                    runner::KNOWN_PACKAGES.join(", ")
                ),
            },
            None => println!("install needs a package name."),
        },
        "uninstall" => match arg {
            Some(name) => match session.uninstall_app(name) {
                Ok(()) => println!("App '{}' uninstalled.", name),
                Err(err) => println!("Error: {}", err),
            },
            None => println!("uninstall needs an app name."),
        },
        "appinfo" => match arg {
            Some(name) => print_appinfo(session, name),
            None => println!("appinfo needs an app name."),
        },
        "exit" => {
            session.save()?;
            if interactive {
                println!("Exiting (filesystem saved).");
            }
            return Ok(false);
        }
        _ => println!("Unknown command: {} (type 'help')", cmd),
    }

    Ok(true)
}

fn print_listing(session: &Session) {
    let (dirs, files) = session.list();
    println!("Directories:");
    for dir in dirs {
        println!("  [DIR] {}", dir);
    }
    println!("Files:");
    for file in files {
        println!("  {}", file);
    }
}

fn print_apps(session: &Session) {
    println!("Installed and built-in apps:");
    for app in session.apps().list() {
        println!(
            "  {} - {}{}",
            app.name,
            app.desc,
            if app.builtin { " [built-in]" } else { "" }
        );
    }
}

fn print_appinfo(session: &Session, name: &str) {
    match session.apps().lookup(name) {
        Some(app) => {
            println!("Name: {}", app.name);
            println!("Desc: {}", app.desc);
            println!("Type: {}", if app.builtin { "built-in" } else { "installed" });
            if !app.builtin {
                println!("Code preview:");
                print!("{}", app.code);
            }
        }
        None => println!("App not found."),
    }
}

fn print_help() {
    println!("Available commands:");
    println!(" help                - show this help");
    println!(" ls                  - list contents of current directory");
    println!(" cd <dir>            - change directory (.. goes up)");
    println!(" back                - go up one directory");
    println!(" mkdir <name>        - create directory");
    println!(" rmdir <name>        - delete directory and its contents");
    println!(" write <file>        - create/write a file (use {} to finish)", END_MARK);
    println!(" cat <file>          - show file contents");
    println!(" rm <file>           - delete file");
    println!(" clear               - clear virtual screen");
    println!(" wipe                - delete ALL user data (keeps the root)");
    println!(" apps                - list apps (built-in + installed)");
    println!(" run <app>           - run an app");
    println!(" install <pkg>       - install package ({})", runner::KNOWN_PACKAGES.join(", "));
    println!(" uninstall <app>     - uninstall installed app");
    println!(" appinfo <app>       - show info about an app");
    println!(" exit                - exit the shell (auto-saved)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use vdisk_core::Store;

    fn session_in(temp_dir: &TempDir) -> Session {
        Session::open(Store::at(temp_dir.path().join("vdisk.txt"))).unwrap()
    }

    fn run_script(session: &mut Session, script: &str) {
        let mut input = Input::new(Cursor::new(script.to_string()));
        while let Some(line) = input.next_line().unwrap() {
            if !dispatch(session, &mut input, &line, false).unwrap() {
                break;
            }
        }
    }

    #[test]
    fn test_scripted_session_builds_tree() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        run_script(
            &mut session,
            "mkdir docs\ncd docs\nwrite a.txt\nhello\nEND\ncd ..\n",
        );

        assert_eq!(session.cwd_path(), "/");
        assert_eq!(session.read_file_at("/docs/a.txt").unwrap(), "hello\n");
    }

    #[test]
    fn test_wipe_requires_confirmation() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        run_script(&mut session, "mkdir keep\nwipe\nno\n");
        let (dirs, _) = session.list();
        assert_eq!(dirs, vec!["keep"]);

        run_script(&mut session, "wipe\nyes\n");
        let (dirs, _) = session.list();
        assert!(dirs.is_empty());
    }

    #[test]
    fn test_exit_stops_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        run_script(&mut session, "exit\nmkdir after\n");
        let (dirs, _) = session.list();
        assert!(dirs.is_empty());
    }

    #[test]
    fn test_install_and_run_listed() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        run_script(&mut session, "install hello\n");
        assert!(session.apps().lookup("hello").is_some());
        assert!(session.read_file_at("/apps/hello.app").is_ok());

        run_script(&mut session, "uninstall hello\n");
        assert!(session.apps().lookup("hello").is_none());
    }

    #[test]
    fn test_unknown_command_keeps_session_alive() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        run_script(&mut session, "bogus\nmkdir ok\n");
        let (dirs, _) = session.list();
        assert_eq!(dirs, vec!["ok"]);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vdisk_core::{Session, Store};

mod input;
mod output;
mod runner;
mod shell;

use output::{
    AppinfoOutput, AppsOutput, CatOutput, DumpOutput, LsOutput, MkdirOutput, OutputWriter,
    RmOutput, RmdirOutput, WriteOutput,
};

/// Vdisk - an in-memory virtual filesystem shell
#[derive(Parser)]
#[command(name = "vdisk")]
#[command(about = "In-memory virtual filesystem with flat-text persistence", long_about = None)]
#[command(version)]
struct Cli {
    /// Disk image file (defaults to VDISK_FILE env var or ./vdisk.txt)
    #[arg(short, long, global = true)]
    disk: Option<PathBuf>,

    /// Output one-shot command results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (the default)
    Shell,

    /// List a directory
    Ls {
        /// Directory path (root if omitted)
        path: Option<String>,
    },

    /// Print file content
    Cat {
        /// File path
        path: String,
    },

    /// Create or overwrite a file
    Write {
        /// File path
        path: String,

        /// Content (read from stdin when omitted)
        #[arg(long)]
        text: Option<String>,
    },

    /// Create a directory
    Mkdir {
        /// Directory path
        path: String,
    },

    /// Delete a file
    Rm {
        /// File path
        path: String,
    },

    /// Delete a directory and all its contents
    Rmdir {
        /// Directory path
        path: String,
    },

    /// List built-in and installed apps
    Apps,

    /// Show info about an app
    Appinfo {
        /// App name
        name: String,
    },

    /// Print the raw disk image
    Dump,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine image location: CLI arg > VDISK_FILE env var > ./vdisk.txt default
    let disk = cli
        .disk
        .or_else(|| std::env::var("VDISK_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./vdisk.txt"));

    let out = OutputWriter::new(cli.json);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => cmd_shell(&disk),
        Commands::Ls { path } => cmd_ls(&disk, path, &out),
        Commands::Cat { path } => cmd_cat(&disk, &path, &out),
        Commands::Write { path, text } => cmd_write(&disk, &path, text, &out),
        Commands::Mkdir { path } => cmd_mkdir(&disk, &path, &out),
        Commands::Rm { path } => cmd_rm(&disk, &path, &out),
        Commands::Rmdir { path } => cmd_rmdir(&disk, &path, &out),
        Commands::Apps => cmd_apps(&disk, &out),
        Commands::Appinfo { name } => cmd_appinfo(&disk, &name, &out),
        Commands::Dump => cmd_dump(&disk, &out),
    }
}

fn open_session(disk: &Path) -> Result<Session> {
    Session::open(Store::at(disk))
        .with_context(|| format!("Failed to load disk image at {}", disk.display()))
}

fn cmd_shell(disk: &Path) -> Result<()> {
    let mut session = open_session(disk)?;
    shell::run(&mut session)
}

fn cmd_ls(disk: &Path, path: Option<String>, out: &OutputWriter) -> Result<()> {
    let session = open_session(disk)?;
    let target = path.as_deref().unwrap_or("/");

    let (dirs, files) = session
        .list_at(target)
        .with_context(|| format!("Failed to list {}", target))?;

    let data = LsOutput {
        success: true,
        result_code: 0,
        path: target.to_string(),
        dirs: dirs.iter().map(|s| s.to_string()).collect(),
        files: files.iter().map(|s| s.to_string()).collect(),
    };
    out.write(&data, || {
        let mut text = String::from("Directories:\n");
        for dir in &data.dirs {
            text.push_str(&format!("  [DIR] {}\n", dir));
        }
        text.push_str("Files:\n");
        for file in &data.files {
            text.push_str(&format!("  {}\n", file));
        }
        text
    })
}

fn cmd_cat(disk: &Path, path: &str, out: &OutputWriter) -> Result<()> {
    let session = open_session(disk)?;

    let content = session
        .read_file_at(path)
        .with_context(|| format!("Failed to read {}", path))?
        .to_string();

    let data = CatOutput {
        success: true,
        result_code: 0,
        path: path.to_string(),
        content,
    };
    out.write(&data, || data.content.clone())
}

fn cmd_write(disk: &Path, path: &str, text: Option<String>, out: &OutputWriter) -> Result<()> {
    let mut session = open_session(disk)?;

    let content = match text {
        Some(text) => text,
        None => io::read_to_string(io::stdin()).context("Failed to read content from stdin")?,
    };

    session
        .write_file_at(path, &content)
        .with_context(|| format!("Failed to write {}", path))?;

    let data = WriteOutput {
        success: true,
        result_code: 0,
        path: path.to_string(),
        bytes: content.len(),
    };
    out.write(&data, || format!("Wrote {} bytes to {}\n", data.bytes, data.path))
}

fn cmd_mkdir(disk: &Path, path: &str, out: &OutputWriter) -> Result<()> {
    let mut session = open_session(disk)?;

    session
        .make_dir_at(path)
        .with_context(|| format!("Failed to create directory {}", path))?;

    let data = MkdirOutput {
        success: true,
        result_code: 0,
        path: path.to_string(),
    };
    out.write(&data, || format!("Directory '{}' created.\n", data.path))
}

fn cmd_rm(disk: &Path, path: &str, out: &OutputWriter) -> Result<()> {
    let mut session = open_session(disk)?;

    session
        .remove_file_at(path)
        .with_context(|| format!("Failed to delete {}", path))?;

    let data = RmOutput {
        success: true,
        result_code: 0,
        path: path.to_string(),
    };
    out.write(&data, || format!("File '{}' deleted.\n", data.path))
}

fn cmd_rmdir(disk: &Path, path: &str, out: &OutputWriter) -> Result<()> {
    let mut session = open_session(disk)?;

    session
        .remove_dir_at(path)
        .with_context(|| format!("Failed to delete directory {}", path))?;

    let data = RmdirOutput {
        success: true,
        result_code: 0,
        path: path.to_string(),
    };
    out.write(&data, || {
        format!("Directory '{}' and all contents removed.\n", data.path)
    })
}

fn cmd_apps(disk: &Path, out: &OutputWriter) -> Result<()> {
    let session = open_session(disk)?;

    let data = AppsOutput {
        success: true,
        result_code: 0,
        apps: session.apps().list().to_vec(),
    };
    out.write(&data, || {
        let mut text = String::from("Installed and built-in apps:\n");
        for app in &data.apps {
            text.push_str(&format!(
                "  {} - {}{}\n",
                app.name,
                app.desc,
                if app.builtin { " [built-in]" } else { "" }
            ));
        }
        text
    })
}

fn cmd_appinfo(disk: &Path, name: &str, out: &OutputWriter) -> Result<()> {
    let session = open_session(disk)?;

    let app = session
        .apps()
        .lookup(name)
        .with_context(|| format!("App not found: {}", name))?
        .clone();

    let data = AppinfoOutput {
        success: true,
        result_code: 0,
        app,
    };
    out.write(&data, || {
        let mut text = format!(
            "Name: {}\nDesc: {}\nType: {}\n",
            data.app.name,
            data.app.desc,
            if data.app.builtin { "built-in" } else { "installed" }
        );
        if !data.app.builtin {
            text.push_str("Code preview:\n");
            text.push_str(&data.app.code);
        }
        text
    })
}

fn cmd_dump(disk: &Path, out: &OutputWriter) -> Result<()> {
    let session = open_session(disk)?;

    let data = DumpOutput {
        success: true,
        result_code: 0,
        image: session.dump_image(),
    };
    out.write(&data, || data.image.clone())
}

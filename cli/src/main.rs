//! Bookshelf command-line client.
//!
//! Thin harness over the library controller: each subcommand fills the
//! matching form buffer (or argument), runs one controller operation against
//! a live server, and prints the resulting banner. The session token persists
//! in a token file between invocations.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use bookshelf::controller::{ConfirmPrompt, Controller, NoopObserver};
use bookshelf::net::api::HttpApi;
use bookshelf::state::forms::SelectedFile;
use bookshelf::state::notice::Severity;
use bookshelf::store::FileTokenStore;
use clap::{Parser, Subcommand};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "shelf-cli", about = "Bookshelf API command-line client")]
struct Cli {
    #[arg(long, env = "SHELF_BASE_URL", default_value = "http://127.0.0.1:8000/api")]
    base_url: String,

    #[arg(long, env = "SHELF_TOKEN_FILE", default_value = ".shelf-token")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and persist the session token.
    Login { username: String, password: String },
    /// Create a new account.
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Drop the current session and its persisted token.
    Logout,
    /// Show the logged-in user.
    Me,
    /// List the library.
    Books,
    /// Upload an ebook file.
    Upload { file: PathBuf },
    /// Delete a book by id.
    Delete {
        book_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// Prompts on stdin before a delete goes through.
struct StdinConfirm;

impl ConfirmPrompt for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes")
    }
}

/// Approves without prompting (`--yes`).
struct YesConfirm;

impl ConfirmPrompt for YesConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let confirm: Box<dyn ConfirmPrompt> = match &cli.command {
        Command::Delete { yes: true, .. } => Box::new(YesConfirm),
        _ => Box::new(StdinConfirm),
    };

    let mut controller = Controller::new(
        HttpApi::new(cli.base_url.as_str()),
        Box::new(FileTokenStore::new(&cli.token_file)),
        confirm,
        Box::new(NoopObserver),
    );

    // Commands acting on an existing session restore it first; login and
    // register start from scratch.
    if matches!(
        cli.command,
        Command::Me | Command::Books | Command::Upload { .. } | Command::Delete { .. }
    ) {
        controller.init().await;
    }

    match cli.command {
        Command::Login { username, password } => {
            controller.login_form.username = username;
            controller.login_form.password = password;
            controller.login().await;
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            controller.register_form.username = username;
            controller.register_form.email = email;
            controller.register_form.password = password;
            controller.register().await;
        }
        Command::Logout => controller.logout(),
        Command::Me => match &controller.session.user {
            Some(user) => print_json(user)?,
            None => println!("not logged in"),
        },
        Command::Books => {
            controller.load_books().await;
            print_json(&controller.books.items)?;
        }
        Command::Upload { file } => {
            let bytes = std::fs::read(&file).map_err(|source| CliError::ReadFile {
                path: file.clone(),
                source,
            })?;
            let file_name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.bin".to_owned());
            controller.selected_file = Some(SelectedFile { file_name, bytes });
            controller.upload_book().await;
        }
        Command::Delete { book_id, .. } => controller.delete_book(book_id).await,
    }

    let banner = &controller.notice.banner;
    if banner.visible {
        println!("[{}] {}", banner.severity, banner.message);
        if banner.severity == Severity::Error {
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

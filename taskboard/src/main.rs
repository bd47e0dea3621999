//! `taskboard`: command-line task board client.
//!
//! Talks to the task API configured via CLI flags, environment variables,
//! or config file (`~/.config/taskboard/config.toml`). The session is kept
//! in a file between invocations.
//!
//! ```bash
//! taskboard login wayne@bm.com --password 'Wayne@123'
//! taskboard list --date week --priority high
//! taskboard add "Write report" --due 2026-10-20 --priority medium
//! taskboard toggle <id>
//! ```

use std::path::Path;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use taskboard_proto::task::{Subtask, TaskId};
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::cache::CacheError;
use taskboard::config::{CliArgs, ClientConfig, Command};
use taskboard::context::AppContext;
use taskboard::coordinator::{
    Committed, Coordinator, LOGIN_FAILED_MESSAGE, OperationError, SIGNUP_FAILED_MESSAGE,
    SignupOutcome,
};
use taskboard::form::{SAVE_FAILED, TaskForm};
use taskboard::render;
use taskboard::session::SessionFile;
use taskboard::store::http::HttpTaskStore;
use taskboard::views::{self, FilterSet, Insights, TaskStats};

/// Exit code when the user has to log in again.
const EXIT_RELOGIN: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Logs go to a file so stdout carries only rendered output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = match HttpTaskStore::new(&config.api_base, config.timeout) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(api_base = %store.base_url(), "taskboard starting");

    let mut ctx = AppContext::new(store);
    if let Some(file) = config
        .session_file
        .clone()
        .map(SessionFile::new)
        .or_else(SessionFile::default_location)
    {
        ctx = ctx.with_session_file(file);
    }
    ctx.restore();

    let mut coordinator = Coordinator::new(ctx);
    let command = cli.command.clone().unwrap_or(Command::List {
        date: None,
        priority: None,
        sort: None,
    });

    match run(&mut coordinator, &config, command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("{}", failure.message);
            if failure.relogin {
                eprintln!("Run `taskboard login <email>` to sign in again.");
                ExitCode::from(EXIT_RELOGIN)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// A command that did not succeed, ready to print.
struct Failure {
    message: String,
    relogin: bool,
}

impl Failure {
    fn new(err: &OperationError, fallback: &str) -> Self {
        Self {
            message: err.message_or(fallback),
            relogin: err.is_session_expired(),
        }
    }

    fn from_form(err: &OperationError, form: &TaskForm) -> Self {
        Self {
            message: form
                .error()
                .map_or_else(|| err.message_or(SAVE_FAILED), str::to_string),
            relogin: err.is_session_expired(),
        }
    }
}

impl From<OperationError> for Failure {
    fn from(err: OperationError) -> Self {
        Self {
            message: err.user_message(),
            relogin: err.is_session_expired(),
        }
    }
}

/// Appends a note when the refresh after a write failed.
fn with_refresh_note<T>(mut out: String, committed: &Committed<T>) -> String {
    if let Some(e) = &committed.refresh_error {
        out.push_str(&format!("\nwarning: could not refresh tasks: {}", e.user_message()));
    }
    out
}

async fn run(
    co: &mut Coordinator<HttpTaskStore>,
    config: &ClientConfig,
    command: Command,
) -> Result<String, Failure> {
    let now = Local::now();

    match command {
        Command::Login { email, password } => {
            let identity = co
                .login(&email, &password)
                .await
                .map_err(|e| Failure::new(&e, LOGIN_FAILED_MESSAGE))?;
            Ok(format!("Logged in as {}", render::identity(&identity)))
        }

        Command::Signup {
            name,
            email,
            password,
        } => {
            let outcome = co
                .signup(&name, &email, &password)
                .await
                .map_err(|e| Failure::new(&e, SIGNUP_FAILED_MESSAGE))?;
            Ok(match outcome {
                SignupOutcome::SignedIn(identity) => {
                    format!("Signed up as {}", render::identity(&identity))
                }
                SignupOutcome::Registered { message } => message,
            })
        }

        Command::Logout => {
            co.logout();
            Ok("Logged out.".to_string())
        }

        Command::Whoami => co
            .context()
            .identity()
            .map(render::identity)
            .ok_or_else(|| Failure {
                message: "Not logged in.".to_string(),
                relogin: true,
            }),

        Command::List {
            date,
            priority,
            sort,
        } => {
            let filters = FilterSet {
                date: date.unwrap_or(config.filters.date),
                priority: priority.unwrap_or(config.filters.priority),
                sort: sort.unwrap_or(config.filters.sort),
            };
            co.refresh().await?;
            let shown = views::dashboard(co.tasks(), &filters, &now);
            Ok(render::dashboard(&shown, &filters, &now))
        }

        Command::Completed { sort } => {
            co.refresh().await?;
            let shown = views::completed(
                co.tasks(),
                sort.unwrap_or(config.completed_sort),
                &now.timezone(),
            );
            Ok(render::completed(&shown, &now))
        }

        Command::Stats => {
            co.refresh().await?;
            let stats = TaskStats::from_tasks(co.tasks());
            let insights = Insights::compute(co.tasks(), &now);
            Ok(render::stats(&stats, &insights))
        }

        Command::Add {
            title,
            description,
            due,
            priority,
            subtasks,
        } => {
            let mut form = TaskForm::new();
            form.open_new();
            let draft = form.draft_mut();
            draft.title = title;
            draft.description = description;
            draft.due_date = due;
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            draft.subtasks = subtasks
                .into_iter()
                .map(|title| Subtask {
                    title,
                    completed: false,
                })
                .collect();

            let committed = co
                .save_form(&mut form, &now)
                .await
                .map_err(|e| Failure::from_form(&e, &form))?;
            let out = committed.value.as_ref().map_or_else(
                || "Task created.".to_string(),
                |task| format!("Created task {}", task.id),
            );
            Ok(with_refresh_note(out, &committed))
        }

        Command::Edit {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
            status,
        } => {
            let id = TaskId::new(id);
            co.refresh().await?;
            let task = co
                .cache()
                .get(&id)
                .cloned()
                .ok_or_else(|| OperationError::from(CacheError::UnknownTask(id.clone())))?;

            let mut form = TaskForm::new();
            form.open_edit(&task, &now.timezone());
            let draft = form.draft_mut();
            if let Some(title) = title {
                draft.title = title;
            }
            if description.is_some() {
                draft.description = description;
            }
            if clear_due {
                draft.due_date = None;
            } else if due.is_some() {
                draft.due_date = due;
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if let Some(status) = status {
                draft.status = status;
            }

            let committed = co
                .save_form(&mut form, &now)
                .await
                .map_err(|e| Failure::from_form(&e, &form))?;
            Ok(with_refresh_note(format!("Updated task {id}"), &committed))
        }

        Command::Delete { id } => {
            let id = TaskId::new(id);
            let committed = co.delete(&id).await?;
            Ok(with_refresh_note(format!("Deleted task {id}"), &committed))
        }

        Command::Toggle { id } => {
            let id = TaskId::new(id);
            co.refresh().await?;
            let committed = co.toggle_status(&id).await?;
            Ok(with_refresh_note(
                format!("Task {id} is now {}", committed.value),
                &committed,
            ))
        }
    }
}

use std::path::PathBuf;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use taskflow::{
    config::Config,
    handlers::{self, Dashboard},
    models::{LoginForm, Priority, ProfileForm, RegisterForm, StatusFilter, Task, TaskFields, TaskId, TaskStatus},
    App,
};

#[derive(Parser)]
#[command(name = "taskflow", version, about = "Command-line client for the TaskFlow task manager")]
struct Cli {
    /// Configuration file to use instead of config/default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget tokens, user and cached tasks
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show, refresh or edit the profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// List tasks, optionally filtered by status
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    /// Create a task
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value = "todo")]
        status: TaskStatus,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Change fields of an existing task
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Move a task to another status
    Status { id: TaskId, status: TaskStatus },
    /// Delete a task
    Delete { id: TaskId },
    /// Show task statistics
    Stats,
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    /// Reload the profile from the server
    Refresh,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::open(&config).context("Failed to open local state")?;
    run(cli.command, &app).await
}

async fn run(command: Command, app: &App) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let user = handlers::handle_login(&app.auth, &app.session, LoginForm { username, password }).await?;
            println!("Welcome back, {}", user.name);
        }
        Command::Register { username, email, password } => {
            let form = RegisterForm { username, email, password };
            let user = handlers::handle_register(&app.auth, &app.session, form).await?;
            println!("Account created, signed in as {}", user.name);
        }
        Command::Logout => {
            handlers::handle_logout(&app.session)?;
            println!("Signed out");
        }
        Command::Whoami => match app.session.current_user() {
            Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
            None => println!("Not signed in"),
        },
        Command::Profile { action } => {
            let editor = app.profile_editor();
            let user = match action.unwrap_or(ProfileAction::Show) {
                ProfileAction::Show => editor.user()?,
                ProfileAction::Refresh => editor.refresh_profile().await?,
                ProfileAction::Update { name, email } => {
                    let current = editor.user()?;
                    editor.update_profile(ProfileForm {
                        name: name.unwrap_or(current.name),
                        email: email.unwrap_or(current.email),
                    })?
                }
            };
            println!("[{}] {} <{}>", user.initials(), user.name, user.email);
        }
        Command::List { status } => {
            let mut dashboard = app.dashboard();
            dashboard.load().await?;
            dashboard.set_filter(status);
            let visible = dashboard.visible_tasks();
            if visible.is_empty() {
                println!("No {} tasks", status);
            }
            for task in visible {
                print_task(task);
            }
        }
        Command::Add { title, description, priority, status, due } => {
            let fields = TaskFields { title, description, priority, status, due_date: due };
            let task = app.dashboard().create_task(fields).await?;
            print_task(&task);
        }
        Command::Edit { id, title, description, priority, status, due, clear_due } => {
            let mut dashboard = app.dashboard();
            let mut fields = loaded_task(&mut dashboard, id).await?.fields();
            if let Some(title) = title {
                fields.title = title;
            }
            if let Some(description) = description {
                fields.description = description;
            }
            if let Some(priority) = priority {
                fields.priority = priority;
            }
            if let Some(status) = status {
                fields.status = status;
            }
            if clear_due {
                fields.due_date = None;
            } else if due.is_some() {
                fields.due_date = due;
            }
            let task = dashboard.update_task(id, fields).await?;
            print_task(&task);
        }
        Command::Status { id, status } => {
            let mut dashboard = app.dashboard();
            dashboard.load().await?;
            let task = dashboard.change_status(id, status).await?;
            print_task(&task);
        }
        Command::Delete { id } => {
            app.dashboard().delete_task(id).await?;
            println!("Deleted task {}", id);
        }
        Command::Stats => {
            let mut dashboard = app.dashboard();
            dashboard.load().await?;
            let stats = dashboard.stats(Utc::now().date_naive());
            println!("Completion rate: {:.0}%", stats.completion_rate());
            println!("Total: {}  Completed: {}  In progress: {}  To do: {}",
                stats.total, stats.completed, stats.in_progress, stats.todo);
            if stats.needs_attention() {
                println!("Overdue: {}  High priority: {}", stats.overdue, stats.high_priority_open);
            }
        }
    }
    Ok(())
}

async fn loaded_task(dashboard: &mut Dashboard, id: TaskId) -> Result<Task> {
    dashboard
        .load()
        .await?
        .iter()
        .find(|task| task.id == id)
        .cloned()
        .with_context(|| format!("Task {} not found", id))
}

fn print_task(task: &Task) {
    let due = task
        .due_date
        .map(|d| format!(" due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!("#{:<6} [{:<11}] {:<6} {}{}", task.id, task.status, task.priority, task.title, due);
}

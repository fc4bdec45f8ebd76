use clap::{CommandFactory, Parser};
use habitos_cli::cli::{
    Cli, Command, HabitCommand, NotesCommand, TaskCommand, ThemeCommand, collect_config_overrides,
};
use habitos_cli::render;
use habitos_core::config::{
    Config, Palette, load_config_with_fallback, merge_overrides, palette_for_theme, plain_palette,
};
use habitos_core::error::AppError;
use habitos_core::filters::{
    HabitFilter, TaskFilter, day_stats, group_by_status, shift_weeks, tasks_on, week_summary,
};
use habitos_core::habit_api::{HabitDraft, HabitPatch};
use habitos_core::heatmap::{MAX_WEEKS, heatmap};
use habitos_core::model::{Priority, TaskStatus, Theme, format_day, parse_day};
use habitos_core::stats::{compute_all, compute_habit_stats, overview};
use habitos_core::storage::{self, FileStore};
use habitos_core::task_api::{TaskDraft, TaskPatch};
use habitos_core::workspace::Workspace;
use std::io::{self, BufRead, IsTerminal};
use time::{Date, OffsetDateTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV_VAR: &str = "HABITOS_LOG";

/// Everything one command needs, resolved from flags, config and the store.
struct Context {
    workspace: Workspace<FileStore>,
    today: Date,
    heatmap_weeks: usize,
    json: bool,
    palette: Palette,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn parse_date_arg(raw: &str) -> Result<Date, AppError> {
    parse_day(raw).ok_or_else(|| {
        AppError::invalid_input(format!("invalid date '{}', expected YYYY-MM-DD", raw.trim()))
    })
}

fn resolve_today(raw: Option<&str>) -> Result<Date, AppError> {
    match raw {
        Some(raw) => parse_date_arg(raw),
        None => Ok(OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()),
    }
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, AppError> {
    raw.map(|value| value.parse::<Priority>()).transpose()
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>, AppError> {
    raw.map(|value| value.parse::<TaskStatus>()).transpose()
}

fn open_context(cli: &Cli, base: &Config) -> Result<Context, AppError> {
    let overrides = collect_config_overrides(&cli.config_override)?;
    let config = merge_overrides(base, &overrides);
    let today = resolve_today(cli.today.as_deref())?;
    let dir = storage::data_dir(config.data_dir.as_deref())?;
    tracing::debug!(data_dir = %dir.display(), %today, "opening workspace");

    let workspace = Workspace::open(FileStore::new(dir))?
        .with_default_target_days(config.default_target_days());
    let palette = if !cli.json && io::stdout().is_terminal() {
        palette_for_theme(workspace.theme())
    } else {
        plain_palette()
    };

    Ok(Context {
        workspace,
        today,
        heatmap_weeks: config.heatmap_weeks(),
        json: cli.json,
        palette,
    })
}

fn run_command(cli: Cli, base: &Config) -> Result<(), AppError> {
    let mut ctx = open_context(&cli, base)?;

    match cli.command {
        Command::Task { task } => run_task(&mut ctx, task),
        Command::Habit { habit } => run_habit(&mut ctx, habit),
        Command::Notes { notes } => run_notes(&mut ctx, notes),
        Command::Theme { theme } => run_theme(&mut ctx, theme),
    }
}

fn run_task(ctx: &mut Context, command: TaskCommand) -> Result<(), AppError> {
    match command {
        TaskCommand::Add {
            title,
            date,
            habit,
            priority,
            status,
            note,
        } => {
            let draft = TaskDraft {
                title: title.unwrap_or_default(),
                date: date.unwrap_or_else(|| format_day(ctx.today)),
                habit_id: habit,
                priority: parse_priority(priority.as_deref())?.unwrap_or_default(),
                status: parse_status(status.as_deref())?.unwrap_or_default(),
                note,
            };

            let task = ctx.workspace.create_task(draft)?;
            if ctx.json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        TaskCommand::Edit {
            id,
            title,
            date,
            habit,
            no_habit,
            priority,
            status,
            note,
            clear_note,
        } => {
            let patch = TaskPatch {
                title,
                date,
                habit_id: if no_habit { Some(None) } else { habit.map(Some) },
                priority: parse_priority(priority.as_deref())?,
                status: parse_status(status.as_deref())?,
                note: if clear_note { Some(None) } else { note.map(Some) },
            };

            let task = ctx.workspace.update_task(&id, patch)?;
            if ctx.json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        TaskCommand::Toggle { id } => {
            let task = ctx.workspace.toggle_task(&id)?;
            if ctx.json {
                println!("{}", render::task_json(&task)?);
            } else if task.is_completed() {
                println!("Completed task: {} ({})", task.title, task.id);
            } else {
                println!("Reopened task: {} ({})", task.title, task.id);
            }
        }
        TaskCommand::Delete { id } => {
            let task = ctx.workspace.delete_task(&id)?;
            if ctx.json {
                println!("{}", render::task_json(&task)?);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        TaskCommand::Show { id } => {
            let task = ctx.workspace.get_task(&id)?;
            if ctx.json {
                println!("{}", render::task_json(&task)?);
            } else {
                let habit_name = task
                    .habit_id
                    .as_deref()
                    .and_then(|habit_id| ctx.workspace.state().habit(habit_id))
                    .map(|habit| habit.name.as_str());
                println!("{}", render::task_details(&task, habit_name));
            }
        }
        TaskCommand::List {
            date,
            priority,
            status,
        } => {
            let date = match date.as_deref() {
                Some(raw) => parse_date_arg(raw)?,
                None => ctx.today,
            };
            let filter = match (
                parse_priority(priority.as_deref())?,
                parse_status(status.as_deref())?,
            ) {
                (Some(priority), _) => TaskFilter::Priority(priority),
                (None, Some(status)) => TaskFilter::Status(status),
                (None, None) => TaskFilter::All,
            };

            let day = tasks_on(ctx.workspace.list_tasks(), date);
            let stats = day_stats(&day);
            let filtered = filter.apply(&day);
            let groups = group_by_status(&filtered);

            if ctx.json {
                println!("{}", render::task_board_json(date, &groups, &stats)?);
            } else {
                println!(
                    "{}",
                    render::task_board(date, &groups, &stats, &ctx.palette)
                );
            }
        }
        TaskCommand::Week { date, shift } => {
            let anchor = match date.as_deref() {
                Some(raw) => parse_date_arg(raw)?,
                None => ctx.today,
            };
            let selected = shift_weeks(anchor, shift).ok_or_else(|| {
                AppError::invalid_input(format!("cannot shift {anchor} by {shift} weeks"))
            })?;
            let week = week_summary(ctx.workspace.list_tasks(), selected);

            if ctx.json {
                println!("{}", render::week_json(selected, &week));
            } else {
                println!(
                    "{}",
                    render::week_view(&week, selected, ctx.today, &ctx.palette)
                );
            }
        }
    }

    Ok(())
}

fn run_habit(ctx: &mut Context, command: HabitCommand) -> Result<(), AppError> {
    match command {
        HabitCommand::Add {
            name,
            description,
            color,
            target_days,
        } => {
            let draft = HabitDraft {
                name: name.unwrap_or_default(),
                description,
                color,
                target_days,
            };

            let habit = ctx.workspace.create_habit(draft)?;
            if ctx.json {
                println!("{}", render::habit_json(&habit)?);
            } else {
                println!("Added habit: {} ({})", habit.name, habit.id);
            }
        }
        HabitCommand::Edit {
            id,
            name,
            description,
            clear_description,
            color,
            target_days,
        } => {
            let patch = HabitPatch {
                name,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                color,
                target_days,
            };

            let habit = ctx.workspace.update_habit(&id, patch)?;
            if ctx.json {
                println!("{}", render::habit_json(&habit)?);
            } else {
                println!("Updated habit: {} ({})", habit.name, habit.id);
            }
        }
        HabitCommand::Delete { id } => {
            let habit = ctx.workspace.delete_habit(&id)?;
            if ctx.json {
                println!("{}", render::habit_json(&habit)?);
            } else {
                println!("Deleted habit: {} ({})", habit.name, habit.id);
            }
        }
        HabitCommand::List { filter } => {
            let filter = filter.parse::<HabitFilter>()?;
            let habits = ctx.workspace.list_habits();
            let tasks = ctx.workspace.list_tasks();
            let all_stats = compute_all(habits, tasks, ctx.today);
            let summary = overview(habits, tasks, ctx.today);

            let rows: Vec<_> = habits
                .iter()
                .zip(all_stats.iter())
                .filter(|(_, stats)| filter.matches(stats))
                .collect();

            if ctx.json {
                let entries = rows
                    .iter()
                    .map(|(habit, stats)| {
                        Ok(serde_json::json!({
                            "habit": render::habit_json(habit)?,
                            "stats": render::stats_json(stats)?,
                        }))
                    })
                    .collect::<Result<Vec<_>, AppError>>()?;
                let payload = serde_json::json!({
                    "habits": entries,
                    "overview": render::overview_json(&summary),
                });
                println!("{payload}");
            } else {
                if rows.is_empty() {
                    println!("No habits found.");
                } else {
                    println!("{}", render::habit_table(&rows));
                }
                println!("{}", ctx.palette.mutedize(&render::overview_line(&summary)));
            }
        }
        HabitCommand::Show { id, weeks } => {
            let weeks = match weeks {
                Some(weeks) if !(1..=MAX_WEEKS).contains(&weeks) => {
                    return Err(AppError::invalid_input(format!(
                        "weeks must be between 1 and {MAX_WEEKS}"
                    )));
                }
                Some(weeks) => weeks,
                None => ctx.heatmap_weeks,
            };

            let habit = ctx.workspace.get_habit(&id)?;
            let stats = compute_habit_stats(&habit, ctx.workspace.list_tasks(), ctx.today);
            let grid = heatmap(&stats, weeks);

            if ctx.json {
                let payload = serde_json::json!({
                    "habit": render::habit_json(&habit)?,
                    "stats": render::stats_json(&stats)?,
                    "heatmap": render::heatmap_json(&grid),
                });
                println!("{payload}");
            } else {
                println!("{}", ctx.palette.accentize(&habit.name));
                println!("{}", render::habit_details(&habit, &stats));
                println!();
                println!("{}", render::heatmap_grid(&grid, &ctx.palette));
            }
        }
    }

    Ok(())
}

fn run_notes(ctx: &mut Context, command: NotesCommand) -> Result<(), AppError> {
    match command {
        NotesCommand::Show => {
            if ctx.json {
                println!("{}", serde_json::json!({ "notes": ctx.workspace.notes() }));
            } else {
                println!("{}", ctx.workspace.notes());
            }
        }
        NotesCommand::Set { text } => {
            ctx.workspace.set_notes(&text)?;
            if ctx.json {
                println!("{}", serde_json::json!({ "notes": ctx.workspace.notes() }));
            } else {
                println!("Notes saved.");
            }
        }
    }

    Ok(())
}

fn run_theme(ctx: &mut Context, command: ThemeCommand) -> Result<(), AppError> {
    match command {
        ThemeCommand::Show => {}
        ThemeCommand::Set { theme } => {
            let theme = theme.parse::<Theme>()?;
            ctx.workspace.set_theme(theme)?;
        }
    }

    let theme = ctx.workspace.theme();
    if ctx.json {
        println!("{}", serde_json::json!({ "theme": theme }));
    } else {
        println!("{theme}");
    }

    Ok(())
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("habitos".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, base) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        eprintln!("WARNING: config ignored: {}", err);
    }
    let config = loaded.config;

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive(&config) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli, &config) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

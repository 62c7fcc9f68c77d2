//! `stickies` - CLI for stickynotes
//!
//! This binary runs the note service for a window front end and provides
//! terminal access to the note store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::info;

use stickynotes::cli::{Cli, Command, ConfigCommand};
use stickynotes::ipc::{self, stdio};
use stickynotes::{init_logging, App, Config, HeadlessHost, NewNote, Note, Storage};

const LIST_EXCERPT_CHARS: usize = 60;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports a broken file instead of failing to load it
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        validate_config(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve => handle_serve(config),
        Command::List(cmd) => handle_list(&config, cmd.json),
        Command::Show(cmd) => handle_show(&config, cmd.id, cmd.json),
        Command::Add(cmd) => handle_add(&config, &cmd.title, &cmd.content, cmd.json),
        Command::Edit(cmd) => {
            open_storage(&config)?.update_content(cmd.id, &cmd.content)?;
            println!("Updated note {}", cmd.id);
            Ok(())
        }
        Command::Delete(cmd) => {
            open_storage(&config)?.delete_note(cmd.id)?;
            println!("Deleted note {}", cmd.id);
            Ok(())
        }
        Command::Pin(cmd) => {
            let pinned = open_storage(&config)?.toggle_pin(cmd.id)?;
            println!(
                "{} note {}",
                if pinned { "Pinned" } else { "Unpinned" },
                cmd.id
            );
            Ok(())
        }
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening note store {}", path.display()))
}

fn handle_serve(config: Config) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;

    runtime.block_on(async move {
        let app = App::open(config, Box::new(HeadlessHost::new()))?;
        let (handle, task) = ipc::spawn(app);

        let served = tokio::select! {
            result = stdio::serve_stdio(&handle) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                Ok(())
            }
        };

        handle.shutdown().await;
        task.await.context("note service task failed")?;
        served?;
        Ok::<(), anyhow::Error>(())
    })
}

fn handle_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let notes = open_storage(config)?.list_notes()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes yet. Create one with `stickies add <title>`.");
        return Ok(());
    }

    for note in &notes {
        let marker = if note.pinned { "*" } else { " " };
        let more = if note.is_long(config.editor.preview_length) {
            " (more)"
        } else {
            ""
        };
        println!(
            "{:>5} {} {:<20} {}",
            note.id,
            marker,
            note.created_on(),
            note.display_title()
        );
        let excerpt = note.excerpt(LIST_EXCERPT_CHARS);
        if !excerpt.is_empty() {
            println!("{:>8}{}{}", "", excerpt, more);
        }
    }
    Ok(())
}

fn handle_show(config: &Config, id: i64, json: bool) -> anyhow::Result<()> {
    let note = open_storage(config)?.require_note(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print_note(&note);
    }
    Ok(())
}

fn handle_add(config: &Config, title: &str, content: &str, json: bool) -> anyhow::Result<()> {
    let note = open_storage(config)?.insert_note(&NewNote::new(title, content))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Saved note {}", note.id);
    }
    Ok(())
}

fn print_note(note: &Note) {
    println!("{}", note.display_title());
    println!("{}", "-".repeat(note.display_title().chars().count()));
    println!("Id:       {}", note.id);
    println!("Created:  {}", note.created_on());
    println!("Pinned:   {}", if note.pinned { "yes" } else { "no" });
    println!();
    println!("{}", note.plain_text());
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;
    let pinned = storage.list_notes()?.into_iter().find(|n| n.pinned);

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "total_notes": stats.total_notes,
            "pinned_notes": stats.pinned_notes,
            "pinned_note": pinned.as_ref().map(|n| n.id),
            "oldest_note": stats.oldest_note,
            "newest_note": stats.newest_note,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("stickies status");
        println!("---------------");
        println!("Database:      {}", storage.path().display());
        println!("Notes:         {}", stats.total_notes);
        match &pinned {
            Some(note) => println!("Pinned:        {} ({})", note.display_title(), note.id),
            None => println!("Pinned:        none"),
        }
        if let Some(newest) = stats.newest_note {
            println!("Newest:        {}", newest.format("%Y-%m-%d %H:%M"));
        }
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!(
                    "  Clear pins on start: {}",
                    config.storage.clear_pins_on_start
                );
                println!();
                println!("[Windows]");
                println!(
                    "  Main:               {}x{}",
                    config.windows.main.width, config.windows.main.height
                );
                println!(
                    "  Pinned:             {}x{} at opacity {}",
                    config.windows.pinned.width,
                    config.windows.pinned.height,
                    config.windows.pinned.opacity
                );
                println!();
                println!("[Editor]");
                println!("  Debounce (ms):      {}", config.editor.debounce_ms);
                println!("  Opacity step:       {}", config.editor.opacity_step);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => validate_config(file),
    }
    Ok(())
}

fn validate_config(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

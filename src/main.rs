use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notekeeper::{
    Backend, KeyValueStore, ListQuery, Note, NoteDraft, NoteId, NoteUpdate, NotesService, Served,
    config, logging, parse_tag_list, utils,
};

/// notekeeper - notes with tags, stored remotely when configured, locally otherwise
#[derive(Parser)]
#[command(name = "notekeeper")]
#[command(about = "Manage short tagged notes")]
#[command(version)]
struct Cli {
    /// Ignore remote configuration and use only the local store
    #[arg(long, global = true)]
    local_only: bool,

    /// Path of the local store file
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// List notes, most recently updated first
    List(ListCommand),
    /// Create a note
    Add(AddCommand),
    /// Change fields of an existing note
    Edit(EditCommand),
    /// Delete a note
    Delete(DeleteCommand),
    /// List every tag in use
    Tags,
}

/// List notes
#[derive(Parser)]
struct ListCommand {
    /// Only notes whose title or content contains this text (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,

    /// Only notes carrying this tag (case-insensitive)
    #[arg(short, long)]
    tag: Option<String>,

    /// Print notes as JSON
    #[arg(long)]
    json: bool,
}

/// Create a note
#[derive(Parser)]
struct AddCommand {
    /// Title of the note (defaults to "Untitled")
    #[arg(value_name = "TITLE")]
    title: Option<String>,

    /// Body text
    #[arg(short, long)]
    content: Option<String>,

    /// Comma-separated tags to apply to the note
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,
}

/// Edit a note
#[derive(Parser)]
struct EditCommand {
    /// Id of the note to change
    #[arg(value_name = "ID")]
    id: String,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New body text
    #[arg(short, long)]
    content: Option<String>,

    /// New comma-separated tags (replaces the existing set)
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,
}

/// Delete a note
#[derive(Parser)]
struct DeleteCommand {
    /// Id of the note to delete
    #[arg(value_name = "ID")]
    id: String,
}

/// Failure the user can act on, reported with exit code 1.
#[derive(Debug, thiserror::Error)]
enum UserError {
    #[error("Note not found: {0}")]
    NotFound(NoteId),
    #[error("Note {0} was not deleted")]
    NotDeleted(NoteId),
    #[error("Nothing to change: pass --title, --content or --tags")]
    NothingToChange,
}

fn main() {
    config::load_dotenv();
    logging::init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let store = utils::open_store(cli.store.as_deref())?;
    let service = if cli.local_only {
        NotesService::local_only(store)
    } else {
        NotesService::new(store)
    };

    match &cli.command {
        Commands::List(cmd) => handle_list(cmd, &service),
        Commands::Add(cmd) => handle_add(cmd, &service),
        Commands::Edit(cmd) => handle_edit(cmd, &service),
        Commands::Delete(cmd) => handle_delete(cmd, &service),
        Commands::Tags => handle_tags(&service),
    }
}

/// Determines if an error is a user error (vs internal error).
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<UserError>().is_some()
}

fn handle_list<S: KeyValueStore>(cmd: &ListCommand, service: &NotesService<S>) -> Result<()> {
    let query = ListQuery {
        search: cmd.search.clone().unwrap_or_default(),
        tag: cmd.tag.clone().unwrap_or_default(),
    };
    let notes = report(service.list(&query));

    if cmd.json {
        let json = serde_json::to_string_pretty(&notes).context("Failed to encode notes")?;
        println!("{json}");
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes found");
    }
    for note in &notes {
        println!("{}", format_note_line(note));
    }
    Ok(())
}

fn handle_add<S: KeyValueStore>(cmd: &AddCommand, service: &NotesService<S>) -> Result<()> {
    let mut draft = NoteDraft::new();
    if let Some(title) = &cmd.title {
        draft = draft.title(title.clone());
    }
    if let Some(content) = &cmd.content {
        draft = draft.content(content.clone());
    }
    if let Some(tags) = &cmd.tags {
        draft = draft.tags(parse_tag_list(tags));
    }

    let note = report(service.create(draft));

    print!("Note created (id: {})", note.id);
    if !note.tags.is_empty() {
        print!(" with tags: {}", note.tags.join(", "));
    }
    println!();
    Ok(())
}

fn handle_edit<S: KeyValueStore>(cmd: &EditCommand, service: &NotesService<S>) -> Result<()> {
    let id = NoteId::new(cmd.id.clone());
    let update = NoteUpdate {
        title: cmd.title.clone(),
        content: cmd.content.clone(),
        tags: cmd.tags.as_deref().map(parse_tag_list),
    };
    if update.is_empty() {
        return Err(UserError::NothingToChange.into());
    }

    let note = report(service.update(&id, &update)).ok_or(UserError::NotFound(id))?;
    println!("Note updated: {}", format_note_line(&note));
    Ok(())
}

fn handle_delete<S: KeyValueStore>(cmd: &DeleteCommand, service: &NotesService<S>) -> Result<()> {
    let id = NoteId::new(cmd.id.clone());
    if !report(service.delete(&id)) {
        return Err(UserError::NotDeleted(id).into());
    }
    println!("Note deleted: {id}");
    Ok(())
}

fn handle_tags<S: KeyValueStore>(service: &NotesService<S>) -> Result<()> {
    let tags = report(service.list_all_tags());
    if tags.is_empty() {
        println!("No tags yet");
    }
    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}

/// Unwraps a facade result, noting on stderr when the local fallback answered.
fn report<T>(served: Served<T>) -> T {
    if served.backend() == Backend::Fallback {
        eprintln!("Remote unavailable; used local store");
    }
    served.into_value()
}

/// One-line summary: id, last update, title and tags.
fn format_note_line(note: &Note) -> String {
    let mut line = format!(
        "{}  {}  {}",
        note.id,
        notekeeper::models::format_timestamp(note.updated_at),
        note.title
    );
    if !note.tags.is_empty() {
        line.push_str(&format!("  [{}]", note.tags.join(", ")));
    }
    line
}

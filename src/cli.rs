//! Command-line front end.
//!
//! Each subcommand drives the library the way a screen of the web UI would:
//! it loads what it needs, performs one operation, and prints the result.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{Category, Note, Tag};
use crate::search::{execute_search, parse_search_input, SearchCriteria};
use crate::services::NotesClient;
use crate::sync::{HeldCollection, NoteStats};

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage notes stored behind the notes API", long_about = None)]
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Directory holding config.json (defaults to the platform config dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Override the API base URL for this run
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all notes
    List {
        /// Print notes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one note
    Show {
        #[arg(value_name = "NOTE_ID")]
        note_id: i64,
    },

    /// Create a note
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Tag name, repeatable
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
        #[arg(long, value_name = "CATEGORY_ID")]
        category_id: Option<i64>,
    },

    /// Edit a note's title or content
    Update {
        #[arg(value_name = "NOTE_ID")]
        note_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },

    /// Delete a note
    Delete {
        #[arg(value_name = "NOTE_ID")]
        note_id: i64,
    },

    /// Search notes by tags, else category, else title
    Search {
        /// Free text; `tag:NAME` and `category:NAME` words are recognized
        #[arg(value_name = "QUERY")]
        query: Vec<String>,
        /// Tag name, repeatable; any tag matches
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Print notes as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tags
    Tags,

    /// Create a custom tag
    TagCreate {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a custom tag
    TagDelete {
        #[arg(value_name = "TAG_ID")]
        tag_id: i64,
    },

    /// List categories
    Categories,

    /// Show note statistics
    Stats,

    /// Check whether the API is reachable
    Health,
}

/// Attach tags by name, reusing the server's tag when one has that name.
fn attach_named_tags(draft: &mut Note, known: &[Tag], names: &[String]) {
    for name in names {
        let name = name.trim();
        match known.iter().find(|t| t.name == name) {
            Some(tag) => {
                draft.attach_tag(tag.clone());
            }
            None => {
                draft.add_tag(name);
            }
        }
    }
}

/// Combine the free-text query with explicit flags; flags win.
fn search_criteria(
    query: &[String],
    tags: Vec<String>,
    category: Option<String>,
    title: Option<String>,
) -> SearchCriteria {
    let mut criteria = parse_search_input(&query.join(" "));
    criteria.tags.extend(tags);
    if category.is_some() {
        criteria.category = category;
    }
    if title.is_some() {
        criteria.title = title;
    }
    criteria
}

fn print_notes(notes: &[Note], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(notes)?);
        return Ok(());
    }
    if notes.is_empty() {
        println!("No notes found");
    }
    for note in notes {
        print_note_line(note);
    }
    Ok(())
}

fn print_note_line(note: &Note) {
    let id = note.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    let category = note.category_name().unwrap_or("");
    let tags = note.tag_names().join(",");
    println!("{}\t{}\t[{}]\t{}", id, note.title, tags, category);
}

fn print_tags(tags: &[Tag]) {
    for tag in tags {
        let id = tag.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        let kind = if tag.is_system_tag { "system" } else { "custom" };
        println!("{}\t{}\t{}", id, tag.name, kind);
    }
}

fn print_categories(categories: &[Category]) {
    for category in categories {
        println!(
            "{}\t{}\t{}",
            category.id,
            category.name,
            category.description.as_deref().unwrap_or("")
        );
    }
}

fn print_stats(stats: &NoteStats) {
    println!("Total notes:     {}", stats.total);
    println!("Recent notes:    {}", stats.recent);
    println!("Categories used: {}", stats.categories);
}

pub async fn run(args: Args) -> Result<()> {
    debug!(?args, "Starting notes with arguments");

    let mut config = Config::new(args.config_dir.clone()).context("Failed to load configuration")?;
    if let Some(url) = &args.base_url {
        config.override_base_url(url);
    }
    info!(base_url = config.base_url(), "Using notes API");

    let client = NotesClient::new(&config)?;

    match args.command {
        Command::List { json } => {
            let notes = client.notes.list_all().await?;
            print_notes(&notes, json)?;
        }
        Command::Show { note_id } => {
            let note = client.notes.get_by_id(note_id).await?;
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        Command::Create {
            title,
            content,
            tags,
            category_id,
        } => {
            let (known, categories) = client.load_reference_data().await?;
            let category = match category_id {
                Some(id) => match categories.into_iter().find(|c| c.id == id) {
                    Some(category) => Some(category),
                    None => bail!("No category with id {}", id),
                },
                None => None,
            };
            let mut draft = Note::new(title, content).with_category(category);
            attach_named_tags(&mut draft, &known, &tags);
            let mut notes: HeldCollection<Note> = HeldCollection::new(config.insert_position());
            let created = notes.create(&client.notes, &draft).await?;
            print_note_line(&created);
        }
        Command::Update {
            note_id,
            title,
            content,
        } => {
            if title.is_none() && content.is_none() {
                bail!("Nothing to update: pass --title and/or --content");
            }
            let mut note = client.notes.get_by_id(note_id).await?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = content {
                note.content = content;
            }
            let updated = client.notes.update(&note).await?;
            print_note_line(&updated);
        }
        Command::Delete { note_id } => {
            client.notes.delete(note_id).await?;
            println!("Deleted note {}", note_id);
        }
        Command::Search {
            query,
            tags,
            category,
            title,
            json,
        } => {
            let criteria = search_criteria(&query, tags, category, title);
            let notes = execute_search(&client.notes, &criteria).await?;
            print_notes(&notes, json)?;
        }
        Command::Tags => {
            let tags = client.tags.list_all().await;
            print_tags(&tags);
        }
        Command::TagCreate { name } => {
            let tag = client.tags.create_custom(&name).await?;
            print_tags(std::slice::from_ref(&tag));
        }
        Command::TagDelete { tag_id } => {
            let tag = client.tags.get_by_id(tag_id).await?;
            if !tag.is_deletable() {
                bail!("Tag '{}' is a system tag and cannot be deleted", tag.name);
            }
            client.tags.delete_by_id(tag_id).await?;
            println!("Deleted tag {}", tag.name);
        }
        Command::Categories => {
            let categories = client.categories.list_all().await?;
            print_categories(&categories);
        }
        Command::Stats => {
            let mut notes: HeldCollection<Note> = HeldCollection::new(config.insert_position());
            notes.refresh(&client.notes).await?;
            print_stats(&notes.stats());
            println!();
            println!("Recent:");
            for note in notes.recent() {
                print_note_line(note);
            }
        }
        Command::Health => {
            let monitor = client.health_monitor(&config);
            match monitor.check().await {
                Some(status) => println!("Backend status: {:?}", status),
                None => println!("Backend status: {:?}", monitor.status()),
            }
        }
    }

    Ok(())
}

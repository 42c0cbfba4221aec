use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use crate::config::AppConfig;
use crate::draft::EssayDraft;
use crate::export;
use crate::remote::{filter_synonyms, EssayModel, RemoteClient};
use crate::storage::{EssayRecord, EssayStore};

/// Fixed user-visible strings for remote failures. No distinction is made
/// between timeouts, transport errors and server errors.
pub const ARGUMENT_FAILURE_NOTICE: &str = "Could not generate arguments. Try again.";
pub const SYNONYM_FAILURE_NOTICE: &str = "Could not load the synonym dictionary. Try again.";
pub const MODEL_FAILURE_NOTICE: &str = "Could not load essay models. Try again.";

const UNTITLED_PLACEHOLDER: &str = "<untitled>";
const SNIPPET_LINES: usize = 3;
const SNIPPET_MAX_CHARS: usize = 160;

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the essay (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the essay body inline. If omitted, reads from stdin.
    #[arg(long)]
    pub body: Option<String>,
    /// Pre-fill the draft from a remote essay model
    #[arg(long)]
    pub model: Option<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Essay identifier
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Essay identifier
    pub id: String,
    /// New title (kept unchanged if omitted)
    #[arg(long)]
    pub title: Option<String>,
    /// New body. If omitted, reads from stdin when piped; kept otherwise.
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Essay identifier
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Essay identifier
    pub id: String,
    /// Destination directory (defaults to the configured export directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ArgumentArgs {
    /// Topic to generate arguments for
    #[arg()]
    pub topic: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SynonymArgs {
    /// Substring filter applied to the fetched dictionary
    #[arg()]
    pub filter: Option<String>,
}

pub fn list_essays(store: &EssayStore) -> Result<()> {
    print!("{}", format_essay_list(&store.list_recent_first()));
    Ok(())
}

pub fn new_essay(config: Arc<AppConfig>, store: EssayStore, args: NewArgs) -> Result<()> {
    let mut draft = match args.model {
        Some(model_id) => {
            let client = RemoteClient::new(&config.remote)?;
            let model = fetch_model(&client, model_id)?;
            EssayDraft::with_template(&model.title, &model.body)
        }
        None => EssayDraft::new(),
    };

    if let Some(title) = args.title {
        draft.set_title(title.trim());
    } else if draft.title().is_empty() {
        draft.set_title(prompt("Title")?.trim());
    }

    let body = match args.body {
        Some(body) => Some(body),
        None => read_stdin()?,
    };
    if let Some(body) = body {
        if let Some(notice) = draft.set_body(&body) {
            eprintln!("{notice}");
        }
    }

    let outcome = draft.save(&store)?;
    println!("Saved essay {}", outcome.record().id);
    Ok(())
}

pub fn show_essay(store: &EssayStore, args: ShowArgs) -> Result<()> {
    let record = fetch_essay(store, &args.id)?;
    println!("{}", display_title(&record));
    println!();
    println!("{}", record.body);
    Ok(())
}

pub fn edit_essay(store: &EssayStore, args: EditArgs) -> Result<()> {
    let record = fetch_essay(store, &args.id)?;
    let mut draft = EssayDraft::for_record(&record);

    if let Some(title) = args.title {
        draft.set_title(title.trim());
    }
    let body = match args.body {
        Some(body) => Some(body),
        None => read_stdin()?,
    };
    if let Some(body) = body {
        if let Some(notice) = draft.set_body(&body) {
            eprintln!("{notice}");
        }
    }

    let outcome = draft.save(store)?;
    println!("Updated essay {}", outcome.record().id);
    Ok(())
}

pub fn delete_essay(store: &EssayStore, args: DeleteArgs) -> Result<()> {
    if !store.remove(&args.id).context("removing essay")? {
        bail!("essay {} not found", args.id);
    }
    println!("Deleted essay {}", args.id);
    Ok(())
}

pub fn export_essay(config: Arc<AppConfig>, store: &EssayStore, args: ExportArgs) -> Result<()> {
    let record = fetch_essay(store, &args.id)?;
    let dir = args
        .dir
        .unwrap_or_else(|| config.export.export_dir.clone());
    let path = export::export_essay(&record, &dir)
        .with_context(|| format!("exporting essay {}", args.id))?;
    println!("Exported essay {} to {}", args.id, path.display());
    Ok(())
}

pub fn generate_arguments(config: Arc<AppConfig>, args: ArgumentArgs) -> Result<()> {
    let topic = args.topic.join(" ").trim().to_string();
    if topic.is_empty() {
        bail!("please provide a topic");
    }
    let client = RemoteClient::new(&config.remote)?;
    println!("Generating arguments...");
    let text = run_arguments(&client, &topic)?;
    println!("{text}");
    Ok(())
}

pub fn lookup_synonyms(config: Arc<AppConfig>, args: SynonymArgs) -> Result<()> {
    let client = RemoteClient::new(&config.remote)?;
    let output = run_synonyms(&client, args.filter.as_deref().unwrap_or(""))?;
    print!("{output}");
    Ok(())
}

pub fn list_models(config: Arc<AppConfig>) -> Result<()> {
    let client = RemoteClient::new(&config.remote)?;
    print!("{}", run_models(&client)?);
    Ok(())
}

fn run_arguments(client: &RemoteClient, topic: &str) -> Result<String> {
    client.generate_arguments(topic).map_err(|err| {
        tracing::warn!(%err, "argument generation failed");
        anyhow!(ARGUMENT_FAILURE_NOTICE)
    })
}

fn run_synonyms(client: &RemoteClient, filter: &str) -> Result<String> {
    let entries = client.fetch_synonyms().map_err(|err| {
        tracing::warn!(%err, "synonym lookup failed");
        anyhow!(SYNONYM_FAILURE_NOTICE)
    })?;

    let hits = filter_synonyms(&entries, filter);
    if hits.is_empty() {
        return Ok("No synonyms matched.\n".to_string());
    }
    let mut out = String::new();
    for (word, entry) in hits {
        let _ = writeln!(&mut out, "{word}: {}", entry.sinonimos.join(", "));
    }
    Ok(out)
}

fn run_models(client: &RemoteClient) -> Result<String> {
    let models = client.fetch_models().map_err(|err| {
        tracing::warn!(%err, "model listing failed");
        anyhow!(MODEL_FAILURE_NOTICE)
    })?;

    if models.is_empty() {
        return Ok("No essay models available.\n".to_string());
    }
    let mut out = String::new();
    for model in models {
        let _ = writeln!(&mut out, "#{}  {}", model.id, model.title);
    }
    Ok(out)
}

fn fetch_model(client: &RemoteClient, model_id: i64) -> Result<EssayModel> {
    let models = client.fetch_models().map_err(|err| {
        tracing::warn!(%err, "model fetch failed");
        anyhow!(MODEL_FAILURE_NOTICE)
    })?;
    models
        .into_iter()
        .find(|model| model.id == model_id)
        .ok_or_else(|| anyhow!("essay model {model_id} not found"))
}

fn fetch_essay(store: &EssayStore, id: &str) -> Result<EssayRecord> {
    store
        .fetch(id)
        .context("reading essay store")?
        .ok_or_else(|| anyhow!("essay {id} not found"))
}

fn format_essay_list(records: &[EssayRecord]) -> String {
    if records.is_empty() {
        return "No essays saved yet.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(&mut out, "{}  {}", record.id, display_title(record));
        if let Some(snippet) = build_snippet(record) {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    out
}

fn display_title(record: &EssayRecord) -> &str {
    let trimmed = record.title.trim();
    if trimmed.is_empty() {
        UNTITLED_PLACEHOLDER
    } else {
        trimmed
    }
}

fn build_snippet(record: &EssayRecord) -> Option<String> {
    let mut segments = Vec::new();
    for line in record.body.lines().take(SNIPPET_LINES) {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            segments.push(trimmed.to_string());
        }
    }
    if segments.is_empty() {
        None
    } else {
        let snippet = segments.join(" ");
        Some(snippet.chars().take(SNIPPET_MAX_CHARS).collect())
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

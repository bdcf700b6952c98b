//! Interactive chat loop.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use quill_chat::{ChatError, ChatService, GenerationOptions, StreamEvent};
use quill_model::ChatClient;
use quill_rag::{FastembedEmbedder, ModelProvider, RagError};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use crate::settings::Settings;

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const HELP: &str = "\
Commands:
  /new [name]        create a session and switch to it
  /sessions          list sessions
  /switch <n>        switch to session number n
  /rename <name>     rename the current session
  /duplicate         copy the current session and switch to the copy
  /delete            delete the current session
  /attach <path>     upload a document (.txt, .md, .text, .pdf) into this session
  /detach            remove the uploaded document
  /system [prompt]   show or replace the system prompt
  /clear             clear the conversation history
  /stats             show conversation statistics
  /export [path]     export the session as JSON (stdout without a path)
  /import <path>     import a session from JSON
  /help              show this help
  /quit              exit
Anything else is sent to the model.";

pub async fn run(settings: Settings) -> Result<()> {
    let client = ChatClient::builder(settings.api_key.clone())
        .with_base_url(settings.base_url.clone())
        .with_timeout(Duration::from_secs(settings.request_timeout))
        .build()
        .context("failed to build API client")?;

    let options = GenerationOptions {
        model: settings.model.clone(),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        top_p: settings.top_p,
        thinking: !settings.no_thinking,
    };

    let embedder = Arc::new(FastembedEmbedder::new(Arc::new(ModelProvider::new())));
    let mut service = ChatService::new(
        client,
        options,
        settings.chunk_size,
        settings.chunk_overlap,
        settings.top_k,
        embedder,
    )?;

    // Set once both model loads have failed; retrieval stays off for the
    // rest of the run instead of retrying per upload.
    let mut rag_unavailable = false;

    let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
    println!("quill — model {} (/help for commands)", settings.model);

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("read error"),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if let Some(command) = line.strip_prefix('/') {
            match run_command(&mut service, command, &mut rag_unavailable) {
                Ok(ControlFlow::Continue) => continue,
                Ok(ControlFlow::Quit) => break,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            }
        }

        chat_turn(&mut service, line).await;
    }

    println!("bye");
    Ok(())
}

enum ControlFlow {
    Continue,
    Quit,
}

async fn chat_turn(service: &mut ChatService, content: &str) {
    let mut in_thinking = false;
    let result = service
        .stream_turn(content, |event| {
            match event {
                StreamEvent::Thinking(delta) => {
                    if !in_thinking {
                        print!("{DIM}");
                        in_thinking = true;
                    }
                    print!("{delta}");
                }
                StreamEvent::Content(delta) => {
                    if in_thinking {
                        print!("{RESET}\n\n");
                        in_thinking = false;
                    }
                    print!("{delta}");
                }
            }
            let _ = std::io::stdout().flush();
        })
        .await;

    if in_thinking {
        print!("{RESET}");
    }
    println!();

    if let Err(error) = result {
        eprintln!("request failed: {error}");
    }
}

fn run_command(
    service: &mut ChatService,
    command: &str,
    rag_unavailable: &mut bool,
) -> Result<ControlFlow> {
    let (name, arg) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "help" => println!("{HELP}"),
        "quit" | "exit" => return Ok(ControlFlow::Quit),
        "new" => {
            let name = (!arg.is_empty()).then(|| arg.to_string());
            let id = service.sessions.create_session(name).id;
            service.sessions.switch(id)?;
            println!("switched to new session '{}'", service.sessions.current().name);
        }
        "sessions" => {
            let current = service.sessions.current().id;
            for (i, session) in service.sessions.list().iter().enumerate() {
                let marker = if session.id == current { "*" } else { " " };
                let doc = session
                    .document_name
                    .as_deref()
                    .map(|d| format!("  [doc: {d}]"))
                    .unwrap_or_default();
                println!(
                    "{marker} {}. {}  ({} messages){doc}",
                    i + 1,
                    session.name,
                    session.messages.len()
                );
            }
        }
        "switch" => {
            let index: usize = arg.parse().context("usage: /switch <number>")?;
            let id = service
                .sessions
                .list()
                .get(index.wrapping_sub(1))
                .map(|s| s.id)
                .with_context(|| format!("no session number {index}"))?;
            service.sessions.switch(id)?;
            println!("switched to '{}'", service.sessions.current().name);
        }
        "rename" => {
            anyhow::ensure!(!arg.is_empty(), "usage: /rename <name>");
            let id = service.sessions.current().id;
            service.sessions.rename(id, arg)?;
            println!("renamed to '{arg}'");
        }
        "duplicate" => {
            let id = service.sessions.current().id;
            let copy =
                service.sessions.duplicate(id).map(|s| s.id).context("nothing to duplicate")?;
            service.sessions.switch(copy)?;
            println!("now in '{}'", service.sessions.current().name);
        }
        "delete" => {
            let id = service.sessions.current().id;
            service.sessions.delete(id);
            println!("deleted; now in '{}'", service.sessions.current().name);
        }
        "attach" => {
            anyhow::ensure!(!arg.is_empty(), "usage: /attach <path>");
            if *rag_unavailable {
                eprintln!("document retrieval is unavailable for this run");
                return Ok(ControlFlow::Continue);
            }
            let path = Path::new(arg);
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let filename =
                path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

            match service.attach_document(&bytes, &filename) {
                Ok(chunks) => println!("indexed '{filename}' ({chunks} chunks)"),
                Err(ChatError::Rag(RagError::ModelLoad(reason))) => {
                    *rag_unavailable = true;
                    warn!(%reason, "embedding models unavailable");
                    eprintln!("document retrieval is unavailable (embedding model failed to load)");
                }
                Err(ChatError::Rag(e)) if e.is_document_error() => {
                    eprintln!("could not process '{filename}': {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
        "detach" => {
            service.detach_document();
            println!("document removed");
        }
        "system" => {
            if arg.is_empty() {
                println!("{}", service.sessions.current().system_prompt);
            } else {
                service.set_system_prompt(arg);
                println!("system prompt updated");
            }
        }
        "clear" => {
            service.clear_conversation();
            println!("history cleared");
        }
        "stats" => {
            let stats = service.stats();
            println!(
                "{} messages ({} user, {} assistant), {} characters",
                stats.total_messages,
                stats.user_messages,
                stats.assistant_messages,
                stats.total_characters
            );
        }
        "export" => {
            let id = service.sessions.current().id;
            let json = service.sessions.export(id)?;
            if arg.is_empty() {
                println!("{json}");
            } else {
                std::fs::write(arg, json).with_context(|| format!("failed to write {arg}"))?;
                println!("exported to {arg}");
            }
        }
        "import" => {
            anyhow::ensure!(!arg.is_empty(), "usage: /import <path>");
            let json = std::fs::read_to_string(arg)
                .with_context(|| format!("failed to read {arg}"))?;
            let id = service.sessions.import(&json)?.id;
            service.sessions.switch(id)?;
            println!("imported; switched to '{}'", service.sessions.current().name);
        }
        other => eprintln!("unknown command '/{other}' (try /help)"),
    }

    Ok(ControlFlow::Continue)
}

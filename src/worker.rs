use crate::api::Backend;
use crate::clipboard::Clipboard;
use crate::panel::{Command, Event};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// One task per command; overlapping translations are not serialized.
pub fn spawn(
    backend: Arc<dyn Backend>,
    clipboard: Arc<dyn Clipboard>,
    events: Sender<Event>,
    notify: impl Fn() + Send + Sync + 'static,
) -> anyhow::Result<Sender<Command>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let (tx, rx) = crossbeam_channel::unbounded::<Command>();
    let notify: Arc<dyn Fn() + Send + Sync> = Arc::new(notify);

    thread::Builder::new()
        .name("translator-io".to_string())
        .spawn(move || run(rt, rx, backend, clipboard, events, notify))?;
    Ok(tx)
}

fn run(
    rt: tokio::runtime::Runtime,
    rx: Receiver<Command>,
    backend: Arc<dyn Backend>,
    clipboard: Arc<dyn Clipboard>,
    events: Sender<Event>,
    notify: Arc<dyn Fn() + Send + Sync>,
) {
    tracing::info!("Worker: started");
    while let Ok(cmd) = rx.recv() {
        let backend = Arc::clone(&backend);
        let clipboard = Arc::clone(&clipboard);
        let events = events.clone();
        let notify = Arc::clone(&notify);
        rt.spawn(async move {
            let event = execute(cmd, backend, clipboard).await;
            if events.send(event).is_err() {
                tracing::warn!("Worker: UI gone, dropping event");
                return;
            }
            notify();
        });
    }
    tracing::info!("Worker: command channel closed");
}

async fn execute(cmd: Command, backend: Arc<dyn Backend>, clipboard: Arc<dyn Clipboard>) -> Event {
    match cmd {
        Command::Translate(request) => Event::Translated(backend.translate(&request).await),
        Command::FetchExamples => Event::ExamplesLoaded(backend.examples().await),
        Command::CheckHealth => Event::Health(backend.health().await),
        Command::CopyText(text) => {
            let res = tokio::task::spawn_blocking(move || clipboard.write_text(&text)).await;
            Event::Copied(res.unwrap_or_else(|e| {
                Err(crate::clipboard::ClipboardError::new(format!("clipboard task failed: {}", e)))
            }))
        }
    }
}

#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use once_cell::sync::OnceCell;
use std::sync::Arc;

mod api;
mod clipboard;
mod config;
mod logger;
mod panel;
mod ui;
mod worker;

fn main() -> anyhow::Result<()> {
    // Init logger first
    logger::init();
    tracing::info!("App starting");

    // config.json next to the exe, then TRANSLATOR_* env overrides
    let cfg = config::Config::load();
    tracing::info!("Backend: {} (beams={}, preserve_numbers={})", cfg.backend_url, cfg.num_beams, cfg.preserve_numbers);

    let backend = Arc::new(api::HttpBackend::new(cfg.backend_url.clone()));
    let repaint: Arc<OnceCell<eframe::egui::Context>> = Arc::new(OnceCell::new());
    let (event_tx, event_rx) = crossbeam_channel::unbounded();

    // Owns the platform clipboard for the whole session so copied text stays pasteable
    let system_clipboard = Arc::new(clipboard::SystemClipboard::new()?);

    // Background: I/O worker wakes the UI whenever an outcome is ready
    let commands = {
        let repaint = Arc::clone(&repaint);
        worker::spawn(backend, system_clipboard, event_tx, move || {
            if let Some(ctx) = repaint.get() {
                ctx.request_repaint();
            }
        })?
    };

    // Run UI on main thread (blocks)
    let res = ui::run(cfg, commands, event_rx, repaint);
    if let Err(e) = &res {
        tracing::error!("{:#}", e);
    }
    res
}

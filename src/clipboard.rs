use crossbeam_channel::Sender;
use std::thread;

#[derive(Debug, thiserror::Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(String);

impl ClipboardError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// A platform clipboard handle. On X11/Wayland the copied text only stays
/// pasteable while the handle that set it is alive.
trait TextSink {
    fn set_text(&mut self, text: String) -> Result<(), ClipboardError>;
}

#[cfg(not(windows))]
impl TextSink for arboard::Clipboard {
    fn set_text(&mut self, text: String) -> Result<(), ClipboardError> {
        arboard::Clipboard::set_text(self, text).map_err(|e| ClipboardError::new(e.to_string()))
    }
}

#[cfg(windows)]
struct WinClipboard;

#[cfg(windows)]
impl TextSink for WinClipboard {
    fn set_text(&mut self, text: String) -> Result<(), ClipboardError> {
        clipboard_win::set_clipboard_string(&text).map_err(|e| ClipboardError::new(e.to_string()))
    }
}

type WriteRequest = (String, Sender<Result<(), ClipboardError>>);

/// Serves writes from one thread that opens the sink once and keeps it until shutdown.
struct OwnedClipboard {
    requests: Sender<WriteRequest>,
}

impl OwnedClipboard {
    fn spawn<S, F>(mut open: F) -> std::io::Result<Self>
    where
        S: TextSink + 'static,
        F: FnMut() -> Result<S, ClipboardError> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded::<WriteRequest>();
        thread::Builder::new().name("clipboard-owner".to_string()).spawn(move || {
            let mut sink: Option<S> = None;
            while let Ok((text, reply)) = rx.recv() {
                let res = match sink.as_mut() {
                    Some(s) => s.set_text(text),
                    None => match open() {
                        Ok(s) => sink.insert(s).set_text(text),
                        Err(e) => Err(e),
                    },
                };
                let _ = reply.send(res);
            }
            tracing::info!("Clipboard owner: stopped");
        })?;
        Ok(Self { requests: tx })
    }
}

impl Clipboard for OwnedClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.requests
            .send((text.to_owned(), reply_tx))
            .map_err(|_| ClipboardError::new("clipboard thread stopped"))?;
        reply_rx
            .recv()
            .map_err(|_| ClipboardError::new("clipboard thread stopped"))?
    }
}

/// The host system clipboard.
pub struct SystemClipboard(OwnedClipboard);

impl SystemClipboard {
    pub fn new() -> std::io::Result<Self> {
        #[cfg(not(windows))]
        let owner = OwnedClipboard::spawn(|| {
            arboard::Clipboard::new().map_err(|e| ClipboardError::new(e.to_string()))
        })?;
        #[cfg(windows)]
        let owner = OwnedClipboard::spawn(|| Ok(WinClipboard))?;
        Ok(Self(owner))
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.0.write_text(text)
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every write; fails them all when `deny` is set.
    #[derive(Default)]
    pub struct RecordingClipboard {
        pub writes: Mutex<Vec<String>>,
        pub deny: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            self.writes.lock().unwrap().push(text.to_string());
            if self.deny {
                Err(ClipboardError::new("access denied"))
            } else {
                Ok(())
            }
        }
    }
}

//! Render injects: deferred output spliced into the next render pass.
//!
//! Injects are keyed by tag and matched by tag prefix. The engine flushes
//! `before:` tags at the start of a pass and `after:` tags at the end, and
//! `<division>:before:` / `<division>:after:` tags around that division's
//! own output. A flushed inject is consumed.

use std::fmt;

/// A deferred piece of output.
pub enum Inject {
    /// Literal output.
    Text(String),
    /// Produces output when flushed; `None` contributes nothing.
    Callback(Box<dyn FnOnce() -> Option<String>>),
}

impl Inject {
    /// Literal output.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Output computed at flush time.
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnOnce() -> Option<String> + 'static,
    {
        Self::Callback(Box::new(callback))
    }

    fn produce(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Callback(callback) => callback(),
        }
    }
}

impl fmt::Debug for Inject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Tagged injects in insertion order.
#[derive(Debug, Default)]
pub struct RenderInjects {
    entries: Vec<(String, Inject)>,
}

impl RenderInjects {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `inject` under `tag`, replacing any inject with the same tag
    /// in place.
    pub fn set(&mut self, tag: impl Into<String>, inject: Inject) {
        let tag = tag.into();
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| *t == tag) {
            entry.1 = inject;
        } else {
            self.entries.push((tag, inject));
        }
    }

    /// Whether an inject is queued under exactly `tag`.
    pub fn has(&self, tag: &str) -> bool {
        self.entries.iter().any(|(t, _)| t == tag)
    }

    /// Number of queued injects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume every inject whose tag starts with `prefix`, concatenating
    /// their output in insertion order.
    pub fn take(&mut self, prefix: &str) -> String {
        let mut out = String::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for (tag, inject) in self.entries.drain(..) {
            if tag.starts_with(prefix) {
                if let Some(text) = inject.produce() {
                    out.push_str(&text);
                }
            } else {
                kept.push((tag, inject));
            }
        }
        self.entries = kept;
        out
    }

    /// Drop every inject whose tag starts with `prefix` without running it.
    pub fn remove(&mut self, prefix: &str) {
        self.entries.retain(|(tag, _)| !tag.starts_with(prefix));
    }
}

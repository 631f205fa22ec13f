//! Consolidated, user-facing status message for one plan generation

#[derive(Debug, Default, Clone, PartialEq)]
pub struct StatusMessage {
    fragments: Vec<String>,
}

impl StatusMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment; blank fragments are ignored
    pub fn push(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.fragments.push(fragment.trim().to_string());
        }
    }

    /// Put a fragment in front of everything collected so far
    pub fn prepend(&mut self, fragment: impl Into<String>) {
        let fragment = fragment.into();
        if !fragment.trim().is_empty() {
            self.fragments.insert(0, fragment.trim().to_string());
        }
    }

    /// Render the message, `None` when nothing was collected
    #[must_use]
    pub fn render(&self) -> Option<String> {
        let message = self.fragments.join(" ");
        let message = message.trim();
        (!message.is_empty()).then(|| message.to_string())
    }
}

/// Terminate `text` with a full stop unless it already ends a sentence
#[must_use]
pub fn sentence(text: impl AsRef<str>) -> String {
    let text = text.as_ref().trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

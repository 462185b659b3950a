//! Provider-agnostic message layout produced by [`crate::builder::build`].
//! Cache breakpoints are side-annotations on the just-appended message, not
//! structural nodes — provider serializers decide whether to honor or drop
//! them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub cache_breakpoint: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), cache_breakpoint: false }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), cache_breakpoint: false }
    }

    pub fn with_cache_breakpoint(mut self) -> Self {
        self.cache_breakpoint = true;
        self
    }
}

/// The fully laid-out request, before provider-specific serialization.
#[derive(Debug, Clone, Default)]
pub struct BuiltRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

impl BuiltRequest {
    /// Marks the last message in the request as a cache breakpoint.
    pub fn mark_last_as_cache_breakpoint(&mut self) {
        if let Some(last) = self.messages.last_mut() {
            last.cache_breakpoint = true;
        }
    }
}

use async_trait::async_trait;
use thiserror::Error;

/// One entry of a quick-pick menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub detail: Option<String>,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
        }
    }

    pub fn with_detail(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: Some(detail.into()),
        }
    }
}

/// A prompt ended without producing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromptError {
    /// The user dismissed the prompt.
    #[error("prompt cancelled")]
    Cancelled,
}

/// Input validator: `Ok` accepts, `Err` carries the message the host shows
/// before re-prompting.
pub type InputValidator<'a> = &'a (dyn Fn(&str) -> Result<(), String> + Send + Sync);

/// The host editor's interactive prompts (quick-pick menus and input boxes).
///
/// Every call is a suspension point of the command flows; cancellation at any
/// of them aborts the whole flow with no persisted side effect.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Show a quick-pick over `options`. Hosts return the picked entry or
    /// [`PromptError::Cancelled`] when dismissed.
    async fn choose(&self, placeholder: &str, options: &[Choice]) -> Result<Choice, PromptError>;

    /// Show an input box. Hosts keep re-prompting while `validator` rejects,
    /// so a returned string always satisfies it.
    async fn input_text(
        &self,
        prompt: &str,
        validator: InputValidator<'_>,
    ) -> Result<String, PromptError>;
}

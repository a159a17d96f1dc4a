//! Prompt presentation seam.
//!
//! The policy never renders anything itself; it asks a `RatingPrompter` to
//! begin displaying the two-button prompt, and the user's answer comes back
//! later through `RatingPolicy::resolve`. The demo surface carries the prompt
//! text on the screen-resume response, so its prompter only logs.

use thiserror::Error;
use tracing::info;

pub const PROMPT_MESSAGE: &str = "Would you be so kind to leave us a rating pls? :)";
pub const STORE_MESSAGE: &str = "GO TO STORE! YEAH!";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt could not be displayed: {0}")]
    Display(String),
}

pub trait RatingPrompter: Send + Sync {
    /// Begins displaying the modal two-button prompt. Failure means the prompt
    /// was not shown this time; the policy retries on a later signal.
    fn present(&self, message: &str) -> Result<(), PromptError>;

    /// One-shot confirmation after an accepted prompt (a toast, conceptually).
    /// Recorded intent only; no store navigation happens.
    fn acknowledge(&self, message: &str);
}

/// Prompter for the HTTP demo surface: presentation is the response payload,
/// so showing and acknowledging reduce to log lines.
pub struct LogPrompter;

impl RatingPrompter for LogPrompter {
    fn present(&self, message: &str) -> Result<(), PromptError> {
        info!("rating prompt presented: {message}");
        Ok(())
    }

    fn acknowledge(&self, message: &str) {
        info!("{message}");
    }
}

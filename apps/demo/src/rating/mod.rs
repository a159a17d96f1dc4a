//! Rating prompt policy — the one-shot decision/recording state machine.
//!
//! `Idle → Eligible → Presenting → Resolved`. A lifecycle signal ("screen
//! became active") re-evaluates the availability guard plus the eligibility
//! source; both must be true for the prompt to go up. Accepting latches
//! `did_rating_popup` so the device is never prompted again; declining only
//! records the outcome, leaving the user re-promptable on a later occasion.

pub mod eligibility;
pub mod handlers;
pub mod prompt;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::guard;
use crate::keys;
use crate::prefs::LocalPrefs;
use crate::session::SessionTracker;
use eligibility::EligibilitySource;
use prompt::{RatingPrompter, PROMPT_MESSAGE, STORE_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    Idle,
    Eligible,
    Presenting,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptResponse {
    Accept,
    Decline,
}

pub struct RatingPolicy {
    session: Arc<SessionTracker>,
    prefs: Arc<dyn LocalPrefs>,
    eligibility: Arc<dyn EligibilitySource>,
    prompter: Arc<dyn RatingPrompter>,
    state: PolicyState,
}

impl RatingPolicy {
    pub fn new(
        session: Arc<SessionTracker>,
        prefs: Arc<dyn LocalPrefs>,
        eligibility: Arc<dyn EligibilitySource>,
        prompter: Arc<dyn RatingPrompter>,
    ) -> Self {
        Self {
            session,
            prefs,
            eligibility,
            prompter,
            state: PolicyState::Idle,
        }
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    /// Lifecycle signal: the surrounding screen became active.
    ///
    /// The guard and the eligibility source are sampled fresh on every signal;
    /// a negative result is never memoized.
    pub async fn on_screen_active(&mut self) -> PolicyState {
        self.eligibility.install().await;

        if self.state == PolicyState::Presenting {
            // Still waiting on the user's answer.
            return self.state;
        }
        if !guard::available(&self.session, self.prefs.as_ref())
            || !self.eligibility.is_eligible().await
        {
            return self.state;
        }

        self.state = PolicyState::Eligible;
        match self.prompter.present(PROMPT_MESSAGE) {
            Ok(()) => self.state = PolicyState::Presenting,
            Err(e) => {
                // Not shown this time; the next lifecycle signal retries.
                warn!("rating prompt skipped: {e}");
                self.state = PolicyState::Idle;
            }
        }
        self.state
    }

    /// Lifecycle signal: the surrounding screen was hidden.
    pub fn on_screen_hidden(&mut self) {
        self.eligibility.teardown();
    }

    /// The user's answer to a presented prompt. Responses arriving in any
    /// other state are ignored.
    pub async fn resolve(&mut self, response: PromptResponse) -> PolicyState {
        if self.state != PolicyState::Presenting {
            debug!("ignoring rating response in state {:?}", self.state);
            return self.state;
        }

        if let Some(handle) = self.session.record_handle() {
            let observed = match response {
                PromptResponse::Accept => 1.0,
                PromptResponse::Decline => 0.0,
            };
            if let Err(e) = handle.set(keys::OBSERVED, observed).await {
                debug!("observed write dropped: {e}");
            }
        }

        match response {
            PromptResponse::Accept => {
                self.prefs.set_bool(keys::PREF_DID_RATING_POPUP, true);
                self.prompter.acknowledge(STORE_MESSAGE);
            }
            PromptResponse::Decline => {
                // No local latch on decline: the user may be asked again on a
                // later eligible occasion.
            }
        }

        self.state = PolicyState::Resolved;
        self.state
    }
}

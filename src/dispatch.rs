//! Event dispatcher — routes inbound updates through the session store and
//! the state machine, and executes the resulting effects.
//!
//! Menu-entry commands work unconditionally; anything else is meaningful
//! only against an existing session. Each update is handled in its own
//! task, with an outermost catch that logs and sends a best-effort generic
//! notice instead of crashing the process.

use std::sync::Arc;

use futures::StreamExt;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

use crate::config::{AGENT_CONTACT, WEBSITE_URL};
use crate::dialog::machine::{self, Event, Outcome};
use crate::dialog::state::{Flow, SearchState};
use crate::error::Result;
use crate::listings::model::{FilterSet, Listing};
use crate::listings::repo::ListingRepository;
use crate::outbound::{CallbackAction, Keyboard, Outbound, menu};
use crate::pager;
use crate::session::SessionStore;
use crate::telegram::{Incoming, IncomingKind, UpdateStream};

const WELCOME: &str =
    "Welcome to Dubai Property Bot! 🌆\nFind your perfect home or list your property with us.";
const GENERIC_ERROR: &str = "An error occurred. Please try again or contact support.";

pub struct Dispatcher {
    sessions: Arc<SessionStore>,
    repo: Arc<dyn ListingRepository>,
    out: Arc<dyn Outbound>,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionStore>,
        repo: Arc<dyn ListingRepository>,
        out: Arc<dyn Outbound>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            repo,
            out,
        })
    }

    /// Consume the update stream until a termination signal arrives.
    pub async fn run(self: Arc<Self>, mut updates: UpdateStream) {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                    break;
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                maybe = updates.next() => {
                    let Some(incoming) = maybe else {
                        warn!("Update stream closed");
                        break;
                    };
                    let this = Arc::clone(&self);
                    tokio::spawn(async move { this.dispatch(incoming).await });
                }
            }
        }
    }

    /// Outermost handler boundary: nothing below may take the process down.
    async fn dispatch(&self, incoming: Incoming) {
        let chat_id = incoming.chat_id;
        if let Err(e) = self.handle(incoming).await {
            error!(chat_id, error = %e, "Update handler failed");
            let _ = self.out.send_text(chat_id, GENERIC_ERROR, &Keyboard::None).await;
        }
    }

    /// Handle one inbound event.
    pub async fn handle(&self, incoming: Incoming) -> Result<()> {
        let Incoming {
            user_id,
            chat_id,
            kind,
        } = incoming;

        match kind {
            IncomingKind::Text(text) => self.handle_text(user_id, chat_id, text).await,
            IncomingKind::Photo(file_id) => self.handle_photo(user_id, chat_id, file_id).await,
            IncomingKind::Callback { id, data } => {
                let result = self.handle_callback(user_id, chat_id, &data).await;
                // Callbacks are acknowledged even on error paths.
                if let Err(e) = self.out.answer_callback(&id).await {
                    warn!(chat_id, error = %e, "Failed to acknowledge callback");
                }
                result
            }
        }
    }

    async fn handle_text(&self, user_id: i64, chat_id: i64, text: String) -> Result<()> {
        match text.as_str() {
            "/start" => {
                self.out.send_text(chat_id, WELCOME, &Keyboard::Main).await?;
                Ok(())
            }
            menu::UPLOAD => {
                info!(user_id, "Upload flow started");
                self.sessions.set(user_id, Flow::upload_start()).await;
                self.send_reply(chat_id, machine::upload_entry_reply()).await
            }
            menu::SEARCH => {
                info!(user_id, "Search flow started");
                self.sessions.set(user_id, Flow::search_start()).await;
                self.send_reply(chat_id, machine::search_entry_reply()).await
            }
            menu::WEBSITE => {
                self.out
                    .send_text(
                        chat_id,
                        &format!("Visit our website: {WEBSITE_URL}"),
                        &Keyboard::None,
                    )
                    .await?;
                Ok(())
            }
            menu::CONTACT_AGENT => {
                self.out
                    .send_text(
                        chat_id,
                        &format!("Contact our agent via WhatsApp: {AGENT_CONTACT}"),
                        &Keyboard::None,
                    )
                    .await?;
                Ok(())
            }
            menu::BACK_TO_MAIN => {
                self.sessions.remove(user_id).await;
                self.out
                    .send_text(chat_id, "Main Menu:", &Keyboard::Main)
                    .await?;
                Ok(())
            }
            _ => {
                let Some(flow) = self.sessions.get(user_id).await else {
                    // No conversation in progress; free text means nothing.
                    debug!(user_id, "Ignoring text without a session");
                    return Ok(());
                };
                let outcome = machine::advance(flow, Event::Text(text));
                self.apply_outcome(user_id, chat_id, outcome).await
            }
        }
    }

    async fn handle_photo(&self, user_id: i64, chat_id: i64, file_id: String) -> Result<()> {
        let Some(flow) = self.sessions.get(user_id).await else {
            debug!(user_id, "Ignoring photo without a session");
            return Ok(());
        };
        let outcome = machine::advance(flow, Event::Photo(file_id));
        self.apply_outcome(user_id, chat_id, outcome).await
    }

    async fn handle_callback(&self, user_id: i64, chat_id: i64, data: &str) -> Result<()> {
        let Some(action) = CallbackAction::parse(data) else {
            warn!(user_id, data, "Unknown callback action");
            return Ok(());
        };

        match action {
            CallbackAction::Contact(listing_id) => match self.repo.contact_info(listing_id).await {
                Ok(Some(contact)) => {
                    self.out
                        .send_text(
                            chat_id,
                            &format!("📞 Contact number: {contact}"),
                            &Keyboard::None,
                        )
                        .await?;
                    Ok(())
                }
                Ok(None) => {
                    debug!(listing_id, "Contact requested for missing listing");
                    Ok(())
                }
                Err(e) => {
                    error!(listing_id, error = %e, "Contact lookup failed");
                    self.out
                        .send_text(
                            chat_id,
                            "Error loading contact information. Please try again.",
                            &Keyboard::None,
                        )
                        .await?;
                    Ok(())
                }
            },

            CallbackAction::NewSearch => {
                info!(user_id, "Search flow restarted");
                self.sessions.set(user_id, Flow::search_start()).await;
                self.send_reply(chat_id, machine::search_entry_reply()).await
            }

            CallbackAction::NextProperty => {
                let Some(Flow::Search(SearchState::Browsing { results, cursor })) =
                    self.sessions.get(user_id).await
                else {
                    debug!(user_id, "Next pressed outside a browse session");
                    return Ok(());
                };
                let next = cursor + 1;
                if next >= results.len() {
                    self.out
                        .send_text(
                            chat_id,
                            "There are no more results to show according to your search criteria.",
                            &Keyboard::None,
                        )
                        .await?;
                    return Ok(());
                }
                self.sessions
                    .set(
                        user_id,
                        Flow::Search(SearchState::Browsing {
                            results: results.clone(),
                            cursor: next,
                        }),
                    )
                    .await;
                self.show_page(chat_id, &results, next).await
            }
        }
    }

    async fn apply_outcome(&self, user_id: i64, chat_id: i64, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Continue { flow, reply } => {
                debug!(user_id, step = flow.step_name(), "Conversation advanced");
                self.sessions.set(user_id, flow).await;
                self.send_reply(chat_id, reply).await
            }

            Outcome::Ignored { flow } => {
                debug!(user_id, step = flow.step_name(), "Input ignored");
                Ok(())
            }

            Outcome::Persist { draft } => {
                info!(user_id, photos = draft.photos.len(), "Persisting listing");
                match self.repo.insert(user_id, draft).await {
                    Ok(listing) => {
                        info!(user_id, listing_id = listing.id, "Listing saved");
                        self.sessions.remove(user_id).await;
                        self.out
                            .send_text(
                                chat_id,
                                "Property listed successfully! ✅\nReturn to main menu:",
                                &Keyboard::Main,
                            )
                            .await?;
                        Ok(())
                    }
                    Err(e) => {
                        // The draft is not re-queued; the user restarts the
                        // upload.
                        error!(user_id, error = %e, "Failed to save listing");
                        self.sessions.remove(user_id).await;
                        self.out
                            .send_text(
                                chat_id,
                                "Error saving property. Please try again.",
                                &Keyboard::None,
                            )
                            .await?;
                        Ok(())
                    }
                }
            }

            Outcome::RunSearch { filters } => self.run_search(user_id, chat_id, filters).await,
        }
    }

    /// Execute the query once and snapshot the results for browsing.
    async fn run_search(&self, user_id: i64, chat_id: i64, filters: FilterSet) -> Result<()> {
        let results = match self.repo.query(&filters).await {
            Ok(results) => results,
            Err(e) => {
                // Session is untouched, so the last filter step can be
                // retried.
                error!(user_id, error = %e, "Search query failed");
                self.out
                    .send_text(
                        chat_id,
                        "Error searching properties. Please try again.",
                        &Keyboard::None,
                    )
                    .await?;
                return Ok(());
            }
        };

        info!(user_id, matches = results.len(), "Search executed");

        if results.is_empty() {
            self.sessions
                .set(
                    user_id,
                    Flow::Search(SearchState::Browsing {
                        results: Vec::new(),
                        cursor: 0,
                    }),
                )
                .await;
            self.out
                .send_text(
                    chat_id,
                    "No properties found matching your criteria. Try adjusting your filters:",
                    &Keyboard::Inline(pager::empty_result_buttons()),
                )
                .await?;
            return Ok(());
        }

        self.sessions
            .set(
                user_id,
                Flow::Search(SearchState::Browsing {
                    results: results.clone(),
                    cursor: 0,
                }),
            )
            .await;

        self.out
            .send_text(chat_id, &pager::filter_summary(&filters), &Keyboard::None)
            .await?;
        self.show_page(chat_id, &results, 0).await
    }

    /// Render and send the result at `cursor`.
    async fn show_page(&self, chat_id: i64, results: &[Listing], cursor: usize) -> Result<()> {
        let page = pager::render_page(&results[cursor], cursor, results.len());
        self.out
            .send_media_group(chat_id, &page.photos, &page.caption)
            .await?;
        self.out
            .send_text(chat_id, "Options:", &Keyboard::Inline(page.buttons))
            .await?;
        Ok(())
    }

    async fn send_reply(&self, chat_id: i64, reply: machine::Reply) -> Result<()> {
        self.out
            .send_text(chat_id, &reply.text, &reply.keyboard)
            .await?;
        Ok(())
    }
}

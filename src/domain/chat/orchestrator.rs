//! Turn orchestration.
//!
//! Sequences one chat turn end to end: sanitize, load or recover the
//! session, walk the priority chain (active bulk order, active callback
//! collection, bulk detection, failed-call detection, generative reply),
//! persist what changed, and always hand back a usable reply.
//!
//! # Invariants
//!
//! - Bulk-order checks run before callback checks at every level
//! - Flow state is persisted only after the step that produced it succeeded
//! - Record-store side effects fire exactly once per flow completion
//! - No collaborator failure escapes as an error reply to the user;
//!   the worst case is a canned direct-contact message

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::{
    BulkOrderDraft, FieldExtraction, FlowStateStore, GenerativeResponder, Notification, Notifier,
    PartsCatalog, RecordStore, ResponderRequest, ServiceTaskDraft, SessionStore,
};

use super::bulk_order::{BulkOrderFlow, BulkOrderOutcome, BulkOrderState, BulkOrderStep};
use super::callback_flow::{CallbackFlow, CallbackOutcome, CallbackStage, CallbackState};
use super::enhancer::{BusinessContact, EnhancedResponse, ResponseEnhancer};
use super::extractor::{sanitize_message, RuleBasedExtractor, TieredExtractor};
use super::intent::{
    extract_part_query, extract_quantity, BulkOrderDetector, FailedCallDetector, FailedCallSignal,
    IntentCategory, Urgency, PART_KEYWORDS, URGENT_WORDS,
};
use super::message::{Message, MessageMeta};
use super::session::Session;

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Minimum failed-call confidence that enters the callback flow.
    pub failed_call_threshold: f32,
    /// Flow state max age; older states are treated as absent.
    pub flow_max_age_secs: u64,
    /// Deadline for each AI call inside a turn.
    pub ai_timeout: Duration,
    /// How many recent messages feed detection context and the responder.
    pub history_turns: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            failed_call_threshold: 0.6,
            flow_max_age_secs: 30 * 60,
            ai_timeout: Duration::from_secs(8),
            history_turns: 6,
        }
    }
}

/// The collaborator ports a turn may touch.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub states: Arc<dyn FlowStateStore>,
    pub extraction: Arc<dyn FieldExtraction>,
    pub responder: Arc<dyn GenerativeResponder>,
    pub catalog: Arc<dyn PartsCatalog>,
    pub records: Arc<dyn RecordStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// One inbound chat turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub message: String,
    pub session_id: Option<SessionId>,
    pub user_ref: Option<String>,
}

/// The completed turn.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub session_id: SessionId,
    pub response: EnhancedResponse,
    pub intent: IntentCategory,
    pub confidence: Option<f32>,
    pub escalated: bool,
}

struct TurnOutcome {
    reply: EnhancedResponse,
    intent: IntentCategory,
    confidence: Option<f32>,
    escalated: bool,
}

/// Orchestrates chat turns over the injected collaborators.
#[derive(Clone)]
pub struct ChatOrchestrator {
    collab: Collaborators,
    settings: OrchestratorSettings,
    extractor: TieredExtractor,
    enhancer: ResponseEnhancer,
    callback_flow: CallbackFlow,
    bulk_flow: BulkOrderFlow,
    failed_call_detector: FailedCallDetector,
    bulk_detector: BulkOrderDetector,
    contact: BusinessContact,
}

impl ChatOrchestrator {
    /// Wires the orchestrator.
    pub fn new(
        collab: Collaborators,
        contact: BusinessContact,
        pickup_address: impl Into<String>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            extractor: TieredExtractor::new(collab.extraction.clone(), settings.ai_timeout),
            enhancer: ResponseEnhancer::new(contact.clone()),
            callback_flow: CallbackFlow::new(),
            bulk_flow: BulkOrderFlow::new(contact.phone.clone(), pickup_address),
            failed_call_detector: FailedCallDetector::new(),
            bulk_detector: BulkOrderDetector::new(),
            contact,
            collab,
            settings,
        }
    }

    /// Handles one turn.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the message is empty after sanitization
    /// - Store errors from session persistence; AI, catalog, record, and
    ///   notifier failures are absorbed into fallback replies instead
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse, DomainError> {
        let text = sanitize_message(&request.message);
        if text.is_empty() {
            return Err(DomainError::validation(
                "message",
                "Message cannot be empty",
            ));
        }

        let mut session = self.load_or_create_session(&request).await?;
        let session_id = session.id();

        let outcome = self.dispatch(&session, &text).await?;

        let meta = MessageMeta {
            intent: Some(outcome.intent),
            confidence: outcome.confidence,
            escalated: outcome.escalated,
        };
        session.append(Message::user(&text)?.with_meta(meta));
        let mut bot = Message::bot(&outcome.reply.text)?;
        if !outcome.reply.quick_replies.is_empty() {
            bot = bot.with_quick_replies();
        }
        session.append(bot);
        if outcome.escalated {
            session.escalate();
        }
        self.collab.sessions.save(&session).await?;

        tracing::info!(
            session = %session_id,
            intent = outcome.intent.name(),
            escalated = outcome.escalated,
            "turn handled"
        );

        Ok(TurnResponse {
            session_id,
            response: outcome.reply,
            intent: outcome.intent,
            confidence: outcome.confidence,
            escalated: outcome.escalated,
        })
    }

    async fn load_or_create_session(&self, request: &TurnRequest) -> Result<Session, DomainError> {
        if let Some(id) = request.session_id {
            if let Some(session) = self.collab.sessions.get(&id).await? {
                return Ok(session);
            }
            // The session map lost the entry but flow state may have
            // survived in the longer-lived state store. Keep the id so the
            // in-progress flow keeps its context.
            let has_state = self.collab.states.get_bulk_order(&id).await?.is_some()
                || self.collab.states.get_callback(&id).await?.is_some();
            if has_state {
                tracing::info!(session = %id, "recovered session shell from flow state");
                let shell = Session::shell(id);
                self.collab.sessions.save(&shell).await?;
                return Ok(shell);
            }
        }
        self.collab.sessions.create(request.user_ref.clone()).await
    }

    async fn dispatch(&self, session: &Session, text: &str) -> Result<TurnOutcome, DomainError> {
        let sid = session.id();

        // Active bulk order outranks everything, including an active
        // callback collection.
        if let Some(state) = self.collab.states.get_bulk_order(&sid).await? {
            if state.is_expired(self.settings.flow_max_age_secs)
                || state.step == BulkOrderStep::Complete
            {
                self.collab.states.clear_bulk_order(&sid).await?;
            } else if state.step == BulkOrderStep::Initial {
                // A state parked at the opening step holds nothing yet.
                // Re-open only while the message still reads like a parts
                // order; otherwise drop the state so the user can change
                // topic.
                if self.bulk_detector.detect(text)
                    || extract_quantity(&text.to_lowercase()).is_some()
                    || extract_part_query(text).is_some()
                {
                    return self.open_bulk_order(sid, text).await;
                }
                self.collab.states.clear_bulk_order(&sid).await?;
            } else {
                return self.continue_bulk_order(sid, state, text).await;
            }
        }

        if let Some(state) = self.collab.states.get_callback(&sid).await? {
            if state.is_expired(self.settings.flow_max_age_secs)
                || state.stage != CallbackStage::Collecting
            {
                self.collab.states.clear_callback(&sid).await?;
            } else {
                return self.continue_callback(sid, state, text).await;
            }
        }

        // Fresh detection: bulk first, and a positive bulk result skips
        // failed-call detection for the turn.
        if self.bulk_detector.detect(text) {
            return self.open_bulk_order(sid, text).await;
        }

        let history: Vec<String> = session
            .recent_messages(self.settings.history_turns)
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        let context: Vec<&str> = history.iter().map(String::as_str).collect();
        let signal = self.failed_call_detector.detect(text, &context);
        if signal.detected && signal.confidence >= self.settings.failed_call_threshold {
            return self.start_callback(sid, &signal, text).await;
        }

        self.generative_turn(session, text).await
    }

    // ── Callback collection ────────────────────────────────────────────────

    async fn start_callback(
        &self,
        sid: SessionId,
        signal: &FailedCallSignal,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let (state, outcome) = self.callback_flow.start(signal, text);
        self.finish_callback(sid, state, outcome, Some(signal.confidence))
            .await
    }

    async fn continue_callback(
        &self,
        sid: SessionId,
        state: CallbackState,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let extracted = self.extractor.extract(text).await;
        let (state, outcome) = self.callback_flow.advance(state, &extracted);
        self.finish_callback(sid, state, outcome, None).await
    }

    async fn finish_callback(
        &self,
        sid: SessionId,
        state: CallbackState,
        outcome: CallbackOutcome,
        confidence: Option<f32>,
    ) -> Result<TurnOutcome, DomainError> {
        match outcome {
            CallbackOutcome::Prompt { text } => {
                self.collab.states.set_callback(&sid, state).await?;
                Ok(TurnOutcome {
                    reply: Self::flow_reply(text, false),
                    intent: IntentCategory::FailedCall,
                    confidence,
                    escalated: false,
                })
            }
            CallbackOutcome::CreateTask {
                customer,
                urgency,
                trigger_message,
            } => {
                let draft = ServiceTaskDraft {
                    customer: customer.clone(),
                    urgency,
                    trigger_message,
                };
                let escalated = urgency == Urgency::High;
                let text = match self.collab.records.create_service_task(&draft).await {
                    Ok(task_id) => {
                        self.collab.states.clear_callback(&sid).await?;
                        self.notify_best_effort(Notification::TaskCreated {
                            task_id,
                            urgency,
                            customer_name: customer
                                .name
                                .clone()
                                .unwrap_or_else(|| "customer".to_string()),
                            phone: customer.phone.clone().unwrap_or_default(),
                        })
                        .await;
                        let name = customer.name.as_deref().unwrap_or("there");
                        let when = match urgency {
                            Urgency::High => "right away",
                            Urgency::Medium => "shortly",
                            Urgency::Low => "soon",
                        };
                        format!(
                            "Thank you {}! I've arranged a callback on {}. Our team \
                             will call you back {}.",
                            name,
                            customer.phone.as_deref().unwrap_or("your number"),
                            when
                        )
                    }
                    Err(err) => {
                        tracing::error!(error = %err, session = %sid, "task creation failed");
                        // Clear anyway so the user is not trapped in the flow.
                        self.collab.states.clear_callback(&sid).await?;
                        self.side_effect_apology()
                    }
                };
                Ok(TurnOutcome {
                    reply: Self::flow_reply(text, escalated),
                    intent: IntentCategory::FailedCall,
                    confidence,
                    escalated,
                })
            }
        }
    }

    // ── Bulk ordering ──────────────────────────────────────────────────────

    async fn open_bulk_order(&self, sid: SessionId, text: &str) -> Result<TurnOutcome, DomainError> {
        let (state, outcome) = self.bulk_flow.open(text);
        match outcome {
            BulkOrderOutcome::NeedsCatalogSearch { query, quantity } => {
                match self.collab.catalog.search(&query).await {
                    Ok(parts) => {
                        let (state, outcome) =
                            self.bulk_flow
                                .apply_catalog_results(state, quantity, &query, &parts);
                        self.finish_bulk_order(sid, state, outcome).await
                    }
                    Err(err) => {
                        tracing::error!(error = %err, session = %sid, "catalog search failed");
                        self.collab.states.set_bulk_order(&sid, state).await?;
                        Ok(TurnOutcome {
                            reply: Self::flow_reply(self.side_effect_apology(), false),
                            intent: IntentCategory::BulkOrder,
                            confidence: None,
                            escalated: false,
                        })
                    }
                }
            }
            other => self.finish_bulk_order(sid, state, other).await,
        }
    }

    async fn continue_bulk_order(
        &self,
        sid: SessionId,
        state: BulkOrderState,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let extracted = self.extractor.extract(text).await;
        let (state, outcome) = self.bulk_flow.advance(state, text, &extracted);
        self.finish_bulk_order(sid, state, outcome).await
    }

    async fn finish_bulk_order(
        &self,
        sid: SessionId,
        state: BulkOrderState,
        outcome: BulkOrderOutcome,
    ) -> Result<TurnOutcome, DomainError> {
        match outcome {
            BulkOrderOutcome::Reply { text } => {
                self.collab.states.set_bulk_order(&sid, state).await?;
                Ok(TurnOutcome {
                    reply: Self::flow_reply(text, false),
                    intent: IntentCategory::BulkOrder,
                    confidence: None,
                    escalated: false,
                })
            }
            BulkOrderOutcome::CreateOrder {
                lines,
                contact,
                pickup_location,
                total_amount,
            } => {
                let draft = BulkOrderDraft {
                    lines,
                    contact: contact.clone(),
                    pickup_location: pickup_location.clone(),
                    total_amount,
                };
                let text = match self.collab.records.create_bulk_order(&draft).await {
                    Ok(order_id) => {
                        self.collab.states.clear_bulk_order(&sid).await?;
                        self.notify_best_effort(Notification::OrderCreated {
                            order_id,
                            total_amount,
                            contact_name: contact
                                .name
                                .clone()
                                .unwrap_or_else(|| "customer".to_string()),
                        })
                        .await;
                        format!(
                            "Your order is confirmed! Reference {}. Total \u{20B9}{}, \
                             payable at pickup: {}. We'll message you when it's ready.",
                            order_id, total_amount, pickup_location
                        )
                    }
                    Err(err) => {
                        tracing::error!(error = %err, session = %sid, "order creation failed");
                        self.collab.states.clear_bulk_order(&sid).await?;
                        self.side_effect_apology()
                    }
                };
                Ok(TurnOutcome {
                    reply: Self::flow_reply(text, false),
                    intent: IntentCategory::BulkOrder,
                    confidence: None,
                    escalated: false,
                })
            }
            BulkOrderOutcome::NeedsCatalogSearch { .. } => {
                // Only `open` produces this, and `open_bulk_order` consumes
                // it before calling here.
                tracing::error!(session = %sid, "unexpected catalog search request");
                Ok(TurnOutcome {
                    reply: Self::flow_reply(self.side_effect_apology(), false),
                    intent: IntentCategory::BulkOrder,
                    confidence: None,
                    escalated: false,
                })
            }
        }
    }

    // ── Generative path ────────────────────────────────────────────────────

    async fn generative_turn(
        &self,
        session: &Session,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let category = self.classify_general(text);
        let history: Vec<String> = session
            .recent_messages(self.settings.history_turns)
            .iter()
            .map(|m| {
                let who = if m.is_user() { "user" } else { "bot" };
                format!("{}: {}", who, m.text())
            })
            .collect();
        let request = ResponderRequest::new(text, category).with_history(history);

        let raw = match tokio::time::timeout(
            self.settings.ai_timeout,
            self.collab.responder.respond(&request),
        )
        .await
        {
            Ok(Ok(reply)) => reply.text,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "responder failed, using contact fallback");
                self.fallback_text()
            }
            Err(_) => {
                tracing::warn!("responder timed out, using contact fallback");
                self.fallback_text()
            }
        };

        let reply = self
            .enhancer
            .enhance(&raw, category, text, session.is_escalated());
        let escalated = reply.escalated;
        Ok(TurnOutcome {
            reply,
            intent: category,
            confidence: None,
            escalated,
        })
    }

    /// Keyword classification for messages outside both flows.
    fn classify_general(&self, text: &str) -> IntentCategory {
        let lower = text.to_lowercase();
        let problem = RuleBasedExtractor::new().extract(text).problem.is_some();

        if problem && URGENT_WORDS.iter().any(|w| lower.contains(w)) {
            return IntentCategory::Emergency;
        }
        if lower.contains("spare") || PART_KEYWORDS.iter().any(|p| lower.contains(p)) {
            return IntentCategory::SpareParts;
        }
        if ["hours", "timing", "open", "close", "address", "where are you", "located"]
            .iter()
            .any(|w| lower.contains(w))
        {
            return IntentCategory::BusinessInfo;
        }
        if problem
            || ["repair", "service", "technician", "fix"]
                .iter()
                .any(|w| lower.contains(w))
        {
            return IntentCategory::ServiceRequest;
        }
        if ["buy", "new model", "exchange offer", "price of new"]
            .iter()
            .any(|w| lower.contains(w))
        {
            return IntentCategory::Sales;
        }
        IntentCategory::General
    }

    // ── Shared helpers ─────────────────────────────────────────────────────

    fn flow_reply(text: String, escalated: bool) -> EnhancedResponse {
        EnhancedResponse {
            text,
            quick_replies: Vec::new(),
            actions: Vec::new(),
            escalated,
        }
    }

    fn fallback_text(&self) -> String {
        format!(
            "I'm having a little trouble right now. Please call {} on {} and \
             we'll help you straight away.",
            self.contact.name, self.contact.phone
        )
    }

    fn side_effect_apology(&self) -> String {
        format!(
            "Sorry, something went wrong on our side. Please call us directly \
             on {} and we'll sort it out immediately.",
            self.contact.phone
        )
    }

    async fn notify_best_effort(&self, notification: Notification) {
        if let Err(err) = self.collab.notifier.notify(&notification).await {
            tracing::warn!(error = %err, "notification delivery failed");
        }
    }
}

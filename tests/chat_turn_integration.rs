//! Integration tests for full chat turns through the orchestrator.
//!
//! These tests drive `ChatOrchestrator::handle_turn` end to end over the
//! in-memory adapters and the mock AI service:
//! 1. Failed-call detection enters the callback flow and creates exactly
//!    one service task once the required fields arrive
//! 2. Bulk ordering runs catalog search, contact collection, confirmation,
//!    and order creation across turns
//! 3. Priority, expiry, recovery, and collaborator-failure behavior
//!
//! The mock AI service is left with empty queues so the deterministic rule
//! cascade drives extraction and the canned mock reply drives the
//! generative path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use repairline::adapters::ai::MockAiService;
use repairline::adapters::memory::{
    InMemoryCatalog, InMemoryNotifier, InMemoryRecordStore, InMemorySessionStore,
    InMemoryStateStore,
};
use repairline::domain::chat::{
    BulkOrderStep, BusinessContact, ChatOrchestrator, Collaborators, IntentCategory,
    OrchestratorSettings, TurnRequest, TurnResponse, Urgency,
};
use repairline::domain::foundation::SessionId;
use repairline::ports::{
    CatalogError, FlowStateStore, Notification, Part, PartsCatalog, SessionStore,
};

const BUSINESS_PHONE: &str = "+91 94470 12345";
const PICKUP: &str = "Kuttappan Electronics, MC Road, Thiruvalla";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Counts catalog searches so tests can assert a path never reached the
/// catalog.
struct CountingCatalog {
    inner: InMemoryCatalog,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PartsCatalog for CountingCatalog {
    async fn search(&self, query: &str) -> Result<Vec<Part>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query).await
    }
}

struct Harness {
    orchestrator: ChatOrchestrator,
    sessions: Arc<InMemorySessionStore>,
    states: Arc<InMemoryStateStore>,
    records: Arc<InMemoryRecordStore>,
    notifier: Arc<InMemoryNotifier>,
    catalog_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn with_parts(parts: Vec<Part>) -> Self {
        let sessions = Arc::new(InMemorySessionStore::new());
        let states = Arc::new(InMemoryStateStore::new());
        let records = Arc::new(InMemoryRecordStore::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let catalog_calls = Arc::new(AtomicUsize::new(0));
        let ai = Arc::new(MockAiService::new());

        let orchestrator = ChatOrchestrator::new(
            Collaborators {
                sessions: sessions.clone(),
                states: states.clone(),
                extraction: ai.clone(),
                responder: ai,
                catalog: Arc::new(CountingCatalog {
                    inner: InMemoryCatalog::with_parts(parts),
                    calls: catalog_calls.clone(),
                }),
                records: records.clone(),
                notifier: notifier.clone(),
            },
            BusinessContact {
                name: "Kuttappan Electronics".to_string(),
                phone: BUSINESS_PHONE.to_string(),
                whatsapp: "919447012345".to_string(),
            },
            PICKUP,
            OrchestratorSettings::default(),
        );

        Self {
            orchestrator,
            sessions,
            states,
            records,
            notifier,
            catalog_calls,
        }
    }

    fn new() -> Self {
        Self::with_parts(vec![remote_control(40)])
    }

    async fn turn(&self, session_id: Option<SessionId>, message: &str) -> TurnResponse {
        self.orchestrator
            .handle_turn(TurnRequest {
                message: message.to_string(),
                session_id,
                user_ref: None,
            })
            .await
            .expect("turn should succeed")
    }
}

fn remote_control(stock: u32) -> Part {
    Part {
        id: "part-ac-remote".to_string(),
        name: "AC Remote Control".to_string(),
        price: 450,
        bulk_price: Some(400),
        stock_quantity: stock,
    }
}

// =============================================================================
// Callback flow
// =============================================================================

#[tokio::test]
async fn callback_flow_completes_across_two_turns_with_one_task() {
    let harness = Harness::new();

    let first = harness
        .turn(
            None,
            "My AC stopped working, tried calling since morning but no response",
        )
        .await;
    assert_eq!(first.intent, IntentCategory::FailedCall);
    assert!(first.response.text.contains("callback"));
    assert!(first
        .response
        .text
        .contains("your name, your phone number, and your location"));
    assert!(harness
        .states
        .get_callback(&first.session_id)
        .await
        .unwrap()
        .is_some());
    assert!(harness.records.tasks().await.is_empty());

    let second = harness
        .turn(Some(first.session_id), "Ravi, 9876543210, Thiruvalla")
        .await;
    assert_eq!(second.session_id, first.session_id);
    assert!(second.response.text.contains("arranged a callback"));

    let tasks = harness.records.tasks().await;
    assert_eq!(tasks.len(), 1);
    let draft = &tasks[0].1;
    assert_eq!(draft.customer.name.as_deref(), Some("Ravi"));
    assert_eq!(draft.customer.phone.as_deref(), Some("9876543210"));
    assert_eq!(draft.customer.location.as_deref(), Some("Thiruvalla"));
    assert_eq!(draft.urgency, Urgency::High);

    // Completion clears the flow state and notifies staff once.
    assert!(harness
        .states
        .get_callback(&first.session_id)
        .await
        .unwrap()
        .is_none());
    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Notification::TaskCreated { .. }));

    // A follow-up turn must not create a second task.
    let third = harness.turn(Some(first.session_id), "thank you").await;
    assert_ne!(third.intent, IntentCategory::FailedCall);
    assert_eq!(harness.records.tasks().await.len(), 1);
}

#[tokio::test]
async fn callback_completes_same_turn_when_trigger_has_all_fields() {
    let harness = Harness::new();

    let turn = harness
        .turn(
            None,
            "I am Ravi, 9876543210, from Thiruvalla, tried calling but no one answered",
        )
        .await;

    assert_eq!(turn.intent, IntentCategory::FailedCall);
    assert!(turn.response.text.contains("arranged a callback"));
    assert_eq!(harness.records.tasks().await.len(), 1);
    assert!(harness
        .states
        .get_callback(&turn.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn high_urgency_callback_escalates_the_turn() {
    let harness = Harness::new();

    let turn = harness
        .turn(
            None,
            "urgent! I am Ravi, 9876543210, from Thiruvalla, tried calling, no response",
        )
        .await;

    assert!(turn.escalated);
    assert!(turn.response.text.contains("right away"));
    let tasks = harness.records.tasks().await;
    assert_eq!(tasks[0].1.urgency, Urgency::High);
}

#[tokio::test]
async fn task_creation_failure_degrades_to_direct_contact_apology() {
    let harness = Harness::new();
    harness.records.set_failing(true);

    let turn = harness
        .turn(
            None,
            "I am Ravi, 9876543210, from Thiruvalla, tried calling but no one answered",
        )
        .await;

    assert!(turn.response.text.contains("went wrong"));
    assert!(turn.response.text.contains(BUSINESS_PHONE));
    assert!(harness.records.tasks().await.is_empty());
    assert!(harness.notifier.sent().await.is_empty());
    // State is cleared so the user is not stuck re-answering prompts.
    assert!(harness
        .states
        .get_callback(&turn.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn notifier_failure_does_not_break_the_turn() {
    let harness = Harness::new();
    harness.notifier.set_failing(true);

    let turn = harness
        .turn(
            None,
            "I am Ravi, 9876543210, from Thiruvalla, tried calling but no one answered",
        )
        .await;

    assert!(turn.response.text.contains("arranged a callback"));
    assert_eq!(harness.records.tasks().await.len(), 1);
    assert!(harness.notifier.sent().await.is_empty());
}

// =============================================================================
// Bulk ordering
// =============================================================================

#[tokio::test]
async fn bulk_order_end_to_end_creates_one_order() {
    let harness = Harness::new();

    let first = harness.turn(None, "I need 10 remote controls").await;
    assert_eq!(first.intent, IntentCategory::BulkOrder);
    // 10 units meets the bulk threshold, so the bulk price applies.
    assert!(first.response.text.contains("\u{20B9}400"));
    assert!(first.response.text.contains("\u{20B9}4000"));
    assert!(first.response.text.contains("your email"));

    let second = harness
        .turn(
            Some(first.session_id),
            "my name is Ravi, number 9876543210, email ravi@example.com",
        )
        .await;
    assert!(second.response.text.contains("Order summary"));
    assert!(second.response.text.contains(PICKUP));
    let state = harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.step, BulkOrderStep::Confirming);

    let third = harness.turn(Some(first.session_id), "yes").await;
    assert!(third.response.text.contains("confirmed"));

    let orders = harness.records.orders().await;
    assert_eq!(orders.len(), 1);
    let draft = &orders[0].1;
    assert_eq!(draft.total_amount, 4000);
    assert_eq!(draft.contact.name.as_deref(), Some("Ravi"));
    assert_eq!(draft.contact.email.as_deref(), Some("ravi@example.com"));
    assert_eq!(draft.pickup_location, PICKUP);

    assert!(harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .is_none());
    let sent = harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Notification::OrderCreated { .. }));
}

#[tokio::test]
async fn insufficient_stock_offers_available_quantity_then_accepts_it() {
    let harness = Harness::with_parts(vec![remote_control(5)]);

    let first = harness.turn(None, "I need 10 remote controls").await;
    assert_eq!(first.intent, IntentCategory::BulkOrder);
    assert!(first.response.text.contains("5 available units"));
    assert!(harness.records.orders().await.is_empty());

    // The reduced re-request goes through the opening path again.
    let second = harness
        .turn(Some(first.session_id), "ok, I'll take 5 remote controls")
        .await;
    assert!(second.response.text.contains("\u{20B9}2000"));
    let state = harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.step, BulkOrderStep::CollectingContact);
}

#[tokio::test]
async fn oversized_quantity_redirects_without_catalog_search() {
    let harness = Harness::new();

    let turn = harness
        .turn(None, "I want to order 5000 remote controls")
        .await;

    assert_eq!(turn.intent, IntentCategory::BulkOrder);
    assert!(turn.response.text.contains("1000"));
    assert!(turn.response.text.contains(BUSINESS_PHONE));
    assert_eq!(harness.catalog_calls.load(Ordering::SeqCst), 0);
    assert!(harness.records.orders().await.is_empty());
}

#[tokio::test]
async fn unknown_part_gets_a_defined_no_match_reply() {
    let harness = Harness::with_parts(Vec::new());

    let turn = harness.turn(None, "I need 10 remote controls").await;

    assert!(turn.response.text.contains("couldn't find"));
    assert_eq!(harness.catalog_calls.load(Ordering::SeqCst), 1);
    assert!(harness.records.orders().await.is_empty());
}

#[tokio::test]
async fn cancellation_at_confirmation_creates_no_order() {
    let harness = Harness::new();

    let first = harness.turn(None, "I need 10 remote controls").await;
    harness
        .turn(
            Some(first.session_id),
            "my name is Ravi, number 9876543210, email ravi@example.com",
        )
        .await;
    let third = harness.turn(Some(first.session_id), "no, cancel it").await;

    assert!(third.response.text.contains("cancelled"));
    assert!(harness.records.orders().await.is_empty());
    let state = harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.step, BulkOrderStep::Initial);
    assert!(state.lines.is_empty());
}

#[tokio::test]
async fn order_creation_failure_clears_state_and_apologizes() {
    let harness = Harness::new();
    harness.records.set_failing(true);

    let first = harness.turn(None, "I need 10 remote controls").await;
    harness
        .turn(
            Some(first.session_id),
            "my name is Ravi, number 9876543210, email ravi@example.com",
        )
        .await;
    let third = harness.turn(Some(first.session_id), "yes").await;

    assert!(third.response.text.contains("went wrong"));
    assert!(harness.records.orders().await.is_empty());
    assert!(harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// Priority and recovery
// =============================================================================

#[tokio::test]
async fn bulk_detection_outranks_failed_call_detection() {
    let harness = Harness::new();

    let turn = harness
        .turn(
            None,
            "Tried calling you, no response. I also want to order 20 thermostats",
        )
        .await;

    assert_eq!(turn.intent, IntentCategory::BulkOrder);
    assert!(harness
        .states
        .get_callback(&turn.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn active_bulk_flow_outranks_new_failed_call_signal() {
    let harness = Harness::new();

    let first = harness.turn(None, "I need 10 remote controls").await;
    // Mentions a failed call mid-flow; the active order still wins.
    let second = harness
        .turn(
            Some(first.session_id),
            "by the way I tried calling you earlier, no response. my name is Ravi, \
             number 9876543210, email ravi@example.com",
        )
        .await;

    assert_eq!(second.intent, IntentCategory::BulkOrder);
    assert!(harness
        .states
        .get_callback(&first.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn stalled_bulk_opening_releases_the_session_for_other_intents() {
    let harness = Harness::new();

    // Opens a bulk state that stays at the initial step (no part named).
    let first = harness.turn(None, "I want to order 25 units").await;
    assert_eq!(first.intent, IntentCategory::BulkOrder);

    // The user changes topic; the parked state must not swallow the turn.
    let second = harness
        .turn(
            Some(first.session_id),
            "forget the order. my AC is not cooling, tried calling since morning, no response",
        )
        .await;

    assert_eq!(second.intent, IntentCategory::FailedCall);
    assert!(harness
        .states
        .get_bulk_order(&first.session_id)
        .await
        .unwrap()
        .is_none());
    assert!(harness
        .states
        .get_callback(&first.session_id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn session_shell_recovered_from_surviving_flow_state() {
    let harness = Harness::new();

    let first = harness.turn(None, "I need 10 remote controls").await;
    // Simulate the session being swept while the flow state survives.
    harness.sessions.remove(&first.session_id).await.unwrap();

    let second = harness
        .turn(
            Some(first.session_id),
            "my name is Ravi, number 9876543210, email ravi@example.com",
        )
        .await;

    assert_eq!(second.session_id, first.session_id);
    assert!(second.response.text.contains("Order summary"));
}

#[tokio::test]
async fn unknown_session_id_without_state_gets_a_fresh_session() {
    let harness = Harness::new();

    let stale = SessionId::new();
    let turn = harness.turn(Some(stale), "hello").await;

    assert_ne!(turn.session_id, stale);
}

// =============================================================================
// Generative path and validation
// =============================================================================

#[tokio::test]
async fn generative_reply_carries_contact_and_actions() {
    let harness = Harness::new();

    let turn = harness.turn(None, "hello").await;

    assert_eq!(turn.intent, IntentCategory::General);
    // The canned mock reply has no contact details, so the enhancer
    // appends them and attaches call/WhatsApp actions.
    assert!(turn.response.text.contains(BUSINESS_PHONE));
    assert_eq!(turn.response.actions.len(), 2);
    assert!(harness.records.tasks().await.is_empty());
}

#[tokio::test]
async fn urgent_problem_without_failed_call_escalates_via_enhancer() {
    let harness = Harness::new();

    let turn = harness
        .turn(None, "my fridge is sparking, please send a technician urgently")
        .await;

    assert_eq!(turn.intent, IntentCategory::Emergency);
    assert!(turn.escalated);
    // No callback flow was entered; escalation came from the enhancer.
    assert!(harness
        .states
        .get_callback(&turn.session_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn empty_and_script_only_messages_are_rejected() {
    let harness = Harness::new();

    for message in ["   ", "<script>alert(1)</script>"] {
        let result = harness
            .orchestrator
            .handle_turn(TurnRequest {
                message: message.to_string(),
                session_id: None,
                user_ref: None,
            })
            .await;
        assert!(result.is_err(), "message {:?} should be rejected", message);
    }
    assert!(harness.sessions.is_empty().await);
}

#[tokio::test]
async fn both_turn_messages_are_recorded_in_the_session() {
    let harness = Harness::new();

    let first = harness.turn(None, "hello").await;
    harness.turn(Some(first.session_id), "what are your hours?").await;

    let session = harness
        .sessions
        .get(&first.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.recent_messages(10).len(), 4);
}

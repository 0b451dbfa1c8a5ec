//! Dialog controller
//!
//! Runs one turn of the slot-filling flow: resolve which slots the detected
//! keywords satisfy, pick the next slot to prompt for (or signal
//! completion), format the prompt, and persist or clear the conversation
//! state. The whole check-init/resolve/persist transition executes inside
//! one per-conversation critical section; only the optional predictor call
//! happens outside it, as an optimistic seed that is discarded when a
//! concurrent turn initialized the conversation first.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use faq_dialog_config::SlotConfigStore;
use faq_dialog_core::{ConversationState, SlotConfig, SlotKey, TenantRef};

use crate::predictor::SlotPredictor;
use crate::response::{TurnResponse, WhatToSay};
use crate::state_store::ConversationStateStore;
use crate::DialogError;

/// Heading substituted when the selected slot has no prompt definition.
/// The turn proceeds; the inconsistency is logged as a defect.
const DIAGNOSTIC_HEADING: &str =
    "internal inconsistency: no prompt is defined for the selected slot";

/// Options shown for the catch-all slot, always this fixed two-choice list.
const CATCH_ALL_OPTIONS: &str = "none, Yes";

const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_secs(2);

/// One inbound turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation id (dialog state is keyed by this)
    pub conversation_id: String,
    /// Which (project, version) slot config applies
    pub tenant: TenantRef,
    /// Slot keys already detected in the user's utterance
    pub detected: HashSet<SlotKey>,
    /// Raw user text, consulted only when a new conversation is seeded
    /// through the predictor
    pub raw_text: Option<String>,
}

/// Decision for one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// True once every required slot is resolved and the conversation closed
    pub done: bool,
    pub response: TurnResponse,
}

/// The slot-filling dialog controller.
///
/// Shares one immutable config store and exclusively owns the conversation
/// state store; it is the only writer of conversation state.
pub struct DialogController {
    configs: Arc<SlotConfigStore>,
    states: Arc<ConversationStateStore>,
    predictor: Option<Arc<dyn SlotPredictor>>,
    predictor_timeout: Duration,
}

impl DialogController {
    pub fn new(configs: Arc<SlotConfigStore>) -> Self {
        Self {
            configs,
            states: Arc::new(ConversationStateStore::new()),
            predictor: None,
            predictor_timeout: DEFAULT_PREDICTOR_TIMEOUT,
        }
    }

    /// Seed new conversations through a slot predictor instead of the static
    /// required list. Predictor failures fall back to the static list.
    pub fn with_predictor(mut self, predictor: Arc<dyn SlotPredictor>, timeout: Duration) -> Self {
        self.predictor = Some(predictor);
        self.predictor_timeout = timeout;
        self
    }

    /// The conversation state store (for diagnostics and idle sweeps).
    pub fn states(&self) -> &ConversationStateStore {
        &self.states
    }

    /// Process one turn.
    pub async fn process(&self, request: TurnRequest) -> Result<TurnOutcome, DialogError> {
        let config = self.configs.get(&request.tenant)?;

        // Seed computed outside the critical section; a conversation that
        // already has state keeps it and ignores the raw text entirely.
        let seed = if self.states.get(&request.conversation_id).is_none() {
            Some(self.seed_outstanding(&config, request.raw_text.as_deref()).await)
        } else {
            None
        };

        let decision = self.states.update(&request.conversation_id, |existing| {
            let state = existing.unwrap_or_else(|| {
                ConversationState::new(seed.unwrap_or_else(|| static_seed(&config)))
            });
            run_turn(state, &request.detected, &config)
        });

        tracing::debug!(
            conversation = %request.conversation_id,
            tenant = %request.tenant,
            ask_more = decision.ask_more_question,
            catch_all = decision.ask_catch_all,
            "processed dialog turn"
        );

        Ok(TurnOutcome {
            done: !decision.ask_more_question,
            response: TurnResponse {
                ask_more_question: decision.ask_more_question,
                conversation_id: request.conversation_id,
                ask_catch_all: decision.ask_catch_all,
                first_question: decision.first_question,
                what_to_say: decision.what_to_say,
            },
        })
    }

    /// Initial outstanding list for a brand-new conversation.
    async fn seed_outstanding(&self, config: &SlotConfig, raw_text: Option<&str>) -> Vec<SlotKey> {
        let mut outstanding = match (&self.predictor, raw_text) {
            (Some(predictor), Some(text)) => {
                match tokio::time::timeout(self.predictor_timeout, predictor.predict(text)).await {
                    Ok(Ok(slots)) => {
                        tracing::debug!(slots = slots.len(), "seeding outstanding slots from predictor");
                        slots
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(%err, "slot prediction failed, using static required list");
                        config.required.clone()
                    }
                    Err(_) => {
                        tracing::warn!("slot prediction timed out, using static required list");
                        config.required.clone()
                    }
                }
            }
            (Some(_), None) => {
                tracing::warn!("predictor configured but turn carried no raw text, using static required list");
                config.required.clone()
            }
            (None, _) => config.required.clone(),
        };

        // Catch-all is appended unconditionally, even when the list already
        // contains it. Duplicates are not removed.
        outstanding.push(config.catch_all.clone());
        outstanding
    }
}

fn static_seed(config: &SlotConfig) -> Vec<SlotKey> {
    let mut outstanding = config.required.clone();
    outstanding.push(config.catch_all.clone());
    outstanding
}

struct TurnDecision {
    ask_more_question: bool,
    ask_catch_all: bool,
    first_question: bool,
    what_to_say: WhatToSay,
}

/// The per-turn state transition. Runs under the conversation's lock.
fn run_turn(
    mut state: ConversationState,
    detected: &HashSet<SlotKey>,
    config: &SlotConfig,
) -> (Option<ConversationState>, TurnDecision) {
    // Resolve satisfied slots: every detected key removes its first
    // occurrence from the outstanding list.
    state.resolve_detected(detected);

    // Select the next prompt. The catch-all is skipped while anything else
    // remains; the length check uses the list as it stood when the scan
    // started, so two outstanding catch-all entries select neither.
    let scan_len = state.len();
    let mut selected = None;
    for key in &state.outstanding {
        if detected.contains(key) {
            continue;
        }
        if *key == config.catch_all && scan_len > 1 {
            continue;
        }
        selected = Some(key.clone());
        break;
    }

    match selected {
        Some(key) => {
            let ask_catch_all = key == config.catch_all;

            let (mut heading, mut options) = match config.definition(&key) {
                Some(definition) => (definition.heading.clone(), definition.options_csv()),
                None => {
                    tracing::error!(slot = %key, "selected slot has no definition");
                    (DIAGNOSTIC_HEADING.to_string(), String::new())
                }
            };
            if ask_catch_all {
                if let Some(definition) = config.catch_all_definition() {
                    heading = definition.heading.clone();
                }
                options = CATCH_ALL_OPTIONS.to_string();
            }

            state.remove_first(&key);

            let is_opening = config.first_required().is_some_and(|first| *first == key);
            let first_question = is_opening || state.first_question;
            state.first_question = first_question;

            let decision = TurnDecision {
                ask_more_question: true,
                ask_catch_all,
                first_question,
                what_to_say: WhatToSay::new(heading, options),
            };
            (Some(state), decision)
        }
        None => {
            // Nothing left to ask: close the conversation. A later call with
            // the same id starts from scratch.
            let decision = TurnDecision {
                ask_more_question: false,
                ask_catch_all: false,
                first_question: state.first_question,
                what_to_say: WhatToSay::new("", ""),
            };
            (None, decision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::PredictError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const VACCINE_HEADING: &str = "What vaccine are you talking about ?";
    const WHO_HEADING: &str = "For whom is this question being asked ?";
    const CATCH_ALL_HEADING: &str = "Is there any additional information you could help us with ?";

    fn tenant() -> TenantRef {
        TenantRef::new("who-faq", "v1")
    }

    fn config_store() -> Arc<SlotConfigStore> {
        let document = format!(
            r#"{{
                "required": ["Vaccine", "Who"],
                "Vaccine": ["{VACCINE_HEADING}", "none, polio, measles"],
                "Who": "{WHO_HEADING}",
                "Catch All": "{CATCH_ALL_HEADING}"
            }}"#
        );
        let mut store = SlotConfigStore::new();
        store.register_document(tenant(), &document, None).unwrap();
        Arc::new(store)
    }

    fn controller() -> DialogController {
        DialogController::new(config_store())
    }

    fn request(conversation: &str, detected: &[&str]) -> TurnRequest {
        TurnRequest {
            conversation_id: conversation.to_string(),
            tenant: tenant(),
            detected: detected.iter().map(|k| SlotKey::from(*k)).collect(),
            raw_text: None,
        }
    }

    struct FixedPredictor {
        slots: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedPredictor {
        fn new(slots: Vec<&'static str>) -> Self {
            Self {
                slots,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SlotPredictor for FixedPredictor {
        async fn predict(&self, _text: &str) -> Result<Vec<SlotKey>, PredictError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.slots.iter().map(|k| SlotKey::from(*k)).collect())
        }
    }

    struct FailingPredictor;

    #[async_trait]
    impl SlotPredictor for FailingPredictor {
        async fn predict(&self, _text: &str) -> Result<Vec<SlotKey>, PredictError> {
            Err(PredictError::Service("500: model unavailable".to_string()))
        }
    }

    struct SlowPredictor;

    #[async_trait]
    impl SlotPredictor for SlowPredictor {
        async fn predict(&self, _text: &str) -> Result<Vec<SlotKey>, PredictError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_scenario_full_flow() {
        let controller = controller();

        // Turn 1: nothing detected, asks the first required slot.
        let outcome = controller.process(request("c1", &[])).await.unwrap();
        assert!(!outcome.done);
        assert!(outcome.response.ask_more_question);
        assert!(!outcome.response.ask_catch_all);
        assert!(outcome.response.first_question);
        assert_eq!(outcome.response.what_to_say.heading, VACCINE_HEADING);
        assert_eq!(
            controller.states().get("c1").unwrap().outstanding,
            vec![SlotKey::from("Who"), SlotKey::from("Catch All")]
        );

        // Turn 2: "Who" detected, catch-all becomes sole survivor and is
        // asked with the fixed two-choice list.
        let outcome = controller.process(request("c1", &["Who"])).await.unwrap();
        assert!(outcome.response.ask_more_question);
        assert!(outcome.response.ask_catch_all);
        assert_eq!(outcome.response.what_to_say.heading, CATCH_ALL_HEADING);
        assert_eq!(outcome.response.what_to_say.options, "none, Yes");
        assert_eq!(outcome.response.what_to_say.option_pieces(), vec!["none", "Yes"]);

        // Turn 3: catch-all answered, conversation closes and state is gone.
        let outcome = controller.process(request("c1", &["Catch All"])).await.unwrap();
        assert!(outcome.done);
        assert!(!outcome.response.ask_more_question);
        assert!(controller.states().get("c1").is_none());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let controller = controller();

        // Same detected set against the same pristine outstanding list picks
        // the same slot, whichever conversation runs it.
        let a = controller.process(request("a", &["Vaccine"])).await.unwrap();
        let b = controller.process(request("b", &["Vaccine"])).await.unwrap();
        assert_eq!(a.response.what_to_say.heading, b.response.what_to_say.heading);
        assert_eq!(a.response.what_to_say.heading, WHO_HEADING);
    }

    #[tokio::test]
    async fn test_outstanding_shrinks_monotonically() {
        let controller = controller();

        controller.process(request("c1", &[])).await.unwrap();
        let len1 = controller.states().get("c1").unwrap().len();

        controller.process(request("c1", &[])).await.unwrap();
        let len2 = controller.states().get("c1").unwrap().len();

        assert!(len2 < len1);
    }

    #[tokio::test]
    async fn test_completion_resets_conversation() {
        let controller = controller();

        let outcome = controller
            .process(request("c1", &["Vaccine", "Who", "Catch All"]))
            .await
            .unwrap();
        assert!(outcome.done);
        assert!(controller.states().get("c1").is_none());

        // Same id afterwards is a brand-new conversation.
        let outcome = controller.process(request("c1", &[])).await.unwrap();
        assert_eq!(outcome.response.what_to_say.heading, VACCINE_HEADING);
        assert!(outcome.response.first_question);
    }

    #[tokio::test]
    async fn test_first_question_is_sticky() {
        let controller = controller();

        let turn1 = controller.process(request("c1", &[])).await.unwrap();
        assert!(turn1.response.first_question);

        // Later follow-up is not the opening question, but the flag sticks.
        let turn2 = controller.process(request("c1", &[])).await.unwrap();
        assert_eq!(turn2.response.what_to_say.heading, WHO_HEADING);
        assert!(turn2.response.first_question);
    }

    #[tokio::test]
    async fn test_first_question_false_when_opening_skipped() {
        let controller = controller();

        let outcome = controller.process(request("c1", &["Vaccine"])).await.unwrap();
        assert_eq!(outcome.response.what_to_say.heading, WHO_HEADING);
        assert!(!outcome.response.first_question);
    }

    #[tokio::test]
    async fn test_prompt_carries_indexed_options() {
        let controller = controller();

        let outcome = controller.process(request("c1", &[])).await.unwrap();
        assert_eq!(outcome.response.what_to_say.options, "none, polio, measles");
        assert_eq!(
            outcome.response.what_to_say.option_pieces(),
            vec!["none", "polio", "measles"]
        );
    }

    #[tokio::test]
    async fn test_unknown_detected_keys_are_ignored() {
        let controller = controller();

        let outcome = controller
            .process(request("c1", &["Garbage", "More Garbage"]))
            .await
            .unwrap();
        assert!(outcome.response.ask_more_question);
        assert_eq!(outcome.response.what_to_say.heading, VACCINE_HEADING);
    }

    #[tokio::test]
    async fn test_predictor_overrides_required_list() {
        let predictor = Arc::new(FixedPredictor::new(vec!["Who"]));
        let controller = DialogController::new(config_store())
            .with_predictor(predictor.clone(), Duration::from_secs(1));

        let mut req = request("c1", &[]);
        req.raw_text = Some("for whom is this?".to_string());
        let outcome = controller.process(req).await.unwrap();

        // Predicted list replaces the static one; "Who" is not the first
        // static required slot.
        assert_eq!(outcome.response.what_to_say.heading, WHO_HEADING);
        assert!(!outcome.response.first_question);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_required_list_frozen_after_first_turn() {
        let predictor = Arc::new(FixedPredictor::new(vec!["Vaccine", "Who"]));
        let controller = DialogController::new(config_store())
            .with_predictor(predictor.clone(), Duration::from_secs(1));

        let mut turn1 = request("c1", &[]);
        turn1.raw_text = Some("is the polio vaccine safe?".to_string());
        controller.process(turn1).await.unwrap();

        let mut turn2 = request("c1", &[]);
        turn2.raw_text = Some("completely different text".to_string());
        controller.process(turn2).await.unwrap();

        // Once the conversation has state, later raw text never re-predicts.
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prediction_failure_falls_back_to_static_list() {
        let controller = DialogController::new(config_store())
            .with_predictor(Arc::new(FailingPredictor), Duration::from_secs(1));

        let mut req = request("c1", &[]);
        req.raw_text = Some("anything".to_string());
        let outcome = controller.process(req).await.unwrap();

        assert_eq!(outcome.response.what_to_say.heading, VACCINE_HEADING);
    }

    #[tokio::test]
    async fn test_prediction_timeout_falls_back_to_static_list() {
        let controller = DialogController::new(config_store())
            .with_predictor(Arc::new(SlowPredictor), Duration::from_millis(10));

        let mut req = request("c1", &[]);
        req.raw_text = Some("anything".to_string());
        let outcome = controller.process(req).await.unwrap();

        assert_eq!(outcome.response.what_to_say.heading, VACCINE_HEADING);
    }

    #[tokio::test]
    async fn test_duplicate_catch_all_closes_without_prompt() {
        // A predicted list already containing the catch-all still gets the
        // catch-all appended; with two entries outstanding the scan skips
        // both and the conversation closes.
        let predictor = Arc::new(FixedPredictor::new(vec!["Catch All"]));
        let controller =
            DialogController::new(config_store()).with_predictor(predictor, Duration::from_secs(1));

        let mut req = request("c1", &[]);
        req.raw_text = Some("anything".to_string());
        let outcome = controller.process(req).await.unwrap();

        assert!(outcome.done);
        assert!(!outcome.response.ask_more_question);
        assert!(controller.states().get("c1").is_none());
    }

    #[tokio::test]
    async fn test_unknown_slot_degrades_to_diagnostic_prompt() {
        let predictor = Arc::new(FixedPredictor::new(vec!["Mystery"]));
        let controller =
            DialogController::new(config_store()).with_predictor(predictor, Duration::from_secs(1));

        let mut req = request("c1", &[]);
        req.raw_text = Some("anything".to_string());
        let outcome = controller.process(req).await.unwrap();

        // The turn is not aborted; a diagnostic heading stands in.
        assert!(outcome.response.ask_more_question);
        assert_eq!(outcome.response.what_to_say.heading, DIAGNOSTIC_HEADING);
        assert_eq!(outcome.response.what_to_say.option_pieces(), vec![""]);
    }

    #[tokio::test]
    async fn test_unknown_tenant_fails_the_turn() {
        let controller = controller();

        let mut req = request("c1", &[]);
        req.tenant = TenantRef::new("nobody", "v9");
        let err = controller.process(req).await.unwrap_err();
        assert!(matches!(err, DialogError::Config(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_turns_initialize_once() {
        let controller = Arc::new(controller());

        let a = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.process(request("race", &[])).await.unwrap() })
        };
        let b = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.process(request("race", &[])).await.unwrap() })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // Exactly one turn saw the pristine list; the other observed the
        // post-update state and claimed the following slot.
        let headings = [
            a.response.what_to_say.heading.clone(),
            b.response.what_to_say.heading.clone(),
        ];
        assert!(headings.contains(&VACCINE_HEADING.to_string()));
        assert!(headings.contains(&WHO_HEADING.to_string()));

        assert_eq!(
            controller.states().get("race").unwrap().outstanding,
            vec![SlotKey::from("Catch All")]
        );
    }
}

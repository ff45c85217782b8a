//! MessageDispatcher: consumes one envelope at a time from a parcel.
//!
//! Control flow per dispatch:
//! 1. structural checks (envelopes present, type descriptor complete)
//! 2. open the lead envelope; a null message is a structural error
//! 3. recurring markers are dropped silently and dispatch continues on the
//!    remainder; a recurring trigger re-runs forever without touching
//!    delivery-attempt counters
//! 4. a lead envelope addressed to a channel this worker does not service is
//!    forwarded whole for re-routing, never partially processed
//! 5. otherwise the handler runs under active-message accounting with
//!    Attempting/Delivered/Aborted/Rejected tracking; on success the
//!    remainder of the parcel (plus accumulated shared state) is re-sent,
//!    addressed by each remaining envelope's own channel
//!
//! Aborts are outcomes, not errors: an abort flagged for reschedule re-sends
//! the same, unmodified parcel; otherwise the parcel is dropped. Unhandled
//! handler errors are recorded as Rejected and re-raised; the host's job
//! infrastructure owns retry/backoff for rejections.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::active::ActiveMessageTracker;
use super::envelope_machine::EnvelopeMachine;
use super::post_office::{SendOptions, SendParcels};
use crate::domain::channel::Channel;
use crate::domain::envelope::{Envelope, Parcel};
use crate::domain::errors::DispatchError;
use crate::domain::messages::RecurringHeaderMessage;
use crate::domain::outcome::DeliveryOutcome;
use crate::domain::shares::find_latest;
use crate::domain::tracking::{HarnessDetails, TrackingCode};
use crate::domain::type_descriptor::{TypeComparer, TypeMatchStrategy};
use crate::ports::tracking::ParcelTracking;
use crate::typed::handler::HandlerContext;
use crate::typed::message::Message;
use crate::typed::registry::HandlerRegistry;

pub struct MessageDispatcher {
    registry: Arc<HandlerRegistry>,
    machine: Arc<EnvelopeMachine>,
    serviced_channels: Vec<Channel>,
    strategy: TypeMatchStrategy,
    harness_details: HarnessDetails,
    tracking: Arc<dyn ParcelTracking>,
    active: Arc<ActiveMessageTracker>,
    sender: Arc<dyn SendParcels>,
    ctx: HandlerContext,
}

impl MessageDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<HandlerRegistry>,
        machine: Arc<EnvelopeMachine>,
        serviced_channels: Vec<Channel>,
        strategy: TypeMatchStrategy,
        harness_details: HarnessDetails,
        tracking: Arc<dyn ParcelTracking>,
        active: Arc<ActiveMessageTracker>,
        sender: Arc<dyn SendParcels>,
        ctx: HandlerContext,
    ) -> Self {
        Self {
            registry,
            machine,
            serviced_channels,
            strategy,
            harness_details,
            tracking,
            active,
            sender,
            ctx,
        }
    }

    pub fn active_messages(&self) -> &ActiveMessageTracker {
        &self.active
    }

    /// Dispatch the lead envelope of `parcel`.
    pub async fn dispatch(
        &self,
        label: &str,
        code: TrackingCode,
        parcel: Parcel,
    ) -> Result<(), DispatchError> {
        let comparer = TypeComparer::new(self.strategy);
        let mut parcel = parcel;

        let (lead, payload) = loop {
            let lead = parcel.lead().ok_or(DispatchError::EmptyParcel)?;
            if !lead.message_type.is_complete() {
                return Err(DispatchError::MessageTypeNotSpecified);
            }

            let lead = lead.clone();
            let payload = self.machine.open_raw(&lead)?;
            if payload.is_null() {
                return Err(DispatchError::NullMessage);
            }

            // scheduled re-trigger, not work: drop without tracking
            if comparer.matches(&lead.message_type, &RecurringHeaderMessage::descriptor()) {
                debug!(%code, "dropping recurring marker envelope");
                parcel = parcel.remainder(parcel.shared_interface_states.clone());
                continue;
            }

            break (lead, payload);
        };

        if let Some(channel) = &lead.channel {
            if !self.serviced_channels.contains(channel) {
                // channel assignment changed after queuing; not ours to run
                debug!(%code, %channel, "parcel addressed to unserviced channel, re-routing whole");
                self.sender
                    .send(parcel, SendOptions::labeled(label))
                    .await?;
                return Ok(());
            }
        }

        self.active.increment();
        let result = self.execute(label, code, &parcel, &lead, payload).await;
        self.active.decrement();
        result
    }

    async fn execute(
        &self,
        label: &str,
        code: TrackingCode,
        parcel: &Parcel,
        lead: &Envelope,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        self.tracking
            .update_attempting(code, &self.harness_details)
            .await?;

        let Some(mut handler) = self.registry.resolve(&lead.message_type, self.strategy) else {
            return Err(DispatchError::NoHandler(lead.message_type.to_string()));
        };

        if let Some(interface) = handler.shared_interface() {
            let comparer = TypeComparer::new(self.strategy);
            let prior = find_latest(
                &parcel.shared_interface_states,
                &interface,
                &handler.handler_type(),
                &comparer,
            );
            if let Err(err) = handler.seed_shared_state(prior) {
                self.tracking.update_rejected(code, &err.to_string()).await?;
                return Err(DispatchError::Handler(err));
            }
        }

        match handler.handle_dyn(payload, &self.ctx).await {
            Ok(DeliveryOutcome::Delivered) => {
                self.tracking.update_delivered(code).await?;

                let mut states = parcel.shared_interface_states.clone();
                if let Some(state) = handler.captured_state() {
                    states.push(state);
                }
                let rest = parcel.remainder(states);
                if !rest.envelopes.is_empty() {
                    debug!(%code, remaining = rest.envelopes.len(), "forwarding remainder of parcel");
                    self.sender.send(rest, SendOptions::labeled(label)).await?;
                }
                Ok(())
            }
            Ok(DeliveryOutcome::Aborted(abort)) => {
                info!(%code, reason = %abort.reason, reschedule = abort.reschedule, "parcel delivery aborted");
                self.tracking.update_aborted(code, &abort.reason).await?;
                if abort.reschedule {
                    self.sender
                        .send(
                            parcel.clone(),
                            SendOptions::labeled(label).with_delay(abort.delay),
                        )
                        .await?;
                }
                Ok(())
            }
            Err(err) => {
                warn!(%code, error = %err, "handler failed, recording rejection");
                self.tracking.update_rejected(code, &err.to_string()).await?;
                Err(DispatchError::Handler(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{RecordingSender, RecordingTracking, machine};
    use crate::domain::envelope::SealedPayload;
    use crate::domain::errors::HandlerError;
    use crate::domain::ids::{EnvelopeId, ParcelId};
    use crate::domain::messages::NullMessage;
    use crate::domain::type_descriptor::TypeDescriptor;
    use crate::handlers::NullMessageHandler;
    use crate::impls::null_tracking::NullParcelTracking;
    use crate::ports::clock::SystemClock;
    use crate::typed::handler::{Handler, SharedState};
    use crate::typed::message::AddressedMessage;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use ulid::Ulid;

    fn context() -> HandlerContext {
        HandlerContext::new(Arc::new(NullParcelTracking), Arc::new(SystemClock))
    }

    struct Fixture {
        tracking: Arc<RecordingTracking>,
        sender: Arc<RecordingSender>,
        dispatcher: MessageDispatcher,
    }

    fn fixture(channels: Vec<Channel>, registry: HandlerRegistry) -> Fixture {
        let tracking = Arc::new(RecordingTracking::default());
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = MessageDispatcher::new(
            Arc::new(registry),
            machine(),
            channels,
            TypeMatchStrategy::NamespaceAndName,
            HarnessDetails::default(),
            Arc::clone(&tracking) as Arc<dyn ParcelTracking>,
            Arc::new(ActiveMessageTracker::new()),
            Arc::clone(&sender) as Arc<dyn SendParcels>,
            context(),
        );
        Fixture {
            tracking,
            sender,
            dispatcher,
        }
    }

    fn code() -> TrackingCode {
        TrackingCode::new(
            ParcelId::from_ulid(Ulid::new()),
            EnvelopeId::from_ulid(Ulid::new()),
        )
    }

    fn parcel_of(envelopes: Vec<Envelope>) -> Parcel {
        Parcel::new(ParcelId::from_ulid(Ulid::new()), envelopes)
    }

    fn stuffed<M: Message>(message: M, channel: &str) -> Envelope {
        machine()
            .stuff(AddressedMessage::new(message, Channel::new(channel)), None)
            .unwrap()
    }

    // -- handler/message fixtures ------------------------------------------

    /// Serializes to JSON null: probes the null-deserialization guard.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct NothingMessage;

    impl Message for NothingMessage {
        const NAMESPACE: &'static str = "postal.test";
        const NAME: &'static str = "NothingMessage";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ThrowsMessage {
        text: String,
    }

    impl Message for ThrowsMessage {
        const NAMESPACE: &'static str = "postal.test";
        const NAME: &'static str = "ThrowsMessage";
    }

    struct ThrowsHandler;

    #[async_trait]
    impl Handler<ThrowsMessage> for ThrowsHandler {
        async fn handle(
            &mut self,
            message: ThrowsMessage,
            _ctx: &HandlerContext,
        ) -> Result<DeliveryOutcome, HandlerError> {
            Err(HandlerError::new(message.text))
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct AbortMessage {
        reschedule: bool,
    }

    impl Message for AbortMessage {
        const NAMESPACE: &'static str = "postal.test";
        const NAME: &'static str = "AbortMessage";
    }

    struct AbortHandler;

    #[async_trait]
    impl Handler<AbortMessage> for AbortHandler {
        async fn handle(
            &mut self,
            message: AbortMessage,
            _ctx: &HandlerContext,
        ) -> Result<DeliveryOutcome, HandlerError> {
            Ok(if message.reschedule {
                DeliveryOutcome::abort_and_reschedule("abort", Some(Duration::from_millis(5)))
            } else {
                DeliveryOutcome::abort("abort")
            })
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct WaitMessage {
        millis: u64,
    }

    impl Message for WaitMessage {
        const NAMESPACE: &'static str = "postal.test";
        const NAME: &'static str = "WaitMessage";
    }

    struct WaitHandler;

    #[async_trait]
    impl Handler<WaitMessage> for WaitHandler {
        async fn handle(
            &mut self,
            message: WaitMessage,
            _ctx: &HandlerContext,
        ) -> Result<DeliveryOutcome, HandlerError> {
            tokio::time::sleep(Duration::from_millis(message.millis)).await;
            Ok(DeliveryOutcome::delivered())
        }
    }

    // -- structural preconditions ------------------------------------------

    #[tokio::test]
    async fn empty_parcel_is_a_dispatch_error() {
        let f = fixture(vec![], HandlerRegistry::new());

        let err = f
            .dispatcher
            .dispatch("Name", code(), parcel_of(vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "parcel must contain envelopes");
    }

    #[tokio::test]
    async fn incomplete_type_descriptor_is_a_dispatch_error() {
        let f = fixture(vec![Channel::new("channel")], HandlerRegistry::new());

        for descriptor in [
            TypeDescriptor {
                namespace: String::new(),
                name: "Something".into(),
                qualified_name: "Something".into(),
            },
            TypeDescriptor {
                namespace: "Something".into(),
                name: String::new(),
                qualified_name: "Something".into(),
            },
            TypeDescriptor {
                namespace: "Something".into(),
                name: "Something".into(),
                qualified_name: String::new(),
            },
        ] {
            let envelope = Envelope::new(
                EnvelopeId::from_ulid(Ulid::new()),
                None,
                Some(Channel::new("channel")),
                SealedPayload::new(vec![1]),
                descriptor,
            );
            let err = f
                .dispatcher
                .dispatch("Name", code(), parcel_of(vec![envelope]))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "message type not specified in envelope");
        }
    }

    #[tokio::test]
    async fn null_deserialization_is_a_dispatch_error() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NothingMessage, _, _>(|| {
                struct H;
                #[async_trait]
                impl Handler<NothingMessage> for H {
                    async fn handle(
                        &mut self,
                        _m: NothingMessage,
                        _ctx: &HandlerContext,
                    ) -> Result<DeliveryOutcome, HandlerError> {
                        Ok(DeliveryOutcome::delivered())
                    }
                }
                H
            })
            .unwrap();
        let f = fixture(vec![Channel::new("channel")], registry);

        let envelope = stuffed(NothingMessage, "channel");
        let err = f
            .dispatcher
            .dispatch("Name", code(), parcel_of(vec![envelope]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "first message in parcel deserialized to null");
        assert!(f.tracking.calls().is_empty());
    }

    #[tokio::test]
    async fn unregistered_type_is_a_dispatch_error() {
        let f = fixture(vec![Channel::new("channel")], HandlerRegistry::new());

        let envelope = stuffed(NullMessage::default(), "channel");
        let err = f
            .dispatcher
            .dispatch("Name", code(), parcel_of(vec![envelope]))
            .await
            .unwrap_err();

        assert!(
            err.to_string()
                .starts_with("unable to find handler for message type")
        );
    }

    // -- happy path and forwarding -----------------------------------------

    #[tokio::test]
    async fn success_tracks_attempting_then_delivered() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NullMessage, _, _>(|| NullMessageHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("channel")], registry);

        let envelope = stuffed(NullMessage::default(), "channel");
        f.dispatcher
            .dispatch("Parcel", code(), parcel_of(vec![envelope]))
            .await
            .unwrap();

        assert_eq!(f.tracking.calls(), vec!["attempting", "delivered"]);
        assert!(f.sender.sends().is_empty());
    }

    #[tokio::test]
    async fn remainder_is_forwarded_without_being_deserialized() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NullMessage, _, _>(|| NullMessageHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("channel")], registry);

        // the second envelope's payload is garbage; forwarding must not open it
        let garbage = Envelope::new(
            EnvelopeId::from_ulid(Ulid::new()),
            Some("no work".into()),
            Some(Channel::new("channel")),
            SealedPayload::new(b"WON'T WORK".to_vec()),
            TypeDescriptor::versioned("namespace", "Name", 1),
        );
        let parcel = parcel_of(vec![stuffed(NullMessage::default(), "channel"), garbage.clone()]);

        f.dispatcher
            .dispatch("First Message", code(), parcel)
            .await
            .unwrap();

        let sent = f.sender.parcels();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelopes, vec![garbage]);
    }

    #[tokio::test]
    async fn two_envelope_sequence_completes_with_exactly_one_resend() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NullMessage, _, _>(|| NullMessageHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("c")], registry);

        let parcel = parcel_of(vec![
            stuffed(NullMessage::default(), "c"),
            stuffed(NullMessage::default(), "c"),
        ]);
        let second = parcel.envelopes[1].clone();

        f.dispatcher
            .dispatch("First Message", code(), parcel)
            .await
            .unwrap();

        let sent = f.sender.parcels();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelopes, vec![second.clone()]);
        assert_eq!(second.channel, Some(Channel::new("c")));

        // dispatching the resend finishes the sequence with no further sends
        f.dispatcher
            .dispatch("Second Message", code(), sent[0].clone())
            .await
            .unwrap();
        assert_eq!(f.sender.parcels().len(), 1);
    }

    #[tokio::test]
    async fn unserviced_channel_forwards_the_untouched_parcel() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NullMessage, _, _>(|| NullMessageHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);

        let valid = parcel_of(vec![stuffed(NullMessage::default(), "channel_name")]);
        f.dispatcher
            .dispatch("ValidParcel", code(), valid)
            .await
            .unwrap();
        assert_eq!(f.sender.sends().len(), 0);

        let invalid = parcel_of(vec![stuffed(NullMessage::default(), "other_channel")]);
        f.dispatcher
            .dispatch("InvalidParcel", code(), invalid.clone())
            .await
            .unwrap();

        // forwarded whole, no handler invoked, no Attempting emitted
        assert_eq!(f.sender.parcels(), vec![invalid]);
        assert!(f.tracking.calls().is_empty());
    }

    // -- abort / reject ----------------------------------------------------

    #[tokio::test]
    async fn abort_with_reschedule_resends_the_identical_parcel() {
        let mut registry = HandlerRegistry::new();
        registry.register::<AbortMessage, _, _>(|| AbortHandler).unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);

        let parcel = parcel_of(vec![stuffed(
            AbortMessage { reschedule: true },
            "channel_name",
        )]);

        f.dispatcher
            .dispatch("Parcel", code(), parcel.clone())
            .await
            .unwrap();

        assert_eq!(f.tracking.calls(), vec!["attempting", "aborted"]);
        let sends = f.sender.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, parcel);
        assert_eq!(sends[0].1.delay, Some(Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn abort_without_reschedule_drops_the_parcel() {
        let mut registry = HandlerRegistry::new();
        registry.register::<AbortMessage, _, _>(|| AbortHandler).unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);

        let parcel = parcel_of(vec![stuffed(
            AbortMessage { reschedule: false },
            "channel_name",
        )]);

        f.dispatcher.dispatch("Parcel", code(), parcel).await.unwrap();

        assert_eq!(f.tracking.calls(), vec!["attempting", "aborted"]);
        assert!(f.sender.sends().is_empty());
    }

    #[tokio::test]
    async fn unhandled_error_tracks_rejected_and_propagates_unchanged() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<ThrowsMessage, _, _>(|| ThrowsHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);

        let parcel = parcel_of(vec![stuffed(
            ThrowsMessage {
                text: "Failed".into(),
            },
            "channel_name",
        )]);

        let err = f
            .dispatcher
            .dispatch("Parcel", code(), parcel)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed");
        assert_eq!(f.tracking.calls(), vec!["attempting", "rejected"]);
        assert_eq!(f.tracking.errors(), vec!["Failed".to_string()]);
        assert!(f.sender.sends().is_empty());
    }

    // -- recurring marker --------------------------------------------------

    #[tokio::test]
    async fn recurring_marker_is_dropped_silently_and_the_remainder_runs() {
        let mut registry = HandlerRegistry::new();
        registry
            .register::<NullMessage, _, _>(|| NullMessageHandler)
            .unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);

        let marker = machine()
            .stuff(
                AddressedMessage::unaddressed(RecurringHeaderMessage::default()),
                None,
            )
            .unwrap();
        let parcel = parcel_of(vec![marker, stuffed(NullMessage::default(), "channel_name")]);

        f.dispatcher.dispatch("Parcel", code(), parcel).await.unwrap();

        // the marker produced no tracking events; only the real envelope did
        assert_eq!(f.tracking.calls(), vec!["attempting", "delivered"]);
        assert!(f.sender.sends().is_empty());
    }

    // -- active-message accounting -----------------------------------------

    #[tokio::test]
    async fn counter_is_held_during_handling_and_released_after() {
        let mut registry = HandlerRegistry::new();
        registry.register::<WaitMessage, _, _>(|| WaitHandler).unwrap();
        let f = fixture(vec![Channel::new("channel_name")], registry);
        let dispatcher = Arc::new(f.dispatcher);

        let parcel = parcel_of(vec![stuffed(WaitMessage { millis: 200 }, "channel_name")]);

        assert_eq!(dispatcher.active_messages().active_count(), 0);
        let running = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch("RunMe", code(), parcel).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dispatcher.active_messages().active_count(), 1);

        running.await.unwrap().unwrap();
        assert_eq!(dispatcher.active_messages().active_count(), 0);
    }

    // -- shared state ------------------------------------------------------

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct InitialStateMessage {}

    impl Message for InitialStateMessage {
        const NAMESPACE: &'static str = "postal.test";
        const NAME: &'static str = "InitialStateMessage";
    }

    /// Mirrors the classic create/validate/seed history probe.
    struct StateHandler {
        history: Arc<Mutex<HashMap<&'static str, String>>>,
        validate: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl Handler<InitialStateMessage> for StateHandler {
        async fn handle(
            &mut self,
            _message: InitialStateMessage,
            _ctx: &HandlerContext,
        ) -> Result<DeliveryOutcome, HandlerError> {
            Ok(DeliveryOutcome::delivered())
        }
    }

    impl SharedState for StateHandler {
        type State = String;

        const INTERFACE_NAME: &'static str = "ShareInitialState";

        fn create_state(&self) -> String {
            let state = Ulid::new().to_string();
            self.history
                .lock()
                .unwrap()
                .insert("generate", state.clone());
            state
        }

        fn is_state_still_valid(&self, state: &String) -> bool {
            self.history
                .lock()
                .unwrap()
                .insert("validate", state.clone());
            *self.validate.lock().unwrap()
        }

        fn pre_handle_with_state(&mut self, state: String) {
            self.history.lock().unwrap().insert("seed", state);
        }
    }

    fn state_fixture() -> (
        Fixture,
        Arc<Mutex<HashMap<&'static str, String>>>,
        Arc<Mutex<bool>>,
    ) {
        let history = Arc::new(Mutex::new(HashMap::new()));
        let validate = Arc::new(Mutex::new(false));
        let mut registry = HandlerRegistry::new();
        let (h, v) = (Arc::clone(&history), Arc::clone(&validate));
        registry
            .register_with_state::<InitialStateMessage, _, _>(move || StateHandler {
                history: Arc::clone(&h),
                validate: Arc::clone(&v),
            })
            .unwrap();
        (
            fixture(vec![Channel::new("fake_channel")], registry),
            history,
            validate,
        )
    }

    #[tokio::test]
    async fn initial_state_is_generated_and_seeded() {
        let (f, history, _validate) = state_fixture();

        let parcel = parcel_of(vec![stuffed(InitialStateMessage {}, "fake_channel")]);
        f.dispatcher.dispatch("Parcel Name", code(), parcel).await.unwrap();

        let history = history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history["generate"], history["seed"]);
    }

    #[tokio::test]
    async fn valid_prior_state_is_reused_on_the_next_envelope() {
        let (f, history, validate) = state_fixture();

        // two envelopes so the first run's state travels to the second
        let parcel = parcel_of(vec![
            stuffed(InitialStateMessage {}, "fake_channel"),
            stuffed(InitialStateMessage {}, "fake_channel"),
        ]);
        f.dispatcher
            .dispatch("Parcel Name", code(), parcel)
            .await
            .unwrap();
        let generated = history.lock().unwrap()["generate"].clone();

        let forwarded = f.sender.parcels().pop().unwrap();
        assert_eq!(forwarded.shared_interface_states.len(), 1);

        history.lock().unwrap().clear();
        *validate.lock().unwrap() = true;
        f.dispatcher
            .dispatch("Parcel Name", code(), forwarded)
            .await
            .unwrap();

        let history = history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history["validate"], history["seed"]);
        assert_eq!(history["seed"], generated);
        assert!(!history.contains_key("generate"));
    }

    #[tokio::test]
    async fn stale_prior_state_is_regenerated() {
        let (f, history, validate) = state_fixture();

        let parcel = parcel_of(vec![
            stuffed(InitialStateMessage {}, "fake_channel"),
            stuffed(InitialStateMessage {}, "fake_channel"),
        ]);
        f.dispatcher
            .dispatch("Parcel Name", code(), parcel)
            .await
            .unwrap();
        let forwarded = f.sender.parcels().pop().unwrap();

        history.lock().unwrap().clear();
        *validate.lock().unwrap() = false;
        f.dispatcher
            .dispatch("Parcel Name", code(), forwarded)
            .await
            .unwrap();

        let history = history.lock().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history["seed"], history["generate"]);
        assert_ne!(history["validate"], history["generate"]);
        assert_ne!(history["validate"], history["seed"]);
    }

    #[tokio::test]
    async fn shared_states_accumulate_prefix_preserving() {
        let (f, _history, _validate) = state_fixture();

        let parcel = parcel_of(vec![
            stuffed(InitialStateMessage {}, "fake_channel"),
            stuffed(InitialStateMessage {}, "fake_channel"),
            stuffed(InitialStateMessage {}, "fake_channel"),
        ]);
        f.dispatcher
            .dispatch("Parcel Name", code(), parcel)
            .await
            .unwrap();

        let first_forward = f.sender.parcels().pop().unwrap();
        assert_eq!(first_forward.shared_interface_states.len(), 1);

        f.dispatcher
            .dispatch("Parcel Name", code(), first_forward.clone())
            .await
            .unwrap();

        let second_forward = f.sender.parcels().pop().unwrap();
        assert_eq!(second_forward.shared_interface_states.len(), 2);
        // earlier entries are preserved in order
        assert_eq!(
            second_forward.shared_interface_states[0],
            first_forward.shared_interface_states[0]
        );
    }
}

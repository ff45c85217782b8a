//! Demo harness: wires the in-memory courier, tracking system, registry and
//! worker pool, sends a two-message parcel and polls its tracking report.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use postal_core::app::{
    ActiveMessageTracker, EnvelopeMachine, MessageDispatcher, ParcelTrackingSystem, PostOffice,
    SendOptions, SendParcels, WorkerGroup,
};
use postal_core::domain::{
    Channel, DeliveryOutcome, HandlerError, HarnessDetails, NullMessage, Parcel, ParcelStatus,
    TypeMatchStrategy,
};
use postal_core::handlers::NullMessageHandler;
use postal_core::impls::{InMemoryCourier, InMemoryShipmentEventStore};
use postal_core::ports::{Clock, IdGenerator, SystemClock, TrackingReports, UlidGenerator};
use postal_core::typed::{AddressedMessage, Handler, HandlerContext, HandlerRegistry, Message};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GreetMessage {
    name: String,
}

impl Message for GreetMessage {
    const NAMESPACE: &'static str = "postal.demo";
    const NAME: &'static str = "GreetMessage";
}

struct GreetHandler;

#[async_trait]
impl Handler<GreetMessage> for GreetHandler {
    async fn handle(
        &mut self,
        message: GreetMessage,
        _ctx: &HandlerContext,
    ) -> Result<DeliveryOutcome, HandlerError> {
        info!(name = %message.name, "hello from the greet handler");
        Ok(DeliveryOutcome::delivered())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,postal_core=debug".into()),
        )
        .init();

    // (A) ports: clock, ids, envelope machine, event store, courier
    let clock = Arc::new(SystemClock);
    let ids = Arc::new(UlidGenerator::new(SystemClock));
    let machine = Arc::new(EnvelopeMachine::new(
        TypeMatchStrategy::NamespaceAndName,
        ids.clone(),
    ));
    let courier = Arc::new(InMemoryCourier::new());
    let tracking = Arc::new(ParcelTrackingSystem::new(
        Arc::new(InMemoryShipmentEventStore::new()),
        clock.clone() as Arc<dyn Clock>,
        Arc::clone(&machine),
    ));

    // (B) post office and handler registry (assembled explicitly; the core
    // never discovers handlers on its own)
    let post_office = Arc::new(PostOffice::new(
        courier.clone(),
        tracking.clone(),
        Arc::clone(&machine),
        ids.clone(),
    ));

    let mut registry = HandlerRegistry::new();
    registry
        .register::<GreetMessage, _, _>(|| GreetHandler)
        .expect("register greet handler");
    registry
        .register::<NullMessage, _, _>(|| NullMessageHandler)
        .expect("register null handler");

    // (C) dispatcher servicing channel "demo" plus a worker pool
    let ctx = HandlerContext::new(tracking.clone(), clock.clone() as Arc<dyn Clock>);
    let dispatcher = Arc::new(MessageDispatcher::new(
        Arc::new(registry),
        Arc::clone(&machine),
        vec![Channel::new("demo")],
        TypeMatchStrategy::NamespaceAndName,
        HarnessDetails::capture("postal-cli"),
        tracking.clone(),
        Arc::new(ActiveMessageTracker::new()),
        post_office.clone(),
        ctx,
    ));
    let workers = WorkerGroup::spawn(2, courier.clone(), dispatcher.clone());

    // (D) send a two-envelope parcel: greet, then a null follow-up
    let channel = Channel::new("demo");
    let envelopes = vec![
        machine
            .stuff(
                AddressedMessage::new(
                    GreetMessage {
                        name: "postal".into(),
                    },
                    channel.clone(),
                ),
                None,
            )
            .expect("stuff greet"),
        machine
            .stuff(
                AddressedMessage::new(NullMessage::default(), channel.clone()),
                None,
            )
            .expect("stuff null"),
    ];
    let parcel = Parcel::new(ids.generate_parcel_id(), envelopes);
    let code = post_office
        .send(parcel, SendOptions::labeled("demo parcel"))
        .await
        .expect("send parcel");
    info!(%code, "parcel sent");

    // (E) poll the tracking report until the lead envelope is delivered,
    // then shut the harness down cleanly
    loop {
        let report = &tracking.tracking_report(&[code]).await.expect("report")[0];
        info!(status = ?report.status, "tracking report");
        if matches!(
            report.status,
            ParcelStatus::Delivered | ParcelStatus::Rejected
        ) {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }

    // give the forwarded second envelope a moment to finish too
    sleep(Duration::from_millis(300)).await;
    info!(active = dispatcher.active_messages().active_count(), "draining");

    courier.shutdown().await;
    workers.shutdown_and_join().await;
    info!("done");
}

//! Ingestion pipeline integration tests
//!
//! Run the full pipeline over the in-memory store: channel resolution,
//! normalization, dedup, contact/conversation resolution, attachments and
//! status reconciliation.
//!
//! Run with: cargo test -p integration-tests --test pipeline_tests

use integration_tests::*;
use relay_core::{
    AccountStatus, AttachmentPayload, Channel, FileType, Inbox, MessageStatus, Provider,
    ProviderConfig,
};
use relay_ingest::services::NO_PHONE_TITLE;
use relay_ingest::{DropReason, EventOutcome, FetchedMedia, IngestPipeline, IngestReport, WebhookJob};
use serde_json::json;

fn cloud_channel(harness: &TestHarness) -> (Channel, Inbox) {
    harness.store.seed_channel(
        Provider::Cloud,
        CLOUD_PHONE,
        ProviderConfig::default()
            .with(ProviderConfig::API_KEY, "cloud-token")
            .with(ProviderConfig::PHONE_NUMBER_ID, CLOUD_PHONE_NUMBER_ID),
    )
}

fn gupshup_channel(harness: &TestHarness) -> (Channel, Inbox) {
    harness.store.seed_channel(
        Provider::Gupshup,
        GUPSHUP_PHONE,
        ProviderConfig::default()
            .with(ProviderConfig::API_KEY, "gs-key")
            .with(ProviderConfig::APP_NAME, GUPSHUP_APP),
    )
}

async fn run(harness: &TestHarness, payload: serde_json::Value) -> IngestReport {
    harness
        .perform(&WebhookJob::new(payload))
        .await
        .expect("pipeline should not fail")
}

fn only_outcome(report: &IngestReport) -> &EventOutcome {
    assert_eq!(report.outcomes.len(), 1, "unexpected outcomes: {:?}", report.outcomes);
    &report.outcomes[0]
}

fn drop_reason(report: &IngestReport) -> &DropReason {
    match only_outcome(report) {
        EventOutcome::Dropped { reason, .. } => reason,
        other => panic!("expected a drop, got {other:?}"),
    }
}

// ============================================================================
// Message Ingestion
// ============================================================================

#[tokio::test]
async fn test_cloud_text_creates_contact_conversation_and_message() {
    let harness = TestHarness::new();
    let (channel, inbox) = cloud_channel(&harness);

    let report = run(&harness, cloud_text("wamid.M1", "hi")).await;

    assert_eq!(report.channel_id, Some(channel.id));
    assert!(matches!(
        only_outcome(&report),
        EventOutcome::MessageCreated { message_ids, attachments: 0, .. } if message_ids.len() == 1
    ));

    let messages = harness.store.messages_in(inbox.id);
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.content, "hi");
    assert_eq!(message.source_id, "wamid.M1");
    assert_eq!(message.status, MessageStatus::Sent);

    let contacts = harness.store.contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, CUSTOMER_NAME);
    assert_eq!(contacts[0].phone_number.as_deref(), Some("+15550002"));
    assert_eq!(message.sender_contact_id, Some(contacts[0].id));

    let conversations = harness.store.conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(message.conversation_id, conversations[0].id);

    assert_eq!(harness.guard.claims(), 1);
    assert_eq!(harness.guard.releases(), 1);
    assert_eq!(harness.guard.held(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_create_one_message() {
    let harness = TestHarness::new();
    let (_, inbox) = cloud_channel(&harness);
    let job = WebhookJob::new(cloud_text("wamid.M1", "hi"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = harness.ctx.clone();
            let job = job.clone();
            tokio::spawn(async move { IngestPipeline::new(&ctx).perform(&job).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let report = handle.await.unwrap().unwrap();
        match only_outcome(&report) {
            EventOutcome::MessageCreated { .. } => created += 1,
            EventOutcome::Dropped { reason, .. } => {
                assert!(
                    matches!(reason, DropReason::InFlight | DropReason::Duplicate),
                    "unexpected drop: {reason:?}"
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(harness.store.messages_in(inbox.id).len(), 1);
    assert_eq!(harness.store.contacts().len(), 1);
    assert_eq!(harness.guard.held(), 0);
}

#[tokio::test]
async fn test_redelivery_after_completion_is_duplicate() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    run(&harness, cloud_text("wamid.M1", "hi")).await;
    let report = run(&harness, cloud_text("wamid.M1", "hi")).await;

    assert_eq!(drop_reason(&report), &DropReason::Duplicate);
    assert_eq!(harness.store.messages().len(), 1);
    assert_eq!(harness.guard.claims(), 2);
    assert_eq!(harness.guard.held(), 0);
}

#[tokio::test]
async fn test_reaction_is_dropped_without_claiming() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let payload = cloud_envelope(vec![cloud_value(
        vec![reaction_message("wamid.R1", "wamid.M1")],
        vec![],
    )]);
    let report = run(&harness, payload).await;

    assert_eq!(drop_reason(&report), &DropReason::Unprocessable("reaction".into()));
    assert!(harness.store.messages().is_empty());
    assert_eq!(harness.guard.claims(), 0);
}

#[tokio::test]
async fn test_provider_error_event_is_dropped_without_claiming() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let payload = cloud_envelope(vec![cloud_value(vec![error_message("wamid.E1")], vec![])]);
    let report = run(&harness, payload).await;

    assert_eq!(drop_reason(&report), &DropReason::ProviderErrorEvent);
    assert!(harness.store.messages().is_empty());
    assert_eq!(harness.guard.claims(), 0);
}

#[tokio::test]
async fn test_message_without_sender_is_dropped() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let payload = cloud_envelope(vec![json!({
        "metadata": metadata(CLOUD_DISPLAY_PHONE, CLOUD_PHONE_NUMBER_ID),
        "messages": [{"id": "wamid.X1", "type": "text", "text": {"body": "who am I"}}]
    })]);
    let report = run(&harness, payload).await;

    assert_eq!(drop_reason(&report), &DropReason::MissingSender);
    assert!(harness.store.contacts().is_empty());
    assert_eq!(harness.guard.claims(), 0);
}

#[tokio::test]
async fn test_store_failure_releases_claim_for_retry() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    harness.store.fail_message_writes(1);
    let job = WebhookJob::new(cloud_text("wamid.M1", "hi"));

    let err = harness.perform(&job).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(harness.guard.held(), 0);

    let report = harness.perform(&job).await.unwrap();
    assert!(matches!(only_outcome(&report), EventOutcome::MessageCreated { .. }));
    assert_eq!(harness.store.messages().len(), 1);
}

// ============================================================================
// Channel Resolution
// ============================================================================

#[tokio::test]
async fn test_phone_number_id_mismatch_drops_webhook() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let payload = cloud_envelope(vec![cloud_value_for(
        "pn-other",
        vec![text_message("wamid.M1", "hi")],
        vec![],
    )]);
    let report = run(&harness, payload).await;

    assert_eq!(report.skipped, Some(DropReason::ChannelNotFound));
    assert!(report.outcomes.is_empty());
    assert!(harness.store.messages().is_empty());
    assert_eq!(harness.guard.claims(), 0);
}

#[tokio::test]
async fn test_unknown_number_drops_webhook() {
    let harness = TestHarness::new();

    let report = run(&harness, cloud_text("wamid.M1", "hi")).await;

    assert_eq!(report.skipped, Some(DropReason::ChannelNotFound));
    assert_eq!(report.channel_id, None);
}

#[tokio::test]
async fn test_inactive_channels_receive_nothing() {
    let harness = TestHarness::new();
    let (channel, _) = cloud_channel(&harness);

    harness
        .store
        .set_account_status(channel.account_id, AccountStatus::Suspended);
    let report = run(&harness, cloud_text("wamid.M1", "hi")).await;
    assert_eq!(report.skipped, Some(DropReason::ChannelInactive));

    harness
        .store
        .set_account_status(channel.account_id, AccountStatus::Active);
    harness.store.set_reauthorization_required(channel.id, true);
    let report = run(&harness, cloud_text("wamid.M1", "hi")).await;
    assert_eq!(report.skipped, Some(DropReason::ChannelInactive));

    assert!(harness.store.messages().is_empty());
}

#[tokio::test]
async fn test_dialog_payload_routes_by_url_phone() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    let (dialog, inbox) = harness
        .store
        .seed_channel(Provider::Default, DIALOG_PHONE, ProviderConfig::default());

    let job = WebhookJob::new(dialog_value(
        vec![text_message("d360.M1", "hello")],
        vec![customer()],
    ))
    .with_phone_number("15550003");
    let report = harness.perform(&job).await.unwrap();

    assert_eq!(report.channel_id, Some(dialog.id));
    let messages = harness.store.messages_in(inbox.id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
}

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_messages_share_open_conversation() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    run(&harness, cloud_text("wamid.M1", "one")).await;
    run(&harness, cloud_text("wamid.M2", "two")).await;

    assert_eq!(harness.store.conversations().len(), 1);
    assert_eq!(harness.store.contacts().len(), 1);
}

#[tokio::test]
async fn test_resolved_conversation_is_not_reopened() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    run(&harness, cloud_text("wamid.M1", "one")).await;
    harness.store.resolve_all_conversations();
    run(&harness, cloud_text("wamid.M2", "two")).await;

    let conversations = harness.store.conversations();
    assert_eq!(conversations.len(), 2);
    let second = harness.store.message_by_source_id("wamid.M2").unwrap();
    let open = conversations.iter().find(|c| !c.is_resolved()).unwrap();
    assert_eq!(second.conversation_id, open.id);
}

#[tokio::test]
async fn test_locked_inbox_reuses_resolved_conversation() {
    let harness = TestHarness::new();
    let (_, inbox) = cloud_channel(&harness);
    harness.store.set_lock_to_single_conversation(inbox.id, true);

    run(&harness, cloud_text("wamid.M1", "one")).await;
    harness.store.resolve_all_conversations();
    run(&harness, cloud_text("wamid.M2", "two")).await;

    let conversations = harness.store.conversations();
    assert_eq!(conversations.len(), 1);
    let first = harness.store.message_by_source_id("wamid.M1").unwrap();
    let second = harness.store.message_by_source_id("wamid.M2").unwrap();
    assert_eq!(first.conversation_id, second.conversation_id);
}

// ============================================================================
// Attachments
// ============================================================================

#[tokio::test]
async fn test_image_is_downloaded_and_attached() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    harness.fetcher.serve(FetchedMedia {
        filename: "look".to_string(),
        content_type: "image/jpeg".to_string(),
        data: vec![0xFF, 0xD8, 0xFF],
    });

    let payload = cloud_envelope(vec![cloud_value(
        vec![image_message("wamid.I1", "media-1", "look")],
        vec![],
    )]);
    let report = run(&harness, payload).await;

    assert!(matches!(
        only_outcome(&report),
        EventOutcome::MessageCreated { attachments: 1, .. }
    ));
    let message = harness.store.message_by_source_id("wamid.I1").unwrap();
    assert_eq!(message.content, "look");

    let attachments = harness.store.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].message_id, message.id);
    assert_eq!(attachments[0].file_type, FileType::Image);
    assert_eq!(
        attachments[0].payload,
        AttachmentPayload::File {
            filename: "look".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF],
        }
    );
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_failed_download_keeps_message() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    harness.fetcher.fail();

    let payload = cloud_envelope(vec![cloud_value(
        vec![image_message("wamid.I1", "media-1", "")],
        vec![],
    )]);
    let report = run(&harness, payload).await;

    assert!(matches!(
        only_outcome(&report),
        EventOutcome::MessageCreated { attachments: 0, .. }
    ));
    let message = harness.store.message_by_source_id("wamid.I1").unwrap();
    assert_eq!(message.content, relay_core::ATTACHMENT_PLACEHOLDER);
    assert!(harness.store.attachments().is_empty());
    assert_eq!(harness.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_contact_cards_become_one_message_each() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let cards: [(&str, &[&str]); 2] = [("Ann", &["+91 98765 43210"]), ("Bob", &[])];
    let payload = cloud_envelope(vec![cloud_value(
        vec![contacts_message("wamid.C1", &cards)],
        vec![],
    )]);
    let report = run(&harness, payload).await;

    assert!(matches!(
        only_outcome(&report),
        EventOutcome::MessageCreated { message_ids, attachments: 2, .. } if message_ids.len() == 2
    ));

    let ann = harness.store.message_by_source_id("wamid.C1").unwrap();
    let bob = harness.store.message_by_source_id("wamid.C1:1").unwrap();
    assert_eq!(ann.content, "Ann");
    assert_eq!(bob.content, "Bob");

    let attachments = harness.store.attachments();
    let title_for = |message_id| {
        attachments
            .iter()
            .find(|a| a.message_id == message_id)
            .map(|a| (a.file_type, a.payload.clone()))
    };
    assert_eq!(
        title_for(ann.id),
        Some((
            FileType::Contact,
            AttachmentPayload::Fallback {
                title: "+91 98765 43210".to_string()
            }
        ))
    );
    assert_eq!(
        title_for(bob.id),
        Some((
            FileType::Contact,
            AttachmentPayload::Fallback {
                title: NO_PHONE_TITLE.to_string()
            }
        ))
    );
    assert_eq!(harness.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_contact_only_value_resolves_contact() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let payload = cloud_envelope(vec![json!({
        "metadata": metadata(CLOUD_DISPLAY_PHONE, CLOUD_PHONE_NUMBER_ID),
        "contacts": [customer()]
    })]);
    let report = run(&harness, payload).await;

    let contacts = harness.store.contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(
        only_outcome(&report),
        &EventOutcome::ContactResolved {
            source_id: CUSTOMER_WA_ID.to_string(),
            contact_id: contacts[0].id,
        }
    );
    assert!(harness.store.messages().is_empty());
    assert!(harness.store.conversations().is_empty());
}

// ============================================================================
// Status Reconciliation
// ============================================================================

#[tokio::test]
async fn test_status_for_unknown_message_changes_nothing() {
    let harness = TestHarness::new();
    cloud_channel(&harness);

    let report = run(&harness, cloud_status("wamid.OUT1", "delivered")).await;

    assert_eq!(drop_reason(&report), &DropReason::UnknownMessage);
    assert!(harness.store.messages().is_empty());
    assert_eq!(harness.guard.claims(), 0);
}

#[tokio::test]
async fn test_status_updates_stored_message() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    run(&harness, cloud_text("wamid.M1", "hi")).await;

    let report = run(&harness, cloud_status("wamid.M1", "delivered")).await;
    assert_eq!(
        only_outcome(&report),
        &EventOutcome::StatusUpdated {
            source_id: "wamid.M1".to_string(),
            status: MessageStatus::Delivered,
        }
    );

    run(&harness, cloud_status("wamid.M1", "read")).await;
    let message = harness.store.message_by_source_id("wamid.M1").unwrap();
    assert_eq!(message.status, MessageStatus::Read);
    assert_eq!(message.external_error, None);
}

#[tokio::test]
async fn test_failed_status_records_external_error() {
    let harness = TestHarness::new();
    cloud_channel(&harness);
    run(&harness, cloud_text("wamid.M1", "hi")).await;

    let payload = cloud_envelope(vec![cloud_value(
        vec![],
        vec![failed_status("wamid.M1", 131_047, "Re-engagement message")],
    )]);
    run(&harness, payload).await;

    let message = harness.store.message_by_source_id("wamid.M1").unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert_eq!(
        message.external_error.as_deref(),
        Some("131047: Re-engagement message")
    );
}

// ============================================================================
// Gupshup
// ============================================================================

#[tokio::test]
async fn test_gupshup_message_and_delivery_events() {
    let harness = TestHarness::new();
    let (channel, inbox) = gupshup_channel(&harness);

    let report = run(&harness, gupshup_message("gs-1", "text", json!({"text": "Namaste"}))).await;
    assert_eq!(report.channel_id, Some(channel.id));
    let messages = harness.store.messages_in(inbox.id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Namaste");
    assert_eq!(harness.store.contacts()[0].phone_number.as_deref(), Some("+918123456789"));

    // Queue acknowledgements are not delivery states
    let report = run(&harness, gupshup_event("gs-1", "enqueued", json!({"whatsappMessageId": "w"}))).await;
    assert!(report.outcomes.is_empty());

    run(
        &harness,
        gupshup_event(
            "gs-1",
            "failed",
            json!({"code": 1002, "reason": "Number Does Not Exists On WhatsApp"}),
        ),
    )
    .await;
    let message = harness.store.message_by_source_id("gs-1").unwrap();
    assert_eq!(message.status, MessageStatus::Failed);
    assert_eq!(
        message.external_error.as_deref(),
        Some("1002: Number Does Not Exists On WhatsApp")
    );
}

#[tokio::test]
async fn test_gupshup_unknown_app_is_dropped() {
    let harness = TestHarness::new();
    gupshup_channel(&harness);

    let mut payload = gupshup_message("gs-1", "text", json!({"text": "hi"}));
    payload["app"] = json!("OtherApp");
    let report = run(&harness, payload).await;

    assert_eq!(report.skipped, Some(DropReason::ChannelNotFound));
    assert!(harness.store.messages().is_empty());
}

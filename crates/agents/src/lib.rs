mod sender;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use arogya_core::{
    extract_age, process_message, BroadcastDelivery, BroadcastReport, BroadcastRequest,
    ContentProvider, Intent, Language, MessageRequest, MessageResult, Subscriber,
};
use arogya_observability::{mask_phone, AppMetrics};
use arogya_storage::SubscriberRepository;
use tracing::{info, instrument, warn};

pub use sender::{DeliveryError, HttpSender, LogSender, MessageSender, RecordingSender};

/// Runs the message pipeline and hands results to the outbound channel.
#[derive(Clone)]
pub struct HealthAgent<S>
where
    S: SubscriberRepository,
{
    content: Arc<dyn ContentProvider>,
    sender: Arc<dyn MessageSender>,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> HealthAgent<S>
where
    S: SubscriberRepository,
{
    pub fn new(
        content: Arc<dyn ContentProvider>,
        sender: Arc<dyn MessageSender>,
        store: Arc<S>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            content,
            sender,
            store,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn sender_name(&self) -> &'static str {
        self.sender.name()
    }

    /// Classifies and answers one inbound message.
    ///
    /// Delivery is spawned on the runtime and never awaited: the caller gets
    /// its result even when the provider is down. Failures are logged and
    /// counted only.
    #[instrument(skip(self, request), fields(to = %mask_phone(&request.phone)))]
    pub fn handle_message(&self, request: MessageRequest) -> MessageResult {
        let result = self.answer(&request);

        let sender = Arc::clone(&self.sender);
        let metrics = Arc::clone(&self.metrics);
        let (phone, text) = (result.to.clone(), result.reply.clone());
        tokio::spawn(async move {
            deliver(sender.as_ref(), &metrics, &phone, &text).await;
        });

        result
    }

    /// Same as [`HealthAgent::handle_message`], but returns only after the
    /// sender has finished. Short-lived processes use this so the reply is
    /// not lost on shutdown. A failed delivery still does not change the
    /// result.
    #[instrument(skip(self, request), fields(to = %mask_phone(&request.phone)))]
    pub async fn handle_message_and_deliver(&self, request: MessageRequest) -> MessageResult {
        let result = self.answer(&request);
        deliver(self.sender.as_ref(), &self.metrics, &result.to, &result.reply).await;
        result
    }

    fn answer(&self, request: &MessageRequest) -> MessageResult {
        let started = Instant::now();
        self.metrics.inc_message();

        let result = process_message(self.content.as_ref(), request);

        if extract_age(&request.text).is_some() {
            self.metrics.inc_schedule_reply();
        }
        if result.intent == Intent::Outbreak {
            self.metrics.inc_outbreak_reply();
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            lang = %result.lang,
            intent = %result.intent,
            hinted = request.language_hint.is_some(),
            pincode = request.pincode.is_some(),
            reply_chars = result.reply.chars().count(),
            "message handled"
        );

        result
    }

    pub async fn subscribe(&self, phone: &str, lang: Language) -> Result<Subscriber> {
        let subscriber = self.store.add(phone, lang).await?;
        info!(to = %mask_phone(phone), lang = %lang, "subscriber added");
        Ok(subscriber)
    }

    pub async fn subscriber_count(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Sends the localized announcement to every subscriber, one at a time,
    /// in store order. Each delivery is awaited so the report says which
    /// ones went out.
    #[instrument(skip(self, request))]
    pub async fn broadcast(&self, request: &BroadcastRequest) -> Result<BroadcastReport> {
        let subscribers = self.store.list_all().await?;
        let mut details = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            let text = request.message_for(subscriber.lang);
            let sent = match self.sender.send(&subscriber.phone, text).await {
                Ok(()) => true,
                Err(error) => {
                    self.metrics.inc_delivery_failure();
                    warn!(
                        to = %mask_phone(&subscriber.phone),
                        error = %error,
                        "broadcast delivery failed"
                    );
                    false
                }
            };

            details.push(BroadcastDelivery {
                phone: subscriber.phone,
                lang: subscriber.lang,
                sent: if sent { "yes" } else { "no" }.to_string(),
            });
        }

        self.metrics.record_broadcast(details.len());
        info!(recipients = details.len(), "broadcast finished");

        Ok(BroadcastReport {
            count: details.len(),
            details,
        })
    }
}

async fn deliver(sender: &dyn MessageSender, metrics: &AppMetrics, phone: &str, text: &str) {
    if let Err(error) = sender.send(phone, text).await {
        metrics.inc_delivery_failure();
        warn!(
            to = %mask_phone(phone),
            sender = sender.name(),
            error = %error,
            "reply delivery failed"
        );
    }
}

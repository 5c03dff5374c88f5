use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use voyage_core::NotificationEmitter;
use voyage_shared::ReservationEvent;

/// Publishes booking events to `<topic>.<kind>`, keyed by booking id so a
/// booking's events stay ordered within a partition.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    topic: String,
}

impl EventProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl NotificationEmitter for EventProducer {
    async fn emit(&self, event: &ReservationEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let topic = format!("{}.{}", self.topic, event.kind.topic_suffix());
        let payload = serde_json::to_string(event)?;
        self.publish(&topic, &event.reservation_id.to_string(), &payload).await?;
        Ok(())
    }
}

// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Kafka Message Bus Adapter
//!
//! [`RdKafkaBus`] implements [`MessageBus`] over `rdkafka`: a `FutureProducer`
//! for publishes, a `StreamConsumer` per subscribed topic/group, and an
//! `AdminClient` for topic/group lifecycle. One `RdKafkaBus` is shared (via
//! `Arc`) across the batch loop and the producer acknowledgement task.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::TopicPartitionList;
use tokio::sync::Mutex;

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::ports::{DeliveryAck, MessageBus};

pub struct RdKafkaBus {
    producer: FutureProducer,
    admin: AdminClient<DefaultClientContext>,
    bootstrap_servers: String,
    /// One consumer per (topic, group) pair, created lazily on first poll.
    consumers: Mutex<HashMap<(String, String), StreamConsumer>>,
}

impl RdKafkaBus {
    pub fn new(bootstrap_servers: &str) -> Result<Self, PipelineError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| PipelineError::Bus(format!("failed to create producer: {e}")))?;

        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .create()
            .map_err(|e| PipelineError::Bus(format!("failed to create admin client: {e}")))?;

        Ok(Self {
            producer,
            admin,
            bootstrap_servers: bootstrap_servers.to_string(),
            consumers: Mutex::new(HashMap::new()),
        })
    }

    async fn consumer_for(&self, topic: &str, group_id: &str) -> Result<(), PipelineError> {
        let mut consumers = self.consumers.lock().await;
        let key = (topic.to_string(), group_id.to_string());
        if consumers.contains_key(&key) {
            return Ok(());
        }

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| PipelineError::Bus(format!("failed to create consumer: {e}")))?;

        consumer.subscribe(&[topic]).map_err(|e| PipelineError::Bus(format!("failed to subscribe to {topic}: {e}")))?;

        consumers.insert(key, consumer);
        Ok(())
    }
}

#[async_trait]
impl MessageBus for RdKafkaBus {
    async fn ensure_topic(&self, topic: &str, partitions: i32, replication_factor: i32) -> Result<(), PipelineError> {
        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(replication_factor));
        let results = self
            .admin
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| PipelineError::Bus(format!("create_topics failed: {e}")))?;

        for result in results {
            match result {
                Ok(_) => {}
                // TopicAlreadyExists is the expected steady-state outcome.
                Err((name, err)) => {
                    if !err.to_string().to_lowercase().contains("already exists") {
                        return Err(PipelineError::Bus(format!("failed to create topic {name}: {err}")));
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete_topic(&self, topic: &str) -> Result<(), PipelineError> {
        let results = self
            .admin
            .delete_topics(&[topic], &AdminOptions::new())
            .await
            .map_err(|e| PipelineError::Bus(format!("delete_topics failed: {e}")))?;

        for result in results {
            if let Err((name, err)) = result {
                if !err.to_string().to_lowercase().contains("unknown topic") {
                    return Err(PipelineError::Bus(format!("failed to delete topic {name}: {err}")));
                }
            }
        }
        Ok(())
    }

    async fn reset_to_earliest(&self, topic: &str, group_id: &str) -> Result<(), PipelineError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .create()
            .map_err(|e| PipelineError::Bus(format!("failed to create reset consumer: {e}")))?;

        let metadata = consumer
            .fetch_metadata(Some(topic), Duration::from_secs(10))
            .map_err(|e| PipelineError::Bus(format!("failed to fetch metadata for {topic}: {e}")))?;

        let mut tpl = TopicPartitionList::new();
        for partition in metadata.topics().iter().flat_map(|t| t.partitions()) {
            tpl.add_partition_offset(topic, partition.id(), rdkafka::Offset::Beginning)
                .map_err(|e| PipelineError::Bus(e.to_string()))?;
        }

        consumer.assign(&tpl).map_err(|e| PipelineError::Bus(format!("failed to assign partitions: {e}")))?;
        consumer
            .commit(&tpl, rdkafka::consumer::CommitMode::Sync)
            .map_err(|e| PipelineError::Bus(format!("failed to commit reset offsets: {e}")))?;

        self.consumers.lock().await.remove(&(topic.to_string(), group_id.to_string()));
        Ok(())
    }

    async fn consumer_lag(&self, topic: &str, group_id: &str) -> Result<i64, PipelineError> {
        self.consumer_for(topic, group_id).await?;
        let consumers = self.consumers.lock().await;
        let consumer = consumers
            .get(&(topic.to_string(), group_id.to_string()))
            .ok_or_else(|| PipelineError::Bus("consumer not found".to_string()))?;

        let metadata = consumer
            .fetch_metadata(Some(topic), Duration::from_secs(10))
            .map_err(|e| PipelineError::Bus(format!("failed to fetch metadata for {topic}: {e}")))?;

        let mut total_lag = 0i64;
        for partition in metadata.topics().iter().flat_map(|t| t.partitions()) {
            let (_, high) = consumer
                .fetch_watermarks(topic, partition.id(), Duration::from_secs(10))
                .map_err(|e| PipelineError::Bus(format!("failed to fetch watermarks: {e}")))?;
            let committed = consumer
                .committed_offsets(TopicPartitionList::new(), Duration::from_secs(10))
                .ok()
                .and_then(|tpl| tpl.find_partition(topic, partition.id()))
                .and_then(|p| p.offset().to_raw())
                .unwrap_or(0);
            total_lag += (high - committed).max(0);
        }
        Ok(total_lag)
    }

    async fn publish(&self, topic: &str, key: &str, payload: &[u8]) -> Result<DeliveryAck, PipelineError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);
        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| PipelineError::Publish(format!("failed to publish to {topic}: {e}")))?;

        Ok(DeliveryAck { key: key.to_string(), event_time: Utc::now() })
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Duration::from_secs(10)))
            .await
            .map_err(|e| PipelineError::Publish(format!("flush task panicked: {e}")))?
            .map_err(|e| PipelineError::Publish(format!("flush failed: {e}")))
    }

    async fn poll(&self, topic: &str, group_id: &str) -> Result<Option<(String, Vec<u8>)>, PipelineError> {
        self.consumer_for(topic, group_id).await?;
        let consumers = self.consumers.lock().await;
        let consumer = consumers
            .get(&(topic.to_string(), group_id.to_string()))
            .ok_or_else(|| PipelineError::Bus("consumer not found".to_string()))?;

        match tokio::time::timeout(Duration::from_secs(1), consumer.recv()).await {
            Ok(Ok(message)) => {
                let key = message.key().map(|k| String::from_utf8_lossy(k).into_owned()).unwrap_or_default();
                let payload = message.payload().map(|p| p.to_vec()).unwrap_or_default();
                Ok(Some((key, payload)))
            }
            Ok(Err(e)) => Err(PipelineError::Bus(format!("poll failed: {e}"))),
            Err(_) => Ok(None),
        }
    }
}

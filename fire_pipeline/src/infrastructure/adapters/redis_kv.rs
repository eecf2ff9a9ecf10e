// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Redis KV + Search Index Adapter
//!
//! [`RedisKvStore`] implements both [`KvStore`] (cursors, watermark, served
//! event hashes) and [`SearchIndex`] (RediSearch `FT.*` commands) over one
//! shared `ConnectionManager`. The `redis` crate has no RediSearch command
//! builder, so index lifecycle goes through raw `redis::cmd(...)` — the same
//! wire commands the original service's `redis.commands.search` wrapper
//! issues.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use fire_pipeline_domain::error::PipelineError;
use fire_pipeline_domain::ports::{IndexField, KvStore, SearchIndex};

pub struct RedisKvStore {
    conn: Mutex<ConnectionManager>,
}

impl RedisKvStore {
    pub async fn connect(redis_url: &str) -> Result<Self, PipelineError> {
        let client = redis::Client::open(redis_url).map_err(|e| PipelineError::Kv(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await.map_err(|e| PipelineError::Kv(format!("redis connect failed: {e}")))?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PipelineError> {
        let mut conn = self.conn.lock().await;
        conn.get(key).await.map_err(|e| PipelineError::Kv(format!("GET {key} failed: {e}")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PipelineError> {
        let mut conn = self.conn.lock().await;
        conn.set::<_, _, ()>(key, value).await.map_err(|e| PipelineError::Kv(format!("SET {key} failed: {e}")))
    }

    async fn exists(&self, key: &str) -> Result<bool, PipelineError> {
        let mut conn = self.conn.lock().await;
        conn.exists(key).await.map_err(|e| PipelineError::Kv(format!("EXISTS {key} failed: {e}")))
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, PipelineError> {
        let mut conn = self.conn.lock().await;
        let keys: Vec<String> =
            conn.keys(pattern).await.map_err(|e| PipelineError::Kv(format!("KEYS {pattern} failed: {e}")))?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 =
            conn.del(&keys).await.map_err(|e| PipelineError::Kv(format!("DEL for pattern {pattern} failed: {e}")))?;
        Ok(deleted)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, PipelineError> {
        let mut conn = self.conn.lock().await;
        conn.keys(pattern).await.map_err(|e| PipelineError::Kv(format!("KEYS {pattern} failed: {e}")))
    }

    async fn set_hash(&self, key: &str, fields: &[(String, String)]) -> Result<(), PipelineError> {
        let mut conn = self.conn.lock().await;
        conn.hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(|e| PipelineError::Kv(format!("HSET {key} failed: {e}")))
    }
}

#[async_trait]
impl SearchIndex for RedisKvStore {
    async fn create_index(&self, index_id: &str, schema: &[IndexField], key_prefix: &str) -> Result<(), PipelineError> {
        if self.index_exists(index_id).await? {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(index_id).arg("ON").arg("HASH").arg("PREFIX").arg(1).arg(format!("{key_prefix}:")).arg("SCHEMA");

        for field in schema {
            match field {
                IndexField::Tag { name } => {
                    cmd.arg(name).arg("TAG");
                }
                IndexField::NumericSortable { name } => {
                    cmd.arg(name).arg("NUMERIC").arg("SORTABLE");
                }
                IndexField::Text { name } => {
                    cmd.arg(name).arg("TEXT");
                }
            }
        }

        cmd.query_async::<()>(&mut *conn).await.map_err(|e| PipelineError::Kv(format!("FT.CREATE {index_id} failed: {e}")))
    }

    async fn drop_index(&self, index_id: &str) -> Result<(), PipelineError> {
        if !self.index_exists(index_id).await? {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        redis::cmd("FT.DROPINDEX")
            .arg(index_id)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|e| PipelineError::Kv(format!("FT.DROPINDEX {index_id} failed: {e}")))
    }

    async fn index_exists(&self, index_id: &str) -> Result<bool, PipelineError> {
        let mut conn = self.conn.lock().await;
        let indexes: Vec<String> = redis::cmd("FT._LIST")
            .query_async(&mut *conn)
            .await
            .map_err(|e| PipelineError::Kv(format!("FT._LIST failed: {e}")))?;
        Ok(indexes.iter().any(|i| i == index_id))
    }
}

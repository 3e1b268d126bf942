//! Live profiling session against a MongoDB database.
//!
//! Wraps the driver calls the tool needs: reading and setting the profiling
//! level, re-creating the capped `system.profile` collection, and streaming
//! its documents back out once the collection window has closed.

use crate::Result;
use crate::config::Config;
use crate::log::RawLogEntry;
use crate::model::ProfileAggregator;

use anyhow::{Context, anyhow, bail};
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{Client, Database};
use std::time::Duration;

pub const PROFILE_COLLECTION: &str = "system.profile";

/// Profiler disabled.
pub const LEVEL_OFF: i32 = 0;
/// Profile every operation.
pub const LEVEL_ALL: i32 = 2;

pub struct ProfilerSession {
    db: Database,
}

/// What happened during one collection window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSummary {
    pub original_level: i32,
    pub collected: u64,
    /// The capped collection may have overwritten its oldest entries.
    pub possibly_rolled_over: bool,
}

impl ProfilerSession {
    pub async fn connect(config: &Config) -> Result<Self> {
        let uri = config.connection_string();
        let client = Client::with_uri_str(&uri)
            .await
            .context("create MongoDB client")?;
        let db = client.database(&config.database);

        db.run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("connect to database {}", config.database))?;
        tracing::debug!(database = %config.database, "connected");

        Ok(Self { db })
    }

    pub async fn profiling_level(&self) -> Result<i32> {
        let reply = self
            .db
            .run_command(doc! { "profile": -1 })
            .await
            .context("read profiling level")?;
        read_level(&reply)
    }

    /// Set the level and return the previous one.
    pub async fn set_profiling_level(&self, level: i32) -> Result<i32> {
        let reply = self
            .db
            .run_command(doc! { "profile": level })
            .await
            .with_context(|| format!("set profiling level to {}", level))?;
        read_level(&reply)
    }

    /// Drop `system.profile` and re-create it as a capped collection.
    ///
    /// The server refuses to drop the profile collection while profiling is
    /// enabled, so the caller must have switched it off first.
    pub async fn reset_profile_collection(&self, size_bytes: u64, max_objects: u64) -> Result<()> {
        self.db
            .collection::<Document>(PROFILE_COLLECTION)
            .drop()
            .await
            .with_context(|| format!("drop {}", PROFILE_COLLECTION))?;

        self.db
            .run_command(create_capped_command(size_bytes, max_objects)?)
            .await
            .with_context(|| format!("create capped {}", PROFILE_COLLECTION))?;
        Ok(())
    }

    pub async fn profile_count(&self) -> Result<u64> {
        let reply = self
            .db
            .run_command(doc! { "count": PROFILE_COLLECTION })
            .await
            .with_context(|| format!("count {}", PROFILE_COLLECTION))?;
        read_count(&reply, "n")
    }

    /// Stream every profiling entry into `agg`.
    pub async fn fold_entries(&self, agg: &mut ProfileAggregator) -> Result<()> {
        let mut cursor = self
            .db
            .collection::<RawLogEntry>(PROFILE_COLLECTION)
            .find(doc! {})
            .projection(doc! { "info": 1, "op": 1, "ns": 1 })
            .await
            .with_context(|| format!("query {}", PROFILE_COLLECTION))?;

        while let Some(entry) = cursor
            .try_next()
            .await
            .with_context(|| format!("read {}", PROFILE_COLLECTION))?
        {
            agg.push(&entry);
        }
        Ok(())
    }

    /// Profile everything for `config.interval()`, then put the original
    /// level back.
    ///
    /// The level is restored even if the window fails or is interrupted.
    pub async fn run_window(&self, config: &Config) -> Result<WindowSummary> {
        let original_level = self.profiling_level().await?;
        tracing::info!("current profiling level is {}", original_level);

        let outcome = self.collect(config, original_level).await;

        let restored = self.set_profiling_level(original_level).await;
        match &restored {
            Ok(_) => tracing::info!(
                "reverted to original profiling level {}",
                original_level
            ),
            Err(err) => tracing::warn!(
                "could not restore profiling level {}: {:#}",
                original_level,
                err
            ),
        }

        let collected = outcome?;
        restored?;

        Ok(WindowSummary {
            original_level,
            collected,
            possibly_rolled_over: collected >= config.max_objects,
        })
    }

    async fn collect(&self, config: &Config, original_level: i32) -> Result<u64> {
        if original_level != LEVEL_OFF {
            self.set_profiling_level(LEVEL_OFF).await?;
        }
        self.reset_profile_collection(config.size_bytes, config.max_objects)
            .await?;

        self.set_profiling_level(LEVEL_ALL).await?;
        tracing::info!("changed profiling level to {}", LEVEL_ALL);
        tracing::info!(
            "data collection starting, will stop in {} seconds",
            config.interval_secs
        );

        wait_for_window(config.interval()).await?;

        self.profile_count().await
    }
}

/// Sleep for the window; Ctrl-C cuts it short with an error.
async fn wait_for_window(window: Duration) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(window) => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            signal.context("listen for Ctrl-C")?;
            bail!("interrupted before the collection window closed")
        }
    }
}

fn create_capped_command(size_bytes: u64, max_objects: u64) -> Result<Document> {
    let size = i64::try_from(size_bytes).context("--size does not fit in a BSON int64")?;
    let max = i64::try_from(max_objects).context("--max-objects does not fit in a BSON int64")?;
    Ok(doc! {
        "create": PROFILE_COLLECTION,
        "capped": true,
        "size": size,
        "max": max,
    })
}

/// `was` from a `profile` command reply.
fn read_level(reply: &Document) -> Result<i32> {
    match reply.get("was") {
        Some(Bson::Int32(v)) => Ok(*v),
        Some(Bson::Int64(v)) => i32::try_from(*v).context("profiling level out of range"),
        Some(Bson::Double(v)) if v.fract() == 0.0 => Ok(*v as i32),
        Some(other) => Err(anyhow!("unexpected profiling level in reply: {}", other)),
        None => Err(anyhow!("profile reply has no 'was' field: {}", reply)),
    }
}

fn read_count(reply: &Document, key: &str) -> Result<u64> {
    let n = match reply.get(key) {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) if v.fract() == 0.0 => *v as i64,
        Some(other) => bail!("unexpected count in reply: {}", other),
        None => bail!("count reply has no '{}' field: {}", key, reply),
    };
    u64::try_from(n).with_context(|| format!("negative count {}", n))
}

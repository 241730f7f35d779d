//! Install and activate.
//!
//! Install seeds the static generation from the configured manifest;
//! activate purges every generation that is no longer current, claims
//! open clients, and arms the deferred-sync registration. Both are
//! idempotent so a host may retry them.

use crate::engine::{Engine, EngineState};
use larder_core::{CachedEntry, Error};

impl Engine {
    /// Seed the static cache generation.
    ///
    /// Fetches every path in the seed manifest through the gateway and
    /// stores all of them in one transaction. Any fetch failure or non-2xx
    /// status aborts the install and leaves the store exactly as it was,
    /// so a previous engine version (if any) stays in control.
    ///
    /// On success the engine is `Installed` and ready for immediate
    /// activation; there is no waiting period for existing clients.
    pub async fn install(&self) -> Result<(), Error> {
        let generation = &self.config.static_generation;
        tracing::info!("installing {} ({} seed paths)", generation, self.config.seed_manifest.len());

        let mut seeded = Vec::with_capacity(self.config.seed_manifest.len());
        for path in &self.config.seed_manifest {
            let response = self
                .gateway
                .get(path)
                .await
                .map_err(|e| Error::SeedFailed { path: path.clone(), reason: e.to_string() })?;

            if !response.is_ok() {
                return Err(Error::SeedFailed {
                    path: path.clone(),
                    reason: format!("status {}", response.status),
                });
            }

            let headers_json = serde_json::to_string(&response.headers).ok();
            seeded.push(CachedEntry::new(
                path,
                response.status,
                response.content_type.clone(),
                headers_json,
                response.body.to_vec(),
            ));
        }

        // All-or-nothing: either the whole manifest lands or none of it.
        self.store.put_entries(generation, seeded).await?;

        if self.state() == EngineState::Idle {
            self.set_state(EngineState::Installed);
        }

        tracing::info!("install of {} complete", generation);
        Ok(())
    }

    /// Take control: purge stale generations and claim open clients.
    ///
    /// Deletes every generation whose name is neither the configured
    /// static nor runtime generation, creates the runtime generation,
    /// claims all open clients through the platform, and registers the
    /// deferred-sync tag that triggers order replay.
    ///
    /// # Errors
    ///
    /// [`Error::NotInstalled`] when no install has completed. A failed
    /// sync registration is logged but not fatal: replay is re-armed the
    /// next time the host delivers a sync event with records remaining.
    pub async fn activate(&self) -> Result<(), Error> {
        if self.state() == EngineState::Idle {
            return Err(Error::NotInstalled);
        }

        let keep = [self.config.static_generation.as_str(), self.config.runtime_generation.as_str()];
        let removed = self.store.purge_generations_except(&keep).await?;
        if !removed.is_empty() {
            tracing::info!("purged stale generations: {}", removed.join(", "));
        }

        self.store.create_generation(&self.config.runtime_generation).await?;

        self.platform.claim_clients().await?;
        self.set_state(EngineState::Active);

        if let Err(e) = self.platform.register_sync(&self.config.sync_tag).await {
            tracing::warn!("deferred sync registration failed: {}", e);
        }

        tracing::info!("activated with {} current", self.config.static_generation);
        Ok(())
    }
}

//! Grant orchestration
//!
//! The kill phase decides whether the reward goes into a corpse and flips the
//! gate. The loot phase announces the reward once a player actually takes it
//! and records who did, without re-evaluating the gate.

use crate::announcer::Announcer;
use crate::config::OnceDropConfig;
use crate::hooks::DropHooks;
use crate::ports::{Broadcaster, Clock, NameResolver, SystemClock};
use crate::roll::roll;
use crate::types::{Actor, KilledCreature, LootContainer, LootSource};
use gate_core::{GateBackend, GateCache, GateRecord, GateState, GateStore, StoreError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Source name used when nothing better resolves
pub const UNKNOWN_SOURCE: &str = "their foe";

/// What a kill occurrence did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// No configuration has been loaded yet
    Uninitialized,
    Disabled,
    NotTarget,
    /// The gate is closed
    AlreadyGranted,
    /// The corpse already carries the reward
    AlreadyInLoot,
    RollFailed,
    /// The reward was added to the corpse
    Granted {
        /// Whether the gate store accepted the write
        persisted: bool,
    },
}

/// What a loot-collection occurrence did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootOutcome {
    Ignored,
    Announced {
        message: String,
        /// Whether the gate store accepted the metadata write
        persisted: bool,
    },
}

/// Snapshot of the gate for admin tooling
#[derive(Debug, Clone, Serialize)]
pub struct GateStatus {
    pub state: GateState,
    pub record: Option<GateRecord>,
    pub read_error: Option<String>,
}

/// The once-per-server reward service.
///
/// Constructed once at startup and handed to the host's hook glue.
pub struct OnceDropService {
    config: RwLock<Arc<OnceDropConfig>>,
    store: GateStore,
    cache: GateCache,
    announcer: Announcer,
    names: Arc<dyn NameResolver>,
    clock: Arc<dyn Clock>,
    rng: Mutex<ChaCha8Rng>,
    /// Held across check-roll-insert-persist so grants never interleave
    grant_lock: Mutex<()>,
}

impl OnceDropService {
    /// Create a service with the wall clock and an entropy-seeded RNG.
    ///
    /// The gate stays uninitialized until the first `on_config_loaded`.
    pub fn new(
        backend: Arc<dyn GateBackend>,
        broadcaster: Arc<dyn Broadcaster>,
        names: Arc<dyn NameResolver>,
    ) -> Self {
        OnceDropService {
            config: RwLock::new(Arc::new(OnceDropConfig::default())),
            store: GateStore::new(backend),
            cache: GateCache::new(),
            announcer: Announcer::new(broadcaster),
            names,
            clock: Arc::new(SystemClock::new()),
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
            grant_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make rolls reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<OnceDropConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> GateState {
        self.cache.state()
    }

    fn lock_grants(&self) -> MutexGuard<'_, ()> {
        self.grant_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn roll(&self, chance_percent: f64) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        roll(chance_percent, &mut *rng)
    }

    /// Install a configuration and rebuild the gate from the store.
    ///
    /// Ensures the record exists, clears it when `reset_on_startup` is set,
    /// then reloads the cache. Store failures are logged; a failed read
    /// leaves the gate open.
    pub fn load_config(&self, mut config: OnceDropConfig, is_reload: bool) {
        config.normalize();
        let _guard = self.lock_grants();
        let key = config.gate_key.clone();

        if let Err(e) = self.store.ensure_initialized(&key) {
            tracing::error!(key = %key, error = %e, "Failed to initialize gate record");
        }

        if config.reset_on_startup {
            match self.store.reset(&key) {
                Ok(()) => {
                    tracing::info!(key = %key, "ResetOnStartup set, cleared once-per-server gate")
                }
                Err(e) => tracing::error!(key = %key, error = %e, "Failed to reset gate"),
            }
        }

        let granted = self.store.load(&key);
        self.cache.load_from(granted);

        let target_name = self
            .names
            .creature_template_name(config.target_entry)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        tracing::info!(
            enabled = config.enabled,
            target_entry = config.target_entry,
            target = %target_name,
            chance = %format!("{:.3}%", config.chance_percent),
            allow_repeat = config.allow_repeat,
            reset_on_startup = config.reset_on_startup,
            already_granted = granted,
            reload = is_reload,
            "Once-drop configuration loaded"
        );

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
    }

    /// Kill phase: maybe put the reward into `loot` and close the gate
    pub fn handle_kill(
        &self,
        killer: &Actor,
        killed: &KilledCreature,
        loot: &mut LootContainer,
    ) -> KillOutcome {
        if let Some(outcome) = screen_kill(&self.config(), killed) {
            return outcome;
        }

        let _guard = self.lock_grants();
        // A reload may have landed while waiting for the lock
        let config = self.config();
        if let Some(outcome) = screen_kill(&config, killed) {
            return outcome;
        }

        match self.cache.state() {
            GateState::Uninitialized => return KillOutcome::Uninitialized,
            GateState::Granted if !config.allow_repeat => return KillOutcome::AlreadyGranted,
            _ => {}
        }

        if loot.contains(config.item_entry) {
            return KillOutcome::AlreadyInLoot;
        }

        if !self.roll(config.chance_percent) {
            return KillOutcome::RollFailed;
        }

        loot.add_one(config.item_entry);

        let now = self.clock.now_epoch_seconds();
        let persisted = match self.store.record_grant(
            &config.gate_key,
            &killer.name,
            now,
            config.allow_repeat,
        ) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    key = %config.gate_key,
                    killer = %killer.name,
                    error = %e,
                    "Failed to persist grant, item stays in loot"
                );
                false
            }
        };

        if !config.allow_repeat {
            self.cache.mark_granted();
        }

        tracing::info!(
            item = config.item_entry,
            creature = %killed.name,
            killer = %killer.name,
            allow_repeat = config.allow_repeat,
            "Added reward to corpse loot"
        );

        KillOutcome::Granted { persisted }
    }

    /// Loot phase: announce the reward and record the looter
    pub fn handle_loot(&self, looter: &Actor, item_entry: u32, source: LootSource) -> LootOutcome {
        let config = self.config();
        if !config.enabled
            || item_entry != config.item_entry
            || self.cache.state() == GateState::Uninitialized
        {
            return LootOutcome::Ignored;
        }

        let source_name = self.resolve_source_name(source, config.target_entry);
        let message = self
            .announcer
            .announce(&looter.name, &config.item_name, &source_name);

        let now = self.clock.now_epoch_seconds();
        let persisted = match self
            .store
            .record_loot_metadata(&config.gate_key, &looter.name, now)
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    key = %config.gate_key,
                    looter = %looter.name,
                    error = %e,
                    "Failed to record loot metadata"
                );
                false
            }
        };

        LootOutcome::Announced { message, persisted }
    }

    fn resolve_source_name(&self, source: LootSource, target_entry: u32) -> String {
        self.names
            .source_name(source)
            .filter(|n| !n.is_empty())
            .or_else(|| {
                tracing::debug!(%source, "Loot source unresolved, using target template name");
                self.names
                    .creature_template_name(target_entry)
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
    }

    /// Reopen the gate outside of a config load
    pub fn reset_gate(&self) -> Result<(), StoreError> {
        let config = self.config();
        let _guard = self.lock_grants();
        self.store.reset(&config.gate_key)?;
        self.cache.mark_ready();
        tracing::info!(key = %config.gate_key, "Gate reset");
        Ok(())
    }

    /// Cached state plus the persisted record, if readable
    pub fn status(&self) -> GateStatus {
        let config = self.config();
        let (record, read_error) = match self.store.load_record(&config.gate_key) {
            Ok(record) => (record, None),
            Err(e) => (None, Some(e.to_string())),
        };
        GateStatus {
            state: self.cache.state(),
            record,
            read_error,
        }
    }
}

fn screen_kill(config: &OnceDropConfig, killed: &KilledCreature) -> Option<KillOutcome> {
    if !config.enabled {
        Some(KillOutcome::Disabled)
    } else if killed.entry != config.target_entry {
        Some(KillOutcome::NotTarget)
    } else {
        None
    }
}

impl DropHooks for OnceDropService {
    fn on_entity_killed(&self, killer: &Actor, killed: &KilledCreature, loot: &mut LootContainer) {
        let outcome = self.handle_kill(killer, killed, loot);
        tracing::trace!(?outcome, creature = killed.entry, "Kill handled");
    }

    fn on_item_collected(&self, looter: &Actor, item_entry: u32, source: LootSource) {
        self.handle_loot(looter, item_entry, source);
    }

    fn on_config_loaded(&self, config: OnceDropConfig, is_reload: bool) {
        self.load_config(config, is_reload);
    }
}

use crate::config::OnceDropConfig;
use crate::types::{Actor, KilledCreature, LootContainer, LootSource};

/// Callbacks the host's event dispatch invokes.
///
/// Implementations must never panic or block the host on internal failure;
/// problems are logged and the call returns normally.
pub trait DropHooks: Send + Sync {
    /// A player killed a creature whose corpse loot is `loot`
    fn on_entity_killed(&self, killer: &Actor, killed: &KilledCreature, loot: &mut LootContainer);

    /// A player took `item_entry` out of the loot of `source`
    fn on_item_collected(&self, looter: &Actor, item_entry: u32, source: LootSource);

    /// Configuration was (re)loaded
    fn on_config_loaded(&self, config: OnceDropConfig, is_reload: bool);
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// A player taking part in a kill or loot occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub guid: u64,
    pub name: String,
}

impl Actor {
    pub fn new(guid: u64, name: impl Into<String>) -> Self {
        Actor {
            guid,
            name: name.into(),
        }
    }
}

/// The creature that just died
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KilledCreature {
    pub guid: u64,
    /// Creature template entry
    pub entry: u32,
    pub name: String,
}

impl KilledCreature {
    pub fn new(guid: u64, entry: u32, name: impl Into<String>) -> Self {
        KilledCreature {
            guid,
            entry,
            name: name.into(),
        }
    }
}

/// One stack of items in a loot container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LootItem {
    pub item_entry: u32,
    pub count: u32,
}

/// The lootable contents of a corpse or object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootContainer {
    pub items: Vec<LootItem>,
    /// Items only visible to players on the matching quest
    pub quest_items: Vec<LootItem>,
}

impl LootContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any regular or quest stack holds `item_entry`
    pub fn contains(&self, item_entry: u32) -> bool {
        self.items
            .iter()
            .chain(self.quest_items.iter())
            .any(|i| i.item_entry == item_entry)
    }

    /// Add a single unit of `item_entry` as a new regular stack
    pub fn add_one(&mut self, item_entry: u32) {
        self.items.push(LootItem {
            item_entry,
            count: 1,
        });
    }

    /// Total units of `item_entry` across all stacks
    pub fn count_of(&self, item_entry: u32) -> u32 {
        self.items
            .iter()
            .chain(self.quest_items.iter())
            .filter(|i| i.item_entry == item_entry)
            .map(|i| i.count)
            .sum()
    }
}

/// What a looted item was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootSource {
    Creature { guid: u64, entry: u32 },
    GameObject { guid: u64, entry: u32 },
    /// Anything else (mail, item containers, unknown guids)
    Other { guid: u64 },
}

impl fmt::Display for LootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LootSource::Creature { guid, entry } => write!(f, "Creature({}:{})", entry, guid),
            LootSource::GameObject { guid, entry } => {
                write!(f, "GameObject({}:{})", entry, guid)
            }
            LootSource::Other { guid } => write!(f, "Other({})", guid),
        }
    }
}

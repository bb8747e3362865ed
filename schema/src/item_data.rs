use serde::Serialize;

/// What a battle item does when used on the active Pokemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemEffect {
    Heal(u16),
    HealToFull,
    CureStatus,
    FullRestore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemData {
    pub id: &'static str,
    pub name: &'static str,
    pub effect: ItemEffect,
}

static ITEMS: &[ItemData] = &[
    ItemData { id: "potion", name: "Potion", effect: ItemEffect::Heal(20) },
    ItemData { id: "super_potion", name: "Super Potion", effect: ItemEffect::Heal(50) },
    ItemData { id: "hyper_potion", name: "Hyper Potion", effect: ItemEffect::Heal(200) },
    ItemData { id: "max_potion", name: "Max Potion", effect: ItemEffect::HealToFull },
    ItemData { id: "full_heal", name: "Full Heal", effect: ItemEffect::CureStatus },
    ItemData { id: "full_restore", name: "Full Restore", effect: ItemEffect::FullRestore },
];

impl ItemData {
    pub fn lookup(id: &str) -> Option<&'static ItemData> {
        let key = id.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ITEMS.iter().find(|item| item.id == key)
    }
}

// Immutable per-mob-type combat data, loaded once at startup.

use serde::Deserialize;
use std::collections::HashMap;

use super::state::Style;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MobTemplate {
    pub protection: i32,
    #[serde(default)]
    pub style: Option<Style>,
    pub power: i32,
    pub max_hp: i32,
    /// Radius in which a disengaging mob looks for a new target.
    #[serde(default = "default_sight_range")]
    pub sight_range: i32,
}

fn default_sight_range() -> i32 {
    1200
}

#[derive(Debug, Deserialize)]
struct MobTableEntry {
    mob_type: i32,
    #[serde(flatten)]
    template: MobTemplate,
}

#[derive(Debug, Clone, Default)]
pub struct MobTable {
    templates: HashMap<i32, MobTemplate>,
}

impl MobTable {
    pub fn new(templates: HashMap<i32, MobTemplate>) -> Self {
        Self { templates }
    }

    /// Parses a JSON array of `{ "mob_type": .., "protection": .., ... }` entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<MobTableEntry> = serde_json::from_str(json)?;
        Ok(Self {
            templates: entries
                .into_iter()
                .map(|entry| (entry.mob_type, entry.template))
                .collect(),
        })
    }

    /// Small table used when no data file is configured.
    pub fn builtin() -> Self {
        let rows = [
            (1, 40, None, 60, 400),
            (2, 120, Some(Style::Adaptium), 180, 1500),
            (3, 150, Some(Style::Blastons), 220, 1800),
            (4, 180, Some(Style::Cosmix), 260, 2100),
            (5, 600, Some(Style::Blastons), 900, 20000),
        ];
        Self {
            templates: rows
                .into_iter()
                .map(|(mob_type, protection, style, power, max_hp)| {
                    (
                        mob_type,
                        MobTemplate {
                            protection,
                            style,
                            power,
                            max_hp,
                            sight_range: default_sight_range(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn get(&self, mob_type: i32) -> Option<&MobTemplate> {
        self.templates.get(&mob_type)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_with_optional_fields() {
        let table = MobTable::from_json(
            r#"[
                {"mob_type": 7, "protection": 90, "style": "Cosmix", "power": 150, "max_hp": 800},
                {"mob_type": 8, "protection": 10, "power": 20, "max_hp": 100, "sight_range": 300}
            ]"#,
        )
        .expect("expected mob table to parse");

        let seven = table.get(7).expect("expected mob type 7");
        assert_eq!(seven.style, Some(Style::Cosmix));
        assert_eq!(seven.sight_range, 1200);

        let eight = table.get(8).expect("expected mob type 8");
        assert_eq!(eight.style, None);
        assert_eq!(eight.sight_range, 300);
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(MobTable::from_json(r#"{"mob_type": 1}"#).is_err());
    }

    #[test]
    fn builtin_table_is_not_empty() {
        assert!(!MobTable::builtin().is_empty());
    }
}

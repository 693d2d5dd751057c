//! The content database: every static table the engine consumes, keyed by
//! id. Entries that fail to compile are skipped with a recorded warning so
//! one bad row never takes down the rest of the table.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use super::types::{
    compile_class, compile_enemy, compile_item, compile_skill, ClassDef, EnemyTemplate, Item,
    RawClass, RawEnemyTemplate, RawItem, RawSkill, Skill,
};

#[derive(Debug, Default)]
pub struct ContentDb {
    skills: HashMap<String, Skill>,
    items: HashMap<String, Item>,
    classes: HashMap<String, ClassDef>,
    enemies: HashMap<String, EnemyTemplate>,
    warnings: Vec<String>,
}

impl ContentDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the content shipped with the binary.
    pub fn builtin() -> Self {
        let mut db = Self::new();
        db.load_skills_json(include_str!("../../assets/skills.json"));
        db.load_items_json(include_str!("../../assets/items.json"));
        db.load_classes_json(include_str!("../../assets/classes.json"));
        db.load_enemies_json(include_str!("../../assets/enemies.json"));
        db
    }

    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id)
    }

    pub fn enemy(&self, id: &str) -> Option<&EnemyTemplate> {
        self.enemies.get(id)
    }

    /// Problems encountered while loading, for surfacing at startup.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.skills.insert(skill.id.clone(), skill);
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn add_class(&mut self, class: ClassDef) {
        self.classes.insert(class.id.clone(), class);
    }

    pub fn add_enemy(&mut self, template: EnemyTemplate) {
        self.enemies.insert(template.id.clone(), template);
    }

    pub fn load_skills_json(&mut self, json: &str) {
        let (entries, mut warnings) = parse_entries::<RawSkill>(json, "skills");
        for raw in entries {
            match compile_skill(raw) {
                Ok(skill) => self.add_skill(skill),
                Err(warning) => warnings.push(warning),
            }
        }
        self.warnings.append(&mut warnings);
    }

    pub fn load_items_json(&mut self, json: &str) {
        let (entries, mut warnings) = parse_entries::<RawItem>(json, "items");
        for raw in entries {
            match compile_item(raw) {
                Ok(item) => self.add_item(item),
                Err(warning) => warnings.push(warning),
            }
        }
        self.warnings.append(&mut warnings);
    }

    pub fn load_classes_json(&mut self, json: &str) {
        let (entries, mut warnings) = parse_entries::<RawClass>(json, "classes");
        for raw in entries {
            match compile_class(raw) {
                Ok(class) => self.add_class(class),
                Err(warning) => warnings.push(warning),
            }
        }
        self.warnings.append(&mut warnings);
    }

    pub fn load_enemies_json(&mut self, json: &str) {
        let (entries, mut warnings) = parse_entries::<RawEnemyTemplate>(json, "enemies");
        for raw in entries {
            match compile_enemy(raw) {
                Ok(template) => self.add_enemy(template),
                Err(warning) => warnings.push(warning),
            }
        }
        self.warnings.append(&mut warnings);
    }
}

/// Parses a JSON array entry-by-entry so a malformed row is skipped with a
/// warning instead of failing the whole table.
fn parse_entries<T: DeserializeOwned>(json: &str, table: &str) -> (Vec<T>, Vec<String>) {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(e) => {
            warnings.push(format!("{table}: unreadable table ({e})"));
            return (entries, warnings);
        }
    };

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => warnings.push(format!("{table}[{index}]: {e}")),
        }
    }

    (entries, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_content_loads_clean() {
        let db = ContentDb::builtin();
        assert!(
            db.warnings().is_empty(),
            "builtin content warnings: {:?}",
            db.warnings()
        );
        assert!(db.skill("field_dressing").is_some());
        assert!(db.item("shock_baton").is_some());
        assert!(db.class("enforcer").is_some());
        assert!(db.enemy("guard").is_some());
        assert!(db.enemy("warden_prime").is_some());
    }

    #[test]
    fn test_bad_row_skipped_with_warning() {
        let mut db = ContentDb::new();
        db.load_skills_json(
            r#"[
                {"id": "ok", "name": "Ok", "type": "utility", "cost": 0},
                {"id": "broken", "name": "Broken", "type": "dance", "cost": 0},
                {"name": "missing id"}
            ]"#,
        );
        assert!(db.skill("ok").is_some());
        assert!(db.skill("broken").is_none());
        assert_eq!(db.warnings().len(), 2);
    }

    #[test]
    fn test_unreadable_table_is_one_warning() {
        let mut db = ContentDb::new();
        db.load_items_json("not json");
        assert_eq!(db.warnings().len(), 1);
    }
}

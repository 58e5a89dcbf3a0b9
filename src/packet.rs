//! Packets: insertion-ordered name -> value records (`spec.md` §3).

use crate::unicode::normalize;
use crate::value::Value;

/// One row of a loop, or (for the scalars loop) a container's unlooped item
/// set. Keys are unique under CIF name normalization; the original spelling
/// of the most recent insertion for a given normalized key is preserved.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Packet {
    // Parallel vectors keep insertion order without needing an indexmap
    // dependency the rest of the teacher's stack doesn't otherwise pull in.
    names: Vec<String>,
    norm_names: Vec<String>,
    values: Vec<Value>,
}

impl Packet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let norm = normalize(name);
        self.norm_names.iter().position(|n| *n == norm)
    }

    /// Insert `value` under `name`. If an equivalent (normalized) key
    /// already exists, its value is replaced and its stored spelling updates
    /// to `name` (`spec.md` §3: "the stored original form updates to the
    /// most recent insertion form").
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => {
                self.names[idx] = name;
                self.values[idx] = value;
            }
            None => {
                self.norm_names.push(normalize(&name));
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.values[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.position(name).map(move |idx| &mut self.values[idx])
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.position(name).map(|idx| {
            self.norm_names.remove(idx);
            self.names.remove(idx);
            self.values.remove(idx)
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Names in first-insertion order, original spelling.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names
            .iter()
            .map(|s| s.as_str())
            .zip(self.values.iter())
    }

    /// Apply a partial-packet update in place: every item present in
    /// `partial` overwrites this packet's value for that name; items absent
    /// from `partial` are left unchanged (`spec.md` §4.5, packet iterator
    /// `update`).
    pub fn apply_update(&mut self, partial: &Packet) {
        for (name, value) in partial.iter() {
            self.insert(name, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_under_normalized_key_and_updates_spelling() {
        let mut p = Packet::new();
        p.insert("_Cell_Length_A", Value::Char("1".into()));
        p.insert("_cell_length_a", Value::Char("2".into()));
        assert_eq!(p.len(), 1);
        assert_eq!(p.get("_CELL_LENGTH_A"), Some(&Value::Char("2".into())));
        assert_eq!(p.names().next(), Some("_cell_length_a"));
    }

    #[test]
    fn preserves_first_insertion_order() {
        let mut p = Packet::new();
        p.insert("_b", Value::Unk);
        p.insert("_a", Value::Unk);
        p.insert("_c", Value::Unk);
        assert_eq!(p.names().collect::<Vec<_>>(), vec!["_b", "_a", "_c"]);
    }

    #[test]
    fn apply_update_touches_only_named_items() {
        let mut p = Packet::new();
        p.insert("_x", Value::Char("old".into()));
        p.insert("_y", Value::Char("unchanged".into()));
        let mut partial = Packet::new();
        partial.insert("_x", Value::Char("new".into()));
        p.apply_update(&partial);
        assert_eq!(p.get("_x"), Some(&Value::Char("new".into())));
        assert_eq!(p.get("_y"), Some(&Value::Char("unchanged".into())));
    }
}

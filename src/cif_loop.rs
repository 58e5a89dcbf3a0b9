//! Loops: named column sets plus row vectors (`spec.md` §3, §9).
//!
//! Grounded in `spec.md` §9's explicit storage guidance: "store both the
//! name->column-index map and the row vectors of `Option<Value>` (absent =>
//! UNK). Name lookup uses the normalized form as key; retain the original
//! form per column."

use std::collections::HashMap;

use crate::error::CifErrorCode;
use crate::packet::Packet;
use crate::unicode::normalize;
use crate::value::Value;

/// A loop's reserved category marking it as the container's scalars loop
/// (`spec.md` §3: "The empty-string category... is reserved").
pub const SCALARS_CATEGORY: &str = "";

/// A loop: declared item names (columns) plus an ordered sequence of packets
/// (rows). Every packet provides exactly the loop's name set; an absent
/// value at the storage layer is `None`, surfaced to callers as
/// [`Value::Unk`] (`spec.md` §9).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Loop {
    names: Vec<String>,
    norm_index: HashMap<String, usize>,
    rows: Vec<Vec<Option<Value>>>,
    /// `None` = no category set; `Some("")` = the reserved scalars loop.
    category: Option<String>,
}

impl Loop {
    /// Create a loop with the given column names, in declaration order.
    /// `spec.md` §4.2: "A loop with no names yields `CIF_NULL_LOOP`" — that
    /// check belongs to the caller (the parser/store), which is why this
    /// constructor itself just rejects empty input as a misuse error.
    pub fn new(names: Vec<String>) -> Result<Self, CifErrorCode> {
        if names.is_empty() {
            return Err(CifErrorCode::NullLoop);
        }
        let mut norm_index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            crate::container::validate_item_name(name)?;
            let norm = normalize(name);
            if norm_index.insert(norm, i).is_some() {
                return Err(CifErrorCode::DuplicateItemName);
            }
        }
        Ok(Loop {
            names,
            norm_index,
            rows: Vec::new(),
            category: None,
        })
    }

    /// Create the reserved scalars loop. Unlike a regular loop it starts
    /// with no declared columns: a container's unlooped items are added one
    /// at a time as scalar items are parsed, each one widening this loop's
    /// single implicit row (`spec.md` §3, "Scalars loop").
    pub fn scalars() -> Self {
        Loop {
            names: Vec::new(),
            norm_index: HashMap::new(),
            rows: Vec::new(),
            category: Some(SCALARS_CATEGORY.to_string()),
        }
    }

    /// Set (inserting or overwriting) a single scalar item's value, widening
    /// the loop's column set and its sole row as needed. Valid only on the
    /// scalars loop; `spec.md` §6.4's "get/set a scalar item's single value".
    pub fn set_scalar(&mut self, name: impl Into<String>, value: Value) -> Result<(), CifErrorCode> {
        if !self.is_scalars() {
            return Err(CifErrorCode::WrongLoop);
        }
        let name = name.into();
        crate::container::validate_item_name(&name)?;
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        match self.column_index(&name) {
            Some(idx) => self.rows[0][idx] = Some(value),
            None => {
                let norm = normalize(&name);
                let idx = self.names.len();
                self.names.push(name);
                self.norm_index.insert(norm, idx);
                self.rows[0].push(Some(value));
            }
        }
        Ok(())
    }

    pub fn get_scalar(&self, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.first()?.get(idx)?.as_ref()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.norm_index.get(&normalize(name)).copied()
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_scalars(&self) -> bool {
        self.category.as_deref() == Some(SCALARS_CATEGORY)
    }

    /// Set the loop's category. Rejects changing a loop into or out of the
    /// reserved empty-string category (`spec.md` §3).
    pub fn set_category(&mut self, category: Option<String>) -> Result<(), CifErrorCode> {
        let was_scalars = self.is_scalars();
        let will_be_scalars = category.as_deref() == Some(SCALARS_CATEGORY);
        if was_scalars != will_be_scalars {
            return Err(CifErrorCode::CategoryNotUnique);
        }
        self.category = category;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a new column, extending every existing row with `UNK` in that
    /// position (`spec.md` §6.4: "add/remove items to/from loops").
    pub fn add_item(&mut self, name: impl Into<String>) -> Result<(), CifErrorCode> {
        let name = name.into();
        crate::container::validate_item_name(&name)?;
        let norm = normalize(&name);
        if self.norm_index.contains_key(&norm) {
            return Err(CifErrorCode::DuplicateItemName);
        }
        let idx = self.names.len();
        self.names.push(name);
        self.norm_index.insert(norm, idx);
        for row in &mut self.rows {
            row.push(None);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, name: &str) -> Result<(), CifErrorCode> {
        let idx = self.column_index(name).ok_or(CifErrorCode::NoSuchLoop)?;
        self.names.remove(idx);
        self.norm_index.remove(&normalize(name));
        for (_, v) in self.norm_index.iter_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    /// Append a packet as a new row. The reserved scalars loop may hold at
    /// most one packet (`spec.md` §3).
    pub fn add_packet(&mut self, packet: &Packet) -> Result<(), CifErrorCode> {
        if self.is_scalars() && !self.rows.is_empty() {
            return Err(CifErrorCode::InvalidPacket);
        }
        let mut row = vec![None; self.names.len()];
        for (name, value) in packet.iter() {
            match self.column_index(name) {
                Some(idx) => row[idx] = Some(value.clone()),
                None => return Err(CifErrorCode::WrongLoop),
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn packet_at(&self, row: usize) -> Option<Packet> {
        let data = self.rows.get(row)?;
        let mut p = Packet::new();
        for (i, name) in self.names.iter().enumerate() {
            let v = data[i].clone().unwrap_or(Value::Unk);
            p.insert(name.clone(), v);
        }
        Some(p)
    }

    pub fn remove_row(&mut self, row: usize) -> Result<(), CifErrorCode> {
        if row >= self.rows.len() {
            return Err(CifErrorCode::InvalidIndex);
        }
        self.rows.remove(row);
        Ok(())
    }

    /// Apply a partial-packet update onto a row in place, leaving columns
    /// absent from `partial` untouched (`spec.md` §4.5).
    pub fn update_row(&mut self, row: usize, partial: &Packet) -> Result<(), CifErrorCode> {
        let data = self.rows.get_mut(row).ok_or(CifErrorCode::InvalidIndex)?;
        for (name, value) in partial.iter() {
            let idx = self
                .norm_index
                .get(&normalize(name))
                .copied()
                .ok_or(CifErrorCode::WrongLoop)?;
            data[idx] = Some(value.clone());
        }
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = Packet> + '_ {
        (0..self.rows.len()).map(move |i| self.packet_at(i).expect("row index in range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rejects_empty_name_list() {
        assert_eq!(Loop::new(vec![]), Err(CifErrorCode::NullLoop));
    }

    #[test]
    fn rejects_duplicate_names_under_normalization() {
        assert_eq!(
            Loop::new(names(&["_a", "_A"])),
            Err(CifErrorCode::DuplicateItemName)
        );
    }

    #[test]
    fn rejects_name_missing_leading_underscore() {
        assert_eq!(Loop::new(names(&["a"])), Err(CifErrorCode::InvalidItemName));
    }

    #[test]
    fn rejects_name_containing_whitespace() {
        assert_eq!(
            Loop::new(names(&["_a b"])),
            Err(CifErrorCode::InvalidItemName)
        );
    }

    #[test]
    fn rejects_bare_underscore_name() {
        assert_eq!(Loop::new(names(&["_"])), Err(CifErrorCode::InvalidItemName));
    }

    #[test]
    fn scalars_loop_set_scalar_rejects_invalid_name() {
        let mut l = Loop::scalars();
        assert_eq!(
            l.set_scalar("not_a_tag", Value::Unk),
            Err(CifErrorCode::InvalidItemName)
        );
    }

    #[test]
    fn absent_item_reads_as_unk() {
        let mut l = Loop::new(names(&["_a", "_b"])).unwrap();
        let mut p = Packet::new();
        p.insert("_a", Value::Char("x".into()));
        l.add_packet(&p).unwrap();
        let row = l.packet_at(0).unwrap();
        assert_eq!(row.get("_b"), Some(&Value::Unk));
    }

    #[test]
    fn scalars_loop_set_scalar_widens_single_row() {
        let mut l = Loop::scalars();
        l.set_scalar("_a", Value::Char("1".into())).unwrap();
        l.set_scalar("_b", Value::Char("2".into())).unwrap();
        assert_eq!(l.len(), 1);
        assert_eq!(l.get_scalar("_a"), Some(&Value::Char("1".into())));
        assert_eq!(l.get_scalar("_b"), Some(&Value::Char("2".into())));
    }

    #[test]
    fn scalars_loop_rejects_second_packet_via_add_packet() {
        let mut l = Loop::scalars();
        l.add_item("_a").unwrap();
        let mut p = Packet::new();
        p.insert("_a", Value::Unk);
        l.add_packet(&p).unwrap();
        assert_eq!(l.add_packet(&p), Err(CifErrorCode::InvalidPacket));
    }

    #[test]
    fn iteration_visits_every_row_once() {
        let mut l = Loop::new(names(&["_a"])).unwrap();
        for i in 0..3 {
            let mut p = Packet::new();
            p.insert("_a", Value::Char(i.to_string()));
            l.add_packet(&p).unwrap();
        }
        let collected: Vec<_> = l.rows().map(|p| p.get("_a").cloned()).collect();
        assert_eq!(collected.len(), 3);
    }
}

//! Containers: data blocks and save frames (`spec.md` §3).

use crate::cif_loop::Loop;
use crate::error::CifErrorCode;
use crate::options::MAX_LINE_LENGTH;
use crate::unicode::{is_name_continue, normalize};
use crate::value::Value;

/// Validate a block/frame code: non-empty, no whitespace, no disallowed
/// controls, at most `MAX_LINE_LENGTH` code points (`spec.md` §3, §6.1).
pub fn validate_code(code: &str) -> Result<(), CifErrorCode> {
    if code.is_empty() {
        return Err(CifErrorCode::InvalidBlockCode);
    }
    if code.chars().count() > MAX_LINE_LENGTH {
        return Err(CifErrorCode::InvalidBlockCode);
    }
    if !code.chars().all(is_name_continue) {
        return Err(CifErrorCode::InvalidBlockCode);
    }
    Ok(())
}

/// Validate a data name: leading `_`, at least one character past it, no
/// whitespace or disallowed controls, at most `MAX_LINE_LENGTH` code points
/// total (`spec.md` §3, §6.1). Applied at every API surface that lets a
/// caller hand in a name directly, since the lexer/parser path already
/// guarantees this shape for names it tokenizes itself.
pub fn validate_item_name(name: &str) -> Result<(), CifErrorCode> {
    if name.chars().count() > MAX_LINE_LENGTH {
        return Err(CifErrorCode::InvalidItemName);
    }
    let mut chars = name.chars();
    if chars.next() != Some('_') {
        return Err(CifErrorCode::InvalidItemName);
    }
    if chars.as_str().is_empty() {
        return Err(CifErrorCode::InvalidItemName);
    }
    if !name.chars().all(is_name_continue) {
        return Err(CifErrorCode::InvalidItemName);
    }
    Ok(())
}

/// Shared behavior of data blocks and save frames: an ordered loop
/// collection plus the reserved scalars loop, with item names unique across
/// the whole container (`spec.md` §3: "an item belongs to exactly one
/// loop").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ItemContainer {
    loops: Vec<Loop>,
    /// Index into `loops` of the reserved scalars loop, once one exists.
    scalars_index: Option<usize>,
}

impl Default for ItemContainer {
    fn default() -> Self {
        Self {
            loops: Vec::new(),
            scalars_index: None,
        }
    }
}

impl ItemContainer {
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn loops_mut(&mut self) -> &mut [Loop] {
        &mut self.loops
    }

    /// Find which loop (by index) currently owns `name`, if any.
    pub fn find_item_loop(&self, name: &str) -> Option<usize> {
        self.loops.iter().position(|l| l.has_item(name))
    }

    pub fn loop_at(&self, idx: usize) -> Option<&Loop> {
        self.loops.get(idx)
    }

    pub fn loop_at_mut(&mut self, idx: usize) -> Option<&mut Loop> {
        self.loops.get_mut(idx)
    }

    /// Add a new (non-scalars) loop, rejecting item names already owned
    /// elsewhere in the container (`spec.md` §3: item names are globally
    /// unique within a container).
    pub fn add_loop(&mut self, l: Loop) -> Result<usize, CifErrorCode> {
        for name in l.names() {
            if self.find_item_loop(name).is_some() {
                return Err(CifErrorCode::DuplicateItemName);
            }
        }
        self.loops.push(l);
        Ok(self.loops.len() - 1)
    }

    pub fn remove_loop(&mut self, idx: usize) -> Result<Loop, CifErrorCode> {
        if idx >= self.loops.len() {
            return Err(CifErrorCode::NoSuchLoop);
        }
        if self.scalars_index == Some(idx) {
            self.scalars_index = None;
        } else if let Some(si) = self.scalars_index {
            if si > idx {
                self.scalars_index = Some(si - 1);
            }
        }
        Ok(self.loops.remove(idx))
    }

    fn scalars_index_or_create(&mut self) -> usize {
        if let Some(i) = self.scalars_index {
            return i;
        }
        self.loops.push(Loop::scalars());
        let idx = self.loops.len() - 1;
        self.scalars_index = Some(idx);
        idx
    }

    /// Set a scalar (unlooped) item's value (`spec.md` §4.2, "Scalar
    /// items"). Rejects names already owned by a non-scalars loop.
    pub fn set_scalar(&mut self, name: &str, value: Value) -> Result<(), CifErrorCode> {
        if let Some(idx) = self.find_item_loop(name) {
            if Some(idx) != self.scalars_index {
                return Err(CifErrorCode::DuplicateItemName);
            }
        }
        let idx = self.scalars_index_or_create();
        self.loops[idx].set_scalar(name, value)
    }

    pub fn get_scalar(&self, name: &str) -> Option<&Value> {
        let idx = self.scalars_index?;
        self.loops[idx].get_scalar(name)
    }

    pub fn scalars_loop(&self) -> Option<&Loop> {
        self.scalars_index.map(|i| &self.loops[i])
    }

    /// Remove every zero-packet non-scalars loop (`spec.md` §3: "A utility
    /// operation removes all empty loops from a container"). The scalars
    /// loop is exempt: it is never "empty" in the pruning sense even with no
    /// items set, since it carries no packet-count invariant of its own.
    pub fn prune_empty_loops(&mut self) {
        let scalars_idx = self.scalars_index;
        let mut kept = Vec::with_capacity(self.loops.len());
        let mut new_scalars_index = None;
        for (i, l) in self.loops.drain(..).enumerate() {
            if Some(i) == scalars_idx || !l.is_empty() {
                if Some(i) == scalars_idx {
                    new_scalars_index = Some(kept.len());
                }
                kept.push(l);
            }
        }
        self.loops = kept;
        self.scalars_index = new_scalars_index;
    }
}

/// A save frame: a named subsection of a data block, structurally like a
/// block but never itself holding further frames (`spec.md` §4.2).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    code: String,
    items: ItemContainer,
}

impl Frame {
    pub fn new(code: impl Into<String>) -> Result<Self, CifErrorCode> {
        let code = code.into();
        validate_code(&code)?;
        Ok(Frame {
            code,
            items: ItemContainer::default(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn items(&self) -> &ItemContainer {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemContainer {
        &mut self.items
    }
}

/// A data block: a code, its items/loops, and an ordered collection of save
/// frames (`spec.md` §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Block {
    code: String,
    items: ItemContainer,
    frames: Vec<Frame>,
}

impl Block {
    pub fn new(code: impl Into<String>) -> Result<Self, CifErrorCode> {
        let code = code.into();
        validate_code(&code)?;
        Ok(Block {
            code,
            items: ItemContainer::default(),
            frames: Vec::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn items(&self) -> &ItemContainer {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut ItemContainer {
        &mut self.items
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn find_frame(&self, code: &str) -> Option<&Frame> {
        let norm = normalize(code);
        self.frames.iter().find(|f| normalize(f.code()) == norm)
    }

    pub fn find_frame_mut(&mut self, code: &str) -> Option<&mut Frame> {
        let norm = normalize(code);
        self.frames.iter_mut().find(|f| normalize(f.code()) == norm)
    }

    /// Add a save frame, rejecting a code already used within this block
    /// (`spec.md` §3: "save frame codes are unique within their immediate
    /// parent container").
    pub fn add_frame(&mut self, frame: Frame) -> Result<(), CifErrorCode> {
        if self.find_frame(frame.code()).is_some() {
            return Err(CifErrorCode::DuplicateFrameCode);
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn remove_frame(&mut self, code: &str) -> Result<Frame, CifErrorCode> {
        let norm = normalize(code);
        let pos = self
            .frames
            .iter()
            .position(|f| normalize(f.code()) == norm)
            .ok_or(CifErrorCode::MissingFrameCode)?;
        Ok(self.frames.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_code() {
        assert_eq!(Block::new("").unwrap_err(), CifErrorCode::InvalidBlockCode);
    }

    #[test]
    fn rejects_code_containing_structural_characters() {
        for bad in ["a[b", "a]b", "a{b", "a}b", "a$b", "a:b", "a'b", "a\"b"] {
            assert_eq!(
                Block::new(bad).unwrap_err(),
                CifErrorCode::InvalidBlockCode,
                "{bad:?} should have been rejected"
            );
        }
    }

    #[test]
    fn rejects_item_name_containing_structural_characters() {
        let mut b = Block::new("x").unwrap();
        for bad in ["_a[b", "_a]b", "_a{b", "_a}b", "_a$b", "_a:b", "_a'b", "_a\"b"] {
            assert_eq!(
                b.items_mut().set_scalar(bad, Value::Char("1".into())).unwrap_err(),
                CifErrorCode::InvalidItemName,
                "{bad:?} should have been rejected"
            );
        }
    }

    #[test]
    fn duplicate_frame_codes_rejected_under_normalization() {
        let mut b = Block::new("x").unwrap();
        b.add_frame(Frame::new("Foo").unwrap()).unwrap();
        let err = b.add_frame(Frame::new("FOO").unwrap()).unwrap_err();
        assert_eq!(err, CifErrorCode::DuplicateFrameCode);
    }

    #[test]
    fn scalar_items_go_in_reserved_loop() {
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_a", Value::Char("1".into()))
            .unwrap();
        assert!(b.items().scalars_loop().unwrap().is_scalars());
        assert_eq!(
            b.items().get_scalar("_a"),
            Some(&Value::Char("1".into()))
        );
    }

    #[test]
    fn prune_empty_loops_keeps_scalars_but_drops_others() {
        let mut b = Block::new("x").unwrap();
        b.items_mut()
            .set_scalar("_a", Value::Char("1".into()))
            .unwrap();
        let empty_loop = Loop::new(vec!["_b".to_string()]).unwrap();
        b.items_mut().add_loop(empty_loop).unwrap();
        assert_eq!(b.items().loops().len(), 2);
        b.items_mut().prune_empty_loops();
        assert_eq!(b.items().loops().len(), 1);
        assert!(b.items().scalars_loop().is_some());
    }
}

//! The store boundary (`spec.md` §6.4): everything the parser and the
//! data-model API need from a backing CIF representation.
//!
//! `spec.md` treats a SQLite-backed store as an external pluggable
//! collaborator and only specifies the interface. This module defines that
//! interface as a trait, [`Store`], plus the one concrete implementation
//! this crate ships: [`MemoryStore`], an in-process tree backed by [`Cif`].
//! A caller who wants a persistent backend implements [`Store`] themselves;
//! the parser is generic over it (`spec.md` §9: "non-virtual and direct").

use crate::cif_loop::Loop;
use crate::container::Block;
use crate::document::Cif;
use crate::error::CifErrorCode;
use crate::packet::Packet;
use crate::value::Value;

/// Addresses a container (a data block, or a save frame within a block) by
/// code, since a store implementation may not expose Rust references the
/// way `MemoryStore` does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerRef {
    Block { block: String },
    Frame { block: String, frame: String },
}

/// The store interface parsing and model manipulation depend on
/// (`spec.md` §6.4). Implementors are responsible for enforcing the
/// invariants of `spec.md` §3 (uniqueness, category rules, scalars-loop
/// singleton) and for using CIF name-normalization comparisons.
pub trait Store {
    fn create_block(&mut self, code: &str) -> Result<(), CifErrorCode>;
    fn has_block(&self, code: &str) -> Result<bool, CifErrorCode>;
    fn list_blocks(&self) -> Result<Vec<String>, CifErrorCode>;

    fn create_frame(&mut self, block: &str, code: &str) -> Result<(), CifErrorCode>;
    fn has_frame(&self, block: &str, code: &str) -> Result<bool, CifErrorCode>;
    fn list_frames(&self, block: &str) -> Result<Vec<String>, CifErrorCode>;

    fn create_loop(&mut self, container: &ContainerRef, names: &[String]) -> Result<(), CifErrorCode>;
    fn list_loop_names(&self, container: &ContainerRef) -> Result<Vec<Vec<String>>, CifErrorCode>;

    fn add_packet(&mut self, container: &ContainerRef, loop_names: &[String], packet: &Packet) -> Result<(), CifErrorCode>;

    fn set_scalar(&mut self, container: &ContainerRef, name: &str, value: Value) -> Result<(), CifErrorCode>;
    fn get_scalar(&self, container: &ContainerRef, name: &str) -> Result<Option<Value>, CifErrorCode>;
}

/// The default in-process store: a thin wrapper around an owned [`Cif`]
/// tree. Backs `Cif::parse_str` and friends so parsing "just works" without
/// a caller ever touching the `Store` trait directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cif: Cif,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_cif(self) -> Cif {
        self.cif
    }

    pub fn cif(&self) -> &Cif {
        &self.cif
    }

    pub fn cif_mut(&mut self) -> &mut Cif {
        &mut self.cif
    }

    fn block_mut(&mut self, code: &str) -> Result<&mut Block, CifErrorCode> {
        self.cif.find_block_mut(code).ok_or(CifErrorCode::MissingBlockCode)
    }

    fn resolve_items_mut(
        &mut self,
        container: &ContainerRef,
    ) -> Result<&mut crate::container::ItemContainer, CifErrorCode> {
        match container {
            ContainerRef::Block { block } => Ok(self.block_mut(block)?.items_mut()),
            ContainerRef::Frame { block, frame } => {
                let b = self.block_mut(block)?;
                let frame = b
                    .find_frame_mut(frame)
                    .ok_or(CifErrorCode::MissingFrameCode)?;
                Ok(frame.items_mut())
            }
        }
    }
}

impl Store for MemoryStore {
    fn create_block(&mut self, code: &str) -> Result<(), CifErrorCode> {
        self.cif.add_block(Block::new(code)?)
    }

    fn has_block(&self, code: &str) -> Result<bool, CifErrorCode> {
        Ok(self.cif.find_block(code).is_some())
    }

    fn list_blocks(&self) -> Result<Vec<String>, CifErrorCode> {
        Ok(self.cif.blocks().iter().map(|b| b.code().to_string()).collect())
    }

    fn create_frame(&mut self, block: &str, code: &str) -> Result<(), CifErrorCode> {
        let b = self.block_mut(block)?;
        b.add_frame(crate::container::Frame::new(code)?)
    }

    fn has_frame(&self, block: &str, code: &str) -> Result<bool, CifErrorCode> {
        let b = self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?;
        Ok(b.find_frame(code).is_some())
    }

    fn list_frames(&self, block: &str) -> Result<Vec<String>, CifErrorCode> {
        let b = self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?;
        Ok(b.frames().iter().map(|f| f.code().to_string()).collect())
    }

    fn create_loop(&mut self, container: &ContainerRef, names: &[String]) -> Result<(), CifErrorCode> {
        let l = Loop::new(names.to_vec())?;
        let items = self.resolve_items_mut(container)?;
        items.add_loop(l)?;
        Ok(())
    }

    fn list_loop_names(&self, container: &ContainerRef) -> Result<Vec<Vec<String>>, CifErrorCode> {
        let items = match container {
            ContainerRef::Block { block } => {
                self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?.items()
            }
            ContainerRef::Frame { block, frame } => {
                let b = self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?;
                b.find_frame(frame).ok_or(CifErrorCode::MissingFrameCode)?.items()
            }
        };
        Ok(items
            .loops()
            .iter()
            .filter(|l| !l.is_scalars())
            .map(|l| l.names().to_vec())
            .collect())
    }

    fn add_packet(&mut self, container: &ContainerRef, loop_names: &[String], packet: &Packet) -> Result<(), CifErrorCode> {
        let items = self.resolve_items_mut(container)?;
        let idx = loop_names
            .first()
            .and_then(|n| items.find_item_loop(n))
            .ok_or(CifErrorCode::NoSuchLoop)?;
        items
            .loop_at_mut(idx)
            .ok_or(CifErrorCode::NoSuchLoop)?
            .add_packet(packet)
    }

    fn set_scalar(&mut self, container: &ContainerRef, name: &str, value: Value) -> Result<(), CifErrorCode> {
        let items = self.resolve_items_mut(container)?;
        items.set_scalar(name, value)
    }

    fn get_scalar(&self, container: &ContainerRef, name: &str) -> Result<Option<Value>, CifErrorCode> {
        let items = match container {
            ContainerRef::Block { block } => {
                self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?.items()
            }
            ContainerRef::Frame { block, frame } => {
                let b = self.cif.find_block(block).ok_or(CifErrorCode::MissingBlockCode)?;
                b.find_frame(frame).ok_or(CifErrorCode::MissingFrameCode)?.items()
            }
        };
        Ok(items.get_scalar(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_list_blocks() {
        let mut s = MemoryStore::new();
        s.create_block("a").unwrap();
        s.create_block("b").unwrap();
        assert_eq!(s.list_blocks().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn scalar_round_trips_through_store() {
        let mut s = MemoryStore::new();
        s.create_block("x").unwrap();
        let cref = ContainerRef::Block { block: "x".to_string() };
        s.set_scalar(&cref, "_a", Value::Char("1".into())).unwrap();
        assert_eq!(s.get_scalar(&cref, "_a").unwrap(), Some(Value::Char("1".into())));
    }

    #[test]
    fn loop_add_packet_through_store() {
        let mut s = MemoryStore::new();
        s.create_block("x").unwrap();
        let cref = ContainerRef::Block { block: "x".to_string() };
        let names = vec!["_a".to_string(), "_b".to_string()];
        s.create_loop(&cref, &names).unwrap();
        let mut p = Packet::new();
        p.insert("_a", Value::Char("1".into()));
        p.insert("_b", Value::Char("2".into()));
        s.add_packet(&cref, &names, &p).unwrap();
        assert_eq!(s.list_loop_names(&cref).unwrap(), vec![names]);
    }
}

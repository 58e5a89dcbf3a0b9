//! The root `Cif` object: an ordered collection of data blocks with unique
//! normalized codes (`spec.md` §3).

use crate::container::Block;
use crate::error::CifErrorCode;
use crate::unicode::normalize;

/// A parsed (or hand-built) CIF document.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Cif {
    blocks: Vec<Block>,
}

impl Cif {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn find_block(&self, code: &str) -> Option<&Block> {
        let norm = normalize(code);
        self.blocks.iter().find(|b| normalize(b.code()) == norm)
    }

    pub fn find_block_mut(&mut self, code: &str) -> Option<&mut Block> {
        let norm = normalize(code);
        self.blocks.iter_mut().find(|b| normalize(b.code()) == norm)
    }

    /// Add a data block, rejecting a code already present (`spec.md` §3:
    /// "Data block codes are unique in the CIF").
    pub fn add_block(&mut self, block: Block) -> Result<(), CifErrorCode> {
        if self.find_block(block.code()).is_some() {
            return Err(CifErrorCode::DuplicateBlockCode);
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn remove_block(&mut self, code: &str) -> Result<Block, CifErrorCode> {
        let norm = normalize(code);
        let pos = self
            .blocks
            .iter()
            .position(|b| normalize(b.code()) == norm)
            .ok_or(CifErrorCode::MissingBlockCode)?;
        Ok(self.blocks.remove(pos))
    }

    pub fn get_or_create_block(&mut self, code: &str) -> Result<usize, CifErrorCode> {
        let norm = normalize(code);
        if let Some(pos) = self.blocks.iter().position(|b| normalize(b.code()) == norm) {
            return Ok(pos);
        }
        self.add_block(Block::new(code)?)?;
        Ok(self.blocks.len() - 1)
    }

    /// Parse `text` (already decoded to a `&str`) using default options and
    /// no structural handler, producing a populated `Cif`. Thin convenience
    /// wrapper over [`crate::parser::Parser`] for the common case.
    pub fn parse_str(text: &str) -> Result<Self, crate::error::CifError> {
        crate::parser::parse_str_to_cif(text, &mut crate::options::ParseOptions::default())
    }

    /// Serialize with default write options (`spec.md` §4.4).
    pub fn to_string_cif(&self) -> Result<String, crate::error::CifError> {
        crate::writer::write_to_string(self, &crate::options::WriteOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Block;

    #[test]
    fn duplicate_block_codes_rejected_under_normalization() {
        let mut cif = Cif::new();
        cif.add_block(Block::new("ABC").unwrap()).unwrap();
        let err = cif.add_block(Block::new("abc").unwrap()).unwrap_err();
        assert_eq!(err, CifErrorCode::DuplicateBlockCode);
    }

    #[test]
    fn block_insertion_order_preserved() {
        let mut cif = Cif::new();
        cif.add_block(Block::new("b").unwrap()).unwrap();
        cif.add_block(Block::new("a").unwrap()).unwrap();
        let codes: Vec<_> = cif.blocks().iter().map(|b| b.code()).collect();
        assert_eq!(codes, vec!["b", "a"]);
    }
}

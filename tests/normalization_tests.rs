//! CIF name normalization (NFD -> default case fold -> NFC) as observed
//! through the public model, not just `unicode::normalize` directly.

use cif_parser::{Block, Cif, Value};

#[test]
fn block_lookup_ignores_case() {
    let mut cif = Cif::new();
    cif.add_block(Block::new("My_Structure").unwrap()).unwrap();
    assert!(cif.find_block("my_structure").is_some());
    assert!(cif.find_block("MY_STRUCTURE").is_some());
}

#[test]
fn duplicate_block_code_rejected_case_insensitively() {
    let mut cif = Cif::new();
    cif.add_block(Block::new("ABC").unwrap()).unwrap();
    let err = cif.add_block(Block::new("abc").unwrap()).unwrap_err();
    assert_eq!(err, cif_parser::CifErrorCode::DuplicateBlockCode);
}

#[test]
fn scalar_item_lookup_ignores_case_through_parsing() {
    let cif = Cif::parse_str("data_x\n_Cell_Length_A 10.0\n").unwrap();
    let b = cif.find_block("x").unwrap();
    assert_eq!(
        b.items().get_scalar("_cell_length_a"),
        b.items().get_scalar("_CELL_LENGTH_A")
    );
    assert!(b.items().get_scalar("_cell_length_a").unwrap().is_numb());
}

#[test]
fn save_frame_lookup_ignores_case() {
    let cif = Cif::parse_str("data_x\nsave_Frame1\n_a 1\nsave_\n").unwrap();
    let b = cif.find_block("x").unwrap();
    assert!(b.find_frame("frame1").is_some());
    assert!(b.find_frame("FRAME1").is_some());
}

#[test]
fn accented_names_normalize_through_nfd_fold_nfc() {
    // "e with acute" vs. "e" + combining acute: distinct code point
    // sequences that normalize to the same string.
    let precomposed = "_caf\u{00E9}";
    let decomposed = "_cafe\u{0301}";
    let cif = Cif::parse_str(&format!("data_x\n{} 1\n", precomposed)).unwrap();
    let b = cif.find_block("x").unwrap();
    assert_eq!(b.items().get_scalar(decomposed), Some(&Value::Numb(cif_parser::Number::parse("1").unwrap())));
}

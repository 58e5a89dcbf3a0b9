//! The recursive-descent parser against representative CIF 1.1/2.0 documents
//! (`spec.md` §4.2).

use cif_parser::{Cif, CifErrorCode, ParseOptions, Value};

#[test]
fn minimal_cif2_document_parses_with_zero_blocks() {
    let cif = Cif::parse_str("#\\CIF_2.0\n").unwrap();
    assert_eq!(cif.blocks().len(), 0);
}

#[test]
fn block_with_scalar_items_and_save_frame() {
    let cif = Cif::parse_str(
        "data_structure\n_cell_length_a 10.250(3)\n_title 'A nice structure'\nsave_frag\n_a 1\nsave_\n",
    )
    .unwrap();
    let b = cif.find_block("structure").unwrap();
    assert!(b.items().get_scalar("_cell_length_a").unwrap().is_numb());
    assert_eq!(
        b.items().get_scalar("_title"),
        Some(&Value::Char("A nice structure".to_string()))
    );
    assert_eq!(b.frames().len(), 1);
}

#[test]
fn loop_with_multiple_packets_parses_every_row() {
    let cif = Cif::parse_str(
        "data_atoms\nloop_\n_atom_site_label\n_atom_site_type_symbol\nC1 C\nN1 N\nO1 O\n",
    )
    .unwrap();
    let b = cif.find_block("atoms").unwrap();
    let l = b.items().loops().iter().find(|l| !l.is_scalars()).unwrap();
    assert_eq!(l.len(), 3);
    assert_eq!(l.get_scalar("_atom_site_label"), None); // not a scalars loop
}

#[test]
fn list_and_table_values_require_cif2() {
    let mut opts = ParseOptions::default();
    opts.default_to_cif2 = true;
    let cif = cif_parser::parse_str_to_cif(
        "data_x\n_coords [1 2 3]\n_meta {'k':1}\n",
        &mut opts,
    )
    .unwrap();
    let b = cif.find_block("x").unwrap();
    assert!(b.items().get_scalar("_coords").unwrap().is_list());
    assert!(b.items().get_scalar("_meta").unwrap().is_table());
}

#[test]
fn duplicate_block_code_is_reported_and_second_is_dropped() {
    let mut seen = Vec::new();
    let mut opts = ParseOptions::default();
    let mut cb = |code: CifErrorCode, _l: u32, _c: u32, _t: &str| {
        seen.push(code);
        false
    };
    opts.error_callback = Some(&mut cb);
    let cif = cif_parser::parse_str_to_cif("data_ABC\n_a 1\ndata_abc\n_b 2\n", &mut opts).unwrap();
    assert!(seen.contains(&CifErrorCode::DuplicateBlockCode));
    assert_eq!(cif.blocks().len(), 1);
}

#[test]
fn content_before_the_first_block_header_is_flagged() {
    let mut seen = Vec::new();
    let mut opts = ParseOptions::default();
    let mut cb = |code: CifErrorCode, _l: u32, _c: u32, _t: &str| {
        seen.push(code);
        false
    };
    opts.error_callback = Some(&mut cb);
    let _ = cif_parser::parse_str_to_cif("_stray 1\ndata_x\n_a 1\n", &mut opts).unwrap();
    assert!(seen.contains(&CifErrorCode::NoBlockHeader));
}

#[test]
fn unterminated_save_frame_reports_eof_in_frame() {
    let mut seen = Vec::new();
    let mut opts = ParseOptions::default();
    let mut cb = |code: CifErrorCode, _l: u32, _c: u32, _t: &str| {
        seen.push(code);
        false
    };
    opts.error_callback = Some(&mut cb);
    let _ = cif_parser::parse_str_to_cif("data_x\nsave_frag\n_a 1\n", &mut opts).unwrap();
    assert!(seen.contains(&CifErrorCode::EofInFrame));
}

#[test]
fn list_literal_as_table_key_is_disallowed_but_does_not_desync_the_stream() {
    let mut seen = Vec::new();
    let mut opts = ParseOptions::default();
    opts.default_to_cif2 = true;
    let mut cb = |code: CifErrorCode, _l: u32, _c: u32, _t: &str| {
        seen.push(code);
        false
    };
    opts.error_callback = Some(&mut cb);
    let cif = cif_parser::parse_str_to_cif(
        "data_x\n_meta {[1 2]:3}\n_after 'still parses'\n",
        &mut opts,
    )
    .unwrap();
    assert!(seen.contains(&CifErrorCode::DisallowedValue));
    let b = cif.find_block("x").unwrap();
    assert_eq!(
        b.items().get_scalar("_after"),
        Some(&Value::Char("still parses".to_string()))
    );
}

#[test]
fn bytes_entry_point_detects_the_cif2_magic_comment() {
    let cif = cif_parser::parse_bytes_to_cif(
        b"#\\CIF_2.0\ndata_x\n_coords [1 2]\n",
        &mut ParseOptions::default(),
    )
    .unwrap();
    let b = cif.find_block("x").unwrap();
    assert!(b.items().get_scalar("_coords").unwrap().is_list());
}

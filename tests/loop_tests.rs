//! Loops as named-column-sets with row vectors (`spec.md` §3), including the
//! reserved scalars loop.

use cif_parser::{CifErrorCode, Loop, Packet, Value, SCALARS_CATEGORY};

fn names(n: &[&str]) -> Vec<String> {
    n.iter().map(|s| s.to_string()).collect()
}

#[test]
fn rejects_a_loop_with_no_declared_names() {
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
fn absent_value_in_a_packet_surfaces_as_unk() {
    let mut l = Loop::new(names(&["_a", "_b"])).unwrap();
    let mut p = Packet::new();
    p.insert("_a", Value::Char("x".into()));
    l.add_packet(&p).unwrap();
    assert_eq!(l.packet_at(0).unwrap().get("_b"), Some(&Value::Unk));
}

#[test]
fn scalars_loop_has_the_reserved_empty_category() {
    let l = Loop::scalars();
    assert_eq!(l.category(), Some(SCALARS_CATEGORY));
    assert!(l.is_scalars());
}

#[test]
fn scalars_loop_widens_as_items_are_set() {
    let mut l = Loop::scalars();
    l.set_scalar("_a", Value::Char("1".into())).unwrap();
    l.set_scalar("_b", Value::Char("2".into())).unwrap();
    assert_eq!(l.len(), 1);
    assert_eq!(l.names().len(), 2);
}

#[test]
fn scalars_loop_rejects_a_second_packet() {
    let mut l = Loop::scalars();
    l.add_item("_a").unwrap();
    let mut p = Packet::new();
    p.insert("_a", Value::Unk);
    l.add_packet(&p).unwrap();
    assert_eq!(l.add_packet(&p), Err(CifErrorCode::InvalidPacket));
}

#[test]
fn add_item_widens_every_existing_row_with_unk() {
    let mut l = Loop::new(names(&["_a"])).unwrap();
    let mut p = Packet::new();
    p.insert("_a", Value::Char("1".into()));
    l.add_packet(&p).unwrap();
    l.add_item("_b").unwrap();
    assert_eq!(l.packet_at(0).unwrap().get("_b"), Some(&Value::Unk));
}

#[test]
fn remove_item_drops_the_column_from_every_row() {
    let mut l = Loop::new(names(&["_a", "_b"])).unwrap();
    let mut p = Packet::new();
    p.insert("_a", Value::Char("1".into()));
    p.insert("_b", Value::Char("2".into()));
    l.add_packet(&p).unwrap();
    l.remove_item("_a").unwrap();
    assert_eq!(l.names(), &["_b".to_string()]);
    assert_eq!(l.packet_at(0).unwrap().get("_b"), Some(&Value::Char("2".into())));
}

#[test]
fn rows_are_visited_in_insertion_order() {
    let mut l = Loop::new(names(&["_a"])).unwrap();
    for i in 0..5 {
        let mut p = Packet::new();
        p.insert("_a", Value::Char(i.to_string()));
        l.add_packet(&p).unwrap();
    }
    let seen: Vec<_> = l.rows().map(|p| p.get("_a").cloned().unwrap()).collect();
    assert_eq!(
        seen,
        (0..5).map(|i| Value::Char(i.to_string())).collect::<Vec<_>>()
    );
}

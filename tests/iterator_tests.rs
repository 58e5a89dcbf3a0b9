//! The packet iterator lifecycle against loops obtained from a parsed
//! document (`spec.md` §4.5).

use cif_parser::{Cif, CifErrorCode, Packet, PacketIterator, Value};

fn parsed_loop_doc() -> Cif {
    Cif::parse_str("data_x\nloop_\n_item1\n_item3\n1 a\n2 b\n3 c\n").unwrap()
}

#[test]
fn iterates_every_packet_in_order_then_finishes() {
    let mut cif = parsed_loop_doc();
    let b = cif.find_block_mut("x").unwrap();
    let l = b.items_mut().loops_mut().iter_mut().find(|l| !l.is_scalars()).unwrap();
    let mut it = PacketIterator::new(l);
    let mut seen = Vec::new();
    while let Some(p) = it.next() {
        seen.push(p.get("_item1").cloned().unwrap());
    }
    assert_eq!(
        seen,
        vec![
            Value::Char("1".into()),
            Value::Char("2".into()),
            Value::Char("3".into())
        ]
    );
    assert!(it.next().is_none());
}

#[test]
fn update_requires_iterated_state() {
    let mut cif = parsed_loop_doc();
    let b = cif.find_block_mut("x").unwrap();
    let l = b.items_mut().loops_mut().iter_mut().find(|l| !l.is_scalars()).unwrap();
    let mut it = PacketIterator::new(l);
    assert_eq!(it.update(Packet::new()), Err(CifErrorCode::Misuse));
}

#[test]
fn close_commits_an_update_to_the_backing_loop() {
    let mut cif = parsed_loop_doc();
    {
        let b = cif.find_block_mut("x").unwrap();
        let l = b.items_mut().loops_mut().iter_mut().find(|l| !l.is_scalars()).unwrap();
        let mut it = PacketIterator::new(l);
        it.next();
        it.next();
        let mut partial = Packet::new();
        partial.insert("_item3", Value::Char("updated".into()));
        it.update(partial).unwrap();
        it.close().unwrap();
    }
    let b = cif.find_block("x").unwrap();
    let l = b.items().loops().iter().find(|l| !l.is_scalars()).unwrap();
    let rows: Vec<_> = l.rows().collect();
    assert_eq!(rows[0].get("_item3"), Some(&Value::Char("a".into())));
    assert_eq!(rows[1].get("_item3"), Some(&Value::Char("updated".into())));
    assert_eq!(rows[2].get("_item3"), Some(&Value::Char("c".into())));
}

#[test]
fn abort_leaves_the_backing_loop_untouched() {
    let mut cif = parsed_loop_doc();
    {
        let b = cif.find_block_mut("x").unwrap();
        let l = b.items_mut().loops_mut().iter_mut().find(|l| !l.is_scalars()).unwrap();
        let mut it = PacketIterator::new(l);
        it.next();
        it.remove().unwrap();
        it.abort().unwrap();
    }
    let b = cif.find_block("x").unwrap();
    let l = b.items().loops().iter().find(|l| !l.is_scalars()).unwrap();
    assert_eq!(l.len(), 3);
}

#[test]
fn close_commits_a_removal() {
    let mut cif = parsed_loop_doc();
    {
        let b = cif.find_block_mut("x").unwrap();
        let l = b.items_mut().loops_mut().iter_mut().find(|l| !l.is_scalars()).unwrap();
        let mut it = PacketIterator::new(l);
        it.next();
        it.remove().unwrap();
        it.close().unwrap();
    }
    let b = cif.find_block("x").unwrap();
    let l = b.items().loops().iter().find(|l| !l.is_scalars()).unwrap();
    assert_eq!(l.len(), 2);
}

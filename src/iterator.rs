//! The packet iterator lifecycle (`spec.md` §4.5): NEW -> ITERATED/FINISHED,
//! with `update`/`remove` valid only in ITERATED, and `close`/`abort` to
//! commit or (best-effort) revert pending mutations.
//!
//! `spec.md` §9 maps this to "an exclusive-borrow pattern: while the
//! iterator exists, no other access to that loop is permitted." This crate
//! enforces that with Rust's borrow checker directly: [`PacketIterator`]
//! holds `&mut Loop` for its lifetime, so the loop cannot be touched through
//! any other path until the iterator is dropped, closed, or aborted.

use crate::cif_loop::Loop;
use crate::error::CifErrorCode;
use crate::packet::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Iterated,
    Removed,
    Finished,
}

/// A pending mutation recorded against a loop row, replayed on `close` and
/// discarded on `abort` (`spec.md` §4.5's rollback requirement — this
/// backing always supports it, so `abort` never returns `NotSupported`).
enum PendingOp {
    Update { row: usize, partial: Packet },
    Remove { row: usize },
}

/// Sequential forward access to a loop's packets (`spec.md` §4.5).
pub struct PacketIterator<'a> {
    cif_loop: &'a mut Loop,
    state: State,
    /// Index of the packet last returned by `next`, in *original* row
    /// numbering (stable across buffered removals since those are only
    /// applied on `close`).
    cursor: Option<usize>,
    next_row: usize,
    pending: Vec<PendingOp>,
    removed_rows: std::collections::HashSet<usize>,
}

impl<'a> PacketIterator<'a> {
    pub fn new(cif_loop: &'a mut Loop) -> Self {
        PacketIterator {
            cif_loop,
            state: State::New,
            cursor: None,
            next_row: 0,
            pending: Vec::new(),
            removed_rows: std::collections::HashSet::new(),
        }
    }

    /// Advance to the next packet not already marked removed, transitioning
    /// to ITERATED (returns `Some`) or FINISHED (returns `None`).
    pub fn next(&mut self) -> Option<Packet> {
        loop {
            if self.next_row >= self.cif_loop.len() {
                self.state = State::Finished;
                self.cursor = None;
                return None;
            }
            let row = self.next_row;
            self.next_row += 1;
            if self.removed_rows.contains(&row) {
                continue;
            }
            self.cursor = Some(row);
            self.state = State::Iterated;
            let mut packet = self.cif_loop.packet_at(row).expect("row in range");
            for op in &self.pending {
                if let PendingOp::Update { row: r, partial } = op {
                    if *r == row {
                        packet.apply_update(partial);
                    }
                }
            }
            return Some(packet);
        }
    }

    /// Apply a partial-packet update onto the current row. Valid only in
    /// ITERATED state.
    pub fn update(&mut self, partial: Packet) -> Result<(), CifErrorCode> {
        if self.state != State::Iterated {
            return Err(CifErrorCode::Misuse);
        }
        let row = self.cursor.expect("ITERATED implies a cursor");
        for name in partial.names() {
            if !self.cif_loop.names().iter().any(|n| crate::unicode::names_equal(n, name)) {
                return Err(CifErrorCode::WrongLoop);
            }
        }
        self.pending.push(PendingOp::Update { row, partial });
        Ok(())
    }

    /// Delete the current row, transitioning ITERATED -> REMOVED.
    pub fn remove(&mut self) -> Result<(), CifErrorCode> {
        if self.state != State::Iterated {
            return Err(CifErrorCode::Misuse);
        }
        let row = self.cursor.expect("ITERATED implies a cursor");
        self.removed_rows.insert(row);
        self.pending.push(PendingOp::Remove { row });
        self.state = State::Removed;
        Ok(())
    }

    /// Commit every buffered update/removal onto the backing loop.
    pub fn close(mut self) -> Result<(), CifErrorCode> {
        self.commit()
    }

    fn commit(&mut self) -> Result<(), CifErrorCode> {
        for op in self.pending.drain(..) {
            match op {
                PendingOp::Update { row, partial } => {
                    // Row indices shift as earlier removals are applied, but
                    // removals here are deferred to the end of this loop in
                    // descending order, so updates by original index are
                    // applied first while the row layout is still original.
                    self.cif_loop.update_row(row, &partial)?;
                }
                PendingOp::Remove { .. } => {}
            }
        }
        let mut removed: Vec<usize> = self.removed_rows.drain().collect();
        removed.sort_unstable_by(|a, b| b.cmp(a));
        for row in removed {
            self.cif_loop.remove_row(row)?;
        }
        Ok(())
    }

    /// Best-effort revert of every buffered update/removal. `MemoryStore`
    /// (and this in-process `Loop`) always supports rollback since nothing
    /// has been written to the backing loop yet; a store-backed iterator
    /// whose backend already persisted partial writes should return
    /// `CifErrorCode::NotSupported` instead (`spec.md` §4.5, §9).
    pub fn abort(mut self) -> Result<(), CifErrorCode> {
        self.pending.clear();
        self.removed_rows.clear();
        Ok(())
    }
}

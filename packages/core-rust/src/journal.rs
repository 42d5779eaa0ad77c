//! Append-only record of the operations attempted during one unit of work.
//!
//! [`OperationJournal`] accepts appends from any number of writers. Walking
//! the entries requires freezing it into a [`FrozenJournal`], which consumes
//! the open journal, so traversal never races with appends.

use std::slice;
use std::vec;

use parking_lot::Mutex;
use tracing::debug;

use crate::operation::{Operation, OperationKind};

/// Open journal. Entries are kept in append order and never removed.
#[derive(Debug, Default)]
pub struct OperationJournal {
    entries: Mutex<Vec<Operation>>,
}

impl OperationJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `op` and returns its position.
    pub fn append(&self, op: impl Into<Operation>) -> usize {
        let op = op.into();
        let kind = op.kind();
        let position = {
            let mut entries = self.entries.lock();
            entries.push(op);
            entries.len() - 1
        };
        debug!(position, %kind, "journaled operation");
        position
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Ends appending and hands out the entries for traversal.
    #[must_use]
    pub fn freeze(self) -> FrozenJournal {
        FrozenJournal {
            entries: self.entries.into_inner(),
        }
    }
}

/// Journal closed for appends, traversable in attempt order.
#[derive(Debug, Default)]
pub struct FrozenJournal {
    entries: Vec<Operation>,
}

impl FrozenJournal {
    pub fn iter(&self) -> slice::Iter<'_, Operation> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Operation> {
        self.entries.get(position)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kinds of all entries, in attempt order.
    #[must_use]
    pub fn kinds(&self) -> Vec<OperationKind> {
        self.entries.iter().map(Operation::kind).collect()
    }
}

impl<'a> IntoIterator for &'a FrozenJournal {
    type Item = &'a Operation;
    type IntoIter = slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for FrozenJournal {
    type Item = Operation;
    type IntoIter = vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use proptest::prelude::*;

    use super::*;
    use crate::key::{EntityKey, EntityKeyMetadata};
    use crate::operation::{CreateByKey, InsertWithShape, RemoveTuple};
    use crate::tuple::Tuple;

    fn key(id: i64) -> EntityKey {
        EntityKey::single("Order", "id", id).unwrap()
    }

    fn insert(id: i64) -> InsertWithShape {
        let shape = EntityKeyMetadata::new("Order", ["id"]).unwrap();
        InsertWithShape::new(shape, Tuple::new().with("id", id)).unwrap()
    }

    fn op_of_kind(selector: u8, id: i64) -> Operation {
        match selector % 3 {
            0 => CreateByKey::new(key(id)).into(),
            1 => insert(id).into(),
            _ => RemoveTuple::new(key(id)).into(),
        }
    }

    #[test]
    fn append_returns_positions() {
        let journal = OperationJournal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.append(CreateByKey::new(key(1))), 0);
        assert_eq!(journal.append(insert(2)), 1);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn traversal_follows_append_order() {
        let journal = OperationJournal::new();
        journal.append(CreateByKey::new(key(42)));
        journal.append(insert(42));
        journal.append(RemoveTuple::new(key(7)));

        let frozen = journal.freeze();
        assert_eq!(
            frozen.kinds(),
            vec![
                OperationKind::CreateByKey,
                OperationKind::InsertWithShape,
                OperationKind::RemoveTuple,
            ]
        );
        let removed = frozen.get(2).unwrap().narrow::<RemoveTuple>().unwrap();
        assert_eq!(removed.entity_key(), &key(7));
        assert!(frozen.get(3).is_none());
    }

    #[test]
    fn identical_operations_are_not_deduplicated() {
        let journal = OperationJournal::new();
        journal.append(CreateByKey::new(key(1)));
        journal.append(CreateByKey::new(key(1)));
        let frozen = journal.freeze();
        assert_eq!(frozen.len(), 2);
        let rendered: Vec<_> = frozen.iter().map(ToString::to_string).collect();
        assert_eq!(rendered[0], rendered[1]);
    }

    #[test]
    fn owned_iteration_yields_handles() {
        let journal = OperationJournal::new();
        journal.append(insert(5));
        let ops: Vec<Operation> = journal.freeze().into_iter().collect();
        let narrowed = ops.into_iter().next().unwrap().into_variant::<InsertWithShape>();
        assert!(narrowed.is_ok());
    }

    #[test]
    fn concurrent_writers_keep_their_own_order() {
        let journal = Arc::new(OperationJournal::new());
        let writers: Vec<_> = (0..4_i64)
            .map(|writer| {
                let journal = Arc::clone(&journal);
                thread::spawn(move || {
                    for i in 0..50 {
                        journal.append(CreateByKey::new(key(writer * 1000 + i)));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let journal = Arc::try_unwrap(journal).unwrap();
        let frozen = journal.freeze();
        assert_eq!(frozen.len(), 200);

        for writer in 0..4_i64 {
            let ids: Vec<i64> = frozen
                .iter()
                .filter_map(|op| op.narrow::<CreateByKey>().ok())
                .filter_map(|op| match op.entity_key().column_values()[0] {
                    crate::types::Value::Int(id) if id / 1000 == writer => Some(id),
                    _ => None,
                })
                .collect();
            let expected: Vec<i64> = (0..50).map(|i| writer * 1000 + i).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn returned_positions_point_at_the_appended_entry() {
        let journal = Arc::new(OperationJournal::new());
        let writers: Vec<_> = (0..4_i64)
            .map(|writer| {
                let journal = Arc::clone(&journal);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| {
                            let id = writer * 1000 + i;
                            (journal.append(CreateByKey::new(key(id))), id)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut appended = Vec::new();
        for writer in writers {
            appended.extend(writer.join().unwrap());
        }

        let frozen = Arc::try_unwrap(journal).unwrap().freeze();
        let mut positions: Vec<usize> = appended.iter().map(|(position, _)| *position).collect();
        positions.sort_unstable();
        assert_eq!(positions, (0..200).collect::<Vec<_>>());
        for (position, id) in appended {
            let op = frozen.get(position).unwrap().narrow::<CreateByKey>().unwrap();
            assert_eq!(op.entity_key(), &key(id));
        }
    }

    proptest! {
        #[test]
        fn frozen_order_equals_append_order(selectors in proptest::collection::vec(any::<u8>(), 0..40)) {
            let journal = OperationJournal::new();
            let mut expected = Vec::new();
            for (i, selector) in selectors.iter().enumerate() {
                let op = op_of_kind(*selector, i64::try_from(i).unwrap());
                expected.push((op.kind(), op.to_string()));
                journal.append(op);
            }
            let frozen = journal.freeze();
            let observed: Vec<_> = frozen.iter().map(|op| (op.kind(), op.to_string())).collect();
            prop_assert_eq!(observed, expected);
        }
    }
}

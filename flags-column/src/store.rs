use crate::definition::Bits;

use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// The host side of a flag column: somewhere to keep one integer per column.
pub trait FlagStore {
    /// `None` while the column has never been written.
    fn read_bits(&self, column: &str) -> Option<Bits>;

    fn write_bits(&mut self, column: &str, bits: Bits);

    /// Whether the record has not been persisted yet.
    fn is_new_record(&self) -> bool;
}

impl<'a, S: FlagStore + ?Sized> FlagStore for &'a mut S {
    #[inline(always)]
    fn read_bits(&self, column: &str) -> Option<Bits> {
        (**self).read_bits(column)
    }

    #[inline(always)]
    fn write_bits(&mut self, column: &str, bits: Bits) {
        (**self).write_bits(column, bits)
    }

    #[inline(always)]
    fn is_new_record(&self) -> bool {
        (**self).is_new_record()
    }
}

/// A plain in-memory record. `Default` and deserialized records count as
/// persisted; use [`Record::new`] for one that is not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    slots: BTreeMap<String, Bits>,
    #[serde(skip)]
    new_record: bool,
}

impl Record {
    /// A record that has not been saved yet.
    #[inline]
    pub fn new() -> Self {
        Record {
            slots: BTreeMap::new(),
            new_record: true,
        }
    }

    /// A record loaded from storage with the given slots.
    pub fn persisted<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item=(S, Bits)>,
        S: Into<String>,
    {
        Record {
            slots: slots.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            new_record: false,
        }
    }

    #[inline]
    pub fn mark_persisted(&mut self) {
        self.new_record = false;
    }

    #[inline]
    pub fn slots(&self) -> &BTreeMap<String, Bits> {
        &self.slots
    }
}

impl FlagStore for Record {
    #[inline]
    fn read_bits(&self, column: &str) -> Option<Bits> {
        self.slots.get(column).cloned()
    }

    #[inline]
    fn write_bits(&mut self, column: &str, bits: Bits) {
        self.slots.insert(column.to_owned(), bits);
    }

    #[inline(always)]
    fn is_new_record(&self) -> bool {
        self.new_record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialized_records_are_persisted() {
        let record: Record = serde_yaml::from_str("slots: { visible_to: 6 }").unwrap();
        assert!(!record.is_new_record());
        assert_eq!(record.read_bits("visible_to"), Some(6));
        assert_eq!(record.read_bits("notify_when"), None);
    }
}

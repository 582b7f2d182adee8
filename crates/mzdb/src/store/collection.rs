use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use thiserror::Error;

/// Upper bound the MZ editor allows for any database collection.
pub const MAX_COLLECTION_LEN: usize = 10_000;

/// A database row whose identity is its position in the collection.
pub trait Record {
    fn id(&self) -> Option<usize>;
    fn set_id(&mut self, id: usize);
    /// Unnamed rows are hidden from listings and counts.
    fn is_blank(&self) -> bool;
    /// True when the row holds nothing beyond what `template` would put in
    /// that slot. Only such rows may be dropped by a shrink.
    fn matches_template(&self, template: &Self) -> bool;
}

/// One position of a collection; `Absent` is stored as JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Absent,
    Present(T),
}

impl<T> Slot<T> {
    pub fn as_present(&self) -> Option<&T> {
        match self {
            Self::Absent => None,
            Self::Present(record) => Some(record),
        }
    }
}

impl<T: Serialize> Serialize for Slot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Present(record) => serializer.serialize_some(record),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Slot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(record) => Self::Present(record),
            None => Self::Absent,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("slot 0 is reserved and must be null")]
    ReservedSlotOccupied,
    #[error("record at index {index} carries id {id:?}; ids must equal their index")]
    IdMismatch { index: usize, id: Option<usize> },
    #[error("no record with id {id}")]
    UnknownId { id: usize },
    #[error("cannot shrink to {new_len}: record {id} in the removed range holds data")]
    ShrinkThroughOccupied { new_len: usize, id: usize },
    #[error("length {requested} is out of range 1..={max}")]
    LengthOutOfRange { requested: usize, max: usize },
    #[error("slot {id} is already occupied")]
    SlotOccupied { id: usize },
    #[error("{0}")]
    Rejected(String),
}

/// An id-indexed sequence of records backing one database file.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            slots: vec![Slot::Absent],
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: Vec<Slot<T>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when nothing besides the reserved slot exists.
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    pub fn slots(&self) -> &[Slot<T>] {
        &self.slots
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if matches!(self.slots.first(), Some(Slot::Present(_))) {
            return Err(ValidationError::ReservedSlotOccupied);
        }
        for (index, slot) in self.slots.iter().enumerate().skip(1) {
            if let Slot::Present(record) = slot {
                if record.id() != Some(index) {
                    return Err(ValidationError::IdMismatch {
                        index,
                        id: record.id(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        if id == 0 {
            return None;
        }
        self.slots.get(id).and_then(Slot::as_present)
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut T> {
        if id == 0 {
            return None;
        }
        match self.slots.get_mut(id) {
            Some(Slot::Present(record)) => Some(record),
            _ => None,
        }
    }

    pub fn present(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().skip(1).filter_map(Slot::as_present)
    }

    pub fn occupied(&self) -> impl Iterator<Item = &T> {
        self.present().filter(|record| !record.is_blank())
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// Appends at the end; the new id is the length before the append.
    pub fn append(&mut self, mut record: T) -> Result<usize, ValidationError> {
        let id = self.slots.len().max(1);
        if id >= MAX_COLLECTION_LEN {
            return Err(ValidationError::LengthOutOfRange {
                requested: id + 1,
                max: MAX_COLLECTION_LEN,
            });
        }
        if self.slots.is_empty() {
            self.slots.push(Slot::Absent);
        }
        record.set_id(id);
        self.slots.push(Slot::Present(record));
        Ok(id)
    }

    /// Places a record at a fixed id, padding any gap with absent slots.
    pub fn insert_at(&mut self, id: usize, mut record: T) -> Result<(), ValidationError> {
        if id == 0 {
            return Err(ValidationError::ReservedSlotOccupied);
        }
        if id >= MAX_COLLECTION_LEN {
            return Err(ValidationError::LengthOutOfRange {
                requested: id + 1,
                max: MAX_COLLECTION_LEN,
            });
        }
        if matches!(self.slots.get(id), Some(Slot::Present(_))) {
            return Err(ValidationError::SlotOccupied { id });
        }
        while self.slots.len() <= id {
            self.slots.push(Slot::Absent);
        }
        record.set_id(id);
        self.slots[id] = Slot::Present(record);
        Ok(())
    }

    /// Grows with `blank(id)` rows or shrinks. A shrink may only drop absent
    /// slots and rows equal to `blank(id)`; anything else is authored data.
    /// A rejected resize leaves the collection untouched.
    pub fn resize_with<F>(&mut self, new_len: usize, mut blank: F) -> Result<(), ValidationError>
    where
        F: FnMut(usize) -> T,
    {
        if new_len == 0 || new_len > MAX_COLLECTION_LEN {
            return Err(ValidationError::LengthOutOfRange {
                requested: new_len,
                max: MAX_COLLECTION_LEN,
            });
        }
        if new_len < self.slots.len() {
            for (id, slot) in self.slots.iter().enumerate().skip(new_len).rev() {
                let Slot::Present(record) = slot else {
                    continue;
                };
                let mut template = blank(id);
                template.set_id(id);
                if !record.matches_template(&template) {
                    return Err(ValidationError::ShrinkThroughOccupied { new_len, id });
                }
            }
            self.slots.truncate(new_len);
            return Ok(());
        }
        while self.slots.len() < new_len {
            let id = self.slots.len();
            let mut record = blank(id);
            record.set_id(id);
            self.slots.push(Slot::Present(record));
        }
        Ok(())
    }

    /// Highest id holding a present record, 0 when there is none.
    pub fn max_present_id(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .rev()
            .find(|(_, slot)| matches!(slot, Slot::Present(_)))
            .map(|(id, _)| id)
            .unwrap_or(0)
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.slots.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Collection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = Vec::<Slot<T>>::deserialize(deserializer)?;
        Ok(Self { slots })
    }
}

//! Ordered, identifier-unique record collection and the page's edit buffer.

use worldline_domain::{RecordId, SyncRecord};

/// Records in arrival order, unique by `record_id()`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedCollection<T> {
    records: Vec<T>,
}

impl<T> Default for TrackedCollection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: SyncRecord> TrackedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server snapshot; later duplicates of an id are dropped.
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(records);
        collection
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.record_id() == id)
    }

    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.record_id() == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.position(id).is_some()
    }

    /// Append unless the id is already present. Returns the new index.
    pub fn insert(&mut self, record: T) -> Option<usize> {
        if self.contains(record.record_id()) {
            return None;
        }
        self.records.push(record);
        Some(self.records.len() - 1)
    }

    /// Replace the record with the same id in place. Never inserts.
    pub fn replace(&mut self, record: T) -> Option<usize> {
        let index = self.position(record.record_id())?;
        self.records[index] = record;
        Some(index)
    }

    /// Remove by id, keeping the order of the survivors.
    pub fn remove(&mut self, id: &RecordId) -> Option<(usize, T)> {
        let index = self.position(id)?;
        Some((index, self.records.remove(index)))
    }

    pub fn replace_all(&mut self, records: impl IntoIterator<Item = T>) {
        self.records.clear();
        for record in records {
            self.insert(record);
        }
    }
}

impl<'a, T> IntoIterator for &'a TrackedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The copy of a record currently open in an edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer<T> {
    editing: Option<T>,
}

impl<T> Default for EditBuffer<T> {
    fn default() -> Self {
        Self { editing: None }
    }
}

impl<T: SyncRecord> EditBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, record: T) {
        self.editing = Some(record);
    }

    pub fn close(&mut self) -> Option<T> {
        self.editing.take()
    }

    pub fn current(&self) -> Option<&T> {
        self.editing.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.editing.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.editing.is_some()
    }

    pub fn is_editing(&self, id: &RecordId) -> bool {
        self.editing.as_ref().is_some_and(|r| r.record_id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldline_domain::Customer;

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: RecordId::parse(id).unwrap(),
            name: name.to_string(),
            email: None,
            company: None,
            phone: None,
        }
    }

    fn names(collection: &TrackedCollection<Customer>) -> Vec<&str> {
        collection.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_insert_is_idempotent_by_id() {
        let mut collection = TrackedCollection::new();
        assert_eq!(collection.insert(customer("1", "Mayuri")), Some(0));
        assert_eq!(collection.insert(customer("1", "Mayuri again")), None);
        assert_eq!(names(&collection), vec!["Mayuri"]);
    }

    #[test]
    fn test_replace_keeps_position_and_never_inserts() {
        let mut collection =
            TrackedCollection::from_records([customer("1", "A"), customer("2", "B"), customer("3", "C")]);
        assert_eq!(collection.replace(customer("2", "B2")), Some(1));
        assert_eq!(collection.replace(customer("9", "Z")), None);
        assert_eq!(names(&collection), vec!["A", "B2", "C"]);
    }

    #[test]
    fn test_remove_preserves_survivor_order() {
        let mut collection =
            TrackedCollection::from_records([customer("1", "A"), customer("2", "B"), customer("3", "C")]);
        let (index, removed) = collection.remove(&RecordId::parse("2").unwrap()).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.name, "B");
        assert_eq!(names(&collection), vec!["A", "C"]);
        assert!(collection.remove(&RecordId::parse("2").unwrap()).is_none());
    }

    #[test]
    fn test_snapshot_drops_duplicate_ids() {
        let collection =
            TrackedCollection::from_records([customer("1", "A"), customer("1", "A'"), customer("2", "B")]);
        assert_eq!(names(&collection), vec!["A", "B"]);
    }

    #[test]
    fn test_edit_buffer_tracks_open_record() {
        let mut buffer = EditBuffer::new();
        assert!(!buffer.is_open());
        buffer.open(customer("7", "Suzuha"));
        assert!(buffer.is_editing(&RecordId::parse("7").unwrap()));
        assert!(!buffer.is_editing(&RecordId::parse("8").unwrap()));
        assert_eq!(buffer.close().map(|c| c.name), Some("Suzuha".to_string()));
        assert!(buffer.current().is_none());
    }
}

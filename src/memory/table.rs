use std::collections::BTreeMap;

/// Rows keyed by a serial id. Ids start at 1 and are never handed out twice,
/// even after the row that held them is deleted.
#[derive(Debug, Clone)]
pub(crate) struct Table<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    pub(crate) fn insert_with(&mut self, row: impl FnOnce(i32) -> T) -> &T {
        self.last_id += 1;
        let id = self.last_id;
        self.rows.entry(id).or_insert(row(id))
    }

    pub(crate) fn get(&self, id: i32) -> Option<&T> {
        self.rows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: i32) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: i32) -> bool {
        self.rows.contains_key(&id)
    }

    pub(crate) fn remove(&mut self, id: i32) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Removes every row matching `pred`, returning the removed rows in id order.
    pub(crate) fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let ids: Vec<i32> = self
            .rows
            .iter()
            .filter(|(_, row)| pred(row))
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter().filter_map(|id| self.rows.remove(&id)).collect()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

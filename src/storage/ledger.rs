use std::collections::HashSet;

/// Ids already submitted for one configuration.
///
/// Membership is answered from a hash set; the submission order is kept
/// alongside so the persisted file reads chronologically.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    key: String,
    order: Vec<String>,
    index: HashSet<String>,
}

impl Ledger {
    /// An empty ledger for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            order: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Rebuilds a ledger from persisted ids. Repeated ids keep their first position.
    pub fn from_ids(key: impl Into<String>, ids: impl IntoIterator<Item = String>) -> Self {
        let mut ledger = Self::new(key);
        for id in ids {
            ledger.record(id);
        }
        ledger
    }

    /// Storage key (the configuration name).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Adds `id`. Returns `false` if it was already present.
    pub fn record(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Ids in submission order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

use parking_lot::RwLock;

/// A text-valued metric cell, last-write-wins.
///
/// Labels carry build versions, hostnames, and the like.  They are sampled
/// far more often than they are written, so a read-write lock is fine here;
/// unlike the numeric cells, labels are not hot-path and setting one may
/// allocate.
pub struct Label {
    value: RwLock<String>,
}

impl Label {
    pub fn new() -> Label {
        Label {
            value: RwLock::new(String::new()),
        }
    }

    /// Sets the label text.
    pub fn set(&self, value: &str) {
        let mut guard = self.value.write();
        guard.clear();
        guard.push_str(value);
    }

    /// Reads a copy of the current label text.
    pub fn value(&self) -> String { self.value.read().clone() }
}

impl Default for Label {
    fn default() -> Label { Label::new() }
}

/// One selector per configured table; at most one table surface is shown at a
/// time. Nothing is visible until the first `select`.
#[derive(Debug, Clone)]
pub struct TableSwitcher {
    names: Vec<String>,
    visible: Option<usize>,
}

impl TableSwitcher {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            visible: None,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Make surface `index` the only visible one.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range; the selector set is fixed by
    /// configuration so callers only ever pass indices they were handed.
    pub fn select(&mut self, index: usize) {
        assert!(
            index < self.names.len(),
            "table index {index} out of range ({} tables)",
            self.names.len()
        );
        self.visible = Some(index);
    }

    pub fn visible(&self) -> Option<usize> {
        self.visible
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible == Some(index)
    }

    /// Index `offset` steps away from the visible surface, wrapping around.
    /// Starts from the first surface when none is visible yet.
    pub fn relative(&self, offset: isize) -> Option<usize> {
        if self.names.is_empty() {
            return None;
        }
        let len = self.names.len() as isize;
        let next = match self.visible {
            Some(current) => (current as isize + offset).rem_euclid(len),
            None => 0,
        };
        Some(next as usize)
    }
}

/// Ordered buffer of answer fragments for one session.
#[derive(Debug, Default, Clone)]
pub struct ContentAccumulator {
    fragments: Vec<String>,
}

impl ContentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
    }

    pub fn append(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    /// Fragments joined by newline, in arrival order.
    pub fn render(&self) -> String {
        self.fragments.join("\n")
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

use std::fmt;

use codemap::Span;

use super::ComplexSelector;

/// A comma-separated list of complex selectors.
#[derive(Clone, Debug)]
pub struct SelectorList {
    /// This is never empty.
    pub components: Vec<ComplexSelector>,
    pub span: Span,
}

impl PartialEq for SelectorList {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for SelectorList {}

impl std::hash::Hash for SelectorList {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl SelectorList {
    pub fn contains_parent_selector(&self) -> bool {
        self.components
            .iter()
            .any(ComplexSelector::contains_parent_selector)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, complex) in self.components.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", complex)?;
        }
        Ok(())
    }
}

use std::fmt::{self, Write};

use super::{CompoundSelector, SimpleSelector};

/// A complex selector.
///
/// A complex selector is composed of `CompoundSelector`s separated by
/// `Combinator`s. It selects elements based on their parent selectors.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ComplexSelector {
    /// The components of this selector.
    ///
    /// This is never empty.
    ///
    /// Descendant combinators aren't explicitly represented here. If two
    /// `CompoundSelector`s are adjacent to one another, there's an implicit
    /// descendant combinator between them.
    ///
    /// It's possible for multiple `Combinator`s to be adjacent to one
    /// another. This isn't valid CSS, but it's supported for CSS hack
    /// purposes.
    pub components: Vec<ComplexSelectorComponent>,

    /// Whether a line break appeared *before* this selector.
    pub line_break: bool,
}

impl ComplexSelector {
    pub fn new(components: Vec<ComplexSelectorComponent>, line_break: bool) -> Self {
        Self {
            components,
            line_break,
        }
    }

    pub fn contains_parent_selector(&self) -> bool {
        self.components.iter().any(|c| match c {
            ComplexSelectorComponent::Compound(compound) => compound
                .components
                .iter()
                .any(SimpleSelector::is_parent),
            ComplexSelectorComponent::Combinator(..) => false,
        })
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last_was_compound = false;
        for component in &self.components {
            match component {
                ComplexSelectorComponent::Compound(compound) => {
                    if last_was_compound {
                        f.write_char(' ')?;
                    }
                    write!(f, "{}", compound)?;
                    last_was_compound = true;
                }
                ComplexSelectorComponent::Combinator(combinator) => {
                    write!(f, " {} ", combinator)?;
                    last_was_compound = false;
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ComplexSelectorComponent {
    Combinator(Combinator),
    Compound(CompoundSelector),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Combinator {
    /// Matches the right-hand selector if it's immediately adjacent to the
    /// left-hand selector in the DOM tree: `+`
    NextSibling,

    /// Matches the right-hand selector if it's a direct child of the
    /// left-hand selector in the DOM tree: `>`
    Child,

    /// Matches the right-hand selector if it comes after the left-hand
    /// selector in the DOM tree: `~`
    FollowingSibling,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextSibling => f.write_char('+'),
            Self::Child => f.write_char('>'),
            Self::FollowingSibling => f.write_char('~'),
        }
    }
}

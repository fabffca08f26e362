use std::fmt::{self, Write};

use codemap::Span;

use super::{Attribute, Namespace, QualifiedName, SelectorList};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum SimpleSelector {
    /// `*`
    Universal(Namespace),

    /// A pseudo-class or pseudo-element selector.
    ///
    /// The semantics of a specific pseudo selector depend on its name. Some
    /// selectors take arguments, including other selectors.
    Pseudo(Pseudo),

    /// A type selector.
    ///
    /// This selects elements whose name equals the given name.
    Type(QualifiedName),

    /// A placeholder selector.
    ///
    /// This doesn't match any elements. It's intended to be extended using
    /// `@extend`. It's not a plain CSS selector and is removed before a CSS
    /// document is emitted.
    Placeholder(String),

    /// A selector that matches the parent in the stylesheet: `&`.
    ///
    /// The parameter is the suffix that will be appended to the parent
    /// selector after it's been resolved, e.g. `&-fallback`.
    Parent(Option<String>),

    /// `#name`
    Id(String),

    /// A class selector: `.name`.
    Class(String),

    /// `[attr]`, `[attr=value]`, etc.
    Attribute(Box<Attribute>),
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(name) => write!(f, "#{}", name),
            Self::Class(name) => write!(f, ".{}", name),
            Self::Placeholder(name) => write!(f, "%{}", name),
            Self::Universal(namespace) => write!(f, "{}*", namespace),
            Self::Pseudo(pseudo) => write!(f, "{}", pseudo),
            Self::Type(name) => write!(f, "{}", name),
            Self::Attribute(attr) => write!(f, "{}", attr),
            Self::Parent(suffix) => match suffix {
                Some(suffix) => write!(f, "&{}", suffix),
                None => f.write_char('&'),
            },
        }
    }
}

impl SimpleSelector {
    pub fn is_parent(&self) -> bool {
        matches!(self, Self::Parent(..))
    }
}

#[derive(Clone, Debug)]
pub struct Pseudo {
    /// The name of this selector, without the colons.
    pub name: String,

    /// Whether this is a pseudo-class, as opposed to a pseudo-element.
    ///
    /// A pseudo written with pseudo-class syntax can still name one of the
    /// legacy pseudo-elements (`:before` and friends).
    pub is_class: bool,

    /// Whether this was written with a single colon.
    pub is_syntactic_class: bool,

    /// The non-selector argument, e.g. the `2n+1` of `:nth-child(2n+1)`.
    pub argument: Option<Box<str>>,

    /// The selector argument of selector-carrying pseudos such as `:not`
    /// and `:nth-child(... of <selector>)`.
    pub selector: Option<Box<SelectorList>>,

    pub span: Span,
}

impl PartialEq for Pseudo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.is_class == other.is_class
            && self.argument == other.argument
            && self.selector == other.selector
    }
}

impl Eq for Pseudo {}

impl std::hash::Hash for Pseudo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.is_class.hash(state);
        self.argument.hash(state);
        self.selector.hash(state);
    }
}

impl fmt::Display for Pseudo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(':')?;

        if !self.is_syntactic_class {
            f.write_char(':')?;
        }

        f.write_str(&self.name)?;

        if self.argument.is_none() && self.selector.is_none() {
            return Ok(());
        }

        f.write_char('(')?;
        if let Some(argument) = &self.argument {
            f.write_str(argument)?;
            if self.selector.is_some() {
                f.write_char(' ')?;
            }
        }
        if let Some(selector) = &self.selector {
            write!(f, "{}", selector)?;
        }
        f.write_char(')')
    }
}

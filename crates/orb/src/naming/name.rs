//! Compound names
//!
//! Stringified form: components separated by `/`, each `id` or `id.kind`.
//! A backslash escapes `/`, `.` and `\` inside an id or kind.

use std::fmt;
use std::str::FromStr;

use crate::error::{OrbError, Result};

/// One `(id, kind)` segment of a name
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameComponent {
    pub id: String,
    pub kind: String,
}

impl NameComponent {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// Component with an empty kind
    pub fn id(id: impl Into<String>) -> Self {
        Self::new(id, "")
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty() && self.kind.is_empty()
    }
}

fn escape(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        if matches!(c, '/' | '.' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        escape(f, &self.id)?;
        if !self.kind.is_empty() {
            f.write_str(".")?;
            escape(f, &self.kind)?;
        }
        Ok(())
    }
}

/// Sequence of name components, never empty
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name(Vec<NameComponent>);

impl Name {
    /// Build a name from components
    pub fn from_components(components: Vec<NameComponent>) -> Result<Self> {
        if components.is_empty() || components.iter().any(NameComponent::is_empty) {
            return Err(OrbError::InvalidName("empty name or name component".to_string()));
        }
        Ok(Self(components))
    }

    /// Parse the stringified form
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || OrbError::InvalidName(format!("{:?}", s));

        let mut components = Vec::new();
        let mut current = NameComponent::default();
        let mut in_kind = false;
        let mut chars = s.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars.next().ok_or_else(invalid)?;
                    if in_kind {
                        current.kind.push(escaped);
                    } else {
                        current.id.push(escaped);
                    }
                }
                '.' if !in_kind => in_kind = true,
                '.' => return Err(invalid()),
                '/' => {
                    if current.is_empty() {
                        return Err(invalid());
                    }
                    components.push(std::mem::take(&mut current));
                    in_kind = false;
                }
                c if in_kind => current.kind.push(c),
                c => current.id.push(c),
            }
        }
        if current.is_empty() {
            return Err(invalid());
        }
        components.push(current);
        Ok(Self(components))
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> &NameComponent {
        // Construction guarantees at least one component.
        &self.0[self.0.len() - 1]
    }

    /// The name with its last component removed, if any remain
    pub fn parent(&self) -> Option<Name> {
        (self.0.len() > 1).then(|| Name(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Append a component
    pub fn child(&self, component: NameComponent) -> Result<Name> {
        if component.is_empty() {
            return Err(OrbError::InvalidName("empty name component".to_string()));
        }
        let mut components = self.0.clone();
        components.push(component);
        Ok(Name(components))
    }
}

impl From<NameComponent> for Name {
    fn from(component: NameComponent) -> Self {
        Name(vec![component])
    }
}

impl FromStr for Name {
    type Err = OrbError;

    fn from_str(s: &str) -> Result<Self> {
        Name::parse(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// Render the components from `start` on, for `NotFound` diagnostics
pub(crate) fn rest_of(components: &[NameComponent], start: usize) -> String {
    components[start..]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

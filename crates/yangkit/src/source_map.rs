//! Source storage for a schema build.
//!
//! A build usually spans several modules and submodules; each one is registered
//! here and referenced everywhere else by a cheap [`SourceId`].

/// Lightweight handle to a source in a build session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u32);

impl SourceId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Describes the origin of a source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SourceKind {
    /// Text handed over directly, labelled with a display name (tests, embedded models).
    Inline(String),
    /// A file with its path.
    File(String),
}

impl SourceKind {
    /// Returns the display name for diagnostics.
    pub fn display_name(&self) -> &str {
        match self {
            SourceKind::Inline(name) => name,
            SourceKind::File(path) => path,
        }
    }
}

/// A borrowed view of a source: id, kind, and content.
#[derive(Clone, Debug)]
pub struct Source<'s> {
    pub id: SourceId,
    pub kind: &'s SourceKind,
    pub content: &'s str,
}

#[derive(Clone, Debug)]
struct SourceEntry {
    kind: SourceKind,
    content: String,
}

/// Registry of all sources taking part in a build.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    entries: Vec<SourceEntry>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named inline source.
    pub fn add_inline(&mut self, name: &str, content: &str) -> SourceId {
        self.push_entry(SourceKind::Inline(name.to_owned()), content)
    }

    /// Add a file source with its path.
    pub fn add_file(&mut self, path: &str, content: &str) -> SourceId {
        self.push_entry(SourceKind::File(path.to_owned()), content)
    }

    /// Create a SourceMap holding a single inline source named `<inline>`.
    pub fn inline(content: &str) -> Self {
        let mut map = Self::new();
        map.add_inline("<inline>", content);
        map
    }

    pub fn content(&self, id: SourceId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|e| e.content.as_str())
    }

    pub fn kind(&self, id: SourceId) -> Option<&SourceKind> {
        self.entries.get(id.0 as usize).map(|e| &e.kind)
    }

    pub fn display_name(&self, id: SourceId) -> Option<&str> {
        self.kind(id).map(SourceKind::display_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Option<Source<'_>> {
        let entry = self.entries.get(id.0 as usize)?;
        Some(Source {
            id,
            kind: &entry.kind,
            content: &entry.content,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Source<'_>> {
        self.entries.iter().enumerate().map(|(idx, entry)| Source {
            id: SourceId(idx as u32),
            kind: &entry.kind,
            content: &entry.content,
        })
    }

    fn push_entry(&mut self, kind: SourceKind, content: &str) -> SourceId {
        let id = SourceId(self.entries.len() as u32);
        self.entries.push(SourceEntry {
            kind,
            content: content.to_owned(),
        });
        id
    }
}

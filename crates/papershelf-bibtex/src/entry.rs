//! BibTeX entry data structures

/// BibTeX entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Article,
    Book,
    InCollection,
    InProceedings,
    Proceedings,
    PhdThesis,
    MastersThesis,
    TechReport,
    Misc,
}

impl EntryType {
    /// Parse an entry type from its `@name` (case-insensitive). Unknown names become `Misc`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "article" => Self::Article,
            "book" => Self::Book,
            "incollection" => Self::InCollection,
            "inproceedings" | "conference" => Self::InProceedings,
            "proceedings" => Self::Proceedings,
            "phdthesis" => Self::PhdThesis,
            "mastersthesis" => Self::MastersThesis,
            "techreport" => Self::TechReport,
            _ => Self::Misc,
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Proceedings => "proceedings",
            Self::PhdThesis => "phdthesis",
            Self::MastersThesis => "mastersthesis",
            Self::TechReport => "techreport",
            Self::Misc => "misc",
        }
    }

    /// Whether the venue of this entry lives in `booktitle` rather than `journal`.
    pub fn is_proceedings(&self) -> bool {
        matches!(
            self,
            Self::InProceedings | Self::Proceedings | Self::InCollection
        )
    }
}

/// A single `name = value` pair. Names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A parsed BibTeX entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub cite_key: String,
    pub entry_type: EntryType,
    pub fields: Vec<Field>,
    /// Source text of the entry as it appeared in the input
    pub raw: Option<String>,
}

impl Entry {
    pub fn new(cite_key: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            cite_key: cite_key.into(),
            entry_type,
            fields: Vec::new(),
            raw: None,
        }
    }

    /// Append a field
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into().to_ascii_lowercase(),
            value: value.into(),
        });
    }

    /// Builder form of [`Entry::push`]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// First field with the given name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn year(&self) -> Option<&str> {
        self.get("year")
    }

    pub fn journal(&self) -> Option<&str> {
        self.get("journal")
    }

    pub fn booktitle(&self) -> Option<&str> {
        self.get("booktitle")
    }

    /// Publication venue: `booktitle` for proceedings-like entries, `journal` otherwise,
    /// falling back to whichever of the two is present.
    pub fn venue(&self) -> Option<&str> {
        if self.entry_type.is_proceedings() {
            self.booktitle().or_else(|| self.journal())
        } else {
            self.journal().or_else(|| self.booktitle())
        }
    }
}

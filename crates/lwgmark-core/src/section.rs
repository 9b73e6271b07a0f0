use std::collections::BTreeMap;
use std::fmt;

use crate::html::escape_title_attr;

/// Number recorded for sections referenced by an issue but absent from the index.
pub const UNRESOLVED_SECTION: u32 = 99;

const ANNEX_BASE: u32 = 100;

/// A section reference: `prefix` names the paper (empty for the standard itself).
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SectionTag {
    pub prefix: String,
    pub name: String,
}

impl SectionTag {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "[{}]", self.name)
        } else {
            write!(f, "{} [{}]", self.prefix, self.name)
        }
    }
}

/// Dotted section number. Annex letters are stored as `100 + (letter - 'A')`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SectionNum {
    pub prefix: String,
    pub num: Vec<u32>,
}

impl SectionNum {
    pub fn unresolved(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            num: vec![UNRESOLVED_SECTION],
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.num == [UNRESOLVED_SECTION]
    }

    /// Parses `23.2.4` or `A.1`.
    pub fn parse(prefix: impl Into<String>, text: &str) -> Option<Self> {
        let mut num = Vec::new();
        for component in text.split('.') {
            let value = match component.as_bytes() {
                [letter] if letter.is_ascii_uppercase() => {
                    ANNEX_BASE + u32::from(letter - b'A')
                }
                _ => component.parse().ok()?,
            };
            num.push(value);
        }
        Some(Self {
            prefix: prefix.into(),
            num,
        })
    }
}

impl fmt::Display for SectionNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, &component) in self.num.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            match component.checked_sub(ANNEX_BASE) {
                Some(letter) if letter < 26 => {
                    write!(f, "{}", char::from(b'A' + letter as u8))?
                }
                _ => write!(f, "{component}")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SectionIndexError {
    #[error("line {line}: expected `[prefix] [name] number`, found {text:?}")]
    Syntax { line: usize, text: String },
    #[error("line {line}: invalid section number {number:?}")]
    Number { line: usize, number: String },
}

/// Section number for every known tag, plus placeholders for unknown ones.
#[derive(Clone, Debug, Default)]
pub struct SectionDb {
    entries: BTreeMap<SectionTag, SectionNum>,
}

impl SectionDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one entry per line: `[name] 1.2.3` or `PREFIX [name] 1.2.3`.
    /// Blank lines and lines starting with `#` are ignored.
    pub fn parse_index(text: &str) -> Result<Self, SectionIndexError> {
        let mut db = Self::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (prefix, name, number) = match tokens.as_slice() {
                [name, number] => ("", *name, *number),
                [prefix, name, number] => (*prefix, *name, *number),
                _ => {
                    return Err(SectionIndexError::Syntax {
                        line: idx + 1,
                        text: raw.to_string(),
                    });
                }
            };
            let Some(name) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) else {
                return Err(SectionIndexError::Syntax {
                    line: idx + 1,
                    text: raw.to_string(),
                });
            };
            let num = SectionNum::parse(prefix, number).ok_or_else(|| SectionIndexError::Number {
                line: idx + 1,
                number: number.to_string(),
            })?;
            db.insert(SectionTag::new(prefix, name), num);
        }
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, tag: &SectionTag) -> Option<&SectionNum> {
        self.entries.get(tag)
    }

    pub fn contains(&self, tag: &SectionTag) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn insert(&mut self, tag: SectionTag, num: SectionNum) -> Option<SectionNum> {
        self.entries.insert(tag, num)
    }

    /// Records an [`UNRESOLVED_SECTION`] entry for `tag` unless it is known.
    /// Returns whether a placeholder was added.
    pub fn register_placeholder(&mut self, tag: &SectionTag) -> bool {
        if self.entries.contains_key(tag) {
            return false;
        }
        tracing::debug!(section = %tag, "registering unresolved section");
        self.entries
            .insert(tag.clone(), SectionNum::unresolved(tag.prefix.clone()));
        true
    }

    /// Picks the entry a reference should link to. A prefixed tag that is
    /// present, even as a placeholder, wins. Otherwise the same name in the
    /// standard itself is used when that is present.
    pub fn resolve(&self, tag: SectionTag) -> SectionTag {
        if tag.prefix.is_empty() || self.contains(&tag) {
            return tag;
        }
        let fallback = SectionTag::new("", tag.name.clone());
        if self.contains(&fallback) {
            tracing::debug!(section = %tag, "resolved through the unprefixed index");
            return fallback;
        }
        tag
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SectionTag, &SectionNum)> {
        self.entries.iter()
    }
}

/// Formats a section reference as published HTML.
pub trait SectionLinker {
    fn section_link(&self, sections: &SectionDb, tag: &SectionTag) -> String;
}

/// Links standard sections to `wg21.link`; paper sections are plain text.
#[derive(Clone, Copy, Debug, Default)]
pub struct WgSectionLinker;

impl SectionLinker for WgSectionLinker {
    fn section_link(&self, sections: &SectionDb, tag: &SectionTag) -> String {
        let number = match sections.get(tag) {
            Some(num) if !num.is_unresolved() => num.to_string(),
            _ => "???".to_string(),
        };
        let name = escape_title_attr(&tag.name);
        if tag.prefix.is_empty() {
            format!("{number} <a href=\"https://wg21.link/{name}\">[{name}]</a>")
        } else {
            format!(
                "{} {number} <span class=\"sref\">[{name}]</span>",
                escape_title_attr(&tag.prefix)
            )
        }
    }
}

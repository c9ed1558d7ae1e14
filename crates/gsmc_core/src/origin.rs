//! Origin strings and the sources parsed from them.
//!
//! An origin is `method;field;field...`, optionally followed by `;;` and a
//! `;`-separated list of flags:
//!
//! ```text
//! assume;$LABEL
//! direct;$LABEL;$URL;$AS[;$TYPE]
//! modrinth;$LABEL;$PLATFORM;$VERSION
//! ```

use gsmc_registry::Category;

use crate::error::ParseError;

const FIELD_SEPARATOR: char = ';';
const FLAG_SEPARATOR: &str = ";;";

/// Variant-specific part of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A peer the user asserts is already present. Never fetched or checked.
    Assume,
    /// A plain URL saved under a fixed file name. No hash is available.
    Direct {
        url: String,
        file_name: String,
        category: Category,
    },
    /// A Modrinth project; the label doubles as the project ID or slug.
    Modrinth {
        platform: String,
        game_version: String,
    },
}

/// Behaviour toggles from the `;;` suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Sync reports `skipped`.
    pub no_sync: bool,
    /// Test reports `skipped`.
    pub no_test: bool,
    /// Flags that are accepted but have no effect.
    pub unknown: Vec<String>,
}

impl Flags {
    fn parse(segment: &str) -> Self {
        let mut flags = Self::default();
        for flag in segment.split(FIELD_SEPARATOR).map(str::trim) {
            match flag.to_ascii_lowercase().as_str() {
                "" => {}
                "nosync" => flags.no_sync = true,
                "notest" | "safe" => flags.no_test = true,
                _ => flags.unknown.push(flag.to_string()),
            }
        }
        flags
    }
}

/// A parsed, validated origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// The raw origin, kept for diagnostics.
    pub origin: String,
    pub label: String,
    pub kind: SourceKind,
    pub flags: Flags,
}

impl Source {
    /// Parse a raw origin string.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let raw = raw.trim();
        let (body, flags) = match raw.split_once(FLAG_SEPARATOR) {
            Some((body, flags)) => (body, Flags::parse(flags)),
            None => (raw, Flags::default()),
        };

        let mut parts = body.split(FIELD_SEPARATOR).map(str::trim);
        let method = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        let Some(entry) = METHODS
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(method))
        else {
            return Err(ParseError::UnknownMethod {
                origin: raw.to_string(),
                method: method.to_string(),
            });
        };

        if fields.len() < entry.arity || fields[..entry.arity].iter().any(|f| f.is_empty()) {
            return Err(ParseError::MalformedOrigin {
                origin: raw.to_string(),
                pattern: entry.pattern,
            });
        }

        Ok(Self {
            origin: raw.to_string(),
            label: fields[0].to_string(),
            kind: (entry.build)(&fields),
            flags,
        })
    }

    /// A registry peer added to the run because another source requires it.
    pub fn peer(label: &str, platform: &str, game_version: &str) -> Self {
        Self {
            origin: format!("modrinth;{label};{platform};{game_version}"),
            label: label.to_string(),
            kind: SourceKind::Modrinth {
                platform: platform.to_string(),
                game_version: game_version.to_string(),
            },
            flags: Flags::default(),
        }
    }

    pub fn method(&self) -> &'static str {
        match self.kind {
            SourceKind::Assume => "assume",
            SourceKind::Direct { .. } => "direct",
            SourceKind::Modrinth { .. } => "modrinth",
        }
    }

    pub fn is_registry(&self) -> bool {
        matches!(self.kind, SourceKind::Modrinth { .. })
    }
}

/// One row of the method table.
struct Method {
    name: &'static str,
    pattern: &'static str,
    /// Required fields after the method, the label included.
    arity: usize,
    build: fn(&[&str]) -> SourceKind,
}

const METHODS: &[Method] = &[
    Method {
        name: "assume",
        pattern: "assume;$LABEL",
        arity: 1,
        build: |_| SourceKind::Assume,
    },
    Method {
        name: "direct",
        pattern: "direct;$LABEL;$URL;$AS[;$TYPE]",
        arity: 3,
        build: |f| SourceKind::Direct {
            url: f[1].to_string(),
            file_name: f[2].to_string(),
            category: f.get(3).map_or(Category::Unknown, |hint| Category::from_hint(hint)),
        },
    },
    Method {
        name: "modrinth",
        pattern: "modrinth;$LABEL;$PLATFORM;$VERSION",
        arity: 3,
        build: |f| SourceKind::Modrinth {
            platform: f[1].to_string(),
            game_version: f[2].to_string(),
        },
    },
];

//! One-shot rewrite of the static pokedex data file: every record whose
//! `image` link follows the generated asset layout gains a sibling
//! `shinyImage` link.
//!
//! The data file is JavaScript source, so the rewrite works on text while
//! still reasoning per record: object literals are located by brace
//! matching, and a record that already defines `shinyImage` is left alone.
//! Running the migration on its own output is therefore a no-op.

use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Target of the `add-shiny-images` binary, relative to the working directory.
pub const DATA_FILE: &str = "./data/pokemonsList.js";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShinyImageMigration {
    pub content: String,
    /// Records that received a `shinyImage` field.
    pub updated: usize,
    /// Records that already had one.
    pub skipped: usize,
}

fn image_field() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""image"\s*:\s*`\$\{baseURL\}/assets/pokemons/(\d+)\.png`"#)
            .expect("image field pattern is valid")
    })
}

fn shiny_key() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:"shinyImage"|'shinyImage'|\bshinyImage)\s*:"#)
            .expect("shinyImage key pattern is valid")
    })
}

/// Byte index just past the string or template literal opening at `start`.
fn skip_literal(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Where the object literals are, and which bytes are string/template
/// literal or comment text rather than code.
struct SourceLayout {
    objects: Vec<Range<usize>>,
    inert: Vec<Range<usize>>,
}

impl SourceLayout {
    /// Braces inside literals and comments do not open or close objects.
    fn scan(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut open = Vec::new();
        let mut objects = Vec::new();
        let mut inert = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let skip_to = match bytes[i] {
                b'"' | b'\'' | b'`' => Some(skip_literal(bytes, i)),
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    Some(source[i..].find('\n').map_or(bytes.len(), |n| i + n))
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => Some(
                    source[i + 2..]
                        .find("*/")
                        .map_or(bytes.len(), |n| i + n + 4),
                ),
                b'{' => {
                    open.push(i);
                    None
                }
                b'}' => {
                    if let Some(start) = open.pop() {
                        objects.push(start..i + 1);
                    }
                    None
                }
                _ => None,
            };

            match skip_to {
                Some(end) => {
                    inert.push(i..end);
                    i = end;
                }
                None => i += 1,
            }
        }

        Self { objects, inert }
    }

    /// Spans nest properly, so the containing span that starts last is the
    /// innermost one.
    fn innermost(&self, pos: usize) -> Option<Range<usize>> {
        self.objects
            .iter()
            .filter(|span| span.contains(&pos))
            .max_by_key(|span| span.start)
            .cloned()
    }

    /// `pos` lies past the opening quote of a literal or inside a comment.
    /// A quoted key starts *at* its opening quote, so it is still code.
    fn is_inert(&self, pos: usize) -> bool {
        self.inert
            .iter()
            .any(|range| range.start < pos && pos < range.end)
    }

    /// Whether `shinyImage` is a key of the record `scope` itself, not of
    /// some object nested inside it nor text inside a value or comment.
    fn defines_shiny_image(&self, source: &str, scope: &Range<usize>, is_record: bool) -> bool {
        shiny_key()
            .find_iter(&source[scope.clone()])
            .map(|m| scope.start + m.start())
            .filter(|&pos| !self.is_inert(pos))
            .any(|pos| !is_record || self.innermost(pos).as_ref() == Some(scope))
    }
}

/// Whitespace that opens the line `pos` sits on, or `None` when the line
/// has other content before `pos`.
fn line_indent(source: &str, pos: usize) -> Option<&str> {
    let line_start = source[..pos].rfind('\n').map_or(0, |n| n + 1);
    let prefix = &source[line_start..pos];
    prefix.chars().all(char::is_whitespace).then_some(prefix)
}

pub fn add_shiny_images(source: &str) -> ShinyImageMigration {
    let layout = SourceLayout::scan(source);
    let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let matches: Vec<_> = image_field().captures_iter(source).collect();

    let mut content = String::with_capacity(source.len() + matches.len() * 64);
    let mut last = 0;
    let mut updated = 0;
    let mut skipped = 0;

    for (index, caps) in matches.iter().enumerate() {
        let Some(field) = caps.get(0) else {
            continue;
        };
        let id = &caps[1];

        // A bare fragment outside any object is scoped up to the next image field.
        let (scope, is_record) = match layout.innermost(field.start()) {
            Some(record) => (record, true),
            None => {
                let end = matches
                    .get(index + 1)
                    .and_then(|next| next.get(0))
                    .map_or(source.len(), |next| next.start());
                (field.end()..end, false)
            }
        };

        content.push_str(&source[last..field.end()]);
        last = field.end();

        if layout.defines_shiny_image(source, &scope, is_record) {
            skipped += 1;
            continue;
        }

        let separator = match line_indent(source, field.start()) {
            Some(indent) => format!(",{}{}", newline, indent),
            None => ", ".to_string(),
        };
        content.push_str(&separator);
        content.push_str(&format!(
            "\"shinyImage\": `${{baseURL}}/assets/pokemons/shiny/{}.png`",
            id
        ));
        updated += 1;
    }
    content.push_str(&source[last..]);

    ShinyImageMigration {
        content,
        updated,
        skipped,
    }
}

/// Read `path`, add missing `shinyImage` fields and write it back in place.
/// The file is left untouched when nothing needs adding.
pub fn migrate_file(path: &Path) -> Result<ShinyImageMigration, MigrationError> {
    let source = std::fs::read_to_string(path).map_err(|source| MigrationError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let migration = add_shiny_images(&source);
    tracing::info!(
        path = %path.display(),
        updated = migration.updated,
        skipped = migration.skipped,
        "Computed shinyImage migration"
    );

    if migration.updated > 0 {
        std::fs::write(path, &migration.content).map_err(|source| MigrationError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(migration)
}

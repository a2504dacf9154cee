//! Model source files: one Go struct per file under the model directory.
//!
//! Structs are located by their literal declaration header
//! (`type Order struct {`), scanning every file in the directory in name
//! order. The first file containing the header wins.

use crate::error::{MiggenError, MiggenResult};
use crate::fsutil::{create_dir_all, read_to_string, write_atomic};
use crate::layout::ProjectLayout;
use crate::naming::{to_snake_case, validate_ident};
use crate::timestamp::Timestamp;
use std::path::PathBuf;

/// A column requested on the command line as `name:type[:tag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: String,
    pub tag: Option<String>,
}

impl Field {
    /// Parse `name:type[:tag]`. A missing type defaults to `string`; the tag
    /// keeps any further `:` (`email:string:json:"email"`).
    pub fn parse(spec: &str) -> MiggenResult<Self> {
        let mut parts = spec.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        validate_ident("column name", name)?;

        let ty = parts
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("string");
        if ty.contains(char::is_whitespace) || ty.contains('`') {
            return Err(MiggenError::InvalidInput(format!(
                "invalid type for column {name}: {ty}"
            )));
        }

        let tag = parts
            .next()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if let Some(tag) = &tag {
            if tag.contains('`') || tag.contains('\n') {
                return Err(MiggenError::InvalidInput(format!(
                    "invalid tag for column {name}: {tag}"
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            ty: ty.to_string(),
            tag,
        })
    }

    /// The Go struct tag, e.g. `` `gorm:"index"` ``.
    pub fn tag_block(&self) -> Option<String> {
        self.tag.as_deref().map(render_tag)
    }

    /// Struct body line: `<name> <type> [<tag>] // Added <note>`.
    pub fn line(&self, note: &str) -> String {
        match self.tag_block() {
            Some(tag) => format!("\t{} {} {tag} // Added {note}", self.name, self.ty),
            None => format!("\t{} {} // Added {note}", self.name, self.ty),
        }
    }
}

/// A bare tag is a gorm setting list; anything quoted is taken as a full Go
/// struct tag.
pub fn render_tag(tag: &str) -> String {
    if tag.contains('"') {
        format!("`{tag}`")
    } else {
        format!("`gorm:\"{tag}\"`")
    }
}

pub fn struct_header(model: &str) -> String {
    format!("type {model} struct {{")
}

pub fn model_source(package: &str, model: &str) -> String {
    format!(
        "package {package}\n\n{}\n\tID uint `gorm:\"primaryKey\"`\n\t// Add your fields here\n}}\n",
        struct_header(model)
    )
}

/// Insert `lines` directly below the first line holding `model`'s header.
/// Inserted lines take the header's line ending (`\r\n` files stay CRLF).
///
/// Returns `None` when the header is absent.
pub fn insert_fields(content: &str, model: &str, lines: &[String]) -> Option<String> {
    let header = struct_header(model);
    let mut out: Vec<String> = content.split('\n').map(str::to_string).collect();
    let at = out.iter().position(|l| l.contains(&header))?;
    let eol = if out[at].ends_with('\r') { "\r" } else { "" };
    for (i, line) in lines.iter().enumerate() {
        out.insert(at + 1 + i, format!("{line}{eol}"));
    }
    Some(out.join("\n"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagUpdate {
    /// The field had no struct tag; a `gorm:"index"` tag was appended.
    Created,
    /// `index;` was injected into an existing tag.
    Injected,
    /// The gorm tag already had an index setting; nothing changed.
    AlreadyIndexed,
}

/// Mark `column` of `model` as indexed in the struct tag.
///
/// Only lines inside the struct body are considered (header up to the first
/// line that is just `}`); the first one starting with `column` plus
/// whitespace is updated. Returns `None` if the struct or field is missing.
pub fn add_index_tag(content: &str, model: &str, column: &str) -> Option<(String, TagUpdate)> {
    let header = struct_header(model);
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let start = lines.iter().position(|l| l.contains(&header))?;

    let field_at = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .take_while(|(_, l)| l.trim() != "}")
        .find(|(_, l)| {
            l.trim()
                .strip_prefix(column)
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
        .map(|(i, _)| i)?;

    let (updated, outcome) = index_field_line(&lines[field_at])?;
    lines[field_at] = updated;
    Some((lines.join("\n"), outcome))
}

/// Rewrite one struct field line so its gorm tag carries `index`.
pub fn index_field_line(line: &str) -> Option<(String, TagUpdate)> {
    let (line_body, eol) = match line.strip_suffix('\r') {
        Some(stripped) => (stripped, "\r"),
        None => (line, ""),
    };
    let indent_len = line_body.len() - line_body.trim_start().len();
    let (indent, body) = line_body.split_at(indent_len);
    let (code, comment) = split_trailing_comment(body);
    let code = code.trim_end();

    let (new_code, outcome) = match (code.find('`'), code.rfind('`')) {
        (Some(open), Some(close)) if close > open => {
            let tag = &code[open + 1..close];
            match tag.find("gorm:\"") {
                Some(g) => {
                    let settings_at = open + 1 + g + "gorm:\"".len();
                    let settings = code[settings_at..close].split('"').next().unwrap_or("");
                    if has_index_setting(settings) {
                        return Some((line.to_string(), TagUpdate::AlreadyIndexed));
                    }
                    let marker = if settings.is_empty() { "index" } else { "index;" };
                    let mut s = code.to_string();
                    s.insert_str(settings_at, marker);
                    (s, TagUpdate::Injected)
                }
                None => {
                    let mut s = code.to_string();
                    s.insert_str(open + 1, "gorm:\"index\" ");
                    (s, TagUpdate::Injected)
                }
            }
        }
        _ => {
            let mut tokens = code.split_whitespace();
            let name = tokens.next()?;
            let ty = tokens.next()?;
            (format!("{name} {ty} `gorm:\"index\"`"), TagUpdate::Created)
        }
    };

    let rebuilt = match comment {
        Some(c) => format!("{indent}{new_code} {c}{eol}"),
        None => format!("{indent}{new_code}{eol}"),
    };
    Some((rebuilt, outcome))
}

fn has_index_setting(settings: &str) -> bool {
    settings.split(';').map(str::trim).any(|s| {
        s.eq_ignore_ascii_case("index") || s.to_ascii_lowercase().starts_with("index:")
    })
}

/// Split `code // comment`, ignoring `//` inside a backtick tag.
fn split_trailing_comment(body: &str) -> (&str, Option<&str>) {
    let mut in_tag = false;
    let bytes = body.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'`' => in_tag = !in_tag,
            b'/' if !in_tag && bytes.get(i + 1) == Some(&b'/') => {
                return (&body[..i], Some(&body[i..]));
            }
            _ => {}
        }
    }
    (body, None)
}

/// Reads and patches model files for one project layout.
#[derive(Debug, Clone, Copy)]
pub struct ModelWriter<'a> {
    layout: &'a ProjectLayout,
}

impl<'a> ModelWriter<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn model_path(&self, model: &str, at: &Timestamp) -> PathBuf {
        let base = to_snake_case(model);
        let file = if self.layout.timestamp_prefix {
            format!("{}_{base}.go", at.id())
        } else {
            format!("{base}.go")
        };
        self.layout.model_dir.join(file)
    }

    /// Write a fresh model file. An existing file with the same name is
    /// overwritten.
    pub fn create_model(&self, model: &str, at: &Timestamp) -> MiggenResult<PathBuf> {
        validate_ident("model name", model)?;
        create_dir_all(&self.layout.model_dir)?;

        let path = self.model_path(model, at);
        if path.exists() {
            tracing::warn!(path = %path.display(), model, "overwriting existing model file");
        } else if let Some((other, _)) = self.find_model(model)? {
            tracing::warn!(
                path = %other.display(),
                model,
                "struct already declared in another model file"
            );
        }

        write_atomic(&path, &model_source(&self.layout.model_package(), model))?;
        tracing::info!(path = %path.display(), model, "created model");
        Ok(path)
    }

    pub fn model_exists(&self, model: &str) -> MiggenResult<bool> {
        Ok(self.find_model(model)?.is_some())
    }

    /// First model file (in name order) declaring `model`, with its content.
    pub fn find_model(&self, model: &str) -> MiggenResult<Option<(PathBuf, String)>> {
        let header = struct_header(model);
        for path in self.model_files()? {
            let content = read_to_string(&path)?;
            if content.contains(&header) {
                tracing::debug!(path = %path.display(), model, "found model");
                return Ok(Some((path, content)));
            }
        }
        Ok(None)
    }

    /// Insert `fields` below the struct header, in the given order.
    pub fn append_fields(
        &self,
        model: &str,
        fields: &[Field],
        at: &Timestamp,
    ) -> MiggenResult<PathBuf> {
        let Some((path, content)) = self.find_model(model)? else {
            return Err(MiggenError::NotFound(format!("model {model}")));
        };

        let note = at.note();
        let lines: Vec<String> = fields.iter().map(|f| f.line(&note)).collect();
        let updated = insert_fields(&content, model, &lines)
            .ok_or_else(|| MiggenError::NotFound(format!("struct header for {model}")))?;

        write_atomic(&path, &updated)?;
        tracing::info!(path = %path.display(), model, count = fields.len(), "added fields");
        Ok(path)
    }

    pub fn add_index_tag(&self, model: &str, column: &str) -> MiggenResult<(PathBuf, TagUpdate)> {
        let Some((path, content)) = self.find_model(model)? else {
            return Err(MiggenError::NotFound(format!("model {model}")));
        };

        let (updated, outcome) = add_index_tag(&content, model, column)
            .ok_or_else(|| MiggenError::NotFound(format!("field {column} in model {model}")))?;

        if outcome == TagUpdate::AlreadyIndexed {
            tracing::warn!(path = %path.display(), model, column, "field already indexed");
        } else {
            write_atomic(&path, &updated)?;
            tracing::info!(path = %path.display(), model, column, ?outcome, "tagged index");
        }
        Ok((path, outcome))
    }

    /// Go sources in the model directory, in name order. Other files
    /// (`.DS_Store`, editor swap files) are never read.
    fn model_files(&self) -> MiggenResult<Vec<PathBuf>> {
        let dir = &self.layout.model_dir;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let dir_str = dir.to_str().ok_or_else(|| {
            MiggenError::InvalidInput(format!("model dir is not valid UTF-8: {}", dir.display()))
        })?;
        let pattern = format!("{}/*.go", glob::Pattern::escape(dir_str));

        let mut files = Vec::new();
        let entries = glob::glob(&pattern)
            .map_err(|e| MiggenError::InvalidInput(format!("invalid glob {pattern}: {e}")))?;
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                MiggenError::io(path, e.into_error())
            })?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

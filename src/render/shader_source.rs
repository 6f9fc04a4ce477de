// shader_source.rs - Splits a tagged GLSL file into its stages

use super::device::ShaderStage;
use super::shaders::{ShaderErrorKind, ShaderLoadError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TAG: &str = "#type";

/// Path reported for sources that did not come from disk.
pub const BUILTIN_PATH: &str = "<builtin:default.glsl>";

const BUILTIN_DEFAULT: &str = include_str!("../../assets/shaders/default.glsl");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShaderParseError {
    #[error("no `#type {0}` section")]
    MissingStage(ShaderStage),
    #[error("more than one `#type {0}` section")]
    DuplicateStage(ShaderStage),
    #[error("unknown shader stage `{0}` (expected `vertex` or `fragment`)")]
    UnknownStage(String),
    #[error("line {line}: `#type` tag without a stage name")]
    MalformedTag { line: usize },
}

/// Vertex and fragment GLSL text read from one tagged file.
///
/// ```text
/// #type vertex
/// <vertex GLSL>
/// #type fragment
/// <fragment GLSL>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    path: PathBuf,
    vertex: String,
    fragment: String,
}

struct Tag<'a> {
    line: usize,
    token: &'a str,
    /// Byte offset of the tag line's first character
    start: usize,
    /// Byte offset just past the tag line's terminator
    body_start: usize,
}

impl ShaderSource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShaderLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ShaderLoadError::new(path, ShaderErrorKind::Io(e)))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl AsRef<Path>, text: &str) -> Result<Self, ShaderLoadError> {
        let path = path.as_ref();
        Self::split(path, text).map_err(|e| ShaderLoadError::new(path, e.into()))
    }

    /// Position and color pass-through program shipped with the engine.
    pub fn builtin() -> Result<Self, ShaderLoadError> {
        Self::parse(BUILTIN_PATH, BUILTIN_DEFAULT)
    }

    fn split(path: &Path, text: &str) -> Result<Self, ShaderParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let tags = find_tags(text)?;

        if let Some(first) = tags.first() {
            if !text[..first.start].trim().is_empty() {
                log::warn!(
                    "Ignoring text before the first `#type` tag in '{}'",
                    path.display()
                );
            }
        }

        let mut vertex = None;
        let mut fragment = None;
        for (i, tag) in tags.iter().enumerate() {
            let stage: ShaderStage = tag
                .token
                .parse()
                .map_err(|_| ShaderParseError::UnknownStage(tag.token.to_string()))?;
            let end = tags.get(i + 1).map_or(text.len(), |next| next.start);
            let body = text[tag.body_start..end].to_string();

            let slot = match stage {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            if slot.is_some() {
                return Err(ShaderParseError::DuplicateStage(stage));
            }
            *slot = Some(body);
        }

        Ok(Self {
            path: path.to_path_buf(),
            vertex: vertex.ok_or(ShaderParseError::MissingStage(ShaderStage::Vertex))?,
            fragment: fragment.ok_or(ShaderParseError::MissingStage(ShaderStage::Fragment))?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

/// A tag line starts (after blanks) with `#type`, then at least one space or
/// tab, then the stage name. `#typedef` and mid-line `#type` are plain text.
fn find_tags(text: &str) -> Result<Vec<Tag<'_>>, ShaderParseError> {
    let mut tags = Vec::new();
    let mut offset = 0;

    for (index, raw_line) in text.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim_start_matches([' ', '\t']);
        let Some(rest) = line.strip_prefix(TAG) else {
            continue;
        };
        let content = rest.trim_end_matches(['\n', '\r']);
        if !content.is_empty() && !content.starts_with([' ', '\t']) {
            continue;
        }
        let token = content.trim();
        if token.is_empty() {
            return Err(ShaderParseError::MalformedTag { line: index + 1 });
        }
        tags.push(Tag {
            line: index + 1,
            token,
            start: line_start,
            body_start: offset,
        });
    }

    log::trace!(
        "found {} shader section tag(s) at lines {:?}",
        tags.len(),
        tags.iter().map(|t| t.line).collect::<Vec<_>>()
    );
    Ok(tags)
}

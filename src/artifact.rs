//! Artifacts - what one emitter pass produces for one target

use indexmap::IndexMap;
use serde::Serialize;

use crate::target::Arch;

/// Categories with one file per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerClassCategory {
    Modify,
    Binding,
}

impl PerClassCategory {
    /// Shared output directory, `modify` or `binding`.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Modify => "modify",
            Self::Binding => "binding",
        }
    }

    /// `modify_arm`, `binding_intel`, ...
    pub fn arch_dir(self, arch: Arch) -> String {
        format!("{}{}", self.dir(), arch.dir_suffix())
    }

    /// Stem of the top-level aggregate header.
    pub fn top_level_stem(self) -> &'static str {
        match self {
            Self::Modify => "GeneratedModify",
            Self::Binding => "GeneratedBinding",
        }
    }
}

/// Categories emitted as one blob per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SingleFileCategory {
    Predeclare,
    Source,
}

impl SingleFileCategory {
    pub fn stem(self) -> &'static str {
        match self {
            Self::Predeclare => "GeneratedPredeclare",
            Self::Source => "GeneratedSource",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Predeclare => "hpp",
            Self::Source => "cpp",
        }
    }
}

/// Filename to content, in model declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactMap {
    files: IndexMap<String, String>,
}

impl ArtifactMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous content if `name` was already present; the
    /// entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.files.insert(name.into(), content.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArtifactMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// One include line per artifact, in artifact order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateManifest {
    text: String,
}

impl AggregateManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, dir: &str, file: &str) {
        self.text.push_str(&format!("#include \"{}/{}\"\n", dir, file));
    }

    /// Full top-level header around this manifest.
    pub fn render_header(&self) -> String {
        format!("#pragma once\n\n{}", self.text)
    }
}

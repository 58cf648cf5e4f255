//! Model Validation - declarations and dependencies
//!
//! Class names become file names, so every local class must be declared
//! once under a plain identifier. A dependency resolves when it names a
//! class declared in the model or a class that belongs to the engine the
//! bindings target.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::Model;
use crate::pipeline::CodegenError;

/// A `depends` entry that names neither a model class nor an external one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDependency {
    pub class: String,
    pub dependency: String,
}

impl From<UnresolvedDependency> for CodegenError {
    fn from(v: UnresolvedDependency) -> Self {
        CodegenError::Dependency {
            class: v.class,
            dependency: v.dependency,
        }
    }
}

/// A local class whose name cannot be used as an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidDeclaration {
    pub class: String,
    pub reason: String,
}

impl From<InvalidDeclaration> for CodegenError {
    fn from(v: InvalidDeclaration) -> Self {
        CodegenError::Declaration {
            class: v.class,
            reason: v.reason,
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Classes known to exist outside the model.
#[derive(Debug, Clone)]
pub struct ExternalClasses {
    prefixes: Vec<String>,
    names: HashSet<String>,
}

impl ExternalClasses {
    pub fn new<P, N>(prefixes: P, names: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// No external classes at all.
    pub fn none() -> Self {
        Self::new(Vec::<String>::new(), Vec::<String>::new())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for ExternalClasses {
    /// cocos2d and FMOD classes, plus a few loose engine types.
    fn default() -> Self {
        Self::new(
            ["cocos2d::", "FMOD::"],
            ["DS_Dictionary", "pugi::xml_document", "pugi::xml_node"],
        )
    }
}

/// Checks the dependency graph before any id or artifact is produced.
pub struct DependencyValidator {
    externals: ExternalClasses,
}

impl DependencyValidator {
    pub fn new(externals: ExternalClasses) -> Self {
        Self { externals }
    }

    /// Badly named or repeated local classes, in declaration order.
    pub fn invalid_declarations(&self, model: &Model) -> Vec<InvalidDeclaration> {
        let mut seen = HashSet::new();
        let mut invalid = vec![];
        for class in &model.classes {
            let reason = if !is_plain_identifier(&class.name) {
                "local class names must be plain identifiers"
            } else if !seen.insert(class.name.as_str()) {
                "declared more than once"
            } else {
                continue;
            };
            invalid.push(InvalidDeclaration {
                class: class.name.clone(),
                reason: reason.to_string(),
            });
        }
        invalid
    }

    /// All unresolved dependencies, in declaration order.
    pub fn violations(&self, model: &Model) -> Vec<UnresolvedDependency> {
        let declared = model.class_names();

        let mut violations = vec![];
        for class in &model.classes {
            for dep in &class.attributes.depends {
                if declared.contains(dep.as_str()) || self.externals.contains(dep) {
                    continue;
                }
                violations.push(UnresolvedDependency {
                    class: class.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
        violations
    }

    /// Fails with the first invalid declaration, then with the first
    /// unresolved dependency.
    pub fn validate(&self, model: &Model) -> Result<(), CodegenError> {
        if let Some(invalid) = self.invalid_declarations(model).into_iter().next() {
            return Err(invalid.into());
        }
        match self.violations(model).into_iter().next() {
            Some(v) => Err(v.into()),
            None => Ok(()),
        }
    }
}

impl Default for DependencyValidator {
    fn default() -> Self {
        Self::new(ExternalClasses::default())
    }
}

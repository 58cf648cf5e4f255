//! Binding Model - the parsed class/function description
//!
//! The DSL front end lives outside this crate. It hands over a [`Model`],
//! either directly or serialized as `Entry.json`, and nothing here mutates
//! it afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::pipeline::CodegenError;
use crate::target::{Arch, Platform, Target};

/// Name of the serialized model document inside the source root.
pub const ENTRY_FILE: &str = "Entry.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub functions: Vec<Function>,
}

impl Model {
    /// Name index over the declared classes.
    pub fn class_names(&self) -> HashSet<&str> {
        self.classes.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub superclasses: Vec<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Class {
    /// Member functions with their index inside `members`.
    pub fn functions(&self) -> impl Iterator<Item = (usize, &Function)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            Member::Function(f) => Some((i, f)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Classes this class needs declared before it.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Platforms on which the class is linked instead of hooked.
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Function(Function),
    Field {
        name: String,
        #[serde(rename = "type")]
        ty: String,
    },
    Pad {
        #[serde(default)]
        bytes: PerPlatform<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub bindings: PerPlatform<Address>,
}

fn default_return_type() -> String { "void".to_string() }

impl Function {
    /// `int x, bool y`
    pub fn parameter_list(&self) -> String {
        self.args.iter()
            .map(|a| format!("{} {}", a.ty, a.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `int, bool`
    pub fn parameter_types(&self) -> String {
        self.args.iter()
            .map(|a| a.ty.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn argument_names(&self) -> String {
        self.args.iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

/// One value per binding column. The column names follow the DSL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PerPlatform<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imac: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m1: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android32: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android64: Option<T>,
}

impl<T> Default for PerPlatform<T> {
    fn default() -> Self {
        Self {
            win: None,
            imac: None,
            m1: None,
            ios: None,
            android32: None,
            android64: None,
        }
    }
}

impl<T: Copy> PerPlatform<T> {
    pub fn for_target(&self, target: Target) -> Option<T> {
        match (target.platform(), target.arch()) {
            (Platform::Windows, _) => self.win,
            (Platform::Mac, Arch::Arm) => self.m1,
            (Platform::Mac, _) => self.imac,
            (Platform::Ios, _) => self.ios,
            (Platform::Android32, _) => self.android32,
            (Platform::Android64, _) => self.android64,
        }
    }
}

/// An offset from the base of the hooked binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressRepr", into = "AddressRepr")]
pub struct Address(pub u64);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<AddressRepr> for Address {
    type Error = String;

    fn try_from(repr: AddressRepr) -> Result<Self, Self::Error> {
        match repr {
            AddressRepr::Number(n) => Ok(Address(n)),
            AddressRepr::Text(s) => {
                let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"));
                let parsed = match digits {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => s.parse::<u64>(),
                };
                parsed.map(Address).map_err(|e| format!("invalid address '{}': {}", s, e))
            }
        }
    }
}

impl From<Address> for AddressRepr {
    fn from(address: Address) -> Self {
        AddressRepr::Text(address.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Seam to the external DSL front end.
pub trait Frontend {
    fn parse(&self, path: &Path) -> Result<Model, CodegenError>;
}

/// Reads a model that the DSL tooling already serialized to JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFrontend;

impl Frontend for JsonFrontend {
    fn parse(&self, path: &Path) -> Result<Model, CodegenError> {
        let content = fs::read_to_string(path).map_err(|source| CodegenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| CodegenError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

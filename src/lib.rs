//! Geode Codegen - multi-target C++ binding generator
//!
//! # Pipeline
//! 1. Dependencies resolve before anything is generated
//! 2. Ids are assigned once, in declaration order
//! 3. Every emitter pass gets an explicit, immutable target
//! 4. Identical architecture outputs are shared, diverging ones split
//! 5. Unchanged files are never rewritten

pub mod artifact;
pub mod config;
pub mod emit;
pub mod hashing;
pub mod ids;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod target;
pub mod validation;
pub mod writer;

pub use artifact::{AggregateManifest, ArtifactMap, PerClassCategory, SingleFileCategory};
pub use config::{ExtraFlags, GeneratorConfig};
pub use emit::{EmitContext, EmittedArtifacts, Emitter, StandardEmitter};
pub use hashing::{canonical_json, sha256_hex};
pub use ids::{IdentityMap, NodeKey};
pub use merge::{OutputPlan, PlannedFile};
pub use model::{Frontend, JsonFrontend, Model};
pub use pipeline::{run, CodegenError, GenerationPipeline, GenerationReport, GenerationRequest};
pub use target::{Arch, Platform, PlatformArg, Target};
pub use validation::{DependencyValidator, ExternalClasses, InvalidDeclaration, UnresolvedDependency};
pub use writer::{write_file, write_file_touching, WriteOutcome, WrittenFile};

pub const CODEGEN_VERSION: &str = env!("CARGO_PKG_VERSION");

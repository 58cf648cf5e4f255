//! Generation Pipeline - Single Entry Point
//!
//! validate -> assign ids -> emit per target -> merge -> write.
//! `generate` always validates first; nothing is emitted for a model whose
//! dependencies do not resolve.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::artifact::PerClassCategory;
use crate::config::GeneratorConfig;
use crate::emit::{emit_all, EmitContext, Emitter, StandardEmitter};
use crate::hashing::{canonical_json, sha256_hex};
use crate::ids::IdentityMap;
use crate::merge::OutputPlan;
use crate::model::{Frontend, JsonFrontend, Model, ENTRY_FILE};
use crate::target::PlatformArg;
use crate::validation::{DependencyValidator, ExternalClasses};
use crate::writer::{apply_plan, WriteOutcome, WrittenFile};
use crate::CODEGEN_VERSION;

/// Directory below the output root that receives every artifact.
pub const OUTPUT_DIR: &str = "Geode";

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("{0}")]
    Argument(String),

    #[error("Class {class} depends on unknown class {dependency}")]
    Dependency { class: String, dependency: String },

    #[error("Invalid class {class}: {reason}")]
    Declaration { class: String, reason: String },

    #[error("{message}")]
    Parse { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub platform: PlatformArg,
    /// `Geode/` is created below this directory.
    pub output_root: PathBuf,
    pub skip_pugixml: bool,
    pub sdk_version: Version,
}

impl From<&GeneratorConfig> for GenerationRequest {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            platform: config.platform,
            output_root: config.output_root.clone(),
            skip_pugixml: config.skip_pugixml,
            sdk_version: config.sdk_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub platform: PlatformArg,
    pub sdk_version: String,
    pub codegen_version: String,
    pub files: Vec<WrittenFile>,
    /// sha256(platform + ":" + sdk_version + ":" + canonical(paths and digests))
    pub report_hash: String,
}

#[derive(Serialize)]
struct HashedPath<'a> {
    path: &'a Path,
    sha256: &'a str,
}

impl GenerationReport {
    fn new(platform: PlatformArg, sdk_version: &Version, files: Vec<WrittenFile>) -> Result<Self, CodegenError> {
        // outcomes differ between a first run and a re-run; the hash must not
        let hashed: Vec<_> = files.iter()
            .map(|f| HashedPath { path: &f.path, sha256: &f.sha256 })
            .collect();
        let report_hash = sha256_hex(format!("{}:{}:{}", platform, sdk_version, canonical_json(&hashed)?));

        Ok(Self {
            platform,
            sdk_version: sdk_version.to_string(),
            codegen_version: CODEGEN_VERSION.to_string(),
            files,
            report_hash,
        })
    }

    fn count(&self, outcome: WriteOutcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }

    pub fn changed(&self) -> usize {
        self.count(WriteOutcome::Changed)
    }

    pub fn unchanged(&self) -> usize {
        self.count(WriteOutcome::Unchanged)
    }

    pub fn touched(&self) -> usize {
        self.count(WriteOutcome::Touched)
    }

    /// Outcome for a path relative to `Geode/`.
    pub fn outcome(&self, path: impl AsRef<Path>) -> Option<WriteOutcome> {
        self.files.iter()
            .find(|f| f.path == path.as_ref())
            .map(|f| f.outcome)
    }
}

/// The generation pipeline - single entry point for all artifact output
pub struct GenerationPipeline<E = StandardEmitter> {
    emitter: E,
    validator: DependencyValidator,
}

impl<E: Emitter> GenerationPipeline<E> {
    pub fn new(emitter: E, externals: ExternalClasses) -> Self {
        Self {
            emitter,
            validator: DependencyValidator::new(externals),
        }
    }

    pub fn into_emitter(self) -> E {
        self.emitter
    }

    /// Everything up to, but not including, touching the filesystem.
    pub fn plan(&self, model: &Model, request: &GenerationRequest) -> Result<OutputPlan, CodegenError> {
        self.validator.validate(model)?;

        let ids = IdentityMap::populate(model);
        info!(nodes = ids.len(), classes = model.classes.len(), "assigned ids");

        let mut outputs = vec![];
        for target in request.platform.targets() {
            let cx = EmitContext {
                model,
                ids: &ids,
                target,
                sdk_version: &request.sdk_version,
            };
            info!(build_target = %target, "emitting");
            outputs.push((target, emit_all(&self.emitter, &cx, request.skip_pugixml)));
        }

        OutputPlan::for_targets(&outputs)
    }

    pub fn generate(&self, model: &Model, request: &GenerationRequest) -> Result<GenerationReport, CodegenError> {
        let plan = self.plan(model, request)?;

        let root = request.output_root.join(OUTPUT_DIR);
        for category in [PerClassCategory::Modify, PerClassCategory::Binding] {
            let dir = root.join(category.dir());
            fs::create_dir_all(&dir).map_err(|source| CodegenError::Io { path: dir.clone(), source })?;
        }

        let files = apply_plan(&root, &plan)?;
        let report = GenerationReport::new(request.platform, &request.sdk_version, files)?;
        info!(
            platform = %request.platform,
            changed = report.changed(),
            unchanged = report.unchanged(),
            touched = report.touched(),
            "generation finished"
        );
        Ok(report)
    }
}

impl Default for GenerationPipeline<StandardEmitter> {
    fn default() -> Self {
        Self::new(StandardEmitter, ExternalClasses::default())
    }
}

/// Parses `<source-root>/Entry.json` and generates into `<output-root>/Geode`.
pub fn run(config: &GeneratorConfig) -> Result<GenerationReport, CodegenError> {
    let entry = config.source_root.join(ENTRY_FILE);
    info!(entry = %entry.display(), "parsing model");
    let model = JsonFrontend.parse(&entry)?;
    GenerationPipeline::<StandardEmitter>::default().generate(&model, &GenerationRequest::from(config))
}

//! Artifact Merge - shared/split layout for universal binaries
//!
//! When one platform builds for two architectures, identical artifacts are
//! written once and only the diverging ones are split into per-architecture
//! copies. Everything here is pure: it produces an [`OutputPlan`] that the
//! writer applies afterwards.

use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::artifact::{AggregateManifest, ArtifactMap, PerClassCategory, SingleFileCategory};
use crate::emit::EmittedArtifacts;
use crate::pipeline::CodegenError;
use crate::target::{Arch, Target, ARM_MARKER};

pub const TEXT_INTERFACE_STEM: &str = "CodegenData";
pub const JSON_INTERFACE_FILE: &str = "CodegenData.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Relative to the generation root.
    pub path: PathBuf,
    pub content: String,
    /// Push the mtime forward even when the content is unchanged.
    pub force_touch: bool,
}

/// Every file one run writes, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    pub files: Vec<PlannedFile>,
}

impl OutputPlan {
    /// Plans the outputs of one platform: either a single target, or the
    /// Arm and Intel passes of a universal Mac build.
    pub fn for_targets(outputs: &[(Target, EmittedArtifacts)]) -> Result<Self, CodegenError> {
        match outputs {
            [(_, single)] => plan_single_target(single),
            [(a, arm), (i, intel)] if a.arch() == Arch::Arm && i.arch() == Arch::Intel => {
                plan_universal(arm, intel)
            }
            _ => Err(CodegenError::Argument(format!(
                "Cannot plan outputs for targets [{}]",
                outputs.iter().map(|(t, _)| t.to_string()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    fn push(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.push(PlannedFile {
            path: path.into(),
            content: content.into(),
            force_touch: false,
        });
    }

    fn push_touching(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.push(PlannedFile {
            path: path.into(),
            content: content.into(),
            force_touch: true,
        });
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&PlannedFile> {
        self.files.iter().find(|f| f.path == path.as_ref())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.get(path).is_some()
    }
}

/// Plan for a platform with a single architecture.
pub fn plan_single_target(out: &EmittedArtifacts) -> Result<OutputPlan, CodegenError> {
    let mut plan = OutputPlan::default();

    for (category, map) in [
        (PerClassCategory::Modify, &out.modify),
        (PerClassCategory::Binding, &out.binding),
    ] {
        let mut manifest = AggregateManifest::new();
        for (name, content) in map.iter() {
            plan.push(Path::new(category.dir()).join(name), content);
            manifest.include(category.dir(), name);
        }
        plan.push(format!("{}.hpp", category.top_level_stem()), manifest.render_header());
    }

    for (category, content) in [
        (SingleFileCategory::Predeclare, &out.predeclare),
        (SingleFileCategory::Source, &out.source),
    ] {
        plan.push(format!("{}.{}", category.stem(), category.extension()), content.as_str());
    }

    plan.push(format!("{}.txt", TEXT_INTERFACE_STEM), out.text.as_str());
    plan.push(JSON_INTERFACE_FILE, serde_json::to_string(&out.json)?);
    Ok(plan)
}

/// Plan for a universal Mac build from the Arm and Intel passes.
pub fn plan_universal(arm: &EmittedArtifacts, intel: &EmittedArtifacts) -> Result<OutputPlan, CodegenError> {
    let mut plan = OutputPlan::default();

    merge_per_class(&mut plan, PerClassCategory::Modify, &arm.modify, &intel.modify);
    merge_per_class(&mut plan, PerClassCategory::Binding, &arm.binding, &intel.binding);
    merge_single_file(&mut plan, SingleFileCategory::Predeclare, &arm.predeclare, &intel.predeclare);
    merge_single_file(&mut plan, SingleFileCategory::Source, &arm.source, &intel.source);

    // address tables always diverge, so they are never merged
    for (arch, out) in [(Arch::Arm, arm), (Arch::Intel, intel)] {
        plan.push(format!("{}{}.txt", TEXT_INTERFACE_STEM, arch.suffix()), out.text.as_str());
    }
    let combined = json!({ "arm": arm.json, "intel": intel.json });
    plan.push(JSON_INTERFACE_FILE, serde_json::to_string(&combined)?);

    Ok(plan)
}

fn merge_per_class(
    plan: &mut OutputPlan,
    category: PerClassCategory,
    arm: &ArtifactMap,
    intel: &ArtifactMap,
) {
    let shared_dir = category.dir();
    let arm_dir = category.arch_dir(Arch::Arm);
    let intel_dir = category.arch_dir(Arch::Intel);

    let mut arm_manifest = AggregateManifest::new();
    let mut intel_manifest = AggregateManifest::new();
    let mut consumed = HashSet::new();

    for (name, content) in arm.iter() {
        if intel.get(name) == Some(content) {
            consumed.insert(name);
            plan.push(Path::new(shared_dir).join(name), content);
            arm_manifest.include(shared_dir, name);
            intel_manifest.include(shared_dir, name);
            continue;
        }

        debug!(file = name, dir = shared_dir, "architectures diverge, splitting");
        plan.push(Path::new(&arm_dir).join(name), content);
        arm_manifest.include(&arm_dir, name);
        if !intel.contains(name) {
            plan.push(Path::new(shared_dir).join(name), redirect(category, name, true, false));
        }
    }

    for (name, content) in intel.iter().filter(|(name, _)| !consumed.contains(name)) {
        plan.push(Path::new(&intel_dir).join(name), content);
        plan.push(
            Path::new(shared_dir).join(name),
            redirect(category, name, arm.contains(name), true),
        );
        intel_manifest.include(&intel_dir, name);
    }

    let stem = category.top_level_stem();
    if arm_manifest == intel_manifest {
        plan.push(format!("{stem}.hpp"), arm_manifest.render_header());
    } else {
        let arm_header = format!("{stem}{}.hpp", Arch::Arm.suffix());
        let intel_header = format!("{stem}{}.hpp", Arch::Intel.suffix());
        plan.push(arm_header.as_str(), arm_manifest.render_header());
        plan.push(intel_header.as_str(), intel_manifest.render_header());
        plan.push(format!("{stem}.hpp"), dispatcher(&arm_header, &intel_header, true));
    }
}

fn merge_single_file(plan: &mut OutputPlan, category: SingleFileCategory, arm: &str, intel: &str) {
    let (stem, ext) = (category.stem(), category.extension());
    let base = format!("{stem}.{ext}");

    if arm == intel {
        plan.push(base, arm);
        return;
    }

    debug!(file = %base, "architectures diverge, splitting");
    let arm_file = format!("{stem}{}.{ext}", Arch::Arm.suffix());
    let intel_file = format!("{stem}{}.{ext}", Arch::Intel.suffix());
    plan.push(arm_file.as_str(), arm);
    plan.push(intel_file.as_str(), intel);

    let content = dispatcher(&arm_file, &intel_file, ext == "hpp");
    match category {
        // the split sources changed, so build systems must recompile the entry
        SingleFileCategory::Source => plan.push_touching(base, content),
        SingleFileCategory::Predeclare => plan.push(base, content),
    }
}

/// Shared-path stand-in for a file that only exists split.
fn redirect(category: PerClassCategory, name: &str, has_arm: bool, has_intel: bool) -> String {
    let branch = |present: bool, arch: Arch| {
        if present {
            format!("#include \"../{}/{}\"\n", category.arch_dir(arch), name)
        } else {
            format!("#error \"{}/{} is not generated for this architecture\"\n", category.dir(), name)
        }
    };
    format!(
        "#pragma once\n\n#ifdef {ARM_MARKER}\n{}#else\n{}#endif\n",
        branch(has_arm, Arch::Arm),
        branch(has_intel, Arch::Intel),
    )
}

fn dispatcher(arm_file: &str, intel_file: &str, header: bool) -> String {
    let pragma = if header { "#pragma once\n\n" } else { "" };
    format!(
        "{pragma}#ifdef {ARM_MARKER}\n#include \"{arm_file}\"\n#else\n#include \"{intel_file}\"\n#endif\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn artifacts(modify: &[(&str, &str)], binding: &[(&str, &str)], source: &str) -> EmittedArtifacts {
        EmittedArtifacts {
            modify: modify.iter().copied().collect(),
            binding: binding.iter().copied().collect(),
            predeclare: "class Foo;\n".to_string(),
            source: source.to_string(),
            text: format!("table {source}"),
            json: Value::String(source.to_string()),
        }
    }

    fn paths(plan: &OutputPlan) -> Vec<String> {
        plan.files.iter().map(|f| f.path.to_string_lossy().replace('\\', "/")).collect()
    }

    #[test]
    fn test_identical_passes_share_everything() {
        let arm = artifacts(&[("A.hpp", "a"), ("B.hpp", "b")], &[("A.hpp", "x")], "src");
        let intel = arm.clone();
        let plan = plan_universal(&arm, &intel).unwrap();

        let paths = paths(&plan);
        assert!(paths.iter().all(|p| !p.contains("_arm") && !p.contains("_intel")));
        assert!(plan.contains("modify/A.hpp"));
        assert!(plan.contains("modify/B.hpp"));
        assert!(plan.contains("GeneratedModify.hpp"));
        assert!(!plan.contains("GeneratedModifyArm.hpp"));
        assert!(!plan.contains("GeneratedSourceArm.cpp"));
        assert_eq!(
            plan.get("GeneratedModify.hpp").unwrap().content,
            "#pragma once\n\n#include \"modify/A.hpp\"\n#include \"modify/B.hpp\"\n"
        );
        assert!(plan.files.iter().all(|f| !f.force_touch));
    }

    #[test]
    fn test_diverging_file_is_split_with_redirect() {
        let arm = artifacts(&[("A.hpp", "same"), ("B.hpp", "arm")], &[], "src");
        let intel = artifacts(&[("A.hpp", "same"), ("B.hpp", "intel")], &[], "src");
        let plan = plan_universal(&arm, &intel).unwrap();

        assert_eq!(plan.get("modify/A.hpp").unwrap().content, "same");
        assert_eq!(plan.get("modify_arm/B.hpp").unwrap().content, "arm");
        assert_eq!(plan.get("modify_intel/B.hpp").unwrap().content, "intel");

        let redirect = &plan.get("modify/B.hpp").unwrap().content;
        assert!(redirect.contains("#ifdef GEODE_IS_ARM_MAC"));
        assert!(redirect.contains("#include \"../modify_arm/B.hpp\""));
        assert!(redirect.contains("#include \"../modify_intel/B.hpp\""));

        assert_eq!(
            plan.get("GeneratedModifyArm.hpp").unwrap().content,
            "#pragma once\n\n#include \"modify/A.hpp\"\n#include \"modify_arm/B.hpp\"\n"
        );
        assert_eq!(
            plan.get("GeneratedModifyIntel.hpp").unwrap().content,
            "#pragma once\n\n#include \"modify/A.hpp\"\n#include \"modify_intel/B.hpp\"\n"
        );
        let top = &plan.get("GeneratedModify.hpp").unwrap().content;
        assert!(top.contains("#include \"GeneratedModifyArm.hpp\""));
        assert!(top.contains("#include \"GeneratedModifyIntel.hpp\""));

        // the shared A.hpp is written once
        assert_eq!(paths(&plan).iter().filter(|p| *p == "modify/A.hpp").count(), 1);
    }

    #[test]
    fn test_single_arch_files() {
        let arm = artifacts(&[("ArmOnly.hpp", "a")], &[], "src");
        let intel = artifacts(&[("IntelOnly.hpp", "i")], &[], "src");
        let plan = plan_universal(&arm, &intel).unwrap();

        assert!(plan.contains("modify_arm/ArmOnly.hpp"));
        assert!(!plan.contains("modify_intel/ArmOnly.hpp"));
        assert!(plan.contains("modify_intel/IntelOnly.hpp"));

        let arm_redirect = &plan.get("modify/ArmOnly.hpp").unwrap().content;
        assert!(arm_redirect.contains("../modify_arm/ArmOnly.hpp"));
        assert!(arm_redirect.contains("#error"));

        let intel_redirect = &plan.get("modify/IntelOnly.hpp").unwrap().content;
        assert!(intel_redirect.contains("../modify_intel/IntelOnly.hpp"));
        assert!(!intel_redirect.contains("../modify_arm/"));
    }

    #[test]
    fn test_diverging_source_forces_touch() {
        let arm = artifacts(&[], &[], "arm source");
        let intel = artifacts(&[], &[], "intel source");
        let plan = plan_universal(&arm, &intel).unwrap();

        assert_eq!(plan.get("GeneratedSourceArm.cpp").unwrap().content, "arm source");
        assert_eq!(plan.get("GeneratedSourceIntel.cpp").unwrap().content, "intel source");
        let entry = plan.get("GeneratedSource.cpp").unwrap();
        assert!(entry.force_touch);
        assert!(!entry.content.contains("#pragma once"));
        assert!(entry.content.contains("#include \"GeneratedSourceArm.cpp\""));

        // identical predeclare stays shared
        assert!(plan.contains("GeneratedPredeclare.hpp"));
        assert!(!plan.contains("GeneratedPredeclareArm.hpp"));
    }

    #[test]
    fn test_interfaces_are_never_merged() {
        let arm = artifacts(&[], &[], "same");
        let plan = plan_universal(&arm, &arm.clone()).unwrap();
        assert!(plan.contains("CodegenDataArm.txt"));
        assert!(plan.contains("CodegenDataIntel.txt"));
        assert!(!plan.contains("CodegenData.txt"));

        let json: Value = serde_json::from_str(&plan.get("CodegenData.json").unwrap().content).unwrap();
        assert_eq!(json["arm"], "same");
        assert_eq!(json["intel"], "same");
    }

    #[test]
    fn test_single_target_layout() {
        let out = artifacts(&[("Foo.hpp", "m")], &[("Foo.hpp", "b")], "src");
        let plan = OutputPlan::for_targets(&[(Target::WIN64, out)]).unwrap();
        assert_eq!(
            paths(&plan),
            [
                "modify/Foo.hpp",
                "GeneratedModify.hpp",
                "binding/Foo.hpp",
                "GeneratedBinding.hpp",
                "GeneratedPredeclare.hpp",
                "GeneratedSource.cpp",
                "CodegenData.txt",
                "CodegenData.json",
            ]
        );
    }

    #[test]
    fn test_rejects_unexpected_target_sets() {
        let out = artifacts(&[], &[], "src");
        let err = OutputPlan::for_targets(&[
            (Target::MAC_INTEL, out.clone()),
            (Target::MAC_ARM, out),
        ]);
        assert!(matches!(err, Err(CodegenError::Argument(_))));
    }
}

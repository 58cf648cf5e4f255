//! Emitters - render binding artifacts for one target
//!
//! An [`Emitter`] must be a pure function of its [`EmitContext`]: the Mac
//! build calls it once per architecture over the same model and compares
//! the results, so any state carried between calls would leak one
//! architecture's output into the other.

use semver::Version;
use serde_json::Value;
use tracing::debug;

use crate::artifact::ArtifactMap;
use crate::ids::IdentityMap;
use crate::model::Model;
use crate::target::{Arch, Platform, Target};

mod headers;
mod interface;
mod source;

/// Everything an emitter may depend on.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub model: &'a Model,
    pub ids: &'a IdentityMap,
    pub target: Target,
    pub sdk_version: &'a Version,
}

pub trait Emitter {
    /// One `modify/<Class>.hpp` per class.
    fn modify_headers(&self, cx: &EmitContext<'_>) -> ArtifactMap;
    /// One `binding/<Class>.hpp` per class.
    fn binding_headers(&self, cx: &EmitContext<'_>) -> ArtifactMap;
    fn predeclare_header(&self, cx: &EmitContext<'_>) -> String;
    /// `skip_pugixml` drops the pugixml include from the generated source.
    fn binding_source(&self, cx: &EmitContext<'_>, skip_pugixml: bool) -> String;
    /// Human-readable address table.
    fn text_interface(&self, cx: &EmitContext<'_>) -> String;
    fn json_interface(&self, cx: &EmitContext<'_>) -> Value;
}

/// Outputs of all six emitters for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedArtifacts {
    pub modify: ArtifactMap,
    pub binding: ArtifactMap,
    pub predeclare: String,
    pub source: String,
    pub text: String,
    pub json: Value,
}

/// Runs the six emitters, in their fixed order, for `cx.target`.
pub fn emit_all<E: Emitter + ?Sized>(emitter: &E, cx: &EmitContext<'_>, skip_pugixml: bool) -> EmittedArtifacts {
    debug!(build_target = %cx.target, "running emitters");
    EmittedArtifacts {
        modify: emitter.modify_headers(cx),
        binding: emitter.binding_headers(cx),
        predeclare: emitter.predeclare_header(cx),
        source: emitter.binding_source(cx, skip_pugixml),
        text: emitter.text_interface(cx),
        json: emitter.json_interface(cx),
    }
}

/// The emitter shipped with the generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardEmitter;

impl Emitter for StandardEmitter {
    fn modify_headers(&self, cx: &EmitContext<'_>) -> ArtifactMap {
        cx.model.classes.iter().enumerate()
            .map(|(ci, class)| (header_name(&class.name), headers::modify_header(cx, ci, class)))
            .collect()
    }

    fn binding_headers(&self, cx: &EmitContext<'_>) -> ArtifactMap {
        let local_names = cx.model.class_names();
        cx.model.classes.iter().enumerate()
            .map(|(ci, class)| (header_name(&class.name), headers::binding_header(cx, &local_names, ci, class)))
            .collect()
    }

    fn predeclare_header(&self, cx: &EmitContext<'_>) -> String {
        headers::predeclare_header(cx)
    }

    fn binding_source(&self, cx: &EmitContext<'_>, skip_pugixml: bool) -> String {
        source::binding_source(cx, skip_pugixml)
    }

    fn text_interface(&self, cx: &EmitContext<'_>) -> String {
        interface::text_interface(cx)
    }

    fn json_interface(&self, cx: &EmitContext<'_>) -> Value {
        interface::json_interface(cx)
    }
}

pub fn header_name(class: &str) -> String {
    format!("{}.hpp", class)
}

/// Calling convention name used by the hooking runtime.
fn convention(target: Target, takes_this: bool) -> &'static str {
    match (target.platform(), target.arch()) {
        (Platform::Windows, Arch::X86) if takes_this => "Thiscall",
        (Platform::Windows, Arch::X86) => "Cdecl",
        _ => "Default",
    }
}

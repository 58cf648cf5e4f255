//! Per-class modify/binding headers and the predeclare header

use std::collections::HashSet;

use crate::model::{Class, Member};

use super::{convention, header_name, EmitContext};

pub(super) fn modify_header(cx: &EmitContext<'_>, ci: usize, class: &Class) -> String {
    let name = &class.name;
    let mut out = String::new();
    out.push_str("#pragma once\n");
    out.push_str("#include <Geode/modify/Modify.hpp>\n");
    out.push_str(&format!("#include <Geode/binding/{}>\n\n", header_name(name)));
    out.push_str("namespace geode::modifier {\n");
    out.push_str("    template <class Der>\n");
    out.push_str(&format!(
        "    struct ModifyDerive<Der, {name}> : ModifyBase<ModifyDerive<Der, {name}>> {{\n"
    ));
    out.push_str(&format!("        using ModifyBase<ModifyDerive<Der, {name}>>::ModifyBase;\n"));
    out.push_str(&format!("        using Base = {name};\n"));
    out.push_str("        void apply() override {\n");

    for (mi, function) in class.functions() {
        if function.bindings.for_target(cx.target).is_none() {
            continue;
        }
        let id = cx.ids.member_id(ci, mi).unwrap_or_default();
        out.push_str(&format!(
            "            GEODE_APPLY_MODIFY_FOR_FUNCTION({}, {}, {}, {}, {})\n",
            id,
            convention(cx.target, !function.is_static),
            name,
            function.name,
            function.parameter_types(),
        ));
    }

    out.push_str("        }\n");
    out.push_str("    };\n");
    out.push_str("}\n");
    out
}

/// `local_names` indexes the classes declared in the model.
pub(super) fn binding_header(
    cx: &EmitContext<'_>,
    local_names: &HashSet<&str>,
    ci: usize,
    class: &Class,
) -> String {
    let name = &class.name;
    let mut out = String::new();
    out.push_str("#pragma once\n");
    out.push_str("#include <Geode/platform/platform.hpp>\n");
    out.push_str("#include <Geode/c++stl/gdstdlib.hpp>\n");

    let mut local = vec![];
    let mut external = false;
    for dep in class.superclasses.iter().chain(&class.attributes.depends) {
        if dep == name || local.contains(&dep) {
            continue;
        }
        if local_names.contains(dep.as_str()) {
            local.push(dep);
        } else {
            external = true;
        }
    }
    if external {
        out.push_str("#include <cocos2d.h>\n");
    }
    for dep in local {
        out.push_str(&format!("#include \"{}\"\n", header_name(dep)));
    }
    out.push('\n');

    if class.superclasses.is_empty() {
        out.push_str(&format!("class {name} {{\n"));
    } else {
        let bases: Vec<_> = class.superclasses.iter().map(|s| format!("public {s}")).collect();
        out.push_str(&format!("class {name} : {} {{\n", bases.join(", ")));
    }
    out.push_str("public:\n");
    out.push_str(&format!("    static constexpr auto CLASS_NAME = \"{name}\";\n"));
    if let Some(id) = cx.ids.class_id(ci) {
        out.push_str(&format!("    static constexpr unsigned CLASS_ID = {id};\n"));
    }

    for member in &class.members {
        match member {
            Member::Function(f) => {
                out.push_str("    ");
                if f.bindings.for_target(cx.target).is_none() {
                    out.push_str("[[deprecated(\"Function is not bound on this platform\")]]\n    ");
                }
                if f.is_static {
                    out.push_str("static ");
                }
                if f.is_virtual {
                    out.push_str("virtual ");
                }
                out.push_str(&format!("{} {}({});\n", f.return_type, f.name, f.parameter_list()));
            }
            Member::Field { name, ty } => {
                out.push_str(&format!("    {ty} {name};\n"));
            }
            Member::Pad { bytes } => {
                if let Some(n) = bytes.for_target(cx.target) {
                    out.push_str(&format!("    GEODE_PAD({n});\n"));
                }
            }
        }
    }

    out.push_str("};\n");
    out
}

pub(super) fn predeclare_header(cx: &EmitContext<'_>) -> String {
    let mut out = String::from("#pragma once\n\n");
    for class in &cx.model.classes {
        out.push_str(&format!("class {};\n", class.name));
    }
    if !cx.model.functions.is_empty() {
        out.push('\n');
        for f in &cx.model.functions {
            out.push_str(&format!("{} {}({});\n", f.return_type, f.name, f.parameter_list()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdentityMap;
    use crate::model::{Address, Attributes, Function, Model, PerPlatform};
    use crate::target::Target;
    use semver::Version;

    fn model() -> Model {
        let hooked = Function {
            name: "update".into(),
            return_type: "void".into(),
            args: vec![],
            is_static: false,
            is_virtual: true,
            bindings: PerPlatform { win: Some(Address(0x10)), ..Default::default() },
        };
        Model {
            classes: vec![
                Class {
                    name: "PlayLayer".into(),
                    superclasses: vec!["GJBaseGameLayer".into()],
                    attributes: Attributes {
                        depends: vec!["GJBaseGameLayer".into(), "cocos2d::CCArray".into()],
                        links: vec![],
                    },
                    members: vec![
                        Member::Function(hooked),
                        Member::Pad { bytes: PerPlatform { win: Some(16), ..Default::default() } },
                    ],
                },
                Class {
                    name: "GJBaseGameLayer".into(),
                    superclasses: vec![],
                    attributes: Attributes::default(),
                    members: vec![],
                },
            ],
            functions: vec![],
        }
    }

    #[test]
    fn test_binding_header_includes_local_dependencies_once() {
        let m = model();
        let ids = IdentityMap::populate(&m);
        let version = Version::new(1, 0, 0);
        let cx = EmitContext { model: &m, ids: &ids, target: Target::WIN64, sdk_version: &version };
        let text = binding_header(&cx, &m.class_names(), 0, &m.classes[0]);

        assert_eq!(text.matches("#include \"GJBaseGameLayer.hpp\"").count(), 1);
        assert!(text.contains("#include <cocos2d.h>"));
        assert!(text.contains("class PlayLayer : public GJBaseGameLayer {"));
        assert!(text.contains("virtual void update();"));
        assert!(text.contains("GEODE_PAD(16);"));
    }

    #[test]
    fn test_pads_and_bindings_follow_target() {
        let m = model();
        let ids = IdentityMap::populate(&m);
        let version = Version::new(1, 0, 0);
        let cx = EmitContext { model: &m, ids: &ids, target: Target::ANDROID64, sdk_version: &version };

        let text = binding_header(&cx, &m.class_names(), 0, &m.classes[0]);
        assert!(!text.contains("GEODE_PAD"));
        assert!(text.contains("[[deprecated"));

        let modify = modify_header(&cx, 0, &m.classes[0]);
        assert!(!modify.contains("GEODE_APPLY_MODIFY_FOR_FUNCTION"));
    }

    #[test]
    fn test_predeclare_lists_classes_in_order() {
        let m = model();
        let ids = IdentityMap::populate(&m);
        let version = Version::new(1, 0, 0);
        let cx = EmitContext { model: &m, ids: &ids, target: Target::WIN64, sdk_version: &version };
        assert_eq!(
            predeclare_header(&cx),
            "#pragma once\n\nclass PlayLayer;\nclass GJBaseGameLayer;\n"
        );
    }
}

//! Address tables, as text and as a JSON document

use serde_json::{json, Value};

use crate::model::{Address, Function};

use super::EmitContext;

fn address_text(address: Option<Address>) -> String {
    match address {
        Some(a) => a.to_string(),
        None => "<unbound>".to_string(),
    }
}

fn signature(f: &Function) -> String {
    format!("{} {}({})", f.return_type, f.name, f.parameter_list())
}

pub(super) fn text_interface(cx: &EmitContext<'_>) -> String {
    let mut out = format!("// {} bindings, SDK {}\n", cx.target, cx.sdk_version);

    for (ci, class) in cx.model.classes.iter().enumerate() {
        let id = cx.ids.class_id(ci).unwrap_or_default();
        out.push_str(&format!("{} [{}]\n", class.name, id));
        for (mi, f) in class.functions() {
            out.push_str(&format!(
                "\t{} [{}] = {}\n",
                signature(f),
                cx.ids.member_id(ci, mi).unwrap_or_default(),
                address_text(f.bindings.for_target(cx.target)),
            ));
        }
    }

    for (fi, f) in cx.model.functions.iter().enumerate() {
        out.push_str(&format!(
            "{} [{}] = {}\n",
            signature(f),
            cx.ids.function_id(fi).unwrap_or_default(),
            address_text(f.bindings.for_target(cx.target)),
        ));
    }
    out
}

fn function_json(f: &Function, id: Option<usize>, address: Option<Address>) -> Value {
    json!({
        "name": f.name,
        "id": id,
        "signature": signature(f),
        "static": f.is_static,
        "virtual": f.is_virtual,
        "address": address,
    })
}

pub(super) fn json_interface(cx: &EmitContext<'_>) -> Value {
    let classes: Vec<Value> = cx.model.classes.iter().enumerate()
        .map(|(ci, class)| {
            let functions: Vec<Value> = class.functions()
                .map(|(mi, f)| function_json(f, cx.ids.member_id(ci, mi), f.bindings.for_target(cx.target)))
                .collect();
            json!({
                "name": class.name,
                "id": cx.ids.class_id(ci),
                "superclasses": class.superclasses,
                "depends": class.attributes.depends,
                "links": class.attributes.links,
                "functions": functions,
            })
        })
        .collect();

    let functions: Vec<Value> = cx.model.functions.iter().enumerate()
        .map(|(fi, f)| function_json(f, cx.ids.function_id(fi), f.bindings.for_target(cx.target)))
        .collect();

    json!({
        "sdk_version": cx.sdk_version.to_string(),
        "platform": cx.target.platform(),
        "arch": cx.target.arch(),
        "classes": classes,
        "functions": functions,
    })
}

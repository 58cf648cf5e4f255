//! Binding source: one address thunk per bound function

use crate::model::{Address, Function};

use super::{convention, EmitContext};

pub(super) fn binding_source(cx: &EmitContext<'_>, skip_pugixml: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("// Generated by geode-codegen, SDK {}\n", cx.sdk_version));
    out.push_str("#include <Geode/Bindings.hpp>\n");
    out.push_str("#include <Geode/modify/Addresses.hpp>\n");
    out.push_str("#include <Geode/loader/Tulip.hpp>\n");
    if !skip_pugixml {
        out.push_str("#include <pugixml.hpp>\n");
    }
    out.push_str("\nusing namespace geode;\nusing namespace geode::modifier;\n");

    for class in &cx.model.classes {
        let bound: Vec<_> = class.functions()
            .filter_map(|(_, f)| f.bindings.for_target(cx.target).map(|a| (f, a)))
            .collect();
        if bound.is_empty() {
            continue;
        }
        out.push_str(&format!("\n// {}\n", class.name));
        for (function, address) in bound {
            out.push_str(&thunk(cx, Some(&class.name), function, address));
        }
    }

    for function in &cx.model.functions {
        if let Some(address) = function.bindings.for_target(cx.target) {
            out.push('\n');
            out.push_str(&thunk(cx, None, function, address));
        }
    }
    out
}

/// Body that forwards a call to the game's implementation at `address`.
fn thunk(cx: &EmitContext<'_>, class: Option<&str>, function: &Function, address: Address) -> String {
    let takes_this = class.is_some() && !function.is_static;
    let qualified = match class {
        Some(c) => format!("{}::{}", c, function.name),
        None => function.name.clone(),
    };

    let mut param_types = vec![];
    let mut call_args = vec![];
    if let (true, Some(c)) = (takes_this, class) {
        param_types.push(format!("{}*", c));
        call_args.push("this".to_string());
    }
    for arg in &function.args {
        param_types.push(arg.ty.clone());
        call_args.push(arg.name.clone());
    }

    format!(
        "auto {qualified}({params}) -> {ret} {{\n\
         \x20   using FunctionType = {ret}(*)({types});\n\
         \x20   static auto func = wrapFunction(base::get() + {address}, {conv});\n\
         \x20   return reinterpret_cast<FunctionType>(func)({args});\n\
         }}\n",
        params = function.parameter_list(),
        ret = function.return_type,
        types = param_types.join(", "),
        conv = convention(cx.target, takes_this),
        args = call_args.join(", "),
    )
}

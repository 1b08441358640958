use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod action_meta;
use action_meta::{parse_action_info, parse_params, parse_slots, SlotField};

/// Derives `metadata()` for an action and submits it to the action catalogue.
///
/// The struct must implement `Default` and `crate::engine::Action`.
#[proc_macro_derive(ActionMeta, attributes(action_meta, param, input, output))]
pub fn derive_action_meta(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let action_info = match parse_action_info(&input) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let (inputs, outputs) = match parse_slots(&input) {
        Ok(slots) => slots,
        Err(e) => return e.write_errors().into(),
    };

    let params = parse_params(&input);

    let struct_name = &input.ident;
    let action_id = action_id(&struct_name.to_string());
    let action_name = &action_info.name;
    let category = &action_info.category;

    let params = params.iter().filter_map(|f| {
        let field_name = f.ident.as_ref()?.to_string();
        let default_val = f.default.as_ref()?.as_str();
        let type_name = extract_type_name(&f.ty);
        let min = option_tokens(f.min);
        let max = option_tokens(f.max);

        Some(quote! {
            crate::registry::ParameterSchema {
                name: #field_name.to_string(),
                param_type: #type_name.to_string(),
                default: serde_json::from_str(#default_val).unwrap_or(serde_json::Value::Null),
                min: #min,
                max: #max,
            }
        })
    });

    let input_metas = match slot_tokens(&inputs) {
        Ok(tokens) => tokens,
        Err(e) => return e.to_compile_error().into(),
    };
    let output_metas = match slot_tokens(&outputs) {
        Ok(tokens) => tokens,
        Err(e) => return e.to_compile_error().into(),
    };

    let mod_name = syn::Ident::new(
        &format!("__action_registration_{}", action_id),
        struct_name.span(),
    );

    let factory_fn_name = syn::Ident::new(
        &format!("create_metadata_{}", action_id),
        struct_name.span(),
    );

    let expanded = quote! {
        impl #struct_name {
            /// Catalogue entry describing this action's slots and parameters
            pub fn metadata() -> crate::registry::ActionMetadata {
                crate::registry::ActionMetadata {
                    id: #action_id.to_string(),
                    name: #action_name.to_string(),
                    category: #category.to_string(),
                    inputs: vec![#(#input_metas),*],
                    outputs: vec![#(#output_metas),*],
                    parameters: vec![#(#params),*],
                    factory: || -> Box<dyn crate::engine::Action> { Box::new(#struct_name::default()) },
                }
            }
        }

        mod #mod_name {
            use super::*;

            fn #factory_fn_name() -> crate::registry::ActionMetadata {
                #struct_name::metadata()
            }

            ::inventory::submit! {
                crate::registry::ActionMetadataFactoryWrapper(#factory_fn_name)
            }
        }
    };

    TokenStream::from(expanded)
}

fn slot_tokens(slots: &[SlotField]) -> syn::Result<Vec<proc_macro2::TokenStream>> {
    slots
        .iter()
        .map(|slot| {
            let name = slot.slot_name();
            let kind = match slot.kind.as_str() {
                "vec2" => quote!(crate::engine::SlotKind::Vec2),
                "int" => quote!(crate::engine::SlotKind::Int),
                "float" => quote!(crate::engine::SlotKind::Float),
                "text" => quote!(crate::engine::SlotKind::Text),
                "bool" => quote!(crate::engine::SlotKind::Bool),
                other => {
                    return Err(syn::Error::new(
                        proc_macro2::Span::call_site(),
                        format!("unknown slot kind `{}` for slot `{}`", other, name),
                    ))
                }
            };
            Ok(quote! {
                crate::registry::SlotMetadata {
                    name: #name.to_string(),
                    kind: #kind,
                }
            })
        })
        .collect()
}

/// `LeftClickAction` -> `left_click`
fn action_id(struct_name: &str) -> String {
    let base = struct_name.strip_suffix("Action").filter(|b| !b.is_empty()).unwrap_or(struct_name);
    let mut id = String::new();
    for (i, ch) in base.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                id.push('_');
            }
            id.extend(ch.to_lowercase());
        } else {
            id.push(ch);
        }
    }
    id
}

fn option_tokens(value: Option<f64>) -> proc_macro2::TokenStream {
    match value {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    }
}

fn extract_type_name(ty: &syn::Type) -> &'static str {
    let type_str = quote!(#ty).to_string();

    if type_str.contains("f64") || type_str.contains("f32") {
        "number"
    } else if type_str.contains("u32") || type_str.contains("i32")
        || type_str.contains("u64") || type_str.contains("i64")
        || type_str.contains("usize") || type_str.contains("isize") {
        "number"
    } else if type_str.contains("String") || type_str.contains("str") {
        "string"
    } else if type_str.contains("bool") {
        "boolean"
    } else {
        "unknown"
    }
}

use darling::{FromAttributes, FromField};
use syn::{DeriveInput, Fields};

/// Parsed attributes from #[action_meta(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(action_meta))]
pub struct ActionMetaArgs {
    pub name: String,
    pub category: String,
}

/// Parsed attributes from #[param(...)]
#[derive(Debug, FromField)]
#[darling(attributes(param))]
pub struct ParamField {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    #[darling(default)]
    pub default: Option<String>,

    #[darling(default)]
    pub min: Option<f64>,

    #[darling(default)]
    pub max: Option<f64>,
}

/// Parsed slot declaration from #[input(...)] or #[output(...)]
#[derive(Debug, FromField)]
#[darling(attributes(input, output))]
pub struct SlotField {
    pub ident: Option<syn::Ident>,

    #[darling(default)]
    pub name: Option<String>,

    pub kind: String,
}

impl SlotField {
    /// Slot name, falling back to the field name without its leading underscore
    pub fn slot_name(&self) -> String {
        match (&self.name, &self.ident) {
            (Some(name), _) => name.clone(),
            (None, Some(ident)) => ident.to_string().trim_start_matches('_').to_string(),
            (None, None) => String::new(),
        }
    }
}

pub fn parse_action_info(input: &DeriveInput) -> darling::Result<ActionMetaArgs> {
    ActionMetaArgs::from_attributes(&input.attrs)
}

fn named_fields(input: &DeriveInput) -> Option<&syn::punctuated::Punctuated<syn::Field, syn::token::Comma>> {
    match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            _ => None,
        },
        _ => None,
    }
}

pub fn parse_params(input: &DeriveInput) -> Vec<ParamField> {
    let Some(fields) = named_fields(input) else {
        return Vec::new();
    };

    fields
        .iter()
        .filter(|f| f.attrs.iter().any(|attr| attr.path().is_ident("param")))
        .filter_map(|f| ParamField::from_field(f).ok())
        .collect()
}

pub fn parse_slots(input: &DeriveInput) -> darling::Result<(Vec<SlotField>, Vec<SlotField>)> {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    let Some(fields) = named_fields(input) else {
        return Ok((inputs, outputs));
    };

    for field in fields.iter() {
        if field.attrs.iter().any(|attr| attr.path().is_ident("input")) {
            inputs.push(SlotField::from_field(field)?);
        }
        if field.attrs.iter().any(|attr| attr.path().is_ident("output")) {
            outputs.push(SlotField::from_field(field)?);
        }
    }

    Ok((inputs, outputs))
}

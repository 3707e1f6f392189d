// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

use syn::{Attribute, Fields, LitStr, Result, Variant};

/// Parsed `#[fsm(...)]` options for one state variant.
#[derive(Default)]
pub struct StateVariantAttrs {
    pub tags: Vec<LitStr>,
    pub nested: bool,
}

impl StateVariantAttrs {
    pub fn from_variant(variant: &Variant) -> Result<Self> {
        let mut parsed = StateVariantAttrs::default();
        for attr in variant.attrs.iter().filter(|a| is_fsm_attr(a)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("nested") {
                    parsed.nested = true;
                    Ok(())
                } else if meta.path.is_ident("tag") {
                    let tag: LitStr = meta.value()?.parse()?;
                    parsed.tags.push(tag);
                    Ok(())
                } else {
                    Err(meta.error("expected `nested` or `tag = \"...\"`"))
                }
            })?;
        }

        if parsed.nested {
            match &variant.fields {
                Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {}
                _ => {
                    return Err(syn::Error::new_spanned(
                        &variant.ident,
                        "#[fsm(nested)] requires a tuple variant with exactly one field",
                    ))
                }
            }
        }

        Ok(parsed)
    }
}

fn is_fsm_attr(attr: &Attribute) -> bool {
    attr.path().is_ident("fsm")
}

/// Whether a variant carries a named `invocation` field.
pub fn has_invocation_field(variant: &Variant) -> bool {
    match &variant.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .any(|f| f.ident.as_ref().is_some_and(|i| i == "invocation")),
        _ => false,
    }
}

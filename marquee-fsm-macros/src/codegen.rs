// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DataEnum, DeriveInput, Fields, Result, Variant};

use crate::attrs::{has_invocation_field, StateVariantAttrs};

fn enum_data<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a DataEnum> {
    match &input.data {
        Data::Enum(e) => Ok(e),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be derived for enums"),
        )),
    }
}

/// Pattern matching a variant while ignoring its payload.
fn wildcard_pattern(variant: &Variant) -> TokenStream {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Unit => quote! { Self::#ident },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Named(_) => quote! { Self::#ident { .. } },
    }
}

pub fn expand_state_variant(input: &DeriveInput) -> Result<TokenStream> {
    let data_enum = enum_data(input, "StateVariant")?;
    let enum_ident = &input.ident;

    let mut name_arms = Vec::new();
    let mut path_arms = Vec::new();
    let mut tag_arms = Vec::new();

    for variant in &data_enum.variants {
        let ident = &variant.ident;
        let attrs = StateVariantAttrs::from_variant(variant)?;
        let tags = &attrs.tags;
        let pattern = wildcard_pattern(variant);

        name_arms.push(quote! { #pattern => stringify!(#ident), });

        if attrs.nested {
            path_arms.push(quote! {
                Self::#ident(inner) => ::std::format!(
                    "{}.{}",
                    stringify!(#ident),
                    ::marquee_fsm::StateVariant::state_path(inner),
                ),
            });
            tag_arms.push(quote! {
                Self::#ident(inner) => {
                    const TAGS: &[&str] = &[#(#tags),*];
                    TAGS.contains(&tag) || ::marquee_fsm::StateVariant::has_tag(inner, tag)
                }
            });
        } else {
            path_arms.push(quote! { #pattern => ::std::string::String::from(stringify!(#ident)), });
            tag_arms.push(quote! {
                #pattern => {
                    const TAGS: &[&str] = &[#(#tags),*];
                    TAGS.contains(&tag)
                }
            });
        }
    }

    Ok(quote! {
        impl ::marquee_fsm::StateVariant for #enum_ident {
            fn variant_name(&self) -> &str {
                match self {
                    #( #name_arms )*
                }
            }

            fn state_path(&self) -> ::std::string::String {
                match self {
                    #( #path_arms )*
                }
            }

            fn has_tag(&self, tag: &str) -> bool {
                match self {
                    #( #tag_arms )*
                }
            }
        }
    })
}

pub fn expand_event_variant(input: &DeriveInput) -> Result<TokenStream> {
    let data_enum = enum_data(input, "EventVariant")?;
    let enum_ident = &input.ident;

    let name_arms = data_enum.variants.iter().map(|variant| {
        let ident = &variant.ident;
        let pattern = wildcard_pattern(variant);
        quote! { #pattern => stringify!(#ident), }
    });

    let invocation_arms = data_enum.variants.iter().map(|variant| {
        let ident = &variant.ident;
        if has_invocation_field(variant) {
            quote! { Self::#ident { invocation, .. } => ::std::option::Option::Some(invocation), }
        } else {
            let pattern = wildcard_pattern(variant);
            quote! { #pattern => ::std::option::Option::None, }
        }
    });

    Ok(quote! {
        impl ::marquee_fsm::EventVariant for #enum_ident {
            fn variant_name(&self) -> &str {
                match self {
                    #( #name_arms )*
                }
            }

            fn invocation(&self) -> ::std::option::Option<&::marquee_fsm::Invocation> {
                match self {
                    #( #invocation_arms )*
                }
            }
        }
    })
}

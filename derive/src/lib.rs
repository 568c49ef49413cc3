use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Ident};

/// Converts a struct into a `serde_json::Map` keyed by field name.
#[proc_macro_derive(IntoJsonMap)]
pub fn derive_into_json_map(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;
    let fields = get_struct_idents(&input.data);
    let v: Vec<_> = fields
        .into_iter()
        .map(|x| {
            quote! {
                mp.insert(stringify!(#x).to_string(), serde_json::json!(x.#x));
            }
        })
        .collect();
    let expanded = quote! {
        impl std::convert::From<#struct_name> for serde_json::Map<String, serde_json::Value> {
            fn from(x: #struct_name) -> Self {
                let mut mp = serde_json::Map::new();
                #(#v;)*
                mp
            }
        }
    };
    expanded.into()
}

#[proc_macro_derive(GetFieldNames)]
pub fn derive_struct_field_names(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;
    let v = get_struct_idents(&input.data);
    let expanded = quote! {
        impl crate::model::traits::StructFieldNames for #struct_name {
            fn field_names() -> &'static [&'static str] {
                &[#(stringify!(#v),)*]
            }
        }
    };
    expanded.into()
}

fn get_struct_idents(data: &Data) -> Vec<&Ident> {
    match data {
        Data::Struct(DataStruct { ref fields, .. }) => match fields {
            Fields::Named(ref named_fields) => named_fields
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .collect(),
            _ => panic!("Must Named Fields"),
        },
        _ => panic!("json map derives are only for structs"),
    }
}

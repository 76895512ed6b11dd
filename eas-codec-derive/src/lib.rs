//! `#[derive(Abi)]` for attestation records.
//!
//! A record maps onto an ABI tuple: fields in declaration order, each named
//! after its `#[abi = "name[,options]"]` annotation or, failing that, its
//! identifier. The derive emits `AbiType`, `Encode` and, for records without
//! borrowed fields, `Decode`.
//!
//! Generated code names the runtime crate as `::eas_codec`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, parse_quote, Data, DeriveInput, Error, Expr, ExprLit, Field, Fields,
    GenericParam, Generics, Ident, Lit, LitStr, Meta, Type,
};

/// Derive the ABI tuple mapping of a struct with named fields.
///
/// ```ignore
/// #[derive(Abi)]
/// struct Record {
///     #[abi = "Key"]
///     key: Uid,
///     #[abi = "val"]
///     value: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Abi, attributes(abi))]
pub fn derive_abi(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

struct RecordField {
    ident: Ident,
    ty: Type,
    annotation: Option<LitStr>,
}

impl RecordField {
    fn parse(field: &Field) -> Result<Self, Error> {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "#[derive(Abi)] needs named fields"))?;

        let mut annotation = None;
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("abi")) {
            if annotation.is_some() {
                return Err(Error::new_spanned(attr, "duplicate #[abi] attribute"));
            }
            annotation = Some(match &attr.meta {
                Meta::NameValue(meta) => match &meta.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(name),
                        ..
                    }) => name.clone(),
                    other => {
                        return Err(Error::new_spanned(other, "expected a string literal"));
                    }
                },
                other => {
                    return Err(Error::new_spanned(other, r#"expected #[abi = "name"]"#));
                }
            });
        }

        Ok(Self {
            ident,
            ty: field.ty.clone(),
            annotation,
        })
    }

    /// Expression evaluating to the field's tuple name at runtime.
    fn name_expr(&self) -> TokenStream2 {
        let ident = self.ident.unraw().to_string();
        match &self.annotation {
            Some(text) => quote!(::eas_codec::field_name(::core::option::Option::Some(#text), #ident)),
            None => quote!(::eas_codec::field_name(::core::option::Option::None, #ident)),
        }
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream2, Error> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(RecordField::parse)
                .collect::<Result<Vec<_>, _>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(unnamed) => {
                return Err(Error::new_spanned(
                    unnamed,
                    "#[derive(Abi)] does not support tuple structs",
                ));
            }
        },
        Data::Enum(data) => {
            return Err(Error::new_spanned(
                data.enum_token,
                "#[derive(Abi)] only supports structs",
            ));
        }
        Data::Union(data) => {
            return Err(Error::new_spanned(
                data.union_token,
                "#[derive(Abi)] only supports structs",
            ));
        }
    };

    // A record with no fields would resolve to `()`, which encodes to nothing.
    if fields.is_empty() {
        return Err(Error::new_spanned(
            &input.ident,
            "#[derive(Abi)] needs at least one field",
        ));
    }

    let record = &input.ident;
    let names: Vec<TokenStream2> = fields.iter().map(RecordField::name_expr).collect();
    let idents: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
    let types: Vec<&Type> = fields.iter().map(|field| &field.ty).collect();

    let abi_generics = bounded(&input.generics, quote!(::eas_codec::AbiType));
    let (impl_generics, ty_generics, where_clause) = abi_generics.split_for_impl();
    let abi_type = quote! {
        impl #impl_generics ::eas_codec::AbiType for #record #ty_generics #where_clause {
            fn abi_type() -> ::eas_codec::TypeDescriptor {
                ::eas_codec::TypeDescriptor::Tuple(::std::vec![
                    #(::eas_codec::NamedType::new(#names, <#types as ::eas_codec::AbiType>::abi_type()),)*
                ])
            }
        }
    };

    let encode_generics = bounded(&input.generics, quote!(::eas_codec::Encode));
    let (impl_generics, ty_generics, where_clause) = encode_generics.split_for_impl();
    let encode = quote! {
        impl #impl_generics ::eas_codec::Encode for #record #ty_generics #where_clause {
            fn encode_value(&self) -> ::eas_codec::Result<::eas_codec::Value> {
                ::core::result::Result::Ok(::eas_codec::Value::Tuple(::std::vec![
                    #({
                        let name = #names;
                        let value = ::eas_codec::Encode::encode_value(&self.#idents)
                            .map_err(|err| err.at_field(&name))?;
                        ::eas_codec::NamedValue::new(name, value)
                    },)*
                ]))
            }
        }
    };

    // Borrowed records can be packed but never written into.
    let decode = if input.generics.lifetimes().next().is_some() {
        quote!()
    } else {
        let decode_generics = bounded(&input.generics, quote!(::eas_codec::Decode));
        let (impl_generics, ty_generics, where_clause) = decode_generics.split_for_impl();
        quote! {
            impl #impl_generics ::eas_codec::Decode for #record #ty_generics #where_clause {
                fn decode_value(value: ::eas_codec::Value) -> ::eas_codec::Result<Self> {
                    #[allow(unused_mut, unused_variables)]
                    let mut fields = value.into_fields()?;
                    ::core::result::Result::Ok(Self {
                        #(#idents: fields.take::<#types>(&#names)?,)*
                    })
                }
            }
        }
    };

    Ok(quote! {
        #abi_type
        #encode
        #decode
    })
}

/// Copy of `generics` with `bound` added to every type parameter.
fn bounded(generics: &Generics, bound: TokenStream2) -> Generics {
    let mut generics = generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(param) = param {
            param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

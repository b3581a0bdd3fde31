use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_quote, Attribute, Data, DataEnum, DataStruct, DeriveInput, Fields, Generics, Ident,
    Index, Type,
};

fn get_repr<'a>(mut attrs: impl Iterator<Item = &'a Attribute>) -> Type {
    attrs
        .find(|&attr| attr.path().is_ident("repr"))
        .expect("Enum must have #[repr(...)] attribute.")
        .parse_args()
        .expect("#[repr(...) can only have one type.")
}

/// Explicit discriminants are used as-is, implicit ones
/// count up from the last explicit discriminant.
fn build_tags(e: &DataEnum) -> Vec<TokenStream2> {
    let mut offset = 0;
    let mut anchor = quote! { 0 };

    e.variants
        .iter()
        .map(|variant| {
            if let Some((_, tag)) = &variant.discriminant {
                anchor = quote! { (#tag) };
                offset = 1;

                anchor.clone()
            } else {
                let rendered = Index::from(offset);
                offset += 1;

                quote! { #anchor + #rendered }
            }
        })
        .collect()
}

/// The implementer generics plus the encoding parameter `__E`,
/// bounding every serialized type by `SerializeIter<__E>`.
fn with_encoding<'a>(generics: &Generics, types: impl IntoIterator<Item = &'a Type>) -> Generics {
    let mut generics = generics.clone();

    generics
        .params
        .push(parse_quote! { __E: cookie_cutter::encoding::Encoding });

    let where_clause = generics.make_where_clause();

    for ty in types {
        where_clause
            .predicates
            .push(parse_quote! { #ty: cookie_cutter::SerializeIter<__E> });
    }

    generics
}

fn implement(
    ident: &Ident,
    generics: &Generics,
    encoded: &Generics,
    ser_body: TokenStream2,
    deser_body: TokenStream2,
) -> TokenStream2 {
    let (_, ty_generics, _) = generics.split_for_impl();
    let (impl_generics, _, where_clause) = encoded.split_for_impl();

    quote! {
        impl #impl_generics cookie_cutter::SerializeIter<__E> for #ident #ty_generics #where_clause {
            fn serialize_iter<'__a>(
                &self,
                dst: impl IntoIterator<Item = &'__a mut <__E as cookie_cutter::encoding::Encoding>::Word>,
            ) -> Result<(), cookie_cutter::error::EndOfInput>
            where
                <__E as cookie_cutter::encoding::Encoding>::Word: '__a,
            {
                #ser_body
            }

            fn deserialize_iter<'__a>(
                src: impl IntoIterator<Item = &'__a <__E as cookie_cutter::encoding::Encoding>::Word>,
            ) -> Result<Self, cookie_cutter::error::Error>
            where
                <__E as cookie_cutter::encoding::Encoding>::Word: '__a,
            {
                #deser_body
            }
        }
    }
}

fn serialize_struct(s: &DataStruct, ident: &Ident, generics: &Generics) -> TokenStream2 {
    let types: Vec<_> = s.fields.iter().map(|field| &field.ty).collect();
    let encoded = with_encoding(generics, types.iter().copied());

    let members: Vec<TokenStream2> = s
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| match &field.ident {
            Some(ident) => quote! { #ident },
            None => {
                let index = Index::from(i);
                quote! { #index }
            }
        })
        .collect();

    let ser_body = quote! {
        let mut dst = dst.into_iter();

        #(
            <#types as cookie_cutter::SerializeIter<__E>>::serialize_iter(&self.#members, &mut dst)?;
        )*

        Ok(())
    };

    let deser_body = match &s.fields {
        Fields::Unit => quote! { Ok(Self) },
        Fields::Unnamed(_) | Fields::Named(_) => quote! {
            let mut src = src.into_iter();

            Ok(Self {
                #(
                    #members: <#types as cookie_cutter::SerializeIter<__E>>::deserialize_iter(&mut src)?,
                )*
            })
        },
    };

    implement(ident, generics, &encoded, ser_body, deser_body)
}

fn serialize_enum(e: &DataEnum, ident: &Ident, generics: &Generics, repr: Type) -> TokenStream2 {
    assert!(!e.variants.is_empty(), "Enum must have at least one variant.");

    for variant in &e.variants {
        if !matches!(variant.fields, Fields::Unit) {
            panic!("Only fieldless enums can be serialized.");
        }
    }

    let encoded = with_encoding(generics, [&repr]);

    let tags = build_tags(e);
    let variants: Vec<_> = e.variants.iter().map(|variant| &variant.ident).collect();
    let tag_consts: Vec<_> = variants
        .iter()
        .map(|ident| {
            format_ident!(
                "{}_TAG",
                inflector::cases::screamingsnakecase::to_screaming_snake_case(&ident.to_string())
            )
        })
        .collect();

    let consts = quote! {
        #(
            const #tag_consts: #repr = #tags;
        )*
    };

    let ser_body = quote! {
        #consts

        let tag = match self {
            #(
                Self::#variants => #tag_consts,
            )*
        };

        <#repr as cookie_cutter::SerializeIter<__E>>::serialize_iter(&tag, dst)
    };

    let deser_body = quote! {
        #consts

        match <#repr as cookie_cutter::SerializeIter<__E>>::deserialize_iter(src)? {
            #(
                #tag_consts => Ok(Self::#variants),
            )*
            _ => Err(cookie_cutter::error::Error::Invalid),
        }
    };

    implement(ident, generics, &encoded, ser_body, deser_body)
}

pub fn serialize_iter(item: TokenStream) -> TokenStream {
    let item: DeriveInput = syn::parse2(item.into()).expect("Derive input must be an item.");

    match &item.data {
        Data::Struct(s) => serialize_struct(s, &item.ident, &item.generics),
        Data::Enum(e) => serialize_enum(e, &item.ident, &item.generics, get_repr(item.attrs.iter())),
        Data::Union(_) => panic!("Serialization is only implemented for structs and enums."),
    }
    .into()
}

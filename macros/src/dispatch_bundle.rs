use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_quote, punctuated::Punctuated, token::Paren, Field, FieldMutability, Fields,
    FieldsUnnamed, Ident, ItemEnum, Path, Type, Visibility,
};

pub fn bundle(attr: TokenStream, item: TokenStream) -> TokenStream {
    // capture trait path and enum body
    let tr: Path = syn::parse2(TokenStream2::from(attr))
        .expect("A common trait must be specified: \"#[bundle(Trait)]\"");

    let mut e: ItemEnum =
        syn::parse2(TokenStream2::from(item)).expect("Bundle must be an enum.");

    assert!(
        !e.variants.is_empty(),
        "Bundle must contain at least one variant."
    );

    // unit variants hold the type of the same name
    for variant in e.variants.iter_mut() {
        if matches!(variant.fields, Fields::Unit) {
            let ident = variant.ident.clone();

            let mut unnamed = Punctuated::new();
            unnamed.push(Field {
                attrs: Vec::new(),
                vis: Visibility::Inherited,
                mutability: FieldMutability::None,
                ident: None,
                colon_token: None,
                ty: Type::Verbatim(quote! { #ident }),
            });

            variant.fields = Fields::Unnamed(FieldsUnnamed {
                paren_token: Paren::default(),
                unnamed,
            });
        }

        match &variant.fields {
            Fields::Named(_) => panic!("Bundles cannot contain struct variants."),
            fields if fields.len() != 1 => panic!("Bundle variants must hold exactly one type."),
            _ => {}
        }
    }

    let ident = &e.ident;
    let (impl_generics, ty_generics, where_clause) = e.generics.split_for_impl();

    let variant_idents: Vec<&Ident> = e.variants.iter().map(|v| &v.ident).collect();
    let variant_tys: Vec<&Type> = e
        .variants
        .iter()
        .filter_map(|v| match &v.fields {
            Fields::Unnamed(fields) => fields.unnamed.first().map(|field| &field.ty),
            _ => None,
        })
        .collect();

    // trait objects handed out are `'static`
    let mut bounded = e.generics.clone();
    let predicates = &mut bounded.make_where_clause().predicates;
    for ty in &variant_tys {
        predicates.push(parse_quote! { #ty: 'static });
    }
    let (_, _, bounded_where_clause) = bounded.split_for_impl();

    quote! {
        #e

        #(
            impl #impl_generics From<#variant_tys> for #ident #ty_generics #where_clause {
                #[inline]
                fn from(value: #variant_tys) -> Self {
                    Self::#variant_idents(value)
                }
            }
        )*

        impl #impl_generics dispatch_bundle::Bundle<dyn #tr> for #ident #ty_generics #bounded_where_clause {
            #[inline]
            fn inner(&mut self) -> &mut (dyn #tr + 'static) {
                match self {
                    #(
                        Self::#variant_idents(held) => held,
                    )*
                }
            }

            #[inline]
            fn inner_ref(&self) -> &(dyn #tr + 'static) {
                match self {
                    #(
                        Self::#variant_idents(held) => held,
                    )*
                }
            }
        }
    }
    .into()
}

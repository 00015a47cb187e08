use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Index, LitStr, Member, parse_macro_input};

enum Designation {
    Member { name: String },
    Base,
}

pub fn derive_equality_definition(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "EqualityDefinition can only be derived for structs",
            ));
        }
    };

    let custom = container_is_custom(&input.attrs)?;

    let mut declarations = Vec::new();
    let members: Vec<(Member, &syn::Field)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(|i| (Member::Named(i), f)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| (Member::Unnamed(Index::from(i)), f))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    for (member, field) in &members {
        let Some(designation) = field_designation(field, member)? else {
            continue;
        };
        match designation {
            Designation::Member { name } => declarations.push(quote! {
                table.member(#name, |this: &Self| &this.#member);
            }),
            Designation::Base => {
                let path = member_name(member);
                declarations.push(quote! {
                    table.inherit(#path, |this: &Self| &this.#member);
                });
            }
        }
    }

    let definition = if custom {
        quote! {}
    } else {
        quote! {
            impl #impl_generics ::structeq_core::EqualityDefinition for #ident #ty_generics #where_clause {}
        }
    };

    Ok(quote! {
        impl #impl_generics ::structeq_core::Members for #ident #ty_generics #where_clause {
            fn describe(table: &mut ::structeq_core::MemberTable<'_, Self>) {
                let _ = &table;
                #(#declarations)*
            }
        }

        #definition

        impl #impl_generics ::structeq_core::Canonicalize for #ident #ty_generics #where_clause {
            const KIND: ::structeq_core::ValueKind = ::structeq_core::ValueKind::Nested;

            fn canonicalize(&self) -> ::structeq_core::CanonicalValue<'_> {
                ::structeq_core::CanonicalValue::Nested(self)
            }
        }

        impl #impl_generics ::core::cmp::PartialEq for #ident #ty_generics #where_clause {
            fn eq(&self, other: &Self) -> bool {
                ::structeq_core::equal(::core::option::Option::Some(self), ::core::option::Option::Some(other))
            }
        }

        impl #impl_generics ::core::cmp::Eq for #ident #ty_generics #where_clause {}

        impl #impl_generics ::core::hash::Hash for #ident #ty_generics #where_clause {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                state.write_u64(::structeq_core::StructuralEquality::hash_code(self));
            }
        }
    })
}

fn member_name(member: &Member) -> String {
    match member {
        Member::Named(ident) => ident.to_string(),
        Member::Unnamed(index) => index.index.to_string(),
    }
}

fn container_is_custom(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut custom = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("equality")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("custom") {
                custom = true;
                Ok(())
            } else {
                Err(meta.error("unsupported container attribute, expected `custom`"))
            }
        })?;
    }
    Ok(custom)
}

fn field_designation(field: &syn::Field, member: &Member) -> syn::Result<Option<Designation>> {
    let mut designation = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("equality")) {
        if designation.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a field takes at most one #[equality] attribute",
            ));
        }

        if matches!(attr.meta, syn::Meta::Path(_)) {
            designation = Some(Designation::Member {
                name: member_name(member),
            });
            continue;
        }

        let mut base = false;
        let mut rename: Option<LitStr> = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                base = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                rename = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute, expected `base` or `rename`"))
            }
        })?;

        designation = Some(match (base, rename) {
            (true, Some(rename)) => {
                return Err(syn::Error::new_spanned(
                    rename,
                    "`rename` cannot be combined with `base`",
                ));
            }
            (true, None) => Designation::Base,
            (false, Some(rename)) => Designation::Member {
                name: rename.value(),
            },
            (false, None) => Designation::Member {
                name: member_name(member),
            },
        });
    }
    Ok(designation)
}

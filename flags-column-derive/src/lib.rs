#![recursion_limit="128"]

extern crate proc_macro;
extern crate proc_macro2;
extern crate quote;
extern crate syn;
extern crate inflector;

use proc_macro::TokenStream;
use syn::{
    parse::{
        Parse,
        ParseStream,
    },
    parse_macro_input,
    punctuated::Punctuated,
    Token,
};
use quote::quote;
use inflector::Inflector;

struct AttributeInput {
    real_name: syn::Ident,
    repr_type: syn::Ident,
    initial: Option<Vec<syn::Ident>>,
    accessible: bool,
}

impl AttributeInput {
    fn builder_ident(&self) -> syn::Ident {
        let builder_ident_s = format!("{}Builder", &self.real_name);
        syn::Ident::new(builder_ident_s.as_str(), self.real_name.span())
    }

    fn column_name(&self) -> String {
        format!("{}", &self.real_name).to_snake_case()
    }
}

impl Parse for AttributeInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let real_name = input.parse()?;
        let _: Token![,] = input.parse()?;
        let repr_type = input.parse()?;
        let mut initial = None;
        let mut accessible = false;
        while !input.is_empty() {
            let _: Token![,] = input.parse()?;
            if input.is_empty() {
                break;
            }
            let option: syn::Ident = input.parse()?;
            match format!("{}", &option).as_str() {
                "initial" => {
                    let content;
                    syn::parenthesized!(content in input);
                    let names = Punctuated::<syn::Ident, Token![,]>::parse_terminated(&content)?;
                    initial = Some(names.into_iter().collect());
                },
                "accessible" => accessible = true,
                _ => return Err(syn::Error::new(option.span(), "expected `initial(..)` or `accessible`")),
            }
        }
        Ok(AttributeInput {
            real_name: real_name,
            repr_type: repr_type,
            initial: initial,
            accessible: accessible,
        })
    }
}

/// Methods generated on the column value type, plus the `TypedColumn` ones
/// callers reach with method syntax. A flag getter may not take their name.
const RESERVED_NAMES: &'static [&'static str] = &[
    "empty", "from_bits", "bits", "new_record", "mask", "unmask",
    "contains_all", "set_all", "all", "none", "flags",
    "into_bits", "definition", "load", "save",
];

fn reserved_name(snake: &str) -> bool {
    RESERVED_NAMES.contains(&snake)
}

/// Turns a fieldless enum whose discriminants are bit positions into a flag
/// column value type.
///
/// `#[flags_column(VisibleTo, u64, initial(Members, Friends), accessible)]`
/// on `enum VisibleToFlag { Admins = 0, Members = 1, Friends = 2 }` generates
/// `VisibleTo` with `admins()`/`set_admins(v)` per flag, the aggregate
/// accessors, a `VisibleToBuilder`, and an implementation of
/// `flags_column::TypedColumn` for the `visible_to` column.
#[proc_macro_attribute]
pub fn flags_column(attribute: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attribute as AttributeInput);
    let enum_input = parse_macro_input!(item as syn::ItemEnum);

    if let Some(variant) = enum_input.variants.iter().find(|v| !v.fields.is_empty()) {
        return syn::Error::new(variant.ident.span(), "flag variants cannot carry data")
            .to_compile_error()
            .into();
    }
    if let Some(variant) = enum_input.variants.iter().find(|v| reserved_name(&format!("{}", v.ident).to_snake_case())) {
        let msg = format!("flag `{}` would shadow a generated method of `{}`", &variant.ident, &args.real_name);
        return syn::Error::new(variant.ident.span(), msg)
            .to_compile_error()
            .into();
    }
    let initial = args.initial.clone().unwrap_or_default();
    if let Some(unknown) = initial.iter().find(|name| !enum_input.variants.iter().any(|v| &v.ident == *name)) {
        return syn::Error::new(unknown.span(), format!("`{}` is not a variant of `{}`", unknown, &enum_input.ident))
            .to_compile_error()
            .into();
    }

    let enum_ident = &enum_input.ident;
    let repr_type = &args.repr_type;
    let real_ident = &args.real_name;
    let builder_ident = &args.builder_ident();
    let column = args.column_name();
    let accessible = args.accessible;

    let variant_idents: Vec<_> = enum_input.variants.iter()
        .map(|variant| variant.ident.clone())
        .collect();
    let variant_names: Vec<_> = variant_idents.iter()
        .map(|ident| format!("{}", ident).to_snake_case())
        .collect();

    let variant_functions: Vec<_> = variant_idents.iter()
        .zip(variant_names.iter())
        .map(|(variant_ident, snake)| {
            let get_ident = syn::Ident::new(snake.as_str(), variant_ident.span());
            let set_ident = syn::Ident::new(format!("set_{}", snake).as_str(), variant_ident.span());
            let real_fns = quote! {
                pub fn #get_ident(&self) -> bool {
                    (self.0 & #enum_ident::#variant_ident.mask()) != 0
                }

                pub fn #set_ident<V: ::flags_column::Truthy>(&mut self, v: V) {
                    let mask = #enum_ident::#variant_ident.mask();
                    if v.is_truthy() {
                        self.0 |= mask;
                    } else {
                        self.0 &= !mask;
                    }
                }
            };
            let builder_fns = quote! {
                pub fn #get_ident(self, v: bool) -> Self {
                    let mask = #enum_ident::#variant_ident.mask();
                    if v {
                        #builder_ident(self.0 | mask)
                    } else {
                        #builder_ident(self.0 & !mask)
                    }
                }
            };
            (real_fns, builder_fns)
        })
        .collect();
    let real_fns = variant_functions.iter()
        .map(|&(ref real, ref _builder)| real);
    let builder_fns = variant_functions.iter()
        .map(|&(ref _real, ref builder)| builder);

    let initial_mask = initial.iter().map(|name| quote! { | #enum_ident::#name.mask() });
    let initial_const = match &args.initial {
        Some(_) => {
            let initial_names = initial.iter().map(|name| format!("{}", name).to_snake_case());
            quote! { Some(&[#(#initial_names),*]) }
        },
        None => quote! { None },
    };
    let positions = variant_idents.iter().map(|v| quote! { #enum_ident::#v => #enum_ident::#v as u32 });
    let names = variant_idents.iter().zip(variant_names.iter()).map(|(v, name)| quote! { #enum_ident::#v => #name });
    let flag_entries = variant_idents.iter().zip(variant_names.iter()).map(|(v, name)| quote! { (#name, #enum_ident::#v as u32) });
    let flag_list: Vec<_> = variant_idents.iter().map(|v| quote! { #enum_ident::#v }).collect();
    let full_mask = variant_idents.iter().map(|v| quote! { | #enum_ident::#v.mask() });

    TokenStream::from(quote! {
        #enum_input

        impl #enum_ident {
            pub const FLAGS: &'static [#enum_ident] = &[#(#flag_list),*];

            #[inline]
            pub const fn position(&self) -> u32 {
                match self {
                    #(#positions),*
                }
            }

            #[inline]
            pub const fn mask(&self) -> #repr_type {
                1 << self.position()
            }

            pub const fn name(&self) -> &'static str {
                match self {
                    #(#names),*
                }
            }
        }

        #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
        pub struct #real_ident(#repr_type);

        impl #real_ident {
            pub const DEFAULT_MASK: #repr_type = 0 #(#initial_mask)*;
            pub const FULL_MASK: #repr_type = 0 #(#full_mask)*;

            #[inline(always)]
            pub const fn empty() -> Self {
                #real_ident(0)
            }

            #[inline(always)]
            pub const fn from_bits(bits: #repr_type) -> Self {
                #real_ident(bits)
            }

            #[inline(always)]
            pub const fn bits(&self) -> #repr_type {
                self.0
            }

            /// The value a brand-new record starts with.
            #[inline(always)]
            pub const fn new_record() -> Self {
                #real_ident(Self::DEFAULT_MASK)
            }

            #(#real_fns)*

            pub fn mask(flags: &[#enum_ident]) -> #repr_type {
                flags.iter().fold(0, |acc, flag| acc | flag.mask())
            }

            pub fn unmask(bits: #repr_type) -> Vec<#enum_ident> {
                #real_ident(bits).flags()
            }

            pub fn contains_all(&self, flags: &[#enum_ident]) -> bool {
                let mask = Self::mask(flags);
                (self.0 & mask) == mask
            }

            pub fn set_all<V: ::flags_column::Truthy>(&mut self, flags: &[#enum_ident], v: V) {
                let mask = Self::mask(flags);
                if v.is_truthy() {
                    self.0 |= mask;
                } else {
                    self.0 &= !mask;
                }
            }

            #[inline]
            pub fn all(&self) -> bool {
                self.0 == Self::FULL_MASK
            }

            #[inline]
            pub fn none(&self) -> bool {
                self.0 == 0
            }

            pub fn flags(&self) -> Vec<#enum_ident> {
                let mut flags = Vec::new();
                #(
                    if (self.0 & #flag_list.mask()) == #flag_list.mask() {
                        flags.push(#flag_list);
                    }
                )*
                flags
            }
        }

        impl Into<#repr_type> for #real_ident {
            #[inline]
            fn into(self) -> #repr_type {
                self.0
            }
        }

        impl ::flags_column::TypedColumn for #real_ident {
            const COLUMN: &'static str = #column;
            const FLAG_POSITIONS: &'static [(&'static str, u32)] = &[#(#flag_entries),*];
            const INITIAL: Option<&'static [&'static str]> = #initial_const;
            const ACCESSIBLE: bool = #accessible;
            const REPR_MASK: ::flags_column::Bits = #repr_type::MAX as ::flags_column::Bits;

            #[inline(always)]
            fn from_bits(bits: ::flags_column::Bits) -> Self {
                #real_ident(bits as #repr_type)
            }

            #[inline(always)]
            fn into_bits(self) -> ::flags_column::Bits {
                self.0 as ::flags_column::Bits
            }
        }

        #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
        pub struct #builder_ident(#repr_type);

        impl #builder_ident {
            #(#builder_fns)*
        }

        impl Into<#real_ident> for #builder_ident {
            #[inline]
            fn into(self) -> #real_ident {
                #real_ident(self.0)
            }
        }

        impl From<#real_ident> for #builder_ident {
            #[inline]
            fn from(real: #real_ident) -> Self {
                #builder_ident(real.0)
            }
        }

        impl Into<#repr_type> for #builder_ident {
            fn into(self) -> #repr_type {
                let v: #real_ident = self.into();
                v.into()
            }
        }
    })
}

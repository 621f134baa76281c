//! Pagebind Derive Macros
//!
//! `#[derive(PageObject)]` turns field annotations into the build-time schema
//! consumed by the pagebind binder and readiness waiter, so page objects never
//! spell out `FieldBindingSpec` lists by hand.
//!
//! # Attributes
//!
//! On the struct:
//!
//! - `#[page(name = "Login")]` - name used in logs and errors
//! - `#[page(url = "https://...")]` - URL opened by `open_default`
//!
//! On a field (the field is skipped by the binder without one):
//!
//! - readiness: `visible`, `invisible`, `force_visible`
//! - locator: `id`, `css`, `xpath`, `name`, `class_name`, `tag_name`,
//!   `link_text`, `partial_link_text`, each `= "value"`
//! - composition: `chain(css = "form", name = "q")` searches nested,
//!   `any(id = "a", chain(...))` takes the first alternative that matches
//! - `label = "..."`, `timeout_ms = N`, `timeout_secs = N`
//! - `root` marks the `WebElement` that receives a block's own root
//!
//! # Example
//!
//! ```ignore
//! #[derive(Debug, Default, PageObject)]
//! #[page(name = "Search", url = "https://example.test/search")]
//! struct SearchPage {
//!     #[page(visible, any(id = "q", chain(css = "form.search", name = "q")))]
//!     query: TextInput,
//!     #[page(visible, timeout_secs = 30, css = "li.result")]
//!     results: ElementList,
//!     notes: String,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitInt, LitStr};

/// Locator strategies accepted as `key = "value"` field attributes
const STRATEGIES: &[&str] = &[
    "id",
    "css",
    "xpath",
    "name",
    "class_name",
    "tag_name",
    "link_text",
    "partial_link_text",
];

/// Derive `pagebind::PageObject` from `#[page(...)]` annotations.
///
/// Fields are emitted into the schema in declaration order. Fields without a
/// `#[page]` attribute appear as unrecognized entries and are left untouched.
#[proc_macro_derive(PageObject, attributes(page))]
pub fn derive_page_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

// ============================================================================
// Attribute model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visible,
    Invisible,
    ForceVisible,
}

impl Mark {
    fn tokens(self) -> TokenStream2 {
        match self {
            Self::Visible => quote!(::pagebind::ReadinessMark::Visible),
            Self::Invisible => quote!(::pagebind::ReadinessMark::Invisible),
            Self::ForceVisible => quote!(::pagebind::ReadinessMark::ForceVisible),
        }
    }
}

#[derive(Debug, Clone)]
struct ByAttr {
    strategy: Ident,
    value: LitStr,
}

impl ByAttr {
    fn tokens(&self) -> TokenStream2 {
        let Self { strategy, value } = self;
        quote!(::pagebind::By::#strategy(#value))
    }
}

#[derive(Debug, Clone)]
enum Locator {
    By(ByAttr),
    Chain(Vec<ByAttr>),
    Any(Vec<Locator>),
}

impl Locator {
    fn tokens(&self) -> TokenStream2 {
        match self {
            Self::By(by) => {
                let by = by.tokens();
                quote!(::pagebind::LocatorSpec::simple(#by))
            }
            Self::Chain(parts) => {
                let bys = parts.iter().map(ByAttr::tokens);
                quote!(::pagebind::LocatorSpec::chain([#(#bys),*]))
            }
            Self::Any(alternatives) => {
                let specs = alternatives.iter().map(Self::tokens);
                quote!(::pagebind::LocatorSpec::any([#(#specs),*]))
            }
        }
    }
}

#[derive(Debug, Default)]
struct PageAttrs {
    name: Option<LitStr>,
    url: Option<LitStr>,
}

#[derive(Debug, Default)]
struct FieldAttrs {
    annotated: bool,
    mark: Option<Mark>,
    locator: Option<Locator>,
    label: Option<LitStr>,
    timeout_ms: Option<u64>,
    root: bool,
}

// ============================================================================
// Parsing
// ============================================================================

fn page_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("page"))
}

fn parse_page_attrs(attrs: &[Attribute]) -> syn::Result<PageAttrs> {
    let mut out = PageAttrs::default();
    for attr in page_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("url") {
                out.url = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `name` or `url`"))
            }
        })?;
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in page_attrs(attrs) {
        out.annotated = true;
        attr.parse_nested_meta(|meta| {
            let key = meta_key(&meta)?;
            match key.to_string().as_str() {
                "visible" => set_mark(&mut out.mark, Mark::Visible, &meta),
                "invisible" => set_mark(&mut out.mark, Mark::Invisible, &meta),
                "force_visible" => set_mark(&mut out.mark, Mark::ForceVisible, &meta),
                "root" => {
                    out.root = true;
                    Ok(())
                }
                "label" => {
                    out.label = Some(meta.value()?.parse()?);
                    Ok(())
                }
                "timeout_ms" => {
                    let lit: LitInt = meta.value()?.parse()?;
                    out.timeout_ms = Some(lit.base10_parse()?);
                    Ok(())
                }
                "timeout_secs" => {
                    let lit: LitInt = meta.value()?.parse()?;
                    let secs: u64 = lit.base10_parse()?;
                    let ms = secs
                        .checked_mul(1000)
                        .ok_or_else(|| syn::Error::new(lit.span(), "timeout too large"))?;
                    out.timeout_ms = Some(ms);
                    Ok(())
                }
                _ => {
                    let locator = parse_locator(&meta)?;
                    if out.locator.replace(locator).is_some() {
                        return Err(meta.error("a field takes at most one locator"));
                    }
                    Ok(())
                }
            }
        })?;
    }
    Ok(out)
}

fn meta_key(meta: &ParseNestedMeta<'_>) -> syn::Result<Ident> {
    meta.path
        .get_ident()
        .cloned()
        .ok_or_else(|| meta.error("expected a plain identifier"))
}

fn set_mark(slot: &mut Option<Mark>, mark: Mark, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if slot.replace(mark).is_some() {
        return Err(meta.error("a field takes at most one readiness mark"));
    }
    Ok(())
}

fn parse_locator(meta: &ParseNestedMeta<'_>) -> syn::Result<Locator> {
    let key = meta_key(meta)?;
    match key.to_string().as_str() {
        "chain" => {
            let mut parts = Vec::new();
            meta.parse_nested_meta(|inner| {
                parts.push(parse_by(&inner)?);
                Ok(())
            })?;
            if parts.is_empty() {
                return Err(meta.error("`chain` needs at least one locator"));
            }
            Ok(Locator::Chain(parts))
        }
        "any" => {
            let mut alternatives = Vec::new();
            meta.parse_nested_meta(|inner| {
                alternatives.push(parse_locator(&inner)?);
                Ok(())
            })?;
            if alternatives.is_empty() {
                return Err(meta.error("`any` needs at least one alternative"));
            }
            Ok(Locator::Any(alternatives))
        }
        _ => parse_by(meta).map(Locator::By),
    }
}

fn parse_by(meta: &ParseNestedMeta<'_>) -> syn::Result<ByAttr> {
    let strategy = meta_key(meta)?;
    if !STRATEGIES.contains(&strategy.to_string().as_str()) {
        return Err(meta.error(format!("unknown page attribute `{strategy}`")));
    }
    let value: LitStr = meta.value()?.parse()?;
    Ok(ByAttr { strategy, value })
}

// ============================================================================
// Code generation
// ============================================================================

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "PageObject needs named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "PageObject can only be derived for structs",
            ))
        }
    };

    let page = parse_page_attrs(&input.attrs)?;
    let mut specs = Vec::with_capacity(fields.len());
    let mut keys = Vec::new();
    let mut members = Vec::new();
    let mut root: Option<&Ident> = None;

    for field in fields {
        let Some(member) = field.ident.as_ref() else {
            continue;
        };
        let key = member.to_string();
        let attrs = parse_field_attrs(&field.attrs)?;
        if !attrs.annotated {
            specs.push(quote!(::pagebind::FieldBindingSpec::unrecognized(#key)));
            continue;
        }

        let ty = &field.ty;
        let mut spec = quote! {
            ::pagebind::FieldBindingSpec::new(#key, <#ty as ::pagebind::ElementField>::shape())
        };
        if let Some(locator) = &attrs.locator {
            let locator = locator.tokens();
            spec = quote!(#spec.with_locator(#locator));
        }
        if let Some(mark) = attrs.mark {
            let mark = mark.tokens();
            spec = quote!(#spec.with_mark(#mark));
        }
        if let Some(label) = &attrs.label {
            spec = quote!(#spec.with_label(#label));
        }
        if let Some(ms) = attrs.timeout_ms {
            spec = quote!(#spec.with_timeout(::std::time::Duration::from_millis(#ms)));
        }
        if attrs.root {
            if root.replace(member).is_some() {
                return Err(syn::Error::new_spanned(
                    member,
                    "only one field can be the block root",
                ));
            }
            spec = quote!(#spec.wrapped_root());
        }

        specs.push(spec);
        keys.push(key);
        members.push(member);
    }

    let page_name = page
        .name
        .map_or_else(|| quote!(stringify!(#ident)), |name| quote!(#name));
    let default_url = page.url.map(|url| {
        quote! {
            fn default_url() -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(#url)
            }
        }
    });
    let set_root = root.map(|member| {
        quote! {
            fn set_root(&mut self, root: ::pagebind::WebElement) {
                self.#member = root;
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::pagebind::PageObject for #ident #ty_generics #where_clause {
            fn schema() -> ::std::vec::Vec<::pagebind::FieldBindingSpec> {
                ::std::vec![#(#specs),*]
            }

            fn field(&self, name: &str) -> ::core::option::Option<&dyn ::pagebind::ElementField> {
                match name {
                    #(#keys => ::core::option::Option::Some(&self.#members as &dyn ::pagebind::ElementField),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                name: &str,
            ) -> ::core::option::Option<&mut dyn ::pagebind::ElementField> {
                match name {
                    #(#keys => ::core::option::Option::Some(&mut self.#members as &mut dyn ::pagebind::ElementField),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn page_name() -> &'static str {
                #page_name
            }

            #default_url

            #set_root
        }
    })
}

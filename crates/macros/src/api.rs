use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{Attribute, Ident, Lit, Meta, NestedMeta, spanned::Spanned};
use synstructure::{BindingInfo, Structure, VariantInfo};

#[derive(Debug)]
struct Error(TokenStream);

impl Error {
    fn new(span: Span, message: &str) -> Error {
        Error(quote_spanned! { span =>
            compile_error!(#message);
        })
    }
}

/// Parsed contents of a `#[api(...)]` attribute.
#[derive(Default)]
struct ApiAttr {
    internal: Option<Span>,
    status: Option<Ident>,
    code: Option<Lit>,
}

pub fn derive_error(s: Structure) -> TokenStream {
    let statuses = s.each_variant(|v| match variant_status(v) {
        Ok(tokens) => tokens,
        Err(Error(tokens)) => tokens,
    });

    let codes = s.each_variant(|v| match variant_code(v) {
        Ok(tokens) => tokens,
        Err(Error(tokens)) => tokens,
    });

    s.gen_impl(quote! {
        gen impl ApiError for @Self {
            fn status(&self) -> ::actix_web::http::StatusCode {
                match *self { #statuses }
            }

            fn code(&self) -> Option<::std::borrow::Cow<str>> {
                match *self { #codes }
            }
        }
    })
}

/// Find and parse the single `#[api(...)]` attribute in a list.
fn parse_api(attrs: &[Attribute]) -> Result<Option<ApiAttr>, Error> {
    let mut metas = attrs.iter()
        .filter_map(|attr| attr.parse_meta().ok())
        .filter(|meta| meta.path().is_ident("api"));

    let list = match metas.next() {
        None => return Ok(None),
        Some(Meta::List(list)) => list,
        Some(meta) => return Err(Error::new(
            meta.span(),
            "api attribute must take a list in parentheses",
        )),
    };

    if let Some(meta) = metas.next() {
        return Err(Error::new(meta.span(), "api attribute must be used exactly once"));
    }

    if list.nested.is_empty() {
        return Err(Error::new(list.span(), "api attribute requires at least one argument"));
    }

    let mut attr = ApiAttr::default();

    for item in list.nested.iter() {
        match item {
            NestedMeta::Meta(Meta::Path(path)) if path.is_ident("internal") =>
                attr.internal = Some(item.span()),
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("code") =>
                attr.code = Some(nv.lit.clone()),
            NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("status") =>
                attr.status = match nv.lit {
                    Lit::Str(ref s) => Some(Ident::new(&s.value(), s.span())),
                    _ => return Err(Error::new(nv.lit.span(), "expected a string")),
                },
            _ => return Err(Error::new(item.span(), "expected one of: internal, code, status")),
        }
    }

    if let Some(span) = attr.internal {
        if attr.status.is_some() {
            return Err(Error::new(span, "internal errors can't have statuses"));
        }
        if attr.code.is_some() {
            return Err(Error::new(span, "internal errors can't have codes"));
        }
    }

    Ok(Some(attr))
}

/// Variants without `#[api]` delegate to the field marked `#[cause]`.
fn delegate(v: &VariantInfo, method: TokenStream) -> Result<TokenStream, Error> {
    v.bindings()
        .iter()
        .find(is_cause)
        .map(|cause| quote!(#cause.#method()))
        .ok_or_else(|| Error::new(
            v.ast().ident.span(),
            "each variant must be #[api]-annotated or have a #[cause]",
        ))
}

fn variant_status(v: &VariantInfo) -> Result<TokenStream, Error> {
    match parse_api(v.ast().attrs)? {
        None => delegate(v, quote!(status)),
        Some(ApiAttr { status: Some(status), .. }) =>
            Ok(quote!(::actix_web::http::StatusCode::#status)),
        Some(_) => Ok(quote!(::actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)),
    }
}

fn variant_code(v: &VariantInfo) -> Result<TokenStream, Error> {
    match parse_api(v.ast().attrs)? {
        None => delegate(v, quote!(code)),
        Some(ApiAttr { code: Some(code), .. }) =>
            Ok(quote!(Some(::std::borrow::Cow::Borrowed(#code)))),
        Some(_) => Ok(quote!(None)),
    }
}

fn is_cause(bi: &&BindingInfo) -> bool {
    bi.ast()
        .attrs
        .iter()
        .filter_map(|attr| attr.parse_meta().ok())
        .any(|meta| meta.path().is_ident("cause"))
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "rxflow_macro::test accepts no arguments for sync tests, and `local` or \
                     `shared` (bare or quoted) for async tests";

/// Marks a test function.
///
/// Sync functions expand to `#[test]`. Async functions run on tokio: the
/// default and `local` use a current-thread runtime, `shared` uses a
/// multi-thread runtime so schedulers can hop threads.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let raw_args = proc_macro2::TokenStream::from(attr);

  if input.sig.asyncness.is_none() {
    if !raw_args.is_empty() {
      return syn::Error::new(raw_args.span(), USAGE).to_compile_error().into();
    }
    return quote!(#[test] #input).into();
  }

  let flavor = if raw_args.is_empty() {
    Ok(Flavor::Local)
  } else if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
    Flavor::parse(&ident.to_string()).ok_or_else(|| syn::Error::new(ident.span(), USAGE))
  } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
    Flavor::parse(&lit.value()).ok_or_else(|| syn::Error::new(lit.span(), USAGE))
  } else {
    Err(syn::Error::new(raw_args.span(), USAGE))
  };

  let tokio_args = match flavor {
    Ok(Flavor::Local) => quote!(flavor = "current_thread"),
    Ok(Flavor::Shared) => quote!(flavor = "multi_thread", worker_threads = 2),
    Err(err) => return err.to_compile_error().into(),
  };

  quote!(
    #[tokio::test(#tokio_args)]
    #input
  )
  .into()
}

enum Flavor {
  Local,
  Shared,
}

impl Flavor {
  fn parse(name: &str) -> Option<Self> {
    match name {
      "local" => Some(Flavor::Local),
      "shared" => Some(Flavor::Shared),
      _ => None,
    }
  }
}

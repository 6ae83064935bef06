use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, ItemFn};

/// Test attribute used across rxshare.
///
/// - sync `fn`: `#[test]` natively, `wasm_bindgen_test` on wasm32.
/// - `async fn`: a current-thread tokio runtime whose body runs inside a
///   `LocalSet`, so `LocalScheduler` can spawn `!Send` tasks. Native only.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);

  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(raw_args.span(), "rxshare_macro::test does not take arguments")
        .to_compile_error(),
    );
  }

  let ItemFn { attrs, vis, mut sig, block } = input;

  let expanded = if sig.asyncness.is_some() {
    sig.asyncness = None;
    quote! {
      #[cfg(not(target_arch = "wasm32"))]
      #[test]
      #(#attrs)*
      #vis #sig {
        tokio::runtime::Builder::new_current_thread()
          .enable_time()
          .build()
          .expect("failed to build test runtime")
          .block_on(tokio::task::LocalSet::new().run_until(async move #block))
      }
    }
  } else {
    quote! {
      #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
      #[cfg_attr(not(target_arch = "wasm32"), test)]
      #(#attrs)*
      #vis #sig #block
    }
  };

  TokenStream::from(expanded)
}

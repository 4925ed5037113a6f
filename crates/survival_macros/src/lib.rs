use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The body is wrapped with a guard that logs the elapsed time when the
/// function returns. Without the `perf_stats` feature the guard is compiled
/// out entirely.
///
/// # Tick detection
/// - `ctx: &mut FrameContext` parameter: the frame tick is read from `ctx.tick`
/// - `tick: u64` parameter: the value is used directly
///
/// With a tick available the guard also logs every 100 ticks, otherwise only
/// when the threshold is exceeded.
///
/// # Example
/// ```ignore
/// #[profile(2)]  // threshold in milliseconds, defaults to 1
/// fn run_actors(&mut self, tick: u64) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let tick_source = sig.inputs.iter().find_map(|arg| {
        let FnArg::Typed(pat_type) = arg else {
            return None;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return None;
        };
        let ty = &pat_type.ty;
        let type_str = quote!(#ty).to_string();
        if pat_ident.ident == "ctx" && type_str.contains("FrameContext") {
            Some(quote!(ctx.tick))
        } else if pat_ident.ident == "tick" && type_str == "u64" {
            Some(quote!(tick))
        } else {
            None
        }
    });

    let profile_guard_def = match tick_source {
        Some(tick_expr) => quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
                tick_value: u64,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms || (self.tick_value % 100 == 0) {
                        bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
                tick_value: #tick_expr,
            }
        },
        None => quote! {
            struct ProfileGuard {
                name: &'static str,
                start: std::time::Instant,
            }
            impl Drop for ProfileGuard {
                fn drop(&mut self) {
                    let elapsed = self.start.elapsed();
                    if elapsed.as_millis() > #threshold_ms {
                        bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                    }
                }
            }
            ProfileGuard {
                name: #fn_name_str,
                start: std::time::Instant::now(),
            }
        },
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #profile_guard_def
            };

            #block
        }
    };

    output.into()
}

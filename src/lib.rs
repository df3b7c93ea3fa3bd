//! # folio
//!
//! Interaction effects for a static portfolio site, compiled to WebAssembly.
//!
//! Every behavior on the page (mobile navigation, scroll effects, reveal
//! animations, the contact form, and so on) is an independent controller
//! implementing [`effects::Effect`]. Controllers never reach for a global
//! `window`; they receive an explicit [`page::Page`] handle, which lets the
//! whole crate be tested natively against an in-memory page.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Read-only constants shared by the controllers |
//! | [`page`] | Document/window abstraction and the browser implementation |
//! | [`effects`] | The controllers and the single install point |

pub mod config;
pub mod effects;
pub mod page;

/// WASM entry point. Runs once when the module is instantiated.
#[cfg(feature = "browser")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    page::web::boot();
}

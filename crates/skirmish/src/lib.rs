//! Umbrella crate that re-exports the `skirmish-*` building blocks.
//!
//! Enable only the parts you need with the `grid`, `nav`, and `sight` features; `full` (the
//! default) pulls in all three.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "grid")]
#[cfg_attr(docsrs, doc(cfg(feature = "grid")))]
pub use skirmish_grid as grid;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use skirmish_nav as nav;

#[cfg(feature = "sight")]
#[cfg_attr(docsrs, doc(cfg(feature = "sight")))]
pub use skirmish_sight as sight;

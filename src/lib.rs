//! `nscatter` is a semi-modular toolkit for Monte Carlo multiple scattering
//! corrections in neutron scattering
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use nscatter_utils as utils;

#[cfg(feature = "discus")]
#[cfg_attr(docsrs, doc(cfg(feature = "discus")))]
#[doc(inline)]
pub use nscatter_discus as discus;

#[cfg(feature = "geometry")]
#[cfg_attr(docsrs, doc(cfg(feature = "geometry")))]
#[doc(inline)]
pub use nscatter_geometry as geometry;

#[cfg(feature = "histogram")]
#[cfg_attr(docsrs, doc(cfg(feature = "histogram")))]
#[doc(inline)]
pub use nscatter_histogram as histogram;

#[cfg(feature = "sparse")]
#[cfg_attr(docsrs, doc(cfg(feature = "sparse")))]
#[doc(inline)]
pub use nscatter_sparse as sparse;

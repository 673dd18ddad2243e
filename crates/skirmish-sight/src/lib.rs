//! Line of sight between tiles and per-faction fog of war.
//!
//! [`LosEngine`] answers tile-to-tile sight queries against a read-only [`skirmish_grid::Grid`].
//! [`VisibilityManager`] turns observers into visibility bits on the grid and tracks which
//! entities each faction has detected.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod los;
pub mod visibility;

pub use error::SightError;
pub use los::{LosCache, LosConfig, LosEngine, LosFlags};
pub use visibility::{
    ConcealmentProvider, FactionGroups, NoConcealment, Observer, Stat, VisibilityConfig,
    VisibilityManager,
};

//! Line-of-sight analysis

mod viewshed;

pub use viewshed::{viewshed, Viewshed, ViewshedParams};

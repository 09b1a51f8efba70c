//! Side effect free data structures and algorithms: everything in here can
//! run and be tested without an X server on the other end.
pub mod geometry;
pub mod layout;
pub mod state;

pub use geometry::{Point, Rect};
pub use layout::{LayoutTable, SlotLayout, Strut};
pub use state::{Client, Monitor, WindowSet, Workspace};

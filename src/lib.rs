//! Live trend plotter for numeric streams.
//!
//! A producer thread decodes samples from a file, FIFO or stdin into one ring
//! buffer per channel. The display loop snapshots the buffers when new data
//! arrives and draws them as wrapping or scrolling traces.

pub mod color;
pub mod config;
pub mod controls;
pub mod decoder;
pub mod distrib;
pub mod geometry;
pub mod intersect;
pub mod pipeline;
pub mod producer;
pub mod ring;
pub mod snapshot;
pub mod source;
pub mod timer;
pub mod transform;
pub mod ui;

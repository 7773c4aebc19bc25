//! fmcollage - Library for building album cover collages from Last.fm listening data
//!
//! This library provides functionality to:
//! - Fetch a user's top albums and store their covers on disk
//! - Decide whether stored covers can be reused
//! - Lay covers out on a grid, either row by row or as a spiral, and encode
//!   the result as JPEG or PNG

pub mod cache;
pub mod cli;
pub mod collage;
pub mod config;
pub mod error;
pub mod grid;
pub mod logging;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod store;

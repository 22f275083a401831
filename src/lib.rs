//! The library code for the `blogdex` blog index generator. Building the index
//! page breaks down into three steps:
//!
//! 1. Loading post records from markdown source files on disk
//!    ([`crate::post`])
//! 2. Selecting the records that belong on the index and ordering them, most
//!    recent first ([`crate::select`])
//! 3. Rendering the index page and writing it to disk ([`crate::write`])
//!
//! The second step is the heart of the crate and is a pure function over the
//! loaded records. The third applies the index template and then runs the
//! post-render hooks ([`crate::hook`]) over the result, which is where e.g.
//! tables pick up the theme's `table` class.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod category;
pub mod config;
pub mod hook;
pub mod htmlrenderer;
pub mod markdown;
pub mod post;
pub mod select;
pub mod site;
pub mod write;

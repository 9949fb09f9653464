// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcagbot - WCAG 2.1 AA page scanner
//!
//! Renders a single web page, runs a fixed battery of accessibility checks
//! against the rendered DOM and reports normalized findings. A second path
//! replays the findings as blunt DOM fixes and returns the patched HTML.
//!
//! ## Checks
//!
//! - **Contrast** (1.4.3): text against its effective background
//! - **Focus Indicator** (2.4.7): outline on focused interactive elements
//! - **Alt Text** (1.1.1): images without alternative text
//! - **Landmarks** (1.3.1): header, nav, main and footer regions
//! - **Headings** (2.4.6): heading inventory for review
//!
//! ## Flow
//!
//! `scanner::scan` renders a URL through a [`render::Renderer`], runs the
//! checks and returns a [`findings::ScanSnapshot`]; `fix::apply_fixes` turns
//! that snapshot into patched HTML. [`store::SnapshotStore`] keeps the latest
//! snapshot for callers that scan and fix in separate steps.

pub mod analyzers;
pub mod config;
pub mod dom;
pub mod error;
pub mod findings;
pub mod fix;
pub mod normalize;
pub mod render;
pub mod report;
pub mod scanner;
pub mod store;

pub use error::{Error, Result};

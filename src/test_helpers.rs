//! Shared test utilities.
//!
//! Float comparison and small style builders used across the module test
//! suites.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let style = style_with_margins(0.0, 0.0, 0.0, 0.0);
//! let layout = compute_layout(container, image, &style);
//! assert_close(layout.scale, 2.0);
//! ```

use crate::style::{Margins, StyleOptions};

// =========================================================================
// Assertions
// =========================================================================

/// Assert two floats are equal within 1e-9.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// =========================================================================
// Style builders
// =========================================================================

pub fn margins(top: f64, right: f64, bottom: f64, left: f64) -> Margins {
    Margins {
        top,
        right,
        bottom,
        left,
    }
}

/// Stock style with the given margins, in percent.
pub fn style_with_margins(top: f64, right: f64, bottom: f64, left: f64) -> StyleOptions {
    StyleOptions {
        margins: margins(top, right, bottom, left),
        ..StyleOptions::default()
    }
}

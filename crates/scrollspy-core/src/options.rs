#![forbid(unsafe_code)]

//! Tracker configuration and the root margin derived from it.
//!
//! The offset is passed through to the platform without sanitizing. Use
//! [`ScrollspyOptions::validate`] to check it up front if that matters to the
//! caller; the tracker itself only logs a warning for out-of-range values.

use core::fmt;

use crate::error::OptionsError;

/// Top offset as handed over by the host.
///
/// Hosts with dynamic values (JS) may hand over text instead of a number;
/// it is spliced into the margin verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Offset {
    Px(f64),
    Raw(String),
}

impl Offset {
    /// Whether this offset stands for "no offset": zero, `NaN`, or empty text.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Px(v) => *v == 0.0 || v.is_nan(),
            Self::Raw(s) => s.is_empty(),
        }
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl From<f64> for Offset {
    fn from(px: f64) -> Self {
        Self::Px(px)
    }
}

impl From<String> for Offset {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for Offset {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }
}

/// Optional configuration for a [`Scrollspy`](crate::Scrollspy).
///
/// `R` is the platform handle used as the intersection root.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollspyOptions<R> {
    /// Container to measure intersection against. `None` means the viewport.
    pub root: Option<R>,
    /// Pixels trimmed from the top edge of the root before intersecting.
    pub offset: Offset,
}

impl<R> Default for ScrollspyOptions<R> {
    fn default() -> Self {
        Self {
            root: None,
            offset: Offset::default(),
        }
    }
}

impl<R> ScrollspyOptions<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(mut self, root: R) -> Self {
        self.root = Some(root);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: impl Into<Offset>) -> Self {
        self.offset = offset.into();
        self
    }

    /// Margin applied to the root: `-offset` on top, zero elsewhere.
    #[must_use]
    pub fn root_margin(&self) -> RootMargin {
        RootMargin::top_inset(self.offset.clone())
    }

    /// Check that the offset is a finite, non-negative pixel count.
    pub fn validate(&self) -> Result<(), OptionsError> {
        match &self.offset {
            Offset::Raw(raw) if raw.is_empty() => Ok(()),
            Offset::Raw(raw) => Err(OptionsError::NonNumericOffset(raw.clone())),
            Offset::Px(v) if !v.is_finite() => Err(OptionsError::NonFiniteOffset(*v)),
            Offset::Px(v) if *v < 0.0 => Err(OptionsError::NegativeOffset(*v)),
            Offset::Px(_) => Ok(()),
        }
    }
}

/// Four-sided margin in CSS `top right bottom left` order.
///
/// Only the top edge is ever non-zero here. The top value is stored as the
/// raw offset and rendered with a leading minus sign, so a negative offset
/// yields a doubled sign that the platform is free to reject.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMargin {
    top_inset: Offset,
}

impl RootMargin {
    /// Shrink the visible region by `offset` from the top.
    ///
    /// An unset offset (zero, `NaN`, empty text) collapses to `0`.
    #[must_use]
    pub fn top_inset(offset: impl Into<Offset>) -> Self {
        let offset = offset.into();
        let top_inset = if offset.is_unset() {
            Offset::Px(0.0)
        } else {
            offset
        };
        Self { top_inset }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.top_inset {
            Offset::Px(px) => write!(f, "-{px}px 0px 0px 0px"),
            Offset::Raw(raw) => write!(f, "-{raw}px 0px 0px 0px"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_margin_has_zero_inset() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::default();
        assert_eq!(opts.root_margin().to_string(), "-0px 0px 0px 0px");
        assert!(opts.root.is_none());
    }

    #[test]
    fn offset_lands_on_top_edge_only() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset(50.0);
        assert_eq!(opts.root_margin().to_string(), "-50px 0px 0px 0px");
    }

    #[test]
    fn fractional_offset_keeps_fraction() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset(12.5);
        assert_eq!(opts.root_margin().to_string(), "-12.5px 0px 0px 0px");
    }

    #[test]
    fn negative_offset_passes_through_unsanitized() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset(-8.0);
        assert_eq!(opts.root_margin().to_string(), "--8px 0px 0px 0px");
        assert_eq!(opts.validate(), Err(OptionsError::NegativeOffset(-8.0)));
    }

    #[test]
    fn nan_offset_reads_as_zero() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset(f64::NAN);
        assert_eq!(opts.root_margin().to_string(), "-0px 0px 0px 0px");
        assert!(matches!(
            opts.validate(),
            Err(OptionsError::NonFiniteOffset(v)) if v.is_nan()
        ));
    }

    #[test]
    fn text_offset_is_spliced_verbatim() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset("50");
        assert_eq!(opts.root_margin().to_string(), "-50px 0px 0px 0px");
        assert_eq!(
            opts.validate(),
            Err(OptionsError::NonNumericOffset("50".into()))
        );
    }

    #[test]
    fn empty_text_offset_reads_as_zero() {
        let opts: ScrollspyOptions<()> = ScrollspyOptions::new().with_offset("");
        assert_eq!(opts.root_margin().to_string(), "-0px 0px 0px 0px");
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn root_is_carried() {
        let opts = ScrollspyOptions::new().with_root("main").with_offset(4.0);
        assert_eq!(opts.root, Some("main"));
        assert!(opts.validate().is_ok());
    }
}

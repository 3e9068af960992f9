use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;

/// Where a dialect starts counting pages.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOrigin {
    /// First page is `0`. Used by the native dialect.
    Zero,
    /// First page is `1`. Used by the gateway dialect.
    One,
}

/// Paging parameters attached to a [`Request`](crate::Request).
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct Pager {
    pub page_size: u32,
    #[builder(default)]
    pub page_no: u32,
    /// Ask the remote to compute `total_count`; required for [`Pager::has_more`].
    #[builder(default)]
    #[serde(default)]
    pub calc_total: bool,
}

impl Pager {
    #[must_use]
    pub const fn new(page_size: u32, page_no: u32) -> Self {
        Self {
            page_size,
            page_no,
            calc_total: false,
        }
    }

    #[must_use]
    pub const fn with_calc_total(mut self, calc_total: bool) -> Self {
        self.calc_total = calc_total;
        self
    }

    /// The page that follows this one.
    #[must_use]
    pub const fn next_page(self) -> Self {
        Self {
            page_no: self.page_no.saturating_add(1),
            ..self
        }
    }

    pub(crate) fn validate(self, origin: PageOrigin) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::validation("page_size must be greater than zero"));
        }
        if origin == PageOrigin::One && self.page_no == 0 {
            return Err(Error::validation(
                "page_no is one-based for this dialect, got 0",
            ));
        }
        Ok(())
    }

    /// Whether rows remain past this page.
    ///
    /// Always `false` unless `calc_total` was requested, since `total_count` is only
    /// reported in that case.
    #[must_use]
    pub fn has_more(&self, total_count: i64, origin: PageOrigin) -> bool {
        if !self.calc_total {
            return false;
        }
        let pages_seen = match origin {
            PageOrigin::Zero => i64::from(self.page_no) + 1,
            PageOrigin::One => i64::from(self.page_no),
        };
        total_count > pages_seen.saturating_mul(i64::from(self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_calc_total_never_has_more() {
        let pager = Pager::new(20, 0);
        assert!(!pager.has_more(i64::MAX, PageOrigin::Zero));
        assert!(!pager.has_more(i64::MAX, PageOrigin::One));
    }

    #[test]
    fn zero_based_threshold() {
        let pager = Pager::new(20, 1).with_calc_total(true);
        assert!(pager.has_more(57, PageOrigin::Zero));
        assert!(pager.has_more(41, PageOrigin::Zero));
        assert!(!pager.has_more(40, PageOrigin::Zero), "equal to threshold");
        assert!(!pager.has_more(0, PageOrigin::Zero));
    }

    #[test]
    fn one_based_threshold() {
        let pager = Pager::builder()
            .page_size(50)
            .page_no(2)
            .calc_total(true)
            .build();
        assert!(pager.has_more(101, PageOrigin::One));
        assert!(!pager.has_more(100, PageOrigin::One), "equal to threshold");
    }

    #[test]
    fn conventions_differ_by_one_page() {
        let pager = Pager::new(10, 3).with_calc_total(true);
        assert!(pager.has_more(35, PageOrigin::One));
        assert!(!pager.has_more(35, PageOrigin::Zero));
    }

    #[test]
    fn huge_pager_does_not_overflow() {
        let pager = Pager::new(u32::MAX, u32::MAX).with_calc_total(true);
        for origin in [PageOrigin::Zero, PageOrigin::One] {
            assert!(!pager.has_more(i64::MAX, origin), "{origin:?}");
            assert!(!pager.has_more(0, origin), "{origin:?}");
        }
        let first = Pager::new(u32::MAX, 0).with_calc_total(true);
        assert!(first.has_more(i64::MAX, PageOrigin::Zero));
    }

    #[test]
    fn validation_rules() {
        assert!(Pager::new(0, 0).validate(PageOrigin::Zero).is_err());
        assert!(Pager::new(10, 0).validate(PageOrigin::Zero).is_ok());
        assert!(Pager::new(10, 0).validate(PageOrigin::One).is_err());
        assert!(Pager::new(10, 1).validate(PageOrigin::One).is_ok());
    }

    #[test]
    fn next_page_keeps_size_and_flag() {
        let pager = Pager::new(10, 3).with_calc_total(true).next_page();
        assert_eq!(pager, Pager::new(10, 4).with_calc_total(true));
    }
}

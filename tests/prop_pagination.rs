use proptest::prelude::*;
use userbase::users::{PageLimits, PageWindow, Pagination};

proptest! {
    #[test]
    fn prop_window_skip_and_page_count(page in 1u64..10_000, limit in 1u64..=100, total in 0u64..100_000) {
        let limits = PageLimits::default();
        let w = PageWindow::from_params(Some(&page.to_string()), Some(&limit.to_string()), limits);
        prop_assert_eq!(w.page as u64, page);
        prop_assert_eq!(w.limit as u64, limit);
        prop_assert_eq!(w.skip() as u64, (page - 1) * limit);

        let p = Pagination::new(w, total as usize);
        prop_assert_eq!(p.pages as u64, total.div_ceil(limit));
        prop_assert_eq!(p.total as u64, total);
    }

    #[test]
    fn prop_bad_input_falls_back_to_defaults(raw in "[^0-9]{0,6}|-[0-9]{1,4}|0") {
        let limits = PageLimits::default();
        let w = PageWindow::from_params(Some(&raw), Some(&raw), limits);
        prop_assert_eq!(w.page, 1);
        prop_assert_eq!(w.limit, limits.default_limit);
    }

    #[test]
    fn prop_limit_never_exceeds_max(limit in 1u64..1_000_000) {
        let limits = PageLimits::default();
        let w = PageWindow::from_params(None, Some(&limit.to_string()), limits);
        prop_assert!(w.limit <= limits.max_limit);
        prop_assert!(w.limit >= 1);
    }
}

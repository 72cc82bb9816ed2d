//! Page/count pagination shared by the ranked listings.

use crate::error::AppError;
use serde::Deserialize;

/// `page` is 1-based; `count` is the page size.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_page() -> i64 {
    1
}
fn default_count() -> i64 {
    10
}

impl PageRequest {
    pub fn new(page: i64, count: i64) -> Self {
        Self { page, count }
    }

    /// Inclusive zero-based index window `(start, end)` of this page.
    pub fn window(&self) -> Result<(i64, i64), AppError> {
        if self.page <= 0 || self.count <= 0 {
            return Err(AppError::validation(
                "Page and count must be greater than 0",
            ));
        }
        let start = self
            .count
            .checked_mul(self.page - 1)
            .ok_or_else(|| AppError::validation("Page number causes overflow"))?;
        let end = start
            .checked_add(self.count - 1)
            .ok_or_else(|| AppError::validation("Page number causes overflow"))?;
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window() {
        assert_eq!(PageRequest::new(1, 10).window().unwrap(), (0, 9));
        assert_eq!(PageRequest::new(2, 10).window().unwrap(), (10, 19));
        assert_eq!(PageRequest::new(3, 1).window().unwrap(), (2, 2));
    }

    #[test]
    fn test_window_rejects_non_positive() {
        for (page, count) in [(0, 10), (1, 0), (-1, 10), (1, -5)] {
            let err = PageRequest::new(page, count).window().unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[test]
    fn test_window_rejects_overflow() {
        let err = PageRequest::new(i64::MAX, i64::MAX).window().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_defaults() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!((req.page, req.count), (1, 10));
    }
}

//! Trailing order-history window selection.
//!
//! Window bounds use the date portion only: a window of `n` days ending
//! today covers the calendar days `[today - n, today]` inclusive, expressed
//! for querying as `[start 00:00, day-after-end 00:00)`.

use jiff::Zoned;
use jiff::civil::{Date, DateTime};

use crate::error::{AppError, AppResult};

/// Upper bound on the window length; windows past this are configuration
/// mistakes, not workloads.
const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingWindow {
    start: Date,
    end: Date,
    start_at: DateTime,
    end_before: DateTime,
}

impl TrendingWindow {
    /// Window of `window_days` trailing days ending today.
    pub fn trailing(window_days: i64) -> AppResult<Self> {
        Self::ending_on(Zoned::now().date(), window_days)
    }

    /// Window of `window_days` trailing days ending on `end` (inclusive).
    pub fn ending_on(end: Date, window_days: i64) -> AppResult<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(AppError::Validation {
                field: "window_days".to_string(),
                reason: format!("must be between 1 and {MAX_WINDOW_DAYS}, got {window_days}"),
            });
        }

        let start = end
            .checked_sub(jiff::Span::new().days(window_days))
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        let day_after_end = end
            .checked_add(jiff::Span::new().days(1))
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            start,
            end,
            start_at: start.at(0, 0, 0, 0),
            end_before: day_after_end.at(0, 0, 0, 0),
        })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// First instant inside the window.
    pub fn start_at(&self) -> DateTime {
        self.start_at
    }

    /// First instant after the window; the query bound is exclusive so the
    /// whole final day is covered.
    pub fn end_before(&self) -> DateTime {
        self.end_before
    }
}

//! Shared utility functions for DBW crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, NaiveDateTime};

    /// Datetime format used by the explorer API: "YYYY-MM-DD HH:MM:SS"
    pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Format a NaiveDateTime as "YYYY-MM-DD HH:MM:SS"
    pub fn format_datetime(dt: &NaiveDateTime) -> String {
        dt.format(DATETIME_FORMAT).to_string()
    }

    /// Split a partial datetime ("2023", "2023-6", "2023-06-15 10:3") into
    /// its numeric components, year first. At most 6 components are returned.
    ///
    /// Returns None if the text does not start with a 4-digit year or a
    /// component is not numeric.
    pub fn split_partial(text: &str) -> Option<Vec<u32>> {
        let mut halves = text.split_whitespace();
        let date = halves.next()?;
        let time = halves.next();

        let mut parts = Vec::with_capacity(6);
        for (idx, piece) in date.split('-').take(3).enumerate() {
            if idx == 0 && piece.len() != 4 {
                return None;
            }
            parts.push(piece.parse::<u32>().ok()?);
        }
        if let Some(time) = time {
            // A time only makes sense after a full date
            if parts.len() == 3 {
                for piece in time.split(':').take(3) {
                    parts.push(piece.parse::<u32>().ok()?);
                }
            }
        }
        Some(parts)
    }

    /// Last day of the given month (1-based), or None for an invalid month.
    pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
        first_of_next.pred_opt().map(|d| d.day())
    }

    fn build(full: [u32; 6]) -> Option<String> {
        let date = NaiveDate::from_ymd_opt(full[0] as i32, full[1], full[2])?;
        let dt = date.and_hms_opt(full[3], full[4], full[5])?;
        Some(format_datetime(&dt))
    }

    /// Complete a partial datetime to the earliest instant it can denote.
    ///
    /// e.g. "2023-06" -> "2023-06-01 00:00:00"
    pub fn complete_min(text: &str) -> Option<String> {
        let parsed = split_partial(text)?;
        let mut full = [0, 1, 1, 0, 0, 0];
        for (slot, value) in full.iter_mut().zip(parsed) {
            *slot = value;
        }
        build(full)
    }

    /// Complete a partial datetime to the latest instant it can denote.
    ///
    /// e.g. "2024-02" -> "2024-02-29 23:59:59"
    pub fn complete_max(text: &str) -> Option<String> {
        let parsed = split_partial(text)?;
        let mut full = [0, 12, 31, 23, 59, 59];
        let given = parsed.len();
        for (slot, value) in full.iter_mut().zip(parsed) {
            *slot = value;
        }
        if given < 3 {
            full[2] = last_day_of_month(full[0] as i32, full[1])?;
        }
        build(full)
    }

}

/// Coordinate helpers
pub mod coords {
    /// Decimal digits kept for coordinates used as keys or filter bounds.
    pub const PRECISION_DIGITS: i32 = 5;

    const SCALE: f64 = 100_000.0;

    /// Round a coordinate to `PRECISION_DIGITS` decimals.
    pub fn round_coord(value: f64) -> f64 {
        (value * SCALE).round() / SCALE
    }

    /// Convert a coordinate to integer units of 1e-5 degrees.
    pub fn to_units(value: f64) -> i64 {
        (value * SCALE).round() as i64
    }

    /// Convert integer units of 1e-5 degrees back to degrees.
    pub fn from_units(units: i64) -> f64 {
        units as f64 / SCALE
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_round_coord() {
            assert_eq!(round_coord(45.123456789), 45.12346);
            assert_eq!(round_coord(-9.000004), -9.0);
        }

        #[test]
        fn test_units_are_stable() {
            // 0.1 + 0.2 has a different representation than 0.3
            assert_eq!(to_units(0.1 + 0.2), to_units(0.3));
            assert_eq!(from_units(to_units(12.3456)), 12.3456);
        }
    }
}

//! Float formatting helpers for result display.
//!
//! Rust's core float-to-decimal formatting has had wasm-facing panics in some
//! toolchain/browser combinations (see `dragon.rs` panics). These helpers do
//! **not** use `format!` on floats: finite values are scaled and rounded into
//! an `i64`, then formatted as integers.

/// Fixed-point rendering with `decimals` digits after the point.
pub fn fmt_fixed(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "NaN".to_string()
        } else if v.is_sign_positive() {
            "Inf".to_string()
        } else {
            "-Inf".to_string()
        };
    }

    let decimals = decimals.min(9);
    let scale_i64 = 10_i64.checked_pow(decimals as u32).unwrap_or(1_i64);
    let scaled = (v * scale_i64 as f64).round();

    // Extremely large values can overflow the scale or the i64 range.
    if !scaled.is_finite() || scaled.abs() > (i64::MAX as f64) {
        return if v.is_sign_negative() {
            "-Inf".to_string()
        } else {
            "Inf".to_string()
        };
    }

    let scaled_i = scaled as i64;
    let abs_i = scaled_i.abs();
    let int_part = abs_i / scale_i64;
    let frac_part = abs_i % scale_i64;

    let mut out = String::new();
    if scaled_i < 0 {
        out.push('-');
    }
    out.push_str(&int_part.to_string());

    if decimals > 0 {
        out.push('.');
        let frac_str = frac_part.to_string();
        for _ in 0..decimals.saturating_sub(frac_str.len()) {
            out.push('0');
        }
        out.push_str(&frac_str);
    }

    out
}

/// Renders a `[0, 1]` fraction as a two-decimal percentage, e.g. `0.82` → `"82.00%"`.
pub fn fmt_fraction_percent(fraction: f64) -> String {
    let mut s = fmt_fixed(fraction * 100.0, 2);
    s.push('%');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pads_fraction_digits() {
        assert_eq!(fmt_fixed(3.5, 2), "3.50");
        assert_eq!(fmt_fixed(0.05, 2), "0.05");
        assert_eq!(fmt_fixed(-1.25, 1), "-1.3");
        assert_eq!(fmt_fixed(42.0, 0), "42");
    }

    #[test]
    fn fixed_handles_non_finite() {
        assert_eq!(fmt_fixed(f64::NAN, 2), "NaN");
        assert_eq!(fmt_fixed(f64::INFINITY, 2), "Inf");
        assert_eq!(fmt_fixed(f64::NEG_INFINITY, 2), "-Inf");
    }

    #[test]
    fn fraction_percent_matches_result_card() {
        assert_eq!(fmt_fraction_percent(0.82), "82.00%");
        assert_eq!(fmt_fraction_percent(0.12), "12.00%");
        assert_eq!(fmt_fraction_percent(1.0), "100.00%");
        assert_eq!(fmt_fraction_percent(0.0), "0.00%");
    }
}

//! Small numeric helpers shared by the fitter and the summary printer.

use ndarray::ArrayView1;

/// Sample quantile with linear interpolation between order statistics
/// (the "type 7" definition used by most statistics packages).
///
/// Returns NaN for an empty input.
pub fn quantile(x: &ArrayView1<f64>, q: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    let mut sorted: Vec<f64> = x.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Min, first quartile, median, third quartile and max.
pub fn five_number_summary(x: &ArrayView1<f64>) -> [f64; 5] {
    [
        quantile(x, 0.0),
        quantile(x, 0.25),
        quantile(x, 0.5),
        quantile(x, 0.75),
        quantile(x, 1.0),
    ]
}

/// Significance code for a p-value.
pub fn significance_code(p: f64) -> &'static str {
    if !p.is_finite() {
        ""
    } else if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else if p < 0.1 {
        "."
    } else {
        ""
    }
}

/// Format a p-value the way regression summaries do: tiny values are
/// clamped to `< 2e-16`.
pub fn format_p_value(p: f64) -> String {
    if !p.is_finite() {
        "NaN".to_string()
    } else if p < 2e-16 {
        "< 2e-16".to_string()
    } else if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.5}", p)
    }
}

/// Serde adapter that writes non-finite floats as `null` and reads `null`
/// back as NaN. JSON has no NaN literal.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_quantile_interpolates() {
        let x = array![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(quantile(&x.view(), 0.0), 1.0);
        assert_relative_eq!(quantile(&x.view(), 0.5), 2.5);
        assert_relative_eq!(quantile(&x.view(), 0.25), 1.75);
        assert_relative_eq!(quantile(&x.view(), 1.0), 4.0);
    }

    #[test]
    fn test_quantile_empty() {
        let x = ndarray::Array1::<f64>::zeros(0);
        assert!(quantile(&x.view(), 0.5).is_nan());
    }

    #[test]
    fn test_five_number_summary() {
        let x = array![5.0, 1.0, 3.0];
        assert_eq!(five_number_summary(&x.view()), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_significance_codes() {
        assert_eq!(significance_code(0.0001), "***");
        assert_eq!(significance_code(0.005), "**");
        assert_eq!(significance_code(0.03), "*");
        assert_eq!(significance_code(0.07), ".");
        assert_eq!(significance_code(0.5), "");
        assert_eq!(significance_code(f64::NAN), "");
    }

    #[test]
    fn test_format_p_value() {
        assert_eq!(format_p_value(1e-20), "< 2e-16");
        assert_eq!(format_p_value(0.0625), "0.06250");
        assert_eq!(format_p_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_nan_as_null_round_trip() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "nan_as_null")]
            value: f64,
        }

        let json = serde_json::to_string(&Wrapper { value: f64::NAN }).unwrap();
        assert_eq!(json, r#"{"value":null}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_nan());

        let back: Wrapper = serde_json::from_str(r#"{"value":1.5}"#).unwrap();
        assert_eq!(back.value, 1.5);
    }
}

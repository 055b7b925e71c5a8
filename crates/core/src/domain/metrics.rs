use serde::{Deserialize, Serialize};

/// Per-ticker market metrics as reported by the model. Values are trusted as given;
/// only `price > 0` is checked at the gateway boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    pub price: f64,
    #[serde(rename = "fiftyDayMA")]
    pub fifty_day_ma: f64,
    #[serde(rename = "twoHundredDayMA")]
    pub two_hundred_day_ma: f64,
    pub rsi: f64,
    pub volume: f64,
    pub avg_volume: f64,
    pub recent_high: f64,
    pub recent_low: f64,
}

impl RawMetrics {
    /// Current volume over average volume; zero when there is no average to divide by.
    pub fn relative_volume(&self) -> f64 {
        if self.avg_volume > 0.0 {
            self.volume / self.avg_volume
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uses_wire_field_names() {
        let m = RawMetrics {
            price: 110.0,
            fifty_day_ma: 100.0,
            two_hundred_day_ma: 90.0,
            rsi: 60.0,
            volume: 2_000_000.0,
            avg_volume: 1_000_000.0,
            recent_high: 112.0,
            recent_low: 95.0,
        };
        let v = serde_json::to_value(m).unwrap();
        assert_eq!(v["fiftyDayMA"], json!(100.0));
        assert_eq!(v["twoHundredDayMA"], json!(90.0));
        assert_eq!(v["avgVolume"], json!(1_000_000.0));
        assert_eq!(v["recentHigh"], json!(112.0));
    }

    #[test]
    fn relative_volume_is_zero_without_average() {
        let m = RawMetrics {
            price: 10.0,
            fifty_day_ma: 0.0,
            two_hundred_day_ma: 0.0,
            rsi: 0.0,
            volume: 5_000.0,
            avg_volume: 0.0,
            recent_high: 0.0,
            recent_low: 0.0,
        };
        assert_eq!(m.relative_volume(), 0.0);
    }
}

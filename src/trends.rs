//! Trend and anomaly analysis over a signal's stored history.
//!
//! Direction comes from an ordinary least-squares slope over the point
//! index, with a dead zone so near-flat series read as flat. Anomalies are
//! z-scores against the series' own mean and sample standard deviation.

/// Slope magnitude below which a series reads as flat.
pub const TREND_DEAD_ZONE: f64 = 0.1;

/// |z| at or above which a point is anomalous.
pub const ANOMALY_THRESHOLD: f64 = 2.0;

/// Minimum series length for anomaly detection.
pub const ANOMALY_MIN_POINTS: usize = 5;

/// Direction of a series over its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
    /// Fewer than three points; no slope worth reporting.
    InsufficientData,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Flat => "flat",
            Self::InsufficientData => "insufficient-data",
        }
    }
}

/// A point flagged by the z-score pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalousPoint {
    /// Index into the analyzed series.
    pub index: usize,
    pub value: f64,
    pub z_score: f64,
}

/// Full statistics for one signal's window.
#[derive(Debug, Clone)]
pub struct TrendReport {
    /// Most recent value in the series.
    pub current: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Standard deviation as a percentage of the mean; zero when the mean
    /// is zero.
    pub volatility_pct: f64,
    pub direction: TrendDirection,
    pub data_points: usize,
    pub anomalies: Vec<AnomalousPoint>,
}

/// Outcome of analyzing a series.
#[derive(Debug, Clone)]
pub enum TrendAnalysis {
    /// Fewer than two finite points; nothing to report.
    InsufficientData { points: usize },
    Stats(TrendReport),
}

/// Analyze a series ordered oldest first, using the default anomaly
/// threshold. Non-finite values are dropped before any statistics.
pub fn analyze(series: &[f64]) -> TrendAnalysis {
    analyze_with_threshold(series, ANOMALY_THRESHOLD)
}

pub fn analyze_with_threshold(series: &[f64], anomaly_threshold: f64) -> TrendAnalysis {
    let values: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    let n = values.len();
    if n < 2 {
        return TrendAnalysis::InsufficientData { points: n };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let volatility_pct = if mean != 0.0 {
        (std_dev / mean).abs() * 100.0
    } else {
        0.0
    };

    let direction = if n < 3 {
        TrendDirection::InsufficientData
    } else {
        let slope = ols_slope(&values);
        if slope > TREND_DEAD_ZONE {
            TrendDirection::Rising
        } else if slope < -TREND_DEAD_ZONE {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        }
    };

    let anomalies = if n >= ANOMALY_MIN_POINTS {
        values
            .iter()
            .enumerate()
            .filter_map(|(index, &value)| {
                // A constant series has no outliers.
                let z_score = if std_dev == 0.0 {
                    0.0
                } else {
                    (value - mean) / std_dev
                };
                (z_score.abs() > anomaly_threshold).then_some(AnomalousPoint {
                    index,
                    value,
                    z_score,
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    TrendAnalysis::Stats(TrendReport {
        current: values[n - 1],
        mean,
        std_dev,
        min,
        max,
        volatility_pct,
        direction,
        data_points: n,
        anomalies,
    })
}

/// OLS slope of value against point index.
fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    // den is zero only for a single point, excluded by the caller.
    num / den
}

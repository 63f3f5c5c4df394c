use serde::Serialize;

/// Box metrics over all classes from a validation run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionMetrics {
    pub precision: f64,
    pub recall: f64,
    pub map50: f64,
    pub map50_95: f64,
}

/// Picks the last `all` row of the framework's validation table.
///
/// The row reads `all <images> <instances> <P> <R> <mAP50> <mAP50-95>`.
pub fn parse_val_summary<S: AsRef<str>>(lines: &[S]) -> Option<DetectionMetrics> {
    lines.iter().rev().find_map(|line| {
        let fields: Vec<&str> = line.as_ref().split_whitespace().collect();
        if fields.first() != Some(&"all") || fields.len() < 7 {
            return None;
        }
        let tail = &fields[fields.len() - 4..];
        let nums = tail
            .iter()
            .map(|f| f.parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(DetectionMetrics {
            precision: nums[0],
            recall: nums[1],
            map50: nums[2],
            map50_95: nums[3],
        })
    })
}

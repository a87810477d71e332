use chrono::{DateTime, Utc};

use super::TimeSeries;
use crate::models::DailyResponse;
use crate::{ClimateError, Result};

/// Build a date-indexed series from one variable of a daily block.
///
/// Timestamps run from the block start up to, but excluding, the block
/// end at the block interval. The number of generated timestamps must
/// match the variable's value count exactly.
pub fn build_series(response: &DailyResponse, variable_index: usize) -> Result<TimeSeries> {
    let variable = response.variable(variable_index).ok_or_else(|| {
        ClimateError::data_integrity(format!(
            "variable index {variable_index} out of range for {} variables",
            response.variables_length()
        ))
    })?;

    let timestamps = time_range(response.time(), response.time_end(), response.interval())?;

    if timestamps.len() != variable.values().len() {
        return Err(ClimateError::data_integrity(format!(
            "daily block for '{}' spans {} timestamps but '{}' has {} values",
            response.model(),
            timestamps.len(),
            variable.name(),
            variable.values().len()
        )));
    }

    TimeSeries::new(timestamps, variable.values().to_vec())
}

/// Left-inclusive, right-exclusive range of unix-second timestamps
fn time_range(start: i64, end: i64, interval: i64) -> Result<Vec<DateTime<Utc>>> {
    if interval <= 0 {
        return Err(ClimateError::data_integrity(format!(
            "interval must be positive, got {interval}s"
        )));
    }
    if start > end {
        return Err(ClimateError::data_integrity(format!(
            "block start {start} is after block end {end}"
        )));
    }

    let to_datetime = |secs: i64| {
        DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            ClimateError::data_integrity(format!("timestamp {secs} is out of range"))
        })
    };

    to_datetime(start)?;
    to_datetime(end)?;

    let span = end - start;
    let count = span / interval + i64::from(span % interval != 0);

    (0..count)
        .map(|i| {
            i.checked_mul(interval)
                .and_then(|offset| start.checked_add(offset))
                .ok_or_else(|| {
                    ClimateError::data_integrity(format!(
                        "timestamp {i} of block starting at {start} overflows"
                    ))
                })
                .and_then(to_datetime)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyVariable, Location};
    use chrono::TimeDelta;

    const DAY: i64 = 86_400;
    // 2020-01-01T00:00:00Z
    const JAN_1_2020: i64 = 1_577_836_800;

    fn block(time: i64, time_end: i64, interval: i64, values: Vec<f64>) -> DailyResponse {
        DailyResponse::new(
            "CMCC_CM2_VHR4",
            Location::new(52.52, 13.41),
            time,
            time_end,
            interval,
            vec![DailyVariable::new("temperature_2m_max", values)],
        )
    }

    #[test]
    fn test_three_days() {
        let response = block(JAN_1_2020, JAN_1_2020 + 3 * DAY, DAY, vec![10.0, 12.0, 11.0]);
        let series = build_series(&response, 0).unwrap();

        assert_eq!(
            series.date_strings(),
            vec!["2020-01-01", "2020-01-02", "2020-01-03"]
        );
        assert_eq!(series.values(), &[10.0, 12.0, 11.0]);
    }

    #[test]
    fn test_constant_spacing_and_length() {
        let values: Vec<f64> = (0..40).map(f64::from).collect();
        let response = block(JAN_1_2020, JAN_1_2020 + 40 * DAY, DAY, values.clone());
        let series = build_series(&response, 0).unwrap();

        assert_eq!(series.len(), values.len());
        assert!(
            series
                .timestamps()
                .windows(2)
                .all(|pair| pair[1] - pair[0] == TimeDelta::seconds(DAY))
        );
    }

    #[test]
    fn test_deterministic() {
        let response = block(JAN_1_2020, JAN_1_2020 + 3 * DAY, DAY, vec![1.5, f64::NAN, 2.5]);
        let first = serde_json::to_string(&build_series(&response, 0).unwrap()).unwrap();
        let second = serde_json::to_string(&build_series(&response, 0).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_length_mismatch_is_integrity_error() {
        let response = block(JAN_1_2020, JAN_1_2020 + 3 * DAY, DAY, vec![10.0, 12.0]);
        let result = build_series(&response, 0);
        assert!(matches!(result, Err(ClimateError::DataIntegrity { .. })));
    }

    #[test]
    fn test_partial_interval_is_counted() {
        // End falls mid-interval: the last timestamp is still strictly before it
        let response = block(JAN_1_2020, JAN_1_2020 + 2 * DAY + 1, DAY, vec![1.0, 2.0, 3.0]);
        let series = build_series(&response, 0).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_empty_block() {
        let response = block(JAN_1_2020, JAN_1_2020, DAY, Vec::new());
        let series = build_series(&response, 0).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_invalid_bounds() {
        let zero_interval = block(JAN_1_2020, JAN_1_2020 + DAY, 0, vec![1.0]);
        assert!(matches!(
            build_series(&zero_interval, 0),
            Err(ClimateError::DataIntegrity { .. })
        ));

        let reversed = block(JAN_1_2020 + DAY, JAN_1_2020, DAY, Vec::new());
        assert!(matches!(
            build_series(&reversed, 0),
            Err(ClimateError::DataIntegrity { .. })
        ));
    }

    #[test]
    fn test_variable_index_out_of_range() {
        let response = block(JAN_1_2020, JAN_1_2020 + DAY, DAY, vec![1.0]);
        assert!(matches!(
            build_series(&response, 1),
            Err(ClimateError::DataIntegrity { .. })
        ));
    }

    #[test]
    fn test_last_step_near_chrono_upper_bound() {
        // One step past the final timestamp is beyond the representable range
        let response = block(0, 8_200_000_000_000, 5_000_000_000_000, vec![1.0, 2.0]);
        let series = build_series(&response, 0).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps()[1].timestamp(), 5_000_000_000_000);
    }

    #[test]
    fn test_huge_interval_single_point() {
        let response = block(JAN_1_2020, JAN_1_2020 + DAY, i64::MAX, vec![7.0]);
        let series = build_series(&response, 0).unwrap();
        assert_eq!(series.values(), &[7.0]);
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let response = block(0, i64::MAX, DAY, vec![1.0]);
        assert!(matches!(
            build_series(&response, 0),
            Err(ClimateError::DataIntegrity { .. })
        ));
    }
}

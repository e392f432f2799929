use std::{
    fmt::Debug,
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use derive_more::{Display, From};
use thiserror::Error;

use crate::client::global_client;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("metric value is not finite: {0}")]
    NonFiniteValue(f64),
    #[error("metric value is not a number: {0:?}")]
    InvalidValue(String),
    #[error("timestamp is not finite: {0}")]
    NonFiniteTimestamp(f64),
    #[error("timestamp doesn't fit in integer seconds: {0}")]
    TimestampOutOfRange(f64),
    #[error("timestamp is not a number: {0:?}")]
    InvalidTimestamp(String),
}

/// A numeric sample as it appears on the wire.
/// Floats are always finite, non-finite inputs are rejected by [ToMetricValue].
#[derive(Clone, Copy, Debug, PartialEq, Display)]
pub enum MetricValue {
    #[display("{_0}")]
    Int(i64),
    #[display("{_0}")]
    UInt(u64),
    #[display("{_0}")]
    Float(f64),
}

/// Fallible coercion into a [MetricValue]. Failing here is the "bad data"
/// case: the emitter logs it and hands back its sentinel instead of erroring.
pub trait ToMetricValue {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError>;
}

macro_rules! signed_metric_value {
    ($($t:ty),*) => {
        $(
            impl ToMetricValue for $t {
                fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
                    Ok(MetricValue::Int(*self as i64))
                }
            }
        )*
    };
}

macro_rules! unsigned_metric_value {
    ($($t:ty),*) => {
        $(
            impl ToMetricValue for $t {
                fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
                    Ok(MetricValue::UInt(*self as u64))
                }
            }
        )*
    };
}

signed_metric_value!(i8, i16, i32, i64, isize);
unsigned_metric_value!(u8, u16, u32, u64, usize);

fn finite_float(value: f64) -> Result<MetricValue, FormatError> {
    if value.is_finite() {
        Ok(MetricValue::Float(value))
    } else {
        Err(FormatError::NonFiniteValue(value))
    }
}

impl ToMetricValue for f64 {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        finite_float(*self)
    }
}

impl ToMetricValue for f32 {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        finite_float(f64::from(*self))
    }
}

/// Elapsed durations go out as fractional seconds.
impl ToMetricValue for Duration {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        finite_float(self.as_secs_f64())
    }
}

impl ToMetricValue for MetricValue {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        Ok(*self)
    }
}

impl ToMetricValue for str {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        let trimmed = self.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Ok(MetricValue::Int(v));
        }
        if let Ok(v) = trimmed.parse::<u64>() {
            return Ok(MetricValue::UInt(v));
        }
        match trimmed.parse::<f64>() {
            Ok(v) => finite_float(v),
            Err(_) => Err(FormatError::InvalidValue(self.to_string())),
        }
    }
}

impl ToMetricValue for String {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        self.as_str().to_metric_value()
    }
}

impl<T: ToMetricValue + ?Sized> ToMetricValue for &T {
    fn to_metric_value(&self) -> Result<MetricValue, FormatError> {
        (**self).to_metric_value()
    }
}

/// Seconds since the unix epoch. Fractional seconds are kept at capture and
/// truncated when the line is formatted.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, From)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn now() -> Self {
        SystemTime::now().into()
    }
    pub const fn from_secs_f64(secs: f64) -> Self {
        Self(secs)
    }
    pub fn from_secs(secs: i64) -> Self {
        Self(secs as f64)
    }
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }
    /// Truncates toward zero, the same as the integer field of the wire line.
    pub fn to_wire_secs(&self) -> Result<i64, FormatError> {
        if !self.0.is_finite() {
            return Err(FormatError::NonFiniteTimestamp(self.0));
        }
        let truncated = self.0.trunc();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range
        if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
            return Err(FormatError::TimestampOutOfRange(self.0));
        }
        Ok(truncated as i64)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        };
        Self(secs)
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self::from_secs(secs)
    }
}

impl FromStr for Timestamp {
    type Err = FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map(Self)
            .map_err(|_| FormatError::InvalidTimestamp(s.to_string()))
    }
}

/// One plaintext protocol line, `"<name> <value> <timestamp>"`, without the
/// trailing newline. [MetricLine::to_payload] adds it.
#[derive(Clone, Debug, PartialEq, Display)]
#[display("{name} {value} {timestamp}")]
pub struct MetricLine {
    name: String,
    value: MetricValue,
    timestamp: i64,
}

impl MetricLine {
    pub fn format<V: ToMetricValue>(
        name: &str,
        value: V,
        timestamp: Timestamp,
    ) -> Result<Self, FormatError> {
        let value = value.to_metric_value()?;
        let timestamp = timestamp.to_wire_secs()?;
        Ok(Self {
            name: name.to_string(),
            value,
            timestamp,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn value(&self) -> MetricValue {
        self.value
    }
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
    pub fn to_payload(&self) -> String {
        format!("{self}\n")
    }
}

/// A metric name that can live in a `const`, see [metric!](crate::metric!).
/// The helpers on it go through the [global client](crate::client::global_client).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MetricName<'a>(&'a str);

impl<'a> MetricName<'a> {
    pub const fn new(name: &'a str) -> Self {
        Self(name)
    }
    pub fn get_name(&self) -> &'a str {
        self.0
    }
    pub fn emit<V>(&self, value: V, timestamp: Option<Timestamp>) -> Option<String>
    where
        V: ToMetricValue + Debug,
    {
        global_client().emit(self.0, value, timestamp)
    }
    pub fn event(&self) -> Option<String> {
        global_client().emit_event(self.0, None)
    }
    pub fn measure_sync_fn<T, F: FnOnce() -> T>(&self, f: F) -> T {
        global_client().time_and_emit(self.0).measure_sync_fn(f)
    }
}

impl AsRef<str> for MetricName<'_> {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl<'a> From<MetricName<'a>> for &'a str {
    fn from(m: MetricName<'a>) -> Self {
        m.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::metric;

    metric!(TEST_METRIC, "gstat.test.metric");

    #[test]
    fn test_line_formatting() {
        let line = MetricLine::format("gstat.test.testcase", 657, Timestamp::from_secs(789))
            .expect("integer values always format");
        assert_eq!(line.to_string(), "gstat.test.testcase 657 789");
        assert_eq!(line.to_payload(), "gstat.test.testcase 657 789\n");

        let line = MetricLine::format("gstat.test.testcase", 647.3, Timestamp::from_secs(789))
            .expect("finite floats always format");
        assert_eq!(line.to_string(), "gstat.test.testcase 647.3 789");
    }

    #[test]
    fn test_timestamp_truncates() {
        let ts = Timestamp::from_secs_f64(1_700_000_000.987);
        assert_eq!(ts.to_wire_secs(), Ok(1_700_000_000));
        let ts = Timestamp::from_secs_f64(-5.5);
        assert_eq!(ts.to_wire_secs(), Ok(-5));
    }

    #[test]
    fn test_bad_values_dont_format() {
        assert_eq!(
            MetricLine::format("gstat.test", "a", Timestamp::from_secs(1)),
            Err(FormatError::InvalidValue("a".to_string()))
        );
        assert!(matches!(
            MetricLine::format("gstat.test", f64::NAN, Timestamp::from_secs(1)),
            Err(FormatError::NonFiniteValue(_))
        ));
        assert_eq!(
            MetricLine::format("gstat.test", 1, Timestamp::from_secs_f64(f64::INFINITY)),
            Err(FormatError::NonFiniteTimestamp(f64::INFINITY))
        );
        assert!(matches!(
            MetricLine::format("gstat.test", 1, Timestamp::from_secs_f64(1e30)),
            Err(FormatError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn test_text_values() {
        assert_eq!("42".to_metric_value(), Ok(MetricValue::Int(42)));
        assert_eq!(
            "18446744073709551615".to_metric_value(),
            Ok(MetricValue::UInt(u64::MAX))
        );
        assert_eq!(" 0.25 ".to_metric_value(), Ok(MetricValue::Float(0.25)));
        assert!("inf".to_metric_value().is_err());
        assert!("".to_metric_value().is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!("789".parse::<Timestamp>(), Ok(Timestamp::from_secs(789)));
        assert_eq!(
            "a".parse::<Timestamp>(),
            Err(FormatError::InvalidTimestamp("a".to_string()))
        );
    }

    #[test]
    fn test_now_is_close_to_system_time() {
        let expected = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();
        let now = Timestamp::now().as_secs_f64();
        assert!((now - expected).abs() < 2.0);
    }

    #[test]
    fn test_metric_macro() {
        assert_eq!(TEST_METRIC.get_name(), "gstat.test.metric");
        let name: &str = TEST_METRIC.into();
        assert_eq!(name, "gstat.test.metric");
    }

    #[test]
    fn test_metric_name_uses_global_client() {
        // No test in this crate sets CARBON_HOST, so the global client stays in debug mode.
        std::env::remove_var(crate::config::CARBON_HOST_ENV);
        assert_eq!(
            TEST_METRIC
                .emit(5.0, Some(Timestamp::from_secs(7)))
                .as_deref(),
            Some("(debug) gstat.test.metric 5 7")
        );
        let event = TEST_METRIC.event().unwrap();
        let fields: Vec<&str> = event.split_whitespace().collect();
        assert_eq!(fields[..3], ["(debug)", "gstat.test.metric", "1"]);
        assert_eq!(TEST_METRIC.measure_sync_fn(|| 3), 3);
    }
}

use std::fmt::Debug;

use thiserror::Error;

use crate::metric::ToMetricValue;

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("expected a \"<metric> <value>\" pair, got: {0:?}")]
    NotAPair(String),
}

/// Anything a batch can be built from. Tuples always unpack; text lines only
/// unpack when they hold exactly two whitespace-separated fields.
pub trait IntoMetricPair {
    type Value: ToMetricValue + Debug;
    fn into_metric_pair(self) -> Result<(String, Self::Value), BatchError>;
}

impl<M, V> IntoMetricPair for (M, V)
where
    M: Into<String>,
    V: ToMetricValue + Debug,
{
    type Value = V;
    fn into_metric_pair(self) -> Result<(String, V), BatchError> {
        Ok((self.0.into(), self.1))
    }
}

impl<M, V> IntoMetricPair for &(M, V)
where
    M: AsRef<str>,
    V: ToMetricValue + Debug + Clone,
{
    type Value = V;
    fn into_metric_pair(self) -> Result<(String, V), BatchError> {
        Ok((self.0.as_ref().to_string(), self.1.clone()))
    }
}

impl IntoMetricPair for &str {
    type Value = String;
    fn into_metric_pair(self) -> Result<(String, String), BatchError> {
        let mut fields = self.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(metric), Some(value), None) => Ok((metric.to_string(), value.to_string())),
            _ => Err(BatchError::NotAPair(self.to_string())),
        }
    }
}

impl IntoMetricPair for String {
    type Value = String;
    fn into_metric_pair(self) -> Result<(String, String), BatchError> {
        self.as_str().into_metric_pair()
    }
}

/// Unpacks the whole batch up front so a malformed element sends nothing.
pub(crate) fn collect_pairs<I, P>(metrics: I) -> Result<Vec<(String, P::Value)>, BatchError>
where
    I: IntoIterator<Item = P>,
    P: IntoMetricPair,
{
    metrics
        .into_iter()
        .map(IntoMetricPair::into_metric_pair)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tuples_unpack() {
        let pairs = collect_pairs([("gstat.test.one", 1), ("gstat.test.two", 2)]).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("gstat.test.one".to_string(), 1),
                ("gstat.test.two".to_string(), 2)
            ]
        );
        let borrowed = vec![("gstat.test.three".to_string(), 3.5)];
        let pairs = collect_pairs(&borrowed).unwrap();
        assert_eq!(pairs, vec![("gstat.test.three".to_string(), 3.5)]);
    }

    #[test]
    fn test_lines_unpack() {
        let pairs = collect_pairs("gstat.test.one 1\ngstat.test.two  2.5".lines()).unwrap();
        assert_eq!(pairs[0], ("gstat.test.one".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("gstat.test.two".to_string(), "2.5".to_string()));
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(
            collect_pairs(["gstat.test.one 1", "7"]),
            Err(BatchError::NotAPair("7".to_string()))
        );
        assert!(collect_pairs(["gstat.test.one 1 789"]).is_err());
        assert!(collect_pairs([""]).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let empty: [(&str, i64); 0] = [];
        assert_eq!(collect_pairs(empty), Ok(vec![]));
    }
}

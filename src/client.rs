use std::{fmt::Debug, io};

use derive_more::Display;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    batch::{collect_pairs, IntoMetricPair},
    config::{ConfigError, ConfigSource, EnvConfig},
    instrument::Elapsed,
    metric::{FormatError, MetricLine, Timestamp, ToMetricValue},
    transport::{DatagramSocket, Transport, UdpTransport},
};

static GLOBAL_CLIENT: OnceCell<GstatClient> = OnceCell::new();

/// Process-wide client backing the free functions. It holds no configuration
/// of its own, [EnvConfig] is consulted on every emission.
pub fn global_client() -> &'static GstatClient {
    GLOBAL_CLIENT.get_or_init(GstatClient::default)
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("couldn't send {line:?}: {source}")]
    Transport {
        line: String,
        #[source]
        source: io::Error,
    },
}

/// What [GstatClient::try_emit] did with a line. The `Display` form is what
/// [GstatClient::emit] hands back to callers.
#[derive(Clone, Debug, PartialEq, Display)]
pub enum Emission {
    /// No host configured, the line was logged instead of sent.
    #[display("(debug) {_0}")]
    Debug(MetricLine),
    /// Handed to the socket. Whether it arrived is unknowable over UDP.
    #[display("{_0}")]
    Sent(MetricLine),
}

impl Emission {
    pub fn line(&self) -> &MetricLine {
        match self {
            Emission::Debug(line) | Emission::Sent(line) => line,
        }
    }
    pub fn was_sent(&self) -> bool {
        matches!(self, Emission::Sent(_))
    }
}

/// Emits graphite plaintext lines, one datagram per metric, fire and forget.
/// None of the `emit*` methods propagate failures: they log at error and
/// return `None`.
#[derive(Clone, Debug, Default)]
pub struct GstatClient<C = EnvConfig, T = UdpTransport> {
    config: C,
    transport: T,
}

impl GstatClient {
    pub fn from_env() -> Self {
        Self::default()
    }
}

impl<C: ConfigSource, T: Transport> GstatClient<C, T> {
    pub fn new(config: C, transport: T) -> Self {
        Self { config, transport }
    }
    pub fn with_config<C2: ConfigSource>(self, config: C2) -> GstatClient<C2, T> {
        GstatClient {
            config,
            transport: self.transport,
        }
    }

    /// Like [GstatClient::emit] but hands the failure back instead of logging it.
    pub fn try_emit<M, V>(
        &self,
        metric: M,
        value: V,
        timestamp: Option<Timestamp>,
    ) -> Result<Emission, EmitError>
    where
        M: AsRef<str>,
        V: ToMetricValue,
    {
        let timestamp = timestamp.unwrap_or_else(Timestamp::now);
        let line = MetricLine::format(metric.as_ref(), value, timestamp)?;
        let config = self.config.resolve()?;
        let Some(host) = config.host else {
            info!(target: "gstat", "gstat (debug): {line}");
            return Ok(Emission::Debug(line));
        };
        self.send(&line, &host, config.port)?;
        debug!(target: "gstat", "gstat sent: {line}");
        Ok(Emission::Sent(line))
    }

    fn send(&self, line: &MetricLine, host: &str, port: u16) -> Result<usize, EmitError> {
        let transport_error = |source: io::Error| EmitError::Transport {
            line: line.to_string(),
            source,
        };
        let payload = line.to_payload();
        // The socket lives for this one send and is released when it drops.
        let socket = self.transport.open().map_err(transport_error)?;
        socket
            .send_to(payload.as_bytes(), host, port)
            .map_err(transport_error)
    }

    /// Returns the line handed to the transport, `"(debug) <line>"` when no
    /// host is configured, or `None` if the value couldn't be formatted or the
    /// send failed.
    pub fn emit<M, V>(&self, metric: M, value: V, timestamp: Option<Timestamp>) -> Option<String>
    where
        M: AsRef<str>,
        V: ToMetricValue + Debug,
    {
        let metric = metric.as_ref();
        match self.try_emit(metric, &value, timestamp) {
            Ok(emission) => Some(emission.to_string()),
            Err(err) => {
                error!(
                    target: "gstat",
                    "emit({metric:?}, {value:?}, {timestamp:?}) failed. ignoring: {err}"
                );
                None
            }
        }
    }

    /// A one-off occurrence, sent with a value of 1.
    pub fn emit_event<M>(&self, metric: M, timestamp: Option<Timestamp>) -> Option<String>
    where
        M: AsRef<str>,
    {
        self.emit(metric, 1, timestamp)
    }

    /// Every metric in the batch carries the same timestamp. Results line up
    /// with the input; a malformed element drops the whole batch before
    /// anything is sent.
    pub fn emit_all<I, P>(
        &self,
        metrics: I,
        timestamp: Option<Timestamp>,
    ) -> Option<Vec<Option<String>>>
    where
        I: IntoIterator<Item = P>,
        P: IntoMetricPair,
    {
        let timestamp = timestamp.unwrap_or_else(Timestamp::now);
        let pairs = match collect_pairs(metrics) {
            Ok(pairs) => pairs,
            Err(err) => {
                error!(target: "gstat", "emit_all(.., {timestamp:?}) failed. ignoring: {err}");
                return None;
            }
        };
        let results = pairs
            .into_iter()
            .map(|(metric, value)| self.emit(metric, value, Some(timestamp)))
            .collect();
        Some(results)
    }
}

impl<C: ConfigSource + Clone, T: Transport + Clone> GstatClient<C, T> {
    /// Times whatever it is handed and emits the elapsed seconds under `metric`.
    pub fn time_and_emit<M: Into<String>>(&self, metric: M) -> Elapsed<C, T> {
        Elapsed::new(self.clone(), metric.into())
    }
}

pub fn emit<M, V>(metric: M, value: V, timestamp: Option<Timestamp>) -> Option<String>
where
    M: AsRef<str>,
    V: ToMetricValue + Debug,
{
    global_client().emit(metric, value, timestamp)
}

pub fn emit_event<M: AsRef<str>>(metric: M, timestamp: Option<Timestamp>) -> Option<String> {
    global_client().emit_event(metric, timestamp)
}

pub fn emit_all<I, P>(metrics: I, timestamp: Option<Timestamp>) -> Option<Vec<Option<String>>>
where
    I: IntoIterator<Item = P>,
    P: IntoMetricPair,
{
    global_client().emit_all(metrics, timestamp)
}

pub fn time_and_emit<M: Into<String>>(metric: M) -> Elapsed {
    global_client().time_and_emit(metric)
}

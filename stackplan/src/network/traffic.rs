//! Traffic classes and the service dependencies between provisioning units.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::port::Port;

/// Application protocol spoken by a traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Request/response HTTP.
    Http,
    /// Raw TCP, typically long-lived connections.
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "HTTP"),
            Self::Tcp => write!(f, "TCP"),
        }
    }
}

/// Who may reach a traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    /// Reachable from any address.
    Public,
    /// Reachable only from the deployment's private range.
    Internal,
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// A category of inbound traffic with shared routing needs.
///
/// # Examples
///
/// ```
/// use stackplan::network::{Exposure, Protocol, TrafficClass};
///
/// let ingest = TrafficClass::streaming_ingest();
/// assert_eq!(ingest.protocol, Protocol::Tcp);
/// assert!(ingest.stateful);
/// assert_eq!(ingest.exposure, Exposure::Public);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficClass {
    /// Unique identifier, e.g. `control-plane`.
    pub id: String,
    /// Protocol spoken on the port.
    pub protocol: Protocol,
    /// Listening port.
    pub port: Port,
    /// Whether connections are long-lived and must stick to one backend.
    #[serde(default)]
    pub stateful: bool,
    /// Who may reach it.
    pub exposure: Exposure,
}

impl TrafficClass {
    /// Creates a traffic class.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        protocol: Protocol,
        port: Port,
        stateful: bool,
        exposure: Exposure,
    ) -> Self {
        Self {
            id: id.into(),
            protocol,
            port,
            stateful,
            exposure,
        }
    }

    /// The web dashboard and API.
    #[must_use]
    pub fn control_plane() -> Self {
        Self::new("control-plane", Protocol::Http, Port::HTTP, false, Exposure::Public)
    }

    /// HLS playback, served over HTTP next to the control plane.
    #[must_use]
    pub fn streaming_playback() -> Self {
        Self::new(
            "streaming-playback",
            Protocol::Http,
            Port::HTTP_ALT,
            false,
            Exposure::Public,
        )
    }

    /// RTMP ingest from broadcasters.
    #[must_use]
    pub fn streaming_ingest() -> Self {
        Self::new(
            "streaming-ingest",
            Protocol::Tcp,
            Port::RTMP,
            true,
            Exposure::Public,
        )
    }

    /// The traffic classes every deployment exposes unless a registry
    /// overrides them.
    #[must_use]
    pub fn standard() -> Vec<Self> {
        vec![
            Self::control_plane(),
            Self::streaming_playback(),
            Self::streaming_ingest(),
        ]
    }
}

/// A consumer unit reaching a data service owned by a provider unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceDependency {
    /// Unit opening the connections.
    pub consumer: String,
    /// Unit owning the service.
    pub provider: String,
    /// Service name, e.g. `database`.
    pub service: String,
    /// Service port.
    pub port: Port,
}

impl ServiceDependency {
    /// Creates a service dependency edge.
    #[must_use]
    pub fn new(
        consumer: impl Into<String>,
        provider: impl Into<String>,
        service: impl Into<String>,
        port: Port,
    ) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            service: service.into(),
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_classes() {
        let classes = TrafficClass::standard();
        let ids: Vec<_> = classes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["control-plane", "streaming-playback", "streaming-ingest"]);
        assert!(classes.iter().all(|c| c.exposure == Exposure::Public));
        assert_eq!(classes[2].port.value(), 1935);
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Http.to_string(), "HTTP");
        assert_eq!(Protocol::Tcp.to_string(), "TCP");
    }

    #[test]
    fn test_traffic_class_from_yaml() {
        let yaml = "id: metrics\nprotocol: http\nport: 9090\nexposure: internal\n";
        let class: TrafficClass = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(class.id, "metrics");
        assert!(!class.stateful);
        assert_eq!(class.exposure, Exposure::Internal);
    }

    #[test]
    fn test_traffic_class_rejects_unknown_fields() {
        let yaml = "id: x\nprotocol: tcp\nport: 1\nexposure: public\nsticky: true\n";
        assert!(serde_yaml::from_str::<TrafficClass>(yaml).is_err());
    }
}

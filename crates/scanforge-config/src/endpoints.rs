//! Runner endpoint normalization (spec §6): externally-configured hosts are
//! stored as `https://host:port` (TCP) or as an absolute path (local IPC),
//! then transformed into the socket scheme the client layer actually dials.
//! The round-robin selection itself lives on the `Store` trait
//! (`find_or_advance_runner_endpoints`), not here — a real deployment's
//! cursor has to be shared across every process talking to the same
//! document store, not just within one.

/// One externally-configured runner endpoint, before transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSource {
    /// `https://host:port`.
    Tcp { host: String, port: u16 },
    /// Absolute filesystem path to a local IPC socket.
    LocalIpc { path: String },
}

/// The socket address the Daemon client layer dials, plus whether TLS
/// material should be staged for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSocket {
    pub address: String,
    pub use_tls: bool,
}

/// Transform one externally-configured endpoint into the client-layer socket
/// address (spec §6): TCP hosts become `tcp://host:port`; local IPC paths
/// become `unix://<abs-path>` with TLS material suppressed.
pub fn normalize(source: &EndpointSource) -> DaemonSocket {
    match source {
        EndpointSource::Tcp { host, port } => DaemonSocket {
            address: format!("tcp://{host}:{port}"),
            use_tls: true,
        },
        EndpointSource::LocalIpc { path } => DaemonSocket {
            address: format!("unix://{path}"),
            use_tls: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_source_normalizes_to_tcp_scheme_with_tls() {
        let s = normalize(&EndpointSource::Tcp {
            host: "daemon.internal".to_string(),
            port: 2376,
        });
        assert_eq!(s.address, "tcp://daemon.internal:2376");
        assert!(s.use_tls);
    }

    #[test]
    fn local_ipc_source_normalizes_to_unix_scheme_without_tls() {
        let s = normalize(&EndpointSource::LocalIpc {
            path: "/var/run/docker.sock".to_string(),
        });
        assert_eq!(s.address, "unix:///var/run/docker.sock");
        assert!(!s.use_tls);
    }
}

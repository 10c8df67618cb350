//! Connection establishment: socket setup, optional TLS, server greeting

use crate::config::ServerConfig;
use crate::error::{MirrorError, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use super::state::ConnectionState;
use super::{NntpClient, NntpStream};

/// TCP connection timeout in seconds
const TCP_CONNECT_TIMEOUT_SECS: u64 = 120;

/// TLS handshake timeout in seconds
const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 60;

/// Header listings are line oriented and modest in size
const BUFREADER_CAPACITY: usize = 64 * 1024;

/// Receive buffer requested from the OS for long HDR listings
const RECV_BUFFER_SIZE: usize = 1024 * 1024;

/// Certificate verifier that accepts everything
///
/// **Security Warning:** Only installed when `allow_insecure_tls` is set.
#[derive(Debug)]
pub(super) struct DangerousAcceptAnyCertificate;

impl ServerCertVerifier for DangerousAcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

fn resolve(config: &ServerConfig) -> Result<SocketAddr> {
    let addr = format!("{}:{}", config.host, config.port);
    addr.to_socket_addrs()
        .map_err(|e| {
            MirrorError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Failed to resolve address {}: {}", addr, e),
            ))
        })?
        .next()
        .ok_or_else(|| {
            MirrorError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("No address resolved for {}", addr),
            ))
        })
}

/// Open a tuned TCP socket to `addr`
async fn open_tcp(addr: SocketAddr) -> Result<TcpStream> {
    use socket2::{Domain, Protocol, Socket, Type};

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Request/response protocol: send commands immediately
    socket.set_nodelay(true)?;

    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
        warn!(
            "Failed to set receive buffer size to {} bytes: {}",
            RECV_BUFFER_SIZE, e
        );
    }

    // socket2 connects in blocking mode; switch to non-blocking only afterwards
    let std_stream = timeout(
        Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
        tokio::task::spawn_blocking(move || -> std::io::Result<std::net::TcpStream> {
            socket.connect(&addr.into())?;
            socket.set_nonblocking(true)?;
            Ok(socket.into())
        }),
    )
    .await
    .map_err(|_| MirrorError::Timeout)?
    .map_err(|e| MirrorError::Io(std::io::Error::other(format!("Task join error: {}", e))))??;

    Ok(TcpStream::from_std(std_stream)?)
}

fn tls_connector(config: &ServerConfig) -> TlsConnector {
    use tokio_rustls::rustls::crypto::{CryptoProvider, ring};
    let _ = CryptoProvider::install_default(ring::default_provider());

    let tls_config = if config.allow_insecure_tls {
        warn!("TLS certificate validation disabled - connection vulnerable to MITM attacks");
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertificate))
            .with_no_client_auth()
    } else {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };

    TlsConnector::from(Arc::new(tls_config))
}

impl NntpClient {
    /// Connect to the NNTP server and read its greeting
    ///
    /// Uses TLS unless `config.tls` is false. Does not authenticate - call
    /// [`authenticate`](Self::authenticate) after connecting.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::Io`] - Address resolution or TCP connect failed
    /// - [`MirrorError::Tls`] - TLS handshake failed
    /// - [`MirrorError::Timeout`] - Connect or handshake timed out
    /// - [`MirrorError::Protocol`] - Server refused service in its greeting
    pub async fn connect(config: Arc<ServerConfig>) -> Result<Self> {
        debug!(
            "Connecting to NNTP server {}:{} (tls: {})",
            config.host, config.port, config.tls
        );

        let addr = resolve(&config)?;
        let tcp_stream = open_tcp(addr).await?;

        let stream: Box<dyn NntpStream> = if config.tls {
            let connector = tls_connector(&config);
            let server_name = ServerName::try_from(config.host.as_str())
                .map_err(|e| MirrorError::Tls(format!("Invalid domain: {}", e)))?
                .to_owned();

            let tls_stream = timeout(
                Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
                connector.connect(server_name, tcp_stream),
            )
            .await
            .map_err(|_| MirrorError::Timeout)?
            .map_err(|e| MirrorError::Tls(format!("TLS handshake failed: {}", e)))?;
            Box::new(tls_stream)
        } else {
            Box::new(tcp_stream)
        };

        let mut client = Self {
            stream: BufReader::with_capacity(BUFREADER_CAPACITY, stream),
            state: ConnectionState::Ready,
            config,
            current_group: None,
            hdr_unsupported: false,
            is_broken: false,
        };

        let greeting = client.read_response().await?;
        debug!("Server greeting: {} {}", greeting.code, greeting.message);

        if !greeting.is_success() {
            return Err(MirrorError::Protocol {
                code: greeting.code,
                message: greeting.message,
            });
        }

        Ok(client)
    }
}

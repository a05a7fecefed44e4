//! Transport connection: plain or TLS byte stream to the relay.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_name;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::config::{Config, Security, TlsOptions};
use crate::error::{Error, Result};

/// A duplex byte stream that can be upgraded to TLS in place.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// Performs a TLS handshake over the already-open stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the handshake fails.
    fn upgrade_to_tls(
        self,
        server_name: &str,
        options: &TlsOptions,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self>> + Send
    where
        Self: Sized;

    /// Returns true if the stream is TLS-encrypted.
    fn is_tls(&self) -> bool;
}

/// Opens transport connections for a session.
pub trait Dialer: Send + Sync + 'static {
    /// Stream type produced by this dialer.
    type Stream: Transport;

    /// Dials the relay described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or implicit TLS handshake fails.
    fn dial(&self, config: &Config) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Dials relays over TCP, negotiating TLS up front for implicit-TLS ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Stream = SmtpStream;

    async fn dial(&self, config: &Config) -> Result<SmtpStream> {
        match config.security {
            Security::Implicit => connect_tls(config).await,
            Security::StartTls | Security::None => connect(config).await,
        }
    }
}

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl Transport for SmtpStream {
    async fn upgrade_to_tls(
        self,
        server_name: &str,
        options: &TlsOptions,
        timeout: Duration,
    ) -> Result<Self> {
        match self {
            Self::Tcp(tcp) => {
                let tls = handshake(tcp, server_name, options, timeout).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::StartTls("Stream is already TLS".into())),
        }
    }

    fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Connects to an SMTP relay over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails or times out.
pub async fn connect(config: &Config) -> Result<SmtpStream> {
    let tcp = dial_tcp(config).await?;
    Ok(SmtpStream::Tcp(tcp))
}

/// Connects to an SMTP relay over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails or times out.
pub async fn connect_tls(config: &Config) -> Result<SmtpStream> {
    let tcp = dial_tcp(config).await?;
    let tls = handshake(
        tcp,
        config.tls_server_name(),
        &config.tls,
        config.connect_timeout,
    )
    .await?;
    Ok(SmtpStream::Tls(Box::new(tls)))
}

async fn dial_tcp(config: &Config) -> Result<TcpStream> {
    let addr = (config.host.as_str(), config.port);
    tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
        .map_err(Error::from)
}

async fn handshake(
    tcp: TcpStream,
    server_name: &str,
    options: &TlsOptions,
    timeout: Duration,
) -> Result<TlsStream<TcpStream>> {
    let connector = create_tls_connector(options)?;
    let server_name = ServerName::try_from(server_name.to_string())?;

    tokio::time::timeout(timeout, connector.connect(server_name, tcp))
        .await
        .map_err(|_| Error::Timeout(timeout))?
        .map_err(Error::from)
}

/// Creates a TLS connector from the bundled roots plus any caller roots.
///
/// # Errors
///
/// Returns an error if a caller-supplied root certificate is rejected.
pub fn create_tls_connector(options: &TlsOptions) -> Result<TlsConnector> {
    let mut root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    for cert in &options.root_certificates {
        root_store.add(cert.clone())?;
    }

    let mut config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    if options.is_permissive() {
        tracing::warn!("TLS certificate verification is relaxed for this relay");
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(PermissiveVerifier {
                check_name: options.verify_peer,
            }));
    }

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Skips chain trust. Only installed when the caller opts out of peer
/// verification or allows self-signed certificates.
///
/// With `check_name` set the leaf certificate must still match the server
/// name, so allowing self-signed certificates alone keeps hostname checks.
#[derive(Debug)]
struct PermissiveVerifier {
    check_name: bool,
}

impl ServerCertVerifier for PermissiveVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        if self.check_name {
            let cert = ParsedCertificate::try_from(end_entity)?;
            verify_server_name(&cert, server_name)?;
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

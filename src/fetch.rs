use crate::error::{Error, Result};
use crate::resolve::HostPort;
use log::debug;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CertificateChain {
    certificates: Vec<CertificateDer<'static>>,
}

impl CertificateChain {
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Result<Self> {
        if certificates.is_empty() {
            return Err(Error::TlsConnection(
                "server presented no certificates".to_string(),
            ));
        }
        Ok(Self { certificates })
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    /// The certificate that gets reported on: the LAST one in the chain.
    ///
    /// This is deliberately not the leaf. The summary groups hosts by whoever
    /// sits at the top of the chain each server sends, so it picks whatever the
    /// server placed last (usually the root-most intermediate, not necessarily
    /// a CA root). Switching to `first()` changes what every report means.
    pub fn select(&self) -> &CertificateDer<'static> {
        &self.certificates[self.certificates.len() - 1]
    }
}

pub trait CertificateSource {
    fn fetch_chain(&self, host: &HostPort) -> Result<CertificateChain>;
}

// Self-signed and expired certificates must come back too: nothing is
// checked against a trust store.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
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
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

pub struct TlsFetcher {
    config: Arc<ClientConfig>,
    timeout: Duration,
}

impl TlsFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = Arc::new(AcceptAnyCertificate {
            provider: provider.clone(),
        });

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CertificateSource for TlsFetcher {
    fn fetch_chain(&self, host: &HostPort) -> Result<CertificateChain> {
        let deadline = Instant::now() + self.timeout;

        let server_name = ServerName::try_from(host.hostname().to_string()).map_err(|e| {
            Error::TlsConnection(format!("invalid server name '{}': {}", host.hostname(), e))
        })?;

        let mut sock = connect(host.as_str(), deadline)
            .map_err(|e| Error::TlsConnection(format!("dial tcp {}: {}", host, e)))?;

        let mut conn = ClientConnection::new(self.config.clone(), server_name)?;

        handshake(&mut conn, &mut sock, deadline)
            .map_err(|e| Error::TlsConnection(format!("handshake with {}: {}", host, e)))?;

        let certificates: Vec<CertificateDer<'static>> = conn
            .peer_certificates()
            .map(|certs| certs.iter().map(|c| c.clone().into_owned()).collect())
            .unwrap_or_default();

        debug!(
            "{} presented {} certificate(s) over {:?}",
            host,
            certificates.len(),
            conn.protocol_version()
        );

        conn.send_close_notify();
        let _ = conn.complete_io(&mut sock);

        CertificateChain::new(certificates)
    }
}

fn remaining(deadline: Instant) -> io::Result<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
        .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "i/o timeout"))
}

// getaddrinfo has no timeout of its own, so it runs on a helper thread and
// the caller stops waiting at the deadline. A stuck lookup thread is left
// behind to finish on its own.
fn lookup_within<F>(resolve: F, deadline: Instant) -> io::Result<Vec<SocketAddr>>
where
    F: FnOnce() -> io::Result<Vec<SocketAddr>> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let _ = sender.send(resolve());
    });

    match receiver.recv_timeout(remaining(deadline)?) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "i/o timeout during name resolution",
        )),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::other(
            "name resolution thread exited without a result",
        )),
    }
}

fn connect(addr: &str, deadline: Instant) -> io::Result<TcpStream> {
    let owned = addr.to_string();
    let addrs = lookup_within(
        move || owned.to_socket_addrs().map(|it| it.collect()),
        deadline,
    )?;

    let mut last_err = None;
    for sock_addr in addrs {
        match TcpStream::connect_timeout(&sock_addr, remaining(deadline)?) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no addresses found for host")
    }))
}

fn handshake(conn: &mut ClientConnection, sock: &mut TcpStream, deadline: Instant) -> io::Result<()> {
    while conn.is_handshaking() {
        let left = remaining(deadline)?;
        sock.set_read_timeout(Some(left))?;
        sock.set_write_timeout(Some(left))?;
        conn.complete_io(sock)?;
    }
    Ok(())
}

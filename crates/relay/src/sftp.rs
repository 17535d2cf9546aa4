//! SFTP upload over libssh2.

use std::{
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
    path::Path,
    time::Duration,
};

use {
    ssh2::{ErrorCode, Session},
    tracing::{debug, info},
};

use crate::{
    destination::Destination,
    progress::ProgressReporter,
    transport::{Transport, TransportError},
};

const CHUNK_SIZE: usize = 32 * 1024;

// libssh2 session error codes.
const ERROR_BANNER_RECV: i32 = -2;
const ERROR_TIMEOUT: i32 = -9;
const ERROR_PASSWORD_EXPIRED: i32 = -15;
const ERROR_AUTHENTICATION_FAILED: i32 = -18;
const ERROR_PUBLICKEY_UNVERIFIED: i32 = -19;
const ERROR_SOCKET_TIMEOUT: i32 = -30;
const ERROR_EAGAIN: i32 = -37;

/// Password-authenticated SFTP. Opens one session per upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpTransport;

impl SftpTransport {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, destination: &Destination) -> Result<Session, TransportError> {
        let timeout = destination.timeout();
        let addrs = (destination.host(), destination.port())
            .to_socket_addrs()
            .map_err(|e| TransportError::from_io("resolve host", &e))?;

        let mut last_err = None;
        let mut tcp = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                },
                Err(e) => last_err = Some(e),
            }
        }
        let tcp = match (tcp, last_err) {
            (Some(tcp), _) => tcp,
            (None, Some(e)) => return Err(TransportError::from_io("connect", &e)),
            (None, None) => {
                return Err(TransportError::other(format!(
                    "{} resolved to no addresses",
                    destination.host()
                )));
            },
        };
        tcp.set_read_timeout(Some(timeout))
            .and_then(|()| tcp.set_write_timeout(Some(timeout)))
            .map_err(|e| TransportError::from_io("configure socket", &e))?;

        let mut session = Session::new().map_err(|e| classify_ssh_error("start session", &e))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(millis(timeout));
        session
            .handshake()
            .map_err(|e| classify_ssh_error("handshake", &e))?;
        session
            .userauth_password(destination.username(), destination.password())
            .map_err(|e| classify_ssh_error("authenticate", &e))?;
        if !session.authenticated() {
            return Err(TransportError::auth("host did not accept the password"));
        }
        Ok(session)
    }
}

impl Transport for SftpTransport {
    fn upload(
        &self,
        destination: &Destination,
        local: &Path,
        remote_path: &str,
        progress: &ProgressReporter,
    ) -> Result<u64, TransportError> {
        let mut source =
            std::fs::File::open(local).map_err(|e| TransportError::from_io("open scratch file", &e))?;
        let total = source
            .metadata()
            .map_err(|e| TransportError::from_io("stat scratch file", &e))?
            .len();

        let session = self.connect(destination)?;
        debug!(host = destination.host(), remote_path, "sftp session open");
        let sftp = session
            .sftp()
            .map_err(|e| classify_ssh_error("start sftp", &e))?;
        let mut remote = sftp
            .create(Path::new(remote_path))
            .map_err(|e| classify_ssh_error("create remote file", &e))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut sent = 0u64;
        progress.report(0, total);
        loop {
            let n = source
                .read(&mut buf)
                .map_err(|e| TransportError::from_io("read scratch file", &e))?;
            if n == 0 {
                break;
            }
            remote
                .write_all(&buf[..n])
                .map_err(|e| classify_io_error("write remote file", &e))?;
            sent += n as u64;
            progress.report(sent, total);
        }
        remote
            .close()
            .map_err(|e| classify_ssh_error("close remote file", &e))?;
        drop(sftp);
        let _ = session.disconnect(None, "upload complete", None);

        info!(host = destination.host(), remote_path, bytes = sent, "sftp upload complete");
        Ok(sent)
    }
}

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

/// Map a libssh2 failure onto the transport taxonomy by error code.
pub fn classify_ssh_error(context: &str, err: &ssh2::Error) -> TransportError {
    let detail = format!("{context}: {}", err.message());
    match err.code() {
        ErrorCode::Session(
            ERROR_AUTHENTICATION_FAILED | ERROR_PUBLICKEY_UNVERIFIED | ERROR_PASSWORD_EXPIRED,
        ) => TransportError::auth(detail),
        ErrorCode::Session(
            ERROR_TIMEOUT | ERROR_SOCKET_TIMEOUT | ERROR_EAGAIN | ERROR_BANNER_RECV,
        ) => TransportError::timeout(detail),
        _ => TransportError::other(detail),
    }
}

/// Writes on an SFTP file surface libssh2 errors wrapped in `io::Error`.
fn classify_io_error(context: &str, err: &std::io::Error) -> TransportError {
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<ssh2::Error>())
    {
        Some(ssh) => classify_ssh_error(context, ssh),
        None => TransportError::from_io(context, err),
    }
}

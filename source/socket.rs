// Socket collaborator (spec §6): send/receive/blockSize/isSecured, with
// partial reads allowed.
//
// Generalizes the teacher's ad hoc TCP/TLS/ReadWrite split in
// source/lib.rs (an `Open` trait producing a concrete `io::Read + io::Write`
// type per transport) into a trait object the Connection can hold
// regardless of transport, so STARTTLS can swap the underlying transport in
// place (spec §4.6).

use anyhow::Context as _;
use std::{
  io::{self, Read as _, Write as _},
  net::{self, ToSocketAddrs as _},
  time,
};

pub trait Socket {
  fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
  /// May return fewer bytes than `buf.len()`.
  fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
  fn block_size(&self) -> usize {
    64 * 1024
  }
  fn is_secured(&self) -> bool;
  /// Upgrades a plaintext transport to TLS in place, for STARTTLS (spec
  /// §4.6). Transports that can't be upgraded (already-TLS, or a transport
  /// with no well-defined STARTTLS story, e.g. a test double) reject it.
  fn upgrade_to_tls(self: Box<Self>, _server_name: &str) -> anyhow::Result<Box<dyn Socket>> {
    anyhow::bail!("this transport doesn't support STARTTLS")
  }
}

/// Placeholder used to hold `Connection`'s socket slot for the instant
/// between taking the old transport out and putting the upgraded one back;
/// it's never actually read from or written to.
pub struct Null;

impl Socket for Null {
  fn send(&mut self, _bytes: &[u8]) -> io::Result<()> {
    unreachable!("Null socket is a transient placeholder")
  }

  fn receive(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
    unreachable!("Null socket is a transient placeholder")
  }

  fn is_secured(&self) -> bool {
    false
  }
}

pub struct Tcp {
  stream: net::TcpStream,
  address: String,
}

impl Tcp {
  pub fn connect(address: &str, port: u16, timeout: Option<time::Duration>) -> anyhow::Result<Self> {
    let resolved = (address, port)
      .to_socket_addrs()?
      .next()
      .with_context(|| format!("couldn't resolve {address}:{port}"))?;
    log::debug!("connecting to {resolved:?} with timeout {timeout:?}");
    let stream = match timeout {
      Some(duration) => {
        let stream = net::TcpStream::connect_timeout(&resolved, duration)?;
        stream.set_read_timeout(Some(duration))?;
        stream
      }
      None => net::TcpStream::connect(resolved)?,
    };
    Ok(Self { stream, address: address.to_string() })
  }
}

impl Socket for Tcp {
  fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
    self.stream.write_all(bytes)
  }

  fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.stream.read(buf)
  }

  fn is_secured(&self) -> bool {
    false
  }

  fn upgrade_to_tls(self: Box<Self>, server_name: &str) -> anyhow::Result<Box<dyn Socket>> {
    Ok(Box::new(Tls::from_stream(self.stream, server_name)?))
  }
}

// ouroboros::self_referencing is used here exactly as in the teacher's
// TLSStream (source/lib.rs): rustls::Stream<'a, ...> borrows both the
// connection state and the transport, so the pair must be self-referential
// to be stored behind a single owned value.
#[ouroboros::self_referencing]
struct TlsInner {
  tcp: net::TcpStream,
  connection: rustls::ClientConnection,
  #[borrows(mut tcp, mut connection)]
  #[covariant]
  stream: rustls::Stream<'this, rustls::ClientConnection, net::TcpStream>,
}

pub struct Tls {
  inner: TlsInner,
}

impl Tls {
  pub fn connect(address: &str, port: u16, timeout: Option<time::Duration>) -> anyhow::Result<Self> {
    let Tcp { stream: tcp, .. } = Tcp::connect(address, port, timeout)?;
    Self::from_stream(tcp, address)
  }

  /// Wraps an already-connected TCP stream in a TLS session, for STARTTLS
  /// (spec §4.6) as well as a freshly dialed connection.
  pub fn from_stream(tcp: net::TcpStream, server_name: &str) -> anyhow::Result<Self> {
    let mut root_store = rustls::RootCertStore::empty();
    for certificate in rustls_native_certs::load_native_certs()? {
      root_store.add(&rustls::Certificate(certificate.0))?;
    }
    let connection = rustls::ClientConnection::new(
      std::sync::Arc::new(
        rustls::ClientConfig::builder()
          .with_safe_defaults()
          .with_root_certificates(root_store)
          .with_no_client_auth(),
      ),
      server_name
        .try_into()
        .with_context(|| format!("couldn't convert {server_name} to a server name"))?,
    )?;
    Ok(Self {
      inner: TlsInnerBuilder {
        tcp,
        connection,
        stream_builder: |tcp, connection| rustls::Stream::new(connection, tcp),
      }
      .build(),
    })
  }
}

impl Socket for Tls {
  fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
    self.inner.with_mut(|fields| fields.stream.write_all(bytes))
  }

  fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.inner.with_mut(|fields| fields.stream.read(buf))
  }

  fn is_secured(&self) -> bool {
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use test_log::test;
  use crate::testing::Mock;

  #[test]
  fn mock_roundtrips_bytes() {
    let mut socket = Mock::with_server_bytes(b"hello");
    socket.send(b"a001 NOOP\r\n").unwrap();
    assert_eq!(b"a001 NOOP\r\n".to_vec(), socket.sent());
    let mut buf = [0; 5];
    assert_eq!(5, socket.receive(&mut buf).unwrap());
    assert_eq!(b"hello", &buf);
  }
}

use crate::config::ProbeConfig;
use crate::constants::DEFAULT_IO_MAX_SIZE;
use crate::error::KrbError;
use crate::proto::build_as_req;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{debug, error, instrument, trace};

const LEN_PREFIX_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Tcp,
    Udp,
}

/// RFC 4120 section 7.2.2: each message on a TCP stream is preceded by its
/// length as 4 octets in network byte order.
pub struct KerberosTcpCodec {
    max_size: usize,
}

impl KerberosTcpCodec {
    pub fn new(max_size: usize) -> Self {
        KerberosTcpCodec { max_size }
    }
}

impl Default for KerberosTcpCodec {
    fn default() -> Self {
        KerberosTcpCodec {
            max_size: DEFAULT_IO_MAX_SIZE,
        }
    }
}

impl Decoder for KerberosTcpCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < LEN_PREFIX_SIZE {
            return Ok(None);
        }

        let mut len_bytes = [0u8; LEN_PREFIX_SIZE];
        len_bytes.copy_from_slice(&buf[..LEN_PREFIX_SIZE]);
        let frame_len = u32::from_be_bytes(len_bytes) as usize;

        // The high bit is reserved for extensions (RFC 4120 section 7.2.2),
        // a value that large is caught here too.
        if frame_len > self.max_size {
            error!(frame_len, max_size = self.max_size, "reply frame too large");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "reply frame exceeds the maximum size",
            ));
        }

        if buf.len() < LEN_PREFIX_SIZE + frame_len {
            buf.reserve(LEN_PREFIX_SIZE + frame_len - buf.len());
            return Ok(None);
        }

        buf.advance(LEN_PREFIX_SIZE);
        Ok(Some(buf.split_to(frame_len).freeze()))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed inside a frame",
            )),
        }
    }
}

impl Encoder<&[u8]> for KerberosTcpCodec {
    type Error = io::Error;

    fn encode(&mut self, der_bytes: &[u8], buf: &mut BytesMut) -> io::Result<()> {
        let d_len = u32::try_from(der_bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "request too large"))?;

        buf.reserve(LEN_PREFIX_SIZE + der_bytes.len());
        buf.put_u32(d_len);
        buf.extend_from_slice(der_bytes);

        Ok(())
    }
}

fn map_read_error(err: io::Error) -> KrbError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => KrbError::TransportClosed,
        io::ErrorKind::InvalidData => KrbError::ReplyTooLarge,
        _ => {
            error!(?err, "failed to read reply");
            KrbError::IoError(err)
        }
    }
}

/// Build a salt probe for `principal_name@realm`, send it to the KDC on port
/// 88 and return the raw reply.
pub async fn send_as_req(
    server_host: &str,
    principal_name: &str,
    realm: &str,
    use_udp: bool,
) -> Result<Vec<u8>, KrbError> {
    let config = ProbeConfig {
        transport: if use_udp { Transport::Udp } else { Transport::Tcp },
        ..Default::default()
    };
    send_as_req_with(&config, server_host, principal_name, realm).await
}

#[instrument(level = "debug", skip(config), fields(transport = ?config.transport, port = config.port))]
pub async fn send_as_req_with(
    config: &ProbeConfig,
    server_host: &str,
    principal_name: &str,
    realm: &str,
) -> Result<Vec<u8>, KrbError> {
    let request = build_as_req(principal_name, realm)?;
    exchange(config, server_host, &request).await
}

/// One request, one reply. Sockets are dropped on every return path.
pub(crate) async fn exchange(
    config: &ProbeConfig,
    server_host: &str,
    request: &[u8],
) -> Result<Vec<u8>, KrbError> {
    let reply = match config.transport {
        Transport::Tcp => {
            tcp_exchange(
                server_host,
                config.port,
                config.timeout(),
                config.max_reply_size,
                request,
            )
            .await?
        }
        Transport::Udp => {
            udp_exchange(
                server_host,
                config.port,
                config.timeout(),
                config.max_reply_size,
                request,
            )
            .await?
        }
    };

    debug!(reply_len = reply.len(), "received reply");
    Ok(reply)
}

async fn tcp_exchange(
    host: &str,
    port: u16,
    io_timeout: Duration,
    max_size: usize,
    request: &[u8],
) -> Result<Vec<u8>, KrbError> {
    let stream = timeout(io_timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| {
            error!(%host, port, "timed out connecting to KDC");
            KrbError::TransportTimeout
        })?
        .map_err(|err| {
            error!(?err, %host, port, "unable to connect to KDC");
            KrbError::IoError(err)
        })?;

    let mut krb_stream = Framed::new(stream, KerberosTcpCodec::new(max_size));

    timeout(io_timeout, tcp_round_trip(&mut krb_stream, request))
        .await
        .map_err(|_| {
            error!(%host, port, "timed out waiting for KDC reply");
            KrbError::TransportTimeout
        })?
}

async fn tcp_round_trip(
    krb_stream: &mut Framed<TcpStream, KerberosTcpCodec>,
    request: &[u8],
) -> Result<Vec<u8>, KrbError> {
    krb_stream.send(request).await.map_err(|err| {
        error!(?err, "failed to transmit request");
        KrbError::IoError(err)
    })?;
    trace!("request sent");

    match krb_stream.next().await {
        Some(Ok(reply)) => Ok(reply.to_vec()),
        Some(Err(err)) => Err(map_read_error(err)),
        None => {
            error!("KDC closed the connection without replying");
            Err(KrbError::TransportClosed)
        }
    }
}

async fn udp_exchange(
    host: &str,
    port: u16,
    io_timeout: Duration,
    max_size: usize,
    request: &[u8],
) -> Result<Vec<u8>, KrbError> {
    let addr = lookup_host((host, port))
        .await
        .map_err(|err| {
            error!(?err, %host, "unable to resolve KDC");
            KrbError::IoError(err)
        })?
        .next()
        .ok_or_else(|| {
            error!(%host, "KDC resolved to no addresses");
            KrbError::NoAddress
        })?;

    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let sock = UdpSocket::bind(local).await?;
    sock.connect(addr).await?;
    sock.send(request).await?;
    trace!(%addr, "request sent");

    // Anything past max_size is discarded by the socket.
    let mut buf = vec![0u8; max_size];
    let len = timeout(io_timeout, sock.recv(&mut buf))
        .await
        .map_err(|_| {
            error!(%addr, "timed out waiting for KDC reply");
            KrbError::TransportTimeout
        })?
        .map_err(|err| {
            error!(?err, %addr, "failed to receive reply");
            KrbError::IoError(err)
        })?;

    buf.truncate(len);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::{exchange, send_as_req_with, KerberosTcpCodec, Transport};
    use crate::asn1::krb_message::KrbMessage;
    use crate::config::ProbeConfig;
    use crate::error::{ErrorKind, KrbError};
    use bytes::BytesMut;
    use der::Decode;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream, UdpSocket};
    use tokio_util::codec::{Decoder, Encoder};

    // KRB-ERROR KDC_ERR_PREAUTH_REQUIRED from an AD domain controller.
    const AD_PREAUTH_REQUIRED: &str = "7e81a93081a6a003020105a10302011ea411180f32303234303631323131343830355aa505020301dc66a603020119a90c1b0a41464f524553542e4144aa1f301da003020102a11630141b066b72627467741b0a41464f524553542e4144ac4c044a30483025a103020113a21e041c301a3018a003020112a1111b0f41464f524553542e414475736572313009a103020102a20204003009a103020110a20204003009a10302010fa2020400";

    fn config(port: u16, transport: Transport) -> ProbeConfig {
        ProbeConfig {
            port,
            transport,
            timeout_secs: 1,
            ..Default::default()
        }
    }

    async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let len = stream.read_u32().await.unwrap();
        let mut request = vec![0u8; len as usize];
        stream.read_exact(&mut request).await.unwrap();
        request
    }

    #[test]
    fn codec_frames() {
        let mut codec = KerberosTcpCodec::default();

        let mut buf = BytesMut::new();
        codec.encode(&[0x30, 0x00][..], &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x00, 0x00, 0x02, 0x30, 0x00]);

        // Short prefix, then short body.
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&[0x03, 0xaa, 0xbb]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&[0xcc, 0x01]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &[0xaa, 0xbb, 0xcc]);
        // The next frame's bytes are left in place.
        assert_eq!(&buf[..], &[0x01]);

        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn codec_rejects_oversized_frames() {
        let mut codec = KerberosTcpCodec::new(16);
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00, 0x11][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

        let mut buf = BytesMut::from(&[0x80, 0x00, 0x00, 0x00][..]);
        assert!(KerberosTcpCodec::default().decode(&mut buf).is_err());
    }

    #[tokio::test]
    async fn tcp_round_trip() {
        let _ = tracing_subscriber::fmt::try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reply = hex::decode(AD_PREAUTH_REQUIRED).unwrap();

        let server_reply = reply.clone();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream
                .write_u32(server_reply.len() as u32)
                .await
                .unwrap();
            stream.write_all(&server_reply).await.unwrap();
            request
        });

        let got = send_as_req_with(
            &config(port, Transport::Tcp),
            "127.0.0.1",
            "user1",
            "AFOREST.AD",
        )
        .await
        .unwrap();
        assert_eq!(got, reply);

        let request = server.await.unwrap();
        let KrbMessage::AsReq(as_req) = KrbMessage::from_der(&request).unwrap() else {
            panic!("KDC did not receive an AS-REQ");
        };
        assert_eq!(as_req.req_body.realm.as_str(), "AFOREST.AD");
        assert_eq!(
            as_req.req_body.cname.map(String::from).as_deref(),
            Some("user1")
        );
    }

    #[tokio::test]
    async fn tcp_closed_inside_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            stream.write_all(&[0x00, 0x00]).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let err = exchange(&config(port, Transport::Tcp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, KrbError::TransportClosed));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn tcp_closed_without_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
        });

        let err = exchange(&config(port, Transport::Tcp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, KrbError::TransportClosed));
    }

    #[tokio::test]
    async fn tcp_reply_too_large() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            stream.write_u32(0x0010_0000).await.unwrap();
            // Hold the stream open until the client gives up.
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink).await;
        });

        let err = exchange(&config(port, Transport::Tcp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, KrbError::ReplyTooLarge));
    }

    #[tokio::test]
    async fn tcp_receive_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = exchange(&config(port, Transport::Tcp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, KrbError::TransportTimeout));
    }

    #[tokio::test]
    async fn tcp_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = exchange(&config(port, Transport::Tcp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn udp_round_trip() {
        let _ = tracing_subscriber::fmt::try_init();

        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let reply = hex::decode(AD_PREAUTH_REQUIRED).unwrap();

        let server_reply = reply.clone();
        let server = tokio::spawn(async move {
            let mut buf = vec![0u8; 2048];
            let (len, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(&server_reply, peer).await.unwrap();
            buf.truncate(len);
            buf
        });

        let got = send_as_req_with(
            &config(port, Transport::Udp),
            "127.0.0.1",
            "user1",
            "AFOREST.AD",
        )
        .await
        .unwrap();
        assert_eq!(got, reply);

        let request = server.await.unwrap();
        assert!(matches!(
            KrbMessage::from_der(&request),
            Ok(KrbMessage::AsReq(_))
        ));
    }

    #[tokio::test]
    async fn udp_receive_timeout() {
        // Bound but silent.
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let err = exchange(&config(port, Transport::Udp), "127.0.0.1", &[0x30, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, KrbError::TransportTimeout));
        drop(server);
    }
}

use std::{
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

// Carbon's plaintext listener doesn't care where datagrams come from.
const DEFAULT_ORIGIN: &str = "0.0.0.0:0";

/// A socket acquired for exactly one send. Dropping it releases the OS
/// resource, so a socket is released on every path out of an emission.
pub trait DatagramSocket {
    fn send_to(&self, payload: &[u8], host: &str, port: u16) -> io::Result<usize>;
}

/// Hands out a fresh [DatagramSocket] per emission. Nothing is shared between
/// callers, so concurrent emissions never contend.
pub trait Transport {
    type Socket: DatagramSocket;
    fn open(&self) -> io::Result<Self::Socket>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransport;

impl Transport for UdpTransport {
    type Socket = UdpSocket;
    fn open(&self) -> io::Result<UdpSocket> {
        UdpSocket::bind(DEFAULT_ORIGIN)
    }
}

fn resolve_ipv4(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no IPv4 address for {host}:{port}"),
            )
        })
}

impl DatagramSocket for UdpSocket {
    fn send_to(&self, payload: &[u8], host: &str, port: u16) -> io::Result<usize> {
        let target = resolve_ipv4(host, port)?;
        UdpSocket::send_to(self, payload, target)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_udp_send_reaches_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let socket = UdpTransport.open().unwrap();
        let payload = b"gstat.test.udp 1 789\n";
        let sent = DatagramSocket::send_to(&socket, payload, "127.0.0.1", port).unwrap();
        assert_eq!(sent, payload.len());

        let mut buf = [0u8; 64];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], payload);
    }

    #[test]
    fn test_unresolvable_host() {
        let socket = UdpTransport.open().unwrap();
        let result = DatagramSocket::send_to(&socket, b"x 1 1\n", "no such host.invalid", 2003);
        assert!(result.is_err());
    }
}

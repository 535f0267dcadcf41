//! Integration tests for adapters_socket crate
//!
//! End-to-end workflows over loopback: stream endpoints through the
//! factory, and datagram exchange.

use adapters_socket::*;
use entities_transport::{BoundAddress, TransportError};
use std::net::Ipv4Addr;
use std::thread;

#[test]
fn test_stream_echo_through_factory() {
    let _ = env_logger::try_init();

    let factory = SocketFactory::new();
    let listening = factory
        .create_listening_endpoint(&BoundAddress::new(0, true))
        .unwrap();
    factory.start_listening(&listening, None).unwrap();
    let addr = listening.local_addr().unwrap();

    let server = thread::spawn(move || {
        let factory = SocketFactory::new();
        let (endpoint, _peer) = factory.accept_next(&listening).unwrap();
        let mut buf = [0u8; 64];
        let n = StreamEndpoint::recv(&endpoint, &mut buf).unwrap();
        StreamEndpoint::send(&endpoint, &buf[..n]).unwrap();
    });

    let client = factory.create_client_endpoint().unwrap();
    factory.connect(&client, addr).unwrap();
    StreamEndpoint::send(&client, b"echo me").unwrap();

    let mut buf = [0u8; 64];
    let n = StreamEndpoint::recv(&client, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"echo me");

    server.join().unwrap();
}

#[test]
fn test_peer_of_accepted_connection_resolves() {
    let factory = SocketFactory::new();
    let listening = factory
        .create_listening_endpoint(&BoundAddress::new(0, true))
        .unwrap();
    factory.start_listening(&listening, Some(4)).unwrap();
    let addr = listening.local_addr().unwrap();

    let client = thread::spawn(move || {
        let endpoint = SocketFactory::new().create_client_endpoint().unwrap();
        SocketFactory::new().connect(&endpoint, addr).unwrap();
        endpoint
    });

    let (_accepted, peer) = factory.accept_next(&listening).unwrap();
    let _client = client.join().unwrap();

    let resolved = SystemResolver::new().resolve(peer).unwrap();
    assert_eq!(resolved.ip(), Ipv4Addr::LOCALHOST);
    assert_eq!(resolved.port(), peer.port());
}

#[test]
fn test_datagram_exchange_with_target_address() {
    let server = DatagramEndpoint::bind(0, true).unwrap();
    let port = server.local_addr().unwrap().port();
    let target = target_address("127.0.0.1", port).unwrap();

    let client = DatagramEndpoint::unbound().unwrap();
    client.send_to(b"hello", target).unwrap();

    let (payload, source) = server.recv_from(1024).unwrap();
    assert_eq!(payload, b"hello");
    server.send_to(b"okay!", source).unwrap();

    let (reply, _) = client.recv_from(1024).unwrap();
    assert_eq!(reply, b"okay!");
}

#[test]
fn test_invalid_target_address() {
    let err = target_address("localhost.invalid", 1).unwrap_err();
    assert!(matches!(err, TransportError::InvalidAddress(_)));
}

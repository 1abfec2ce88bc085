use example_monorpc_service_definition::{Echo, Square};
use futures::FutureExt;
use monorpc::codec::{WireType, WireValue};
use monorpc::constants::DEFAULT_MAX_FRAME_SIZE;
use monorpc::frame::FramedStream;
use monorpc::rpc::{
    CallRequest, CallResponse, DescriptorError, InterfaceDescriptor, OperationDescriptor,
    RpcFailure, failure_kind,
};
use monorpc_service::{RpcOperation, WireArgs};
use monorpc_service_endpoint::RpcHandlerError;
use monorpc_tokio_server::{
    ConfigurationError, RpcServer, RpcServerConfig, RpcServerError, ServiceHandle,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn host_square(config: RpcServerConfig) -> ServiceHandle {
    init_tracing();
    RpcServer::with_config(config)
        .serve_operation::<Square, _, _, _>(0, |(x,)| async move {
            Ok::<_, Infallible>(f64::from(x) * f64::from(x))
        })
        .await
        .expect("failed to host square")
}

async fn connect(addr: SocketAddr) -> FramedStream<TcpStream> {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    FramedStream::new(stream, DEFAULT_MAX_FRAME_SIZE)
}

fn request<Op: RpcOperation>(input: Op::Input) -> Vec<u8> {
    CallRequest::new(&Op::descriptor().unwrap(), input.into_args()).encode()
}

async fn exchange(
    framed: &mut FramedStream<TcpStream>,
    payload: &[u8],
    returns: &WireType,
) -> CallResponse {
    framed.write_frame(payload).await.unwrap();
    let frame = framed
        .read_frame()
        .await
        .unwrap()
        .expect("connection closed before response");
    CallResponse::decode(&frame, returns).unwrap()
}

fn system_error_kind(response: CallResponse) -> String {
    match response {
        CallResponse::SystemError(failure) => failure.kind,
        other => panic!("expected SystemError, got {other:?}"),
    }
}

async fn assert_closed(framed: &mut FramedStream<TcpStream>) {
    let next = tokio::time::timeout(Duration::from_secs(5), framed.read_frame())
        .await
        .expect("connection was not closed");
    assert!(!matches!(next, Ok(Some(_))), "unexpected frame: {next:?}");
}

#[tokio::test]
async fn serves_sequential_calls_on_one_connection() {
    let handle = host_square(RpcServerConfig::default()).await;
    assert!(handle.is_running());
    assert_eq!(handle.interface().name(), "HelloWorld");

    let mut framed = connect(handle.local_addr()).await;
    for (x, expected) in [(5, 25.0), (-3, 9.0), (0, 0.0)] {
        let response = exchange(&mut framed, &request::<Square>((x,)), &WireType::F64).await;
        assert_eq!(response, CallResponse::Success(WireValue::F64(expected)));
    }

    handle.stop().await;
}

#[tokio::test]
async fn untyped_host_serves_descriptor_operations() {
    init_tracing();
    let echo = OperationDescriptor::new("echo", vec![WireType::Str], WireType::Str).unwrap();
    let interface = InterfaceDescriptor::of("Echo", echo);

    let handle = RpcServer::host(0, &interface, |mut args| async move {
        Ok::<_, RpcHandlerError>(args.pop().unwrap_or(WireValue::Unit))
    })
    .await
    .unwrap();

    let mut framed = connect(handle.local_addr()).await;
    let response = exchange(&mut framed, &request::<Echo>(("hi".into(),)), &WireType::Str).await;
    assert_eq!(response, CallResponse::Success(WireValue::Str("hi".into())));

    handle.stop().await;
}

#[tokio::test]
async fn interface_must_have_exactly_one_operation() {
    // Holding the port proves validation happens before any bind attempt.
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let square = Square::descriptor().unwrap();
    let cube = OperationDescriptor::new("cube", vec![WireType::I32], WireType::F64).unwrap();
    let interfaces = [
        InterfaceDescriptor::new("Empty"),
        InterfaceDescriptor::of("Calculator", square).with_operation(cube),
    ];

    for interface in &interfaces {
        let err = RpcServer::host(port, interface, |_| async {
            Ok::<_, RpcHandlerError>(WireValue::Unit)
        })
        .await
        .unwrap_err();

        assert!(err.is_configuration());
        assert!(matches!(
            err,
            RpcServerError::Configuration(ConfigurationError::Interface(
                DescriptorError::NoOperations { .. } | DescriptorError::MultipleOperations { .. }
            ))
        ));
    }
}

#[tokio::test]
async fn port_in_use_is_a_configuration_error() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let err = RpcServer::host_operation::<Square, _, _, _>(port, |(x,)| async move {
        Ok::<_, Infallible>(f64::from(x))
    })
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        RpcServerError::Configuration(ConfigurationError::AddressInUse { .. })
    ));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_binding() {
    let configs = [
        RpcServerConfig::default().with_bind_host("  "),
        RpcServerConfig::default().with_max_frame_size(4),
        RpcServerConfig::default().with_idle_timeout(Duration::ZERO),
    ];

    for config in configs {
        let err = RpcServer::with_config(config)
            .serve_operation::<Square, _, _, _>(0, |(x,)| async move {
                Ok::<_, Infallible>(f64::from(x))
            })
            .await
            .unwrap_err();
        assert!(err.is_configuration(), "{err}");
    }
}

#[tokio::test]
async fn zero_idle_timeout_is_rejected_before_binding() {
    let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = reserved.local_addr().unwrap().port();
    drop(reserved);

    let err = RpcServer::with_config(RpcServerConfig::default().with_idle_timeout(Duration::ZERO))
        .serve_operation::<Square, _, _, _>(port, |(x,)| async move {
            Ok::<_, Infallible>(f64::from(x))
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RpcServerError::Configuration(ConfigurationError::ZeroIdleTimeout)
    ));

    // Nothing was bound.
    assert!(TcpListener::bind(("127.0.0.1", port)).await.is_ok());
}

#[tokio::test]
async fn stop_is_idempotent_and_concurrent() {
    let handle = host_square(RpcServerConfig::default()).await;

    let stops = (0..4).map(|_| {
        let handle = handle.clone();
        tokio::spawn(async move { handle.stop().await })
    });
    for stop in futures::future::join_all(stops).await {
        stop.unwrap();
    }

    assert!(!handle.is_running());
    handle.stop().await;
    assert!(!handle.is_running());
}

#[tokio::test]
async fn port_can_be_rebound_after_stop() {
    let first = host_square(RpcServerConfig::default()).await;
    let port = first.local_addr().port();

    // Leave a connection behind so the port has state to clean up.
    let mut framed = connect(first.local_addr()).await;
    exchange(&mut framed, &request::<Square>((2,)), &WireType::F64).await;

    first.stop().await;
    assert!(TcpStream::connect(first.local_addr()).await.is_err());

    let second = RpcServer::host_operation::<Square, _, _, _>(port, |(x,)| async move {
        Ok::<_, Infallible>(-f64::from(x))
    })
    .await
    .expect("port was not released by stop");

    let mut framed = connect(second.local_addr()).await;
    let response = exchange(&mut framed, &request::<Square>((2,)), &WireType::F64).await;
    assert_eq!(response, CallResponse::Success(WireValue::F64(-2.0)));

    second.stop().await;
}

#[tokio::test]
async fn stop_closes_idle_connections_immediately() {
    let handle = host_square(
        RpcServerConfig::default().with_shutdown_grace_period(Duration::from_secs(10)),
    )
    .await;

    let mut framed = connect(handle.local_addr()).await;
    exchange(&mut framed, &request::<Square>((1,)), &WireType::F64).await;

    let started = Instant::now();
    handle.stop().await;
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_closed(&mut framed).await;
}

#[tokio::test]
async fn in_flight_call_finishes_during_stop() {
    init_tracing();
    let entered = Arc::new(Notify::new());

    let handle = {
        let entered = entered.clone();
        RpcServer::host_operation::<Square, _, _, _>(0, move |(x,)| {
            let entered = entered.clone();
            async move {
                entered.notify_one();
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok::<_, Infallible>(f64::from(x) * f64::from(x))
            }
        })
        .await
        .unwrap()
    };

    let mut framed = connect(handle.local_addr()).await;
    framed.write_frame(&request::<Square>((6,))).await.unwrap();
    entered.notified().await;

    let stopper = {
        let handle = handle.clone();
        tokio::spawn(async move { handle.stop().await })
    };

    let frame = framed.read_frame().await.unwrap().expect("response lost");
    assert_eq!(
        CallResponse::decode(&frame, &WireType::F64).unwrap(),
        CallResponse::Success(WireValue::F64(36.0))
    );

    stopper.await.unwrap();
    assert!(!handle.is_running());
    assert_closed(&mut framed).await;
}

#[tokio::test]
async fn calls_exceeding_the_grace_period_are_aborted() {
    init_tracing();
    let config = RpcServerConfig::default().with_shutdown_grace_period(Duration::from_millis(200));
    let entered = Arc::new(Notify::new());

    let handle = {
        let entered = entered.clone();
        RpcServer::with_config(config)
            .serve_operation::<Square, _, _, _>(0, move |(x,)| {
                let entered = entered.clone();
                async move {
                    entered.notify_one();
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, Infallible>(f64::from(x))
                }
            })
            .await
            .unwrap()
    };

    let mut framed = connect(handle.local_addr()).await;
    framed.write_frame(&request::<Square>((6,))).await.unwrap();
    entered.notified().await;

    let started = Instant::now();
    handle.stop().await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(handle.active_connections(), 0);

    assert_closed(&mut framed).await;
}

#[tokio::test]
async fn malformed_arguments_get_a_system_error_and_close() {
    let handle = host_square(RpcServerConfig::default()).await;
    let mut framed = connect(handle.local_addr()).await;

    let descriptor = Square::descriptor().unwrap();
    let bad = CallRequest::new(&descriptor, vec![WireValue::Str("five".into())]).encode();

    let response = exchange(&mut framed, &bad, &WireType::F64).await;
    assert_eq!(system_error_kind(response), failure_kind::MALFORMED_PAYLOAD);
    assert_closed(&mut framed).await;

    // The host itself is unaffected.
    let mut framed = connect(handle.local_addr()).await;
    let response = exchange(&mut framed, &request::<Square>((3,)), &WireType::F64).await;
    assert_eq!(response, CallResponse::Success(WireValue::F64(9.0)));

    handle.stop().await;
}

#[tokio::test]
async fn unreadable_header_is_an_invalid_request() {
    let handle = host_square(RpcServerConfig::default()).await;
    let mut framed = connect(handle.local_addr()).await;

    let response = exchange(&mut framed, &[9, 9], &WireType::F64).await;
    assert_eq!(system_error_kind(response), failure_kind::INVALID_REQUEST);
    assert_closed(&mut framed).await;

    handle.stop().await;
}

#[tokio::test]
async fn mismatched_fingerprint_fails_closed() {
    let handle = host_square(RpcServerConfig::default()).await;
    let mut framed = connect(handle.local_addr()).await;

    let response = exchange(&mut framed, &request::<Echo>(("5".into(),)), &WireType::Str).await;
    assert_eq!(system_error_kind(response), failure_kind::OPERATION_MISMATCH);
    assert_closed(&mut framed).await;

    handle.stop().await;
}

#[tokio::test]
async fn oversized_frame_is_rejected_without_reading_it() {
    let handle = host_square(RpcServerConfig::default().with_max_frame_size(64)).await;
    let mut raw = TcpStream::connect(handle.local_addr()).await.unwrap();

    // A header declaring a 1 MiB request is enough; the body never follows.
    raw.write_all(&(1u32 << 20).to_le_bytes()).await.unwrap();
    let mut framed = FramedStream::new(raw, DEFAULT_MAX_FRAME_SIZE);

    let frame = framed.read_frame().await.unwrap().expect("no error response");
    let response = CallResponse::decode(&frame, &WireType::F64).unwrap();
    assert_eq!(system_error_kind(response), failure_kind::FRAME_TOO_LARGE);
    assert_closed(&mut framed).await;

    handle.stop().await;
}

#[tokio::test]
async fn panicking_implementation_reports_panic_and_keeps_serving() {
    init_tracing();
    let handle = RpcServer::host_operation::<Echo, _, _, _>(0, |(text,)| async move {
        if text == "boom" {
            panic!("echo exploded");
        }
        Ok::<_, Infallible>(text)
    })
    .await
    .unwrap();

    let mut framed = connect(handle.local_addr()).await;
    let response = exchange(&mut framed, &request::<Echo>(("boom".into(),)), &WireType::Str).await;
    assert_eq!(
        response,
        CallResponse::Fail(RpcFailure::new(failure_kind::PANIC, "echo exploded"))
    );

    // Application failures are not protocol errors; the connection stays open.
    let response = exchange(&mut framed, &request::<Echo>(("fine".into(),)), &WireType::Str).await;
    assert_eq!(response, CallResponse::Success(WireValue::Str("fine".into())));

    handle.stop().await;
}

#[tokio::test]
async fn idle_connections_time_out() {
    let handle = host_square(
        RpcServerConfig::default().with_idle_timeout(Duration::from_millis(100)),
    )
    .await;

    let mut framed = connect(handle.local_addr()).await;
    exchange(&mut framed, &request::<Square>((4,)), &WireType::F64).await;
    assert_closed(&mut framed).await;

    handle.stop().await;
}

#[tokio::test]
async fn active_connections_are_counted() {
    let handle = host_square(RpcServerConfig::default()).await;

    let mut first = connect(handle.local_addr()).await;
    let mut second = connect(handle.local_addr()).await;
    exchange(&mut first, &request::<Square>((1,)), &WireType::F64).await;
    exchange(&mut second, &request::<Square>((2,)), &WireType::F64).await;
    assert_eq!(handle.active_connections(), 2);

    drop(first);
    drop(second);

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while handle.active_connections() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(drained.is_ok());

    handle.stop().await;
}

#[tokio::test]
async fn run_scoped_stops_after_body_returns() {
    let handle = host_square(RpcServerConfig::default()).await;
    let observer = handle.clone();

    let response = handle
        .run_scoped(|handle| async move {
            let mut framed = connect(handle.local_addr()).await;
            exchange(&mut framed, &request::<Square>((5,)), &WireType::F64).await
        })
        .await;

    assert_eq!(response, CallResponse::Success(WireValue::F64(25.0)));
    assert!(!observer.is_running());
    assert!(TcpStream::connect(observer.local_addr()).await.is_err());
}

#[tokio::test]
async fn run_scoped_stops_when_body_panics() {
    let handle = host_square(RpcServerConfig::default()).await;
    let observer = handle.clone();

    let outcome = AssertUnwindSafe(handle.run_scoped(|_handle| async {
        panic!("scoped body failed");
    }))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert!(!observer.is_running());
    assert!(TcpStream::connect(observer.local_addr()).await.is_err());
}

#[tokio::test]
async fn dropping_the_last_handle_aborts_the_service() {
    let handle = host_square(RpcServerConfig::default()).await;
    let addr = handle.local_addr();
    drop(handle);

    let refused = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if TcpStream::connect(addr).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(refused.is_ok());
}

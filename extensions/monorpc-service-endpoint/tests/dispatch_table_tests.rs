use example_monorpc_service_definition::{DIVISION_BY_ZERO, Divide, Echo, Ping, Square, Tally};
use monorpc::codec::{WireType, WireValue};
use monorpc::constants::MAX_WIRE_NESTING_DEPTH;
use monorpc::rpc::{CallRequest, CallResponse, OperationDescriptor, RpcFailure, failure_kind};
use monorpc_service::{RpcOperation, WireArgs};
use monorpc_service_endpoint::{RpcHandlerError, RpcServiceEndpoint, error::RpcServiceEndpointError};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn square_endpoint() -> RpcServiceEndpoint {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Square, _, _, _>(|(x,)| async move {
            Ok::<_, Infallible>(f64::from(x) * f64::from(x))
        })
        .unwrap();
    endpoint
}

fn request<Op: RpcOperation>(input: Op::Input) -> CallRequest {
    CallRequest::new(&Op::descriptor().unwrap(), input.into_args())
}

fn expect_failure(response: CallResponse) -> RpcFailure {
    match response {
        CallResponse::Fail(failure) => failure,
        other => panic!("expected Fail, got {other:?}"),
    }
}

fn expect_system_error(response: CallResponse) -> RpcFailure {
    match response {
        CallResponse::SystemError(failure) => failure,
        other => panic!("expected SystemError, got {other:?}"),
    }
}

#[tokio::test]
async fn invokes_registered_operation() {
    let endpoint = square_endpoint();

    assert_eq!(
        endpoint.invoke(request::<Square>((5,))).await,
        CallResponse::Success(WireValue::F64(25.0))
    );
    assert_eq!(
        endpoint.invoke(request::<Square>((-3,))).await,
        CallResponse::Success(WireValue::F64(9.0))
    );
}

#[tokio::test]
async fn invoke_bytes_decodes_against_descriptor() {
    let endpoint = square_endpoint();
    let bytes = request::<Square>((7,)).encode();

    assert_eq!(
        endpoint.invoke_bytes(&bytes).await,
        CallResponse::Success(WireValue::F64(49.0))
    );
}

#[tokio::test]
async fn unit_operations_return_unit() {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Ping, _, _, _>(|()| async { Ok::<_, Infallible>(()) })
        .unwrap();

    assert_eq!(
        endpoint.invoke(request::<Ping>(())).await,
        CallResponse::Success(WireValue::Unit)
    );
}

#[tokio::test]
async fn composite_arguments_and_results() {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Tally, _, _, _>(|(counts, label)| async move {
            let total = counts.iter().map(|c| i64::from(*c)).sum::<i64>();
            Ok::<_, Infallible>((label, total))
        })
        .unwrap();

    let response = endpoint
        .invoke(request::<Tally>((vec![1, 2, 3, 4], "apples".into())))
        .await;

    assert_eq!(
        response,
        CallResponse::Success(WireValue::Tuple(vec![
            WireValue::Str("apples".into()),
            WireValue::I64(10),
        ]))
    );
}

#[tokio::test]
async fn unknown_fingerprint_fails_closed() {
    let endpoint = square_endpoint();
    let failure = expect_system_error(endpoint.invoke(request::<Echo>(("hi".into(),))).await);
    assert_eq!(failure.kind, failure_kind::OPERATION_MISMATCH);

    let bytes = request::<Echo>(("hi".into(),)).encode();
    assert!(matches!(
        endpoint.decode_request(&bytes).unwrap_err(),
        RpcServiceEndpointError::UnknownOperation { .. }
    ));
}

#[tokio::test]
async fn mistyped_arguments_are_malformed_payloads() {
    let endpoint = square_endpoint();
    let descriptor = Square::descriptor().unwrap();

    let wrong_type = CallRequest::new(&descriptor, vec![WireValue::Str("5".into())]);
    let failure = expect_system_error(endpoint.invoke(wrong_type.clone()).await);
    assert_eq!(failure.kind, failure_kind::MALFORMED_PAYLOAD);

    let failure = expect_system_error(endpoint.invoke_bytes(&wrong_type.encode()).await);
    assert_eq!(failure.kind, failure_kind::MALFORMED_PAYLOAD);

    let too_many = CallRequest::new(&descriptor, vec![WireValue::I32(1), WireValue::I32(2)]);
    let failure = expect_system_error(endpoint.invoke(too_many).await);
    assert_eq!(failure.kind, failure_kind::MALFORMED_PAYLOAD);
}

#[tokio::test]
async fn truncated_header_is_an_invalid_request() {
    let endpoint = square_endpoint();
    let err = endpoint.decode_request(&[1, 0, 0]).unwrap_err();

    assert!(matches!(err, RpcServiceEndpointError::InvalidRequest(_)));
    assert_eq!(
        expect_system_error(err.to_response()).kind,
        failure_kind::INVALID_REQUEST
    );
}

#[tokio::test]
async fn rpc_failure_keeps_its_kind() {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Divide, _, _, _>(|(a, b)| async move {
            if b == 0 {
                return Err(RpcFailure::new(DIVISION_BY_ZERO, format!("{a} / 0")));
            }
            Ok(a / b)
        })
        .unwrap();

    assert_eq!(
        endpoint.invoke(request::<Divide>((9, 3))).await,
        CallResponse::Success(WireValue::I64(3))
    );

    let failure = expect_failure(endpoint.invoke(request::<Divide>((9, 0))).await);
    assert_eq!(failure, RpcFailure::new(DIVISION_BY_ZERO, "9 / 0"));
}

#[tokio::test]
async fn other_errors_become_application_errors() {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Echo, _, _, _>(|(text,)| async move {
            text.parse::<i32>().map(|n| n.to_string())
        })
        .unwrap();

    let failure = expect_failure(endpoint.invoke(request::<Echo>(("nope".into(),))).await);
    assert_eq!(failure.kind, failure_kind::APPLICATION_ERROR);
    assert_eq!(failure.message, "invalid digit found in string");
}

#[tokio::test]
async fn panics_become_panic_failures() {
    let endpoint = RpcServiceEndpoint::new();
    endpoint
        .register_operation::<Echo, _, _, _>(|(text,)| async move {
            if text == "boom" {
                panic!("handler exploded");
            }
            Ok::<_, Infallible>(text)
        })
        .unwrap();

    let failure = expect_failure(endpoint.invoke(request::<Echo>(("boom".into(),))).await);
    assert_eq!(failure.kind, failure_kind::PANIC);
    assert_eq!(failure.message, "handler exploded");

    // The table is still usable afterwards.
    assert_eq!(
        endpoint.invoke(request::<Echo>(("ok".into(),))).await,
        CallResponse::Success(WireValue::Str("ok".into()))
    );
}

#[tokio::test]
async fn panic_before_the_future_exists_is_caught() {
    let endpoint = RpcServiceEndpoint::new();
    let descriptor = Ping::descriptor().unwrap();
    endpoint.register(
        descriptor.clone(),
        |_args| -> std::future::Ready<Result<WireValue, RpcHandlerError>> {
            panic!("eager failure")
        },
    );

    let failure = expect_failure(endpoint.invoke(CallRequest::new(&descriptor, vec![])).await);
    assert_eq!(failure.kind, failure_kind::PANIC);
    assert_eq!(failure.message, "eager failure");
}

#[tokio::test]
async fn wrong_return_type_is_a_system_error() {
    let endpoint = RpcServiceEndpoint::new();
    let descriptor = Square::descriptor().unwrap();
    endpoint.register(descriptor.clone(), |_args| async {
        Ok::<_, RpcHandlerError>(WireValue::I32(25))
    });

    let failure = expect_system_error(
        endpoint
            .invoke(CallRequest::new(&descriptor, vec![WireValue::I32(5)]))
            .await,
    );
    assert_eq!(failure.kind, failure_kind::INVALID_RETURN_VALUE);
}

#[tokio::test]
async fn reregistering_replaces_the_binding() {
    let endpoint = square_endpoint();
    let replaced = endpoint
        .register_operation::<Square, _, _, _>(|(x,)| async move {
            Ok::<_, Infallible>(-f64::from(x))
        })
        .unwrap();

    assert!(replaced);
    assert_eq!(endpoint.len(), 1);
    assert_eq!(
        endpoint.invoke(request::<Square>((4,))).await,
        CallResponse::Success(WireValue::F64(-4.0))
    );
}

#[tokio::test]
async fn descriptors_are_looked_up_by_fingerprint() {
    let endpoint = square_endpoint();
    let descriptor = Square::descriptor().unwrap();

    assert_eq!(
        endpoint.descriptor(descriptor.fingerprint()).as_deref(),
        Some(&descriptor)
    );

    let other = OperationDescriptor::new("square", vec![WireType::I64], WireType::F64).unwrap();
    assert!(endpoint.descriptor(other.fingerprint()).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invocations_run_concurrently() {
    let endpoint = Arc::new(RpcServiceEndpoint::new());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        endpoint
            .register_operation::<Echo, _, _, _>(move |(text,)| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(text)
                }
            })
            .unwrap();
    }

    let calls = (0..8).map(|i| {
        let endpoint = endpoint.clone();
        tokio::spawn(async move {
            let marker = format!("marker-{i}");
            let response = endpoint.invoke(request::<Echo>((marker.clone(),))).await;
            assert_eq!(response, CallResponse::Success(WireValue::Str(marker)));
        })
    });

    for call in futures::future::join_all(calls).await {
        call.unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn deepest_accepted_descriptor_is_callable() {
    let mut ty = WireType::I32;
    let mut value = WireValue::I32(11);
    for _ in 0..MAX_WIRE_NESTING_DEPTH {
        ty = WireType::list_of(ty);
        value = WireValue::List(vec![value]);
    }
    let op = OperationDescriptor::new("deep", vec![ty.clone()], ty).unwrap();

    let endpoint = RpcServiceEndpoint::new();
    endpoint.register(op.clone(), |mut args| async move {
        Ok::<_, RpcHandlerError>(args.remove(0))
    });

    let bytes = CallRequest::new(&op, vec![value.clone()]).encode();
    assert_eq!(endpoint.invoke_bytes(&bytes).await, CallResponse::Success(value));
}

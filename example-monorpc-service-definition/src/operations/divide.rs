use monorpc_service::RpcOperation;

/// Failure kind an implementation reports for a zero divisor.
pub const DIVISION_BY_ZERO: &str = "DivisionByZero";

/// Integer division; the only operation here with a domain failure.
pub struct Divide;

impl RpcOperation for Divide {
    const INTERFACE: &'static str = "Arithmetic";
    const NAME: &'static str = "divide";

    type Input = (i64, i64);
    type Output = i64;
}

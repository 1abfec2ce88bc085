use monorpc_service::RpcOperation;

/// Sums a list of counts under a label and echoes the label back.
pub struct Tally;

impl RpcOperation for Tally {
    const INTERFACE: &'static str = "Ledger";
    const NAME: &'static str = "tally";

    type Input = (Vec<i32>, String);
    type Output = (String, i64);
}

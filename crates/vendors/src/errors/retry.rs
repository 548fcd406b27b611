/// Classification of a failed vendor call.
///
/// Used to decide how the failure feeds health tracking and whether a
/// purchase may be re-submitted under the same request id.
///
/// # Behavior Summary
///
/// | Class | Vendor outcome | Counts against health? | Same key may re-submit? |
/// |-------|----------------|------------------------|-------------------------|
/// | `Unknown` | may have been applied | Yes | No, requery first |
/// | `Rejected` | definitely not applied | Yes | Yes |
/// | `Configuration` | never sent | No | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    /// The request may have reached the vendor (timeout, 5xx, dropped
    /// connection mid-flight). The vendor-side effect must be resolved with a status
    /// query, never by re-submitting.
    Unknown,

    /// The vendor answered and refused the request.
    Rejected,

    /// The request was never sent because it was malformed locally or the
    /// provider has no endpoint for it.
    Configuration,
}

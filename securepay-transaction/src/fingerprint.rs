//! Device fingerprinting for fraud control.

use securepay_token::MerchantClaims;

/// Supplies the fraud-control transaction id for a device.
pub trait FingerprintProvider: Send + Sync {
    /// Base64 fingerprint, or `None` when the device could not be profiled
    fn fingerprint(&self) -> Option<String>;
}

impl<F> FingerprintProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn fingerprint(&self) -> Option<String> {
        self()
    }
}

/// Fingerprint to send with this attempt's requests.
///
/// An id the merchant already put in the token wins: the provider is then
/// not consulted and no field is sent.
pub(crate) fn attempt_fingerprint(
    claims: Option<&MerchantClaims>,
    provider: Option<&dyn FingerprintProvider>,
) -> Option<String> {
    let supplied = claims.is_some_and(|c| c.payload.fraud_control_transaction_id.is_some());
    if supplied {
        return None;
    }
    provider
        .and_then(|p| p.fingerprint())
        .filter(|id| !id.is_empty())
}

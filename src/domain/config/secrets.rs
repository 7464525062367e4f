/// Shared secrets loaded from the environment at startup.
///
/// Token issuance is triggered by the payment webhook handler, not by end
/// users, so the /store route is guarded by a shared-secret header.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub internal_secret: String,
}

use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const MERCHANT_REFERENCE_PREFIX: &str = "qz_";

pub fn generate_merchant_reference() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("{}{}", MERCHANT_REFERENCE_PREFIX, suffix)
}

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub(crate) const TEST_CODE_LEN: usize = 6;

pub(crate) fn generate_test_code() -> String {
    let mut rng = rand::thread_rng();
    let mut output = String::with_capacity(TEST_CODE_LEN);
    for _ in 0..TEST_CODE_LEN {
        let index = rng.gen_range(0..ALPHABET.len());
        output.push(ALPHABET[index] as char);
    }
    output
}

/// Codes are typed by hand, so surrounding whitespace and case are ignored.
pub(crate) fn normalize_test_code(entered: &str) -> String {
    entered.trim().to_ascii_uppercase()
}

/// Checks a mainland-China mobile number against the carrier prefixes the
/// user service accepts: `1` followed by a known two-digit network prefix
/// and eight more digits.
pub fn is_valid_mobile(mobile: &str) -> bool {
    let digits = mobile.as_bytes();
    if digits.len() != 11 || !digits.iter().all(u8::is_ascii_digit) || digits[0] != b'1' {
        return false;
    }

    let (second, third) = (digits[1], digits[2]);
    match second {
        b'3' | b'8' => true,
        b'4' => matches!(third, b'5' | b'7' | b'9'),
        b'5' => third != b'4',
        b'6' => third == b'6',
        b'7' => matches!(third, b'0' | b'1' | b'3' | b'5' | b'6' | b'7' | b'8'),
        b'9' => matches!(third, b'8' | b'9'),
        _ => false,
    }
}

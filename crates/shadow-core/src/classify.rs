/// True when `contents` holds a control character other than `\r`, `\n` or `\t`.
///
/// Only decides what the operator log shows; persistence never consults it.
pub fn is_binary_like(contents: &str) -> bool {
    contents
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\r' | '\n' | '\t'))
}

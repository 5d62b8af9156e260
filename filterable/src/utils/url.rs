//! URL decoding helpers

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Decode a form-urlencoded token (`%XX` escapes, `+` as space).
///
/// Malformed escapes are kept literally. Invalid UTF-8 is replaced lossily.
pub fn url_decode(input: &str) -> Cow<'_, str> {
    if !input.contains(['%', '+']) {
        return Cow::Borrowed(input);
    }

    let spaced = input.replace('+', " ");
    Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}

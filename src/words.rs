/// Splits source text into the ordered word sequence a session types through.
///
/// Words are separated by runs of whitespace; empty tokens are dropped. An
/// empty or all-whitespace input yields an empty sequence, which callers treat
/// as "no content".
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

use ammonia;

/// Escapes user-supplied text for embedding in HTML or SVG markup.
///
/// Every character that could open a tag, attribute or entity is replaced by
/// an entity reference, so the output is always inert text. Names and
/// certificate titles go through this before reaching the renderer or the
/// issuance email.
///
/// Control characters are dropped first and `&grave;` is rewritten as a
/// numeric reference, since neither is allowed in an XML (SVG) document.
pub fn escape_text(input: &str) -> String {
    let printable: String = input.chars().filter(|c| !c.is_control()).collect();
    ammonia::clean_text(&printable).replace("&grave;", "&#96;")
}

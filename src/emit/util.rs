/// Escape text for use inside an XML attribute or element.
pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Split `Class::method` into its class part, if it has one.
pub(crate) fn class_of(case: &str) -> Option<&str> {
    case.rsplit_once("::").map(|(class, _)| class)
}

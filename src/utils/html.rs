use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) survive, dangerous tags (like
/// <script>, <iframe>) and attributes (like onclick) are stripped together
/// with their content. Applied to host-entered event titles, which are
/// rendered on every dashboard.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

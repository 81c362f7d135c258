use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Exam descriptions, question text and option strings come from teacher
/// input and are rendered straight into quiz pages by the clients, so
/// they pass through whitelist sanitization before storage: safe tags
/// survive, <script>/<iframe> and event-handler attributes do not.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

//! AMQP-style topic matching.

/// Returns true if `topic` matches `pattern`.
///
/// Both are dot-separated words. In the pattern, `*` matches exactly one word
/// and `#` matches zero or more words.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    words_match(&pattern, &topic)
}

fn words_match(pattern: &[&str], topic: &[&str]) -> bool {
    match (pattern.split_first(), topic.split_first()) {
        (None, None) => true,
        (Some((&"#", rest)), _) => {
            words_match(rest, topic) || (!topic.is_empty() && words_match(pattern, &topic[1..]))
        }
        (Some((&"*", rest)), Some((_, topic_rest))) => words_match(rest, topic_rest),
        (Some((word, rest)), Some((topic_word, topic_rest))) => {
            word == topic_word && words_match(rest, topic_rest)
        }
        _ => false,
    }
}

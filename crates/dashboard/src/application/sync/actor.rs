//! Human-readable actor names for notifications.

/// Fallback when an event does not say who caused it.
pub const UNKNOWN_ACTOR: &str = "another user";

/// Render an actor for a notification.
///
/// Email-like actors become the local part split on `.` and `_`, each word
/// capitalized: `okabe.rintaro@lab.jp` gives `Okabe Rintaro`. Anything else is
/// shown as sent.
pub fn format_actor(actor: Option<&str>) -> String {
    let actor = match actor.map(str::trim) {
        Some(actor) if !actor.is_empty() => actor,
        _ => return UNKNOWN_ACTOR.to_string(),
    };

    let Some((local, _domain)) = actor.split_once('@') else {
        return actor.to_string();
    };

    let words: Vec<String> = local
        .split(['.', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        actor.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

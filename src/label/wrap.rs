//! Greedy word wrap for label text.

/// Split `text` into lines of at most `width` characters.
///
/// Words are separated by spaces (runs collapse). A line is flushed exactly
/// when appending the next word plus its separating space would exceed
/// `width`; the last partial line is always kept. A word longer than
/// `width` gets a line of its own and is never broken. Blank text yields
/// no lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let word_len = word.chars().count();

        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

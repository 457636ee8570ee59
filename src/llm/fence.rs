//! Fixed-width code fence removal.

/// Characters assumed to open the block: "```sql\n".
const LEADING: usize = 7;

/// Characters assumed to close the block: "\n```".
const TRAILING: usize = 4;

/// Cuts the fence off a synthesized statement by position.
///
/// Exactly 7 characters are dropped from the front and 4 from the back,
/// whatever they are. The content is never inspected, so a reply with a
/// different fence (or none) comes back truncated. Text too short to hold
/// both fences yields an empty string.
pub fn strip_fence(text: &str) -> String {
    let len = text.chars().count();
    if len < LEADING + TRAILING {
        return String::new();
    }

    text.chars().skip(LEADING).take(len - LEADING - TRAILING).collect()
}

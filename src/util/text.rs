use std::borrow::Cow;

/// Longest title reddit accepts for a submission, in characters.
pub const MAX_TITLE_CHARS: usize = 300;

/// Ellipsis appended when a title has to be cut.
const ELLIPSIS: &str = "...";

/// Turns a raw feed title into something postable.
///
/// Feed titles frequently carry embedded newlines, tabs and runs of spaces
/// from the source markup. These are collapsed into single spaces, control
/// characters are dropped, and the result is cut to [`MAX_TITLE_CHARS`]
/// characters with a trailing `...` when it is too long.
///
/// Returns `Cow::Borrowed` when the input is already clean.
///
/// # Examples
///
/// ```
/// use snoofeeder::util::post_title;
///
/// assert_eq!(post_title("Hello\n   world"), "Hello world");
/// assert_eq!(post_title("Already clean"), "Already clean");
/// ```
pub fn post_title(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();

    let needs_collapse = trimmed
        .chars()
        .zip(trimmed.chars().skip(1))
        .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
        || trimmed.chars().any(|c| c.is_control() || (c.is_whitespace() && c != ' '));

    let collapsed: Cow<'_, str> = if needs_collapse {
        let mut out = String::with_capacity(trimmed.len());
        let mut pending_space = false;
        for c in trimmed.chars() {
            if c.is_whitespace() {
                pending_space = true;
                continue;
            }
            if c.is_control() {
                continue;
            }
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
        Cow::Owned(out)
    } else {
        Cow::Borrowed(trimmed)
    };

    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }

    let keep = MAX_TITLE_CHARS - ELLIPSIS.len();
    let mut cut: String = collapsed.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    Cow::Owned(cut)
}

//! Shell-style node name patterns
//!
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from a set or range
//! - `[!abc]` matches one character not in the set

/// Upper bound on matcher steps, so patterns like `*a*a*a*b` stay cheap
const MAX_STEPS: usize = 100_000;

/// Returns true when `pattern` matches the whole of `name`
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let mut steps = 0;
    match_from(&pattern, &name, &mut steps)
}

/// Names from `names` matching `pattern`, in their original order
pub fn filter_names<'a, I>(names: I, pattern: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|name| glob_match(pattern, name))
        .map(str::to_string)
        .collect()
}

fn match_from(pattern: &[char], name: &[char], steps: &mut usize) -> bool {
    *steps += 1;
    if *steps > MAX_STEPS {
        return false;
    }

    let Some((&first, rest)) = pattern.split_first() else {
        return name.is_empty();
    };

    match first {
        '*' => {
            let rest = trim_stars(rest);
            if rest.is_empty() {
                return true;
            }
            (0..=name.len()).any(|skip| match_from(rest, &name[skip..], steps))
        }
        '?' => !name.is_empty() && match_from(rest, &name[1..], steps),
        '[' => match (name.first(), char_class(pattern)) {
            (Some(&ch), Some((class, consumed))) => {
                class.contains(ch) && match_from(&pattern[consumed..], &name[1..], steps)
            }
            // an unclosed bracket is a literal '['
            (Some(&ch), None) => ch == '[' && match_from(rest, &name[1..], steps),
            (None, _) => false,
        },
        literal => name.first() == Some(&literal) && match_from(rest, &name[1..], steps),
    }
}

fn trim_stars(pattern: &[char]) -> &[char] {
    let skip = pattern.iter().take_while(|&&c| c == '*').count();
    &pattern[skip..]
}

struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    fn contains(&self, ch: char) -> bool {
        let hit = self
            .ranges
            .iter()
            .any(|&(low, high)| low <= ch && ch <= high);
        hit != self.negated
    }
}

/// Parse a `[...]` class at the start of `pattern`; returns the class and
/// how many pattern characters it spans
fn char_class(pattern: &[char]) -> Option<(CharClass, usize)> {
    let mut idx = 1;
    let negated = matches!(pattern.get(idx), Some('!') | Some('^'));
    if negated {
        idx += 1;
    }

    let body_start = idx;
    let mut ranges = Vec::new();
    loop {
        let &c = pattern.get(idx)?;
        // ']' right after the opening bracket is a member, not the end
        if c == ']' && idx > body_start {
            return Some((CharClass { negated, ranges }, idx + 1));
        }

        match (pattern.get(idx + 1), pattern.get(idx + 2)) {
            (Some('-'), Some(&high)) if high != ']' => {
                ranges.push((c, high));
                idx += 3;
            }
            _ => {
                ranges.push((c, c));
                idx += 1;
            }
        }
    }
}

//! Changelog directives in free text
//!
//! A change body may carry one directive line:
//!
//! ```text
//! changelog: [3.1, Kernel] Fixed a crash when the page cache is full
//! cl: 2.2, 2.3: Backported to both series
//! ```
//!
//! The directive token (`changelog` or `cl`, any case) must start a line
//! and stand alone as a word. It may be followed by a colon, an optional
//! `[...]` list of releases (`major.minor`) and categories, and the message.
//! When the directive line has no message, the next non-blank line is used,
//! which may itself start with the `[...]` list.

use crate::domain::source::ChangeLink;

const DIRECTIVE_TOKENS: [&str; 2] = ["changelog", "cl"];

/// Metadata recovered from a change body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Release series the change is restricted to (e.g., "3.1")
    pub release_filter: Vec<String>,
    /// Categories named in the directive
    pub category_filter: Vec<String>,
    /// Message that replaces the change title
    pub override_text: Option<String>,
}

impl Annotation {
    /// Scan `body` for the first directive line.
    ///
    /// Bodies without a directive yield an empty annotation.
    pub fn parse(body: &str) -> Annotation {
        let lines: Vec<&str> = body.lines().collect();

        for (idx, line) in lines.iter().enumerate() {
            if let Some(rest) = strip_directive(line.trim_start()) {
                return parse_directive(rest, &lines[idx + 1..]);
            }
        }
        Annotation::default()
    }

    /// Category filter, or `intrinsic` when the directive named none
    pub fn categories_or(&self, intrinsic: &[String]) -> Vec<String> {
        if self.category_filter.is_empty() {
            intrinsic.to_vec()
        } else {
            self.category_filter.clone()
        }
    }

    /// Override text if it has content, else `title`
    pub fn text_or<'a>(&'a self, title: &'a str) -> &'a str {
        match self.override_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => title,
        }
    }
}

/// Append the reference link and optional author to a change text.
///
/// Applying it to its own output returns that output unchanged.
///
/// # Arguments
/// * `text` - Message of the change
/// * `link` - Reference rendered as `[#12](url)` or `(abc1234)`
/// * `author` - Author shown in parentheses, if any
pub fn decorate(text: &str, link: &ChangeLink, author: Option<&str>) -> String {
    let mut suffix = format!(" {}", link);
    if let Some(author) = author {
        suffix.push_str(&format!(" ({})", author));
    }

    let text = text.trim();
    if text.ends_with(&suffix) {
        text.to_string()
    } else {
        format!("{}{}", text, suffix)
    }
}

/// Return what follows the directive token, if `line` starts with one.
fn strip_directive(line: &str) -> Option<&str> {
    DIRECTIVE_TOKENS.iter().find_map(|token| {
        let head = line.get(..token.len())?;
        if !head.eq_ignore_ascii_case(token) {
            return None;
        }
        let rest = &line[token.len()..];
        match rest.chars().next() {
            None => Some(rest),
            Some(c) if c.is_whitespace() || c == ':' || c == '[' => Some(rest),
            Some(_) => None,
        }
    })
}

fn parse_directive(rest: &str, following: &[&str]) -> Annotation {
    let mut annotation = Annotation::default();
    let rest = skip_colon(rest);

    let message = match take_bracket(rest, &mut annotation) {
        Some(after) => after,
        None => take_legacy_releases(rest, &mut annotation),
    };
    if !message.is_empty() {
        annotation.override_text = Some(message.to_string());
        return annotation;
    }

    let mut next = following.iter().map(|l| l.trim()).filter(|l| !l.is_empty());
    if let Some(line) = next.next() {
        match take_bracket(line, &mut annotation) {
            Some("") => annotation.override_text = next.next().map(str::to_string),
            Some(after) => annotation.override_text = Some(after.to_string()),
            None => annotation.override_text = Some(line.to_string()),
        }
    }
    annotation
}

fn skip_colon(text: &str) -> &str {
    let text = text.trim_start();
    text.strip_prefix(':').unwrap_or(text).trim()
}

/// Parse a leading `[a, b]` list into the filters and return the rest.
fn take_bracket<'a>(text: &'a str, annotation: &mut Annotation) -> Option<&'a str> {
    let inner = text.strip_prefix('[')?;
    let close = inner.find(']')?;

    for item in inner[..close].split(',').map(str::trim).filter(|i| !i.is_empty()) {
        if is_release_token(item) {
            annotation.release_filter.push(item.to_string());
        } else {
            annotation.category_filter.push(item.to_string());
        }
    }
    Some(skip_colon(&inner[close + 1..]))
}

/// Older form without brackets: `2.2, 2.3` or `2.2, 2.3: message`.
///
/// The text before the first colon is a release list only if every item in
/// it is a release; otherwise the whole text is the message.
fn take_legacy_releases<'a>(text: &'a str, annotation: &mut Annotation) -> &'a str {
    let (head, message) = match text.find(':') {
        Some(idx) => (&text[..idx], text[idx + 1..].trim()),
        None => (text, ""),
    };

    let items: Vec<&str> = head.split(',').map(str::trim).filter(|i| !i.is_empty()).collect();
    if items.is_empty() || !items.iter().all(|i| is_release_token(i)) {
        return text.trim();
    }

    annotation
        .release_filter
        .extend(items.iter().map(|i| i.to_string()));
    message
}

/// `major.minor`, digits only
fn is_release_token(item: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    item.split_once('.')
        .map_or(false, |(major, minor)| all_digits(major) && all_digits(minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_release_list_without_text() {
        let a = Annotation::parse("changelog: 2.2, 2.3");
        assert_eq!(a.release_filter, strings(&["2.2", "2.3"]));
        assert!(a.category_filter.is_empty());
        assert_eq!(a.override_text, None);
        assert_eq!(a.text_or("Title"), "Title");
    }

    #[test]
    fn test_short_token_with_spaces_before_colon() {
        let a = Annotation::parse("CL  : 2.2, 2.3");
        assert_eq!(a.release_filter, strings(&["2.2", "2.3"]));
        assert_eq!(a.override_text, None);
    }

    #[test]
    fn test_plain_text() {
        let a = Annotation::parse("CL: Custom text");
        assert!(a.release_filter.is_empty());
        assert!(a.category_filter.is_empty());
        assert_eq!(a.override_text.as_deref(), Some("Custom text"));
    }

    #[test]
    fn test_text_containing_colon() {
        let a = Annotation::parse("CL: Really tricky text: with a colon");
        assert!(a.release_filter.is_empty());
        assert_eq!(
            a.override_text.as_deref(),
            Some("Really tricky text: with a colon")
        );
    }

    #[test]
    fn test_release_list_with_text() {
        let a = Annotation::parse("changelog: 2.1 ,2.2, 2.3 : My change text follows here");
        assert_eq!(a.release_filter, strings(&["2.1", "2.2", "2.3"]));
        assert_eq!(a.override_text.as_deref(), Some("My change text follows here"));
    }

    #[test]
    fn test_bracket_metadata() {
        let a = Annotation::parse("cl: [3.1, Kernel , ,Cypher] Fixed the planner");
        assert_eq!(a.release_filter, strings(&["3.1"]));
        assert_eq!(a.category_filter, strings(&["Kernel", "Cypher"]));
        assert_eq!(a.override_text.as_deref(), Some("Fixed the planner"));
    }

    #[test]
    fn test_bracket_without_colon_or_spaces() {
        let a = Annotation::parse("changelog[3.0,Kernel]Tight text");
        assert_eq!(a.release_filter, strings(&["3.0"]));
        assert_eq!(a.category_filter, strings(&["Kernel"]));
        assert_eq!(a.override_text.as_deref(), Some("Tight text"));
    }

    #[test]
    fn test_message_on_next_line() {
        let body = "Some description\n\nchangelog:\n\n  Message on its own line  \nNot part of it";
        let a = Annotation::parse(body);
        assert_eq!(a.override_text.as_deref(), Some("Message on its own line"));
    }

    #[test]
    fn test_metadata_and_message_on_following_lines() {
        let body = "cl\n[3.1, Kernel]\nThe message\nmore";
        let a = Annotation::parse(body);
        assert_eq!(a.release_filter, strings(&["3.1"]));
        assert_eq!(a.category_filter, strings(&["Kernel"]));
        assert_eq!(a.override_text.as_deref(), Some("The message"));
    }

    #[test]
    fn test_metadata_line_with_message() {
        let a = Annotation::parse("changelog:\n[Cypher] Faster joins");
        assert_eq!(a.category_filter, strings(&["Cypher"]));
        assert_eq!(a.override_text.as_deref(), Some("Faster joins"));
    }

    #[test]
    fn test_only_first_line_of_message() {
        let a = Annotation::parse("cl: First line\nsecond line");
        assert_eq!(a.override_text.as_deref(), Some("First line"));
    }

    #[test]
    fn test_words_starting_with_token_do_not_match() {
        assert_eq!(Annotation::parse("closes #99"), Annotation::default());
        assert_eq!(Annotation::parse("changelogs: nope"), Annotation::default());
        assert_eq!(Annotation::parse("clean up: x"), Annotation::default());
    }

    #[test]
    fn test_directive_must_start_line() {
        assert_eq!(
            Annotation::parse("see the cl: in the docs"),
            Annotation::default()
        );
        let a = Annotation::parse("Intro\n   Changelog: indented directive");
        assert_eq!(a.override_text.as_deref(), Some("indented directive"));
    }

    #[test]
    fn test_first_directive_wins() {
        let a = Annotation::parse("cl: first\ncl: second");
        assert_eq!(a.override_text.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_and_directive_only_bodies() {
        assert_eq!(Annotation::parse(""), Annotation::default());
        assert_eq!(Annotation::parse("changelog"), Annotation::default());
    }

    #[test]
    fn test_categories_or_falls_back_to_intrinsic() {
        let intrinsic = strings(&["bug"]);
        assert_eq!(Annotation::parse("cl: x").categories_or(&intrinsic), intrinsic);
        assert_eq!(
            Annotation::parse("cl: [Kernel] x").categories_or(&intrinsic),
            strings(&["Kernel"])
        );
    }

    #[test]
    fn test_blank_override_uses_title() {
        let a = Annotation {
            override_text: Some("   ".to_string()),
            ..Annotation::default()
        };
        assert_eq!(a.text_or("Title"), "Title");
    }

    #[test]
    fn test_decorate_is_idempotent() {
        let link = ChangeLink {
            label: "#1243".to_string(),
            url: Some("http://test.com/test".to_string()),
        };
        let once = decorate("Fix the kernel ", &link, None);
        assert_eq!(once, "Fix the kernel [#1243](http://test.com/test)");
        assert_eq!(decorate(&once, &link, None), once);

        let with_author = decorate("Fix the kernel", &link, Some("@octocat"));
        assert_eq!(
            with_author,
            "Fix the kernel [#1243](http://test.com/test) (@octocat)"
        );
        assert_eq!(decorate(&with_author, &link, Some("@octocat")), with_author);
    }

    #[test]
    fn test_decorate_commit_without_url() {
        let link = ChangeLink {
            label: "abc1234".to_string(),
            url: None,
        };
        assert_eq!(decorate("Tweak", &link, Some("Jane")), "Tweak (abc1234) (Jane)");
    }
}

use crate::{HarnessError, Result};
use regex::Regex;

/// Placeholder types a step pattern may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `{string}` - a double-quoted value; quotes are stripped.
    Str,
    /// `{int}` - a whole number.
    Int,
    /// `{float}` - a number with an optional fraction.
    Float,
    /// `{word}` - one whitespace-free token.
    Word,
}

impl PlaceholderKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::Str),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "word" => Some(Self::Word),
            _ => None,
        }
    }

    fn capture(self) -> &'static str {
        match self {
            Self::Str => r#""([^"]*)""#,
            Self::Int => r"(-?\d+)",
            Self::Float => r"(-?\d+(?:\.\d+)?)",
            Self::Word => r"(\S+)",
        }
    }

    fn sample(self) -> &'static str {
        match self {
            Self::Str => r#""sample""#,
            Self::Int => "42",
            Self::Float => "3.5",
            Self::Word => "sample",
        }
    }

    fn token(self) -> &'static str {
        match self {
            Self::Str => "{string}",
            Self::Int => "{int}",
            Self::Float => "{float}",
            Self::Word => "{word}",
        }
    }
}

/// A typed argument extracted from a step line.
#[derive(Debug, Clone, PartialEq)]
pub enum StepArg {
    Str(String),
    Int(i64),
    Float(f64),
    Word(String),
}

impl StepArg {
    pub fn as_str(&self) -> &str {
        match self {
            StepArg::Str(s) | StepArg::Word(s) => s,
            _ => "",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            StepArg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            StepArg::Float(n) => Some(*n),
            StepArg::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

/// One step pattern, compiled once at registration into an anchored regex
/// plus a typed extraction plan applied positionally at match time.
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    regex: Regex,
    plan: Vec<PlaceholderKind>,
    canonical: String,
}

impl StepPattern {
    pub fn compile(source: &str) -> Result<Self> {
        let mut regex_src = String::with_capacity(source.len() + 16);
        let mut canonical = String::with_capacity(source.len());
        let mut plan = Vec::new();
        regex_src.push('^');

        let mut rest = source;
        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            regex_src.push_str(&regex::escape(literal));
            canonical.push_str(literal);

            let close = tail.find('}').ok_or_else(|| HarnessError::InvalidPattern {
                pattern: source.to_string(),
                reason: "unclosed placeholder".to_string(),
            })?;
            let name = &tail[1..close];
            let kind =
                PlaceholderKind::parse(name).ok_or_else(|| HarnessError::InvalidPattern {
                    pattern: source.to_string(),
                    reason: format!("unknown placeholder {{{name}}}"),
                })?;
            regex_src.push_str(kind.capture());
            canonical.push_str(kind.token());
            plan.push(kind);
            rest = &tail[close + 1..];
        }
        regex_src.push_str(&regex::escape(rest));
        canonical.push_str(rest);
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| HarnessError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
            plan,
            canonical,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Typed arguments when `line` matches, in placeholder order.
    pub fn try_match(&self, line: &str) -> Option<Vec<StepArg>> {
        let captures = self.regex.captures(line)?;
        let mut args = Vec::with_capacity(self.plan.len());
        for (index, kind) in self.plan.iter().enumerate() {
            let raw = captures.get(index + 1)?.as_str();
            let arg = match kind {
                PlaceholderKind::Str => StepArg::Str(raw.to_string()),
                PlaceholderKind::Int => StepArg::Int(raw.parse().ok()?),
                PlaceholderKind::Float => StepArg::Float(raw.parse().ok()?),
                PlaceholderKind::Word => StepArg::Word(raw.to_string()),
            };
            args.push(arg);
        }
        Some(args)
    }

    /// A representative line this pattern matches, used for overlap checks.
    pub(crate) fn example_line(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        let mut kinds = self.plan.iter();
        while let Some(open) = rest.find('{') {
            let (literal, tail) = rest.split_at(open);
            out.push_str(literal);
            // Both hold after compile(); bail rather than panic if not.
            let Some(close) = tail.find('}') else { break };
            let Some(kind) = kinds.next() else { break };
            out.push_str(kind.sample());
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Conservative overlap test: identical canonical forms, or either
    /// pattern accepting the other's representative line. Regex
    /// intersection in general is not worth deciding here; this catches
    /// the collisions people actually write.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.canonical == other.canonical
            || self.regex.is_match(&other.example_line())
            || other.regex.is_match(&self.example_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_verbatim_only() {
        let p = StepPattern::compile("I visit the homepage").expect("compile");
        assert_eq!(p.try_match("I visit the homepage"), Some(vec![]));
        assert!(p.try_match("I visit the homepage!").is_none());
        assert!(p.try_match("i visit the homepage").is_none());
    }

    #[test]
    fn string_placeholder_strips_quotes() {
        let p = StepPattern::compile(r#"I see the placeholder {string}"#).expect("compile");
        let args = p
            .try_match(r#"I see the placeholder "Search""#)
            .expect("match");
        assert_eq!(args, vec![StepArg::Str("Search".to_string())]);
        // Unquoted text does not satisfy a {string} placeholder.
        assert!(p.try_match("I see the placeholder Search").is_none());
    }

    #[test]
    fn typed_extraction_in_declared_order() {
        let p = StepPattern::compile("the {string} exchange responds with status {int}")
            .expect("compile");
        let args = p
            .try_match(r#"the "getComments" exchange responds with status 200"#)
            .expect("match");
        assert_eq!(
            args,
            vec![
                StepArg::Str("getComments".to_string()),
                StepArg::Int(200),
            ]
        );
    }

    #[test]
    fn float_and_word_placeholders() {
        let p = StepPattern::compile("a margin of {float} percent on {word}").expect("compile");
        let args = p.try_match("a margin of 39.5 percent on Arabica").expect("match");
        assert_eq!(
            args,
            vec![StepArg::Float(39.5), StepArg::Word("Arabica".to_string())]
        );
    }

    #[test]
    fn unknown_placeholder_is_rejected() {
        let err = StepPattern::compile("I wait {seconds}").expect_err("invalid");
        assert!(matches!(err, HarnessError::InvalidPattern { .. }));
    }

    #[test]
    fn overlap_detection() {
        let a = StepPattern::compile("I see {string}").expect("compile");
        let b = StepPattern::compile("I see {string}").expect("compile");
        let c = StepPattern::compile("I see {word}").expect("compile");
        let d = StepPattern::compile("I click {string}").expect("compile");
        assert!(a.overlaps(&b));
        // "\"sample\"" is one whitespace-free token, so {word} collides.
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }
}

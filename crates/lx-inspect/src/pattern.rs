//! Name patterns used to look elements up in the catalog
//!
//! A pattern may carry a scheme prefix: `glob:` (the default when no scheme
//! is given) or `regex:`. Matching ignores case and covers the whole name.
//!
//! Glob syntax:
//!
//! | glob      | matches                                  |
//! |-----------|------------------------------------------|
//! | `*`       | any run of characters except `/`         |
//! | `**`      | any run of characters, `/` included     |
//! | `?`       | one character except `/`                 |
//! | `[a-z]`   | one character from the class, `[!a]` negates |
//! | `{a,b}`   | either alternative                       |
//! | `\c`      | the character `c` literally              |

use crate::query::{QueryError, QueryResult};
use regex::{Regex, RegexBuilder};

/// A compiled glob or regex, anchored at both ends
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn compile(text: &str) -> QueryResult<Self> {
        match text.split_once(':') {
            None => Self::glob(text),
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("glob") => Self::glob(rest),
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("regex") => Self::regex(rest),
            Some((scheme, _)) => Err(QueryError::UnknownSyntax {
                scheme: scheme.to_string(),
                pattern: text.to_string(),
            }),
        }
    }

    fn glob(text: &str) -> QueryResult<Self> {
        let invalid = |reason: String| QueryError::InvalidGlob {
            pattern: text.to_string(),
            reason,
        };
        let translated = translate_glob(text).map_err(|reason| invalid(reason.to_string()))?;
        build(&translated)
            .map(|regex| Self { regex })
            .map_err(|source| invalid(source.to_string()))
    }

    fn regex(text: &str) -> QueryResult<Self> {
        build(&format!("^(?:{})$", text))
            .map(|regex| Self { regex })
            .map_err(|source| QueryError::InvalidRegex {
                pattern: text.to_string(),
                source,
            })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

fn build(regex: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(regex).case_insensitive(true).build()
}

/// Rewrite a glob as an anchored regex
fn translate_glob(glob: &str) -> Result<String, &'static str> {
    let mut regex = String::from("^");
    let mut chars = glob.chars().peekable();
    let mut in_group = false;

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.next_if_eq(&'*').is_some() {
                    while chars.next_if_eq(&'*').is_some() {}
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut regex, escaped),
                None => return Err("trailing escape"),
            },
            '[' => {
                regex.push('[');
                if chars.next_if(|&c| c == '!' || c == '^').is_some() {
                    regex.push('^');
                }
                let mut empty = true;
                loop {
                    match chars.next() {
                        None => return Err("unclosed character class"),
                        Some(']') if !empty => break,
                        Some(c @ ('\\' | '[' | ']' | '&' | '~' | '^')) => {
                            regex.push('\\');
                            regex.push(c);
                        }
                        Some(c) => regex.push(c),
                    }
                    empty = false;
                }
                regex.push(']');
            }
            '{' if in_group => return Err("nested groups"),
            '{' => {
                in_group = true;
                regex.push_str("(?:");
            }
            '}' if in_group => {
                in_group = false;
                regex.push(')');
            }
            ',' if in_group => regex.push('|'),
            c => push_literal(&mut regex, c),
        }
    }

    if in_group {
        return Err("unclosed group");
    }
    regex.push('$');
    Ok(regex)
}

fn push_literal(regex: &mut String, c: char) {
    let mut buf = [0; 4];
    regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("servlet-*", "servlet-4.0", true)]
    #[case("SERVLET-*", "servlet-4.0", true)]
    #[case("glob:servlet-?.0", "servlet-4.0", true)]
    #[case("servlet-?.0", "servlet-10.0", false)]
    #[case("*", "com.example.core", true)]
    #[case("*", "lib/core.jar", false)]
    #[case("**", "lib/core.jar", true)]
    #[case("servlet**", "servlet-4.0", true)]
    #[case("servlet**", "servlet/impl/1.0", true)]
    #[case("*core**", "com.example.core", true)]
    #[case("*core**", "com.example.core-1.0", true)]
    #[case("*core**", "com.example.kernel", false)]
    #[case("{servlet,jsp}-*", "jsp-2.3", true)]
    #[case("[sj]*-4.0", "servlet-4.0", true)]
    #[case("[!s]*", "servlet-4.0", false)]
    #[case("servlet-4.0", "servlet-400", false)]
    #[case("a\\*", "a*", true)]
    #[case("regex:servlet-[0-9]+\\.0", "servlet-10.0", true)]
    #[case("regex:servlet", "servlet-10.0", false)]
    #[case("REGEX:Servlet-.*", "servlet-4.0", true)]
    fn test_matches(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(NamePattern::compile(pattern).unwrap().matches(name), expected);
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            NamePattern::compile("xpath://feature"),
            Err(QueryError::UnknownSyntax { ref scheme, .. }) if scheme == "xpath"
        ));
    }

    #[rstest]
    #[case("[unclosed")]
    #[case("{open,group")]
    #[case("{a,{b}}")]
    #[case("trailing\\")]
    #[case("[z-a]")]
    fn test_invalid_globs(#[case] pattern: &str) {
        assert!(matches!(
            NamePattern::compile(pattern),
            Err(QueryError::InvalidGlob { .. })
        ));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            NamePattern::compile("regex:(unclosed"),
            Err(QueryError::InvalidRegex { .. })
        ));
    }
}
